use actix_web::cookie::time::{Duration, OffsetDateTime};
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::config::AppConfig;
use crate::errors::ApiError;

pub const SESSION_COOKIE: &str = "user_id";

/// The staff member a request claims to act for, read from the session cookie
/// once at the boundary. Handlers that mutate data confirm the id against an
/// active personnel row before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: i32,
}

impl SessionContext {
    pub fn from_http_request(req: &HttpRequest) -> Result<Self, ApiError> {
        req.cookie(SESSION_COOKIE)
            .and_then(|c| c.value().parse::<i32>().ok())
            .map(|user_id| SessionContext { user_id })
            .ok_or(ApiError::Unauthorized)
    }
}

impl FromRequest for SessionContext {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http_request(req))
    }
}

pub fn session_cookie(user_id: i32, config: &AppConfig) -> Cookie<'static> {
    let lifetime = Duration::hours(config.session_max_age_hours);
    Cookie::build(SESSION_COOKIE, user_id.to_string())
        .path("/")
        .http_only(true)
        .secure(config.is_production())
        .same_site(SameSite::Lax)
        .max_age(lifetime)
        .expires(OffsetDateTime::now_utc() + lifetime)
        .finish()
}

/// Overwrites the session cookie with an empty, already-expired one.
pub fn cleared_cookie(config: &AppConfig) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(config.is_production())
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .finish()
}
