use actix_web::http::Method;
use actix_web::{get, web, HttpResponse, Responder};
use log::{debug, info};
use serde_json::json;

use crate::config::AppConfig;
use crate::db::Store;
use crate::errors::ApiError;
use crate::models::{LoginRequest, PublicUser, RegisterRequest};
use crate::resources::{
    self, method_not_allowed, preflight, CampResource, EventResource, NestResource,
    ObservationResource, SpeciesResource,
};
use crate::services::{AuthService, Credentials, PersonnelService, Registration};
use crate::session::{cleared_cookie, session_cookie, SessionContext};

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn login(
    store: web::Data<Store>,
    config: web::Data<AppConfig>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let credentials = Credentials::try_from(body.into_inner())?;
    debug!("Login attempt for user: {}", credentials.email);

    let user = AuthService::login(credentials, &store).await?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(user.id, &config))
        .json(json!({ "success": true, "user": PublicUser::from(&user) })))
}

async fn register(
    store: web::Data<Store>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let registration = Registration::try_from(body.into_inner())?;
    debug!("Registration attempt for: {}", registration.email);

    let user = AuthService::register(registration, &store).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "user": PublicUser::from(&user) })))
}

async fn logout(config: web::Data<AppConfig>, session: Option<SessionContext>) -> HttpResponse {
    if let Some(session) = session {
        info!("User {} logged out", session.user_id);
    }
    HttpResponse::Ok()
        .cookie(cleared_cookie(&config))
        .json(json!({ "success": true }))
}

async fn me(store: web::Data<Store>, session: SessionContext) -> Result<HttpResponse, ApiError> {
    let user = AuthService::require_active(session, &store).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "user": PublicUser::from(&user) })))
}

async fn list_personnel(store: web::Data<Store>) -> Result<HttpResponse, ApiError> {
    let staff: Vec<PublicUser> = PersonnelService::list_active(&store)
        .await?
        .iter()
        .map(PublicUser::from)
        .collect();
    debug!("Listed {} active staff members", staff.len());
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": staff })))
}

async fn deactivate_personnel(
    store: web::Data<Store>,
    session: SessionContext,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let actor = AuthService::require_active(session, &store).await?;

    match PersonnelService::deactivate(id, &store).await? {
        Some(user) => {
            info!("{} deactivated staff member {}", actor.email, user.email);
            Ok(HttpResponse::Ok().json(json!({ "success": true })))
        }
        None => Err(ApiError::NotFound(format!("No existe el miembro del personal {}", id))),
    }
}

async fn unknown_route() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound("Ruta no encontrada".to_string()))
}

/// Every route under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.default_service(web::route().to(unknown_route));
    cfg.service(
        web::resource("/auth/login")
            .route(web::post().to(login))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::route().to(method_not_allowed)),
    )
    .service(
        web::resource("/auth/registro")
            .route(web::post().to(register))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::route().to(method_not_allowed)),
    )
    .service(
        web::resource("/auth/logout")
            .route(web::post().to(logout))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::route().to(method_not_allowed)),
    )
    .service(
        web::resource("/auth/me")
            .route(web::get().to(me))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::route().to(method_not_allowed)),
    )
    .service(
        web::resource("/personal")
            .route(web::get().to(list_personnel))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::route().to(method_not_allowed)),
    )
    .service(
        web::resource("/personal/{id}")
            .route(web::delete().to(deactivate_personnel))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::route().to(method_not_allowed)),
    );

    resources::register::<SpeciesResource>(cfg);
    resources::register::<CampResource>(cfg);
    resources::register::<NestResource>(cfg);
    resources::register::<EventResource>(cfg);
    resources::register::<ObservationResource>(cfg);
}
