use actix_web::http::StatusCode;
use actix_web::{error::ResponseError, HttpResponse};
use log::{debug, error, warn};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;
use crate::error_classifier::{classify, StoreErrorCategory};

pub const INVALID_CREDENTIALS: &str = "Credenciales inválidas";
pub const EMAIL_TAKEN: &str = "El email ya está registrado";
pub const UNAUTHORIZED: &str = "No autenticado";
pub const METHOD_NOT_ALLOWED: &str = "Método no permitido";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials,

    #[error("{}", UNAUTHORIZED)]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{}", EMAIL_TAKEN)]
    EmailTaken,

    #[error("unique constraint violated")]
    UniqueViolation,

    #[error("foreign key constraint violated")]
    ForeignKeyViolation,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{}", METHOD_NOT_ALLOWED)]
    MethodNotAllowed,

    /// The detail is logged, never sent.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn required(field: &str) -> Self {
        ApiError::Validation(format!("El campo {} es obligatorio", field))
    }

    /// The text that goes into the `error` field of the response body.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::InvalidCredentials => INVALID_CREDENTIALS.to_string(),
            ApiError::Unauthorized => UNAUTHORIZED.to_string(),
            ApiError::Validation(msg) => msg.clone(),
            ApiError::EmailTaken => EMAIL_TAKEN.to_string(),
            ApiError::UniqueViolation => StoreErrorCategory::UniqueViolation.message().to_string(),
            ApiError::ForeignKeyViolation => {
                StoreErrorCategory::ForeignKeyViolation.message().to_string()
            }
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::MethodNotAllowed => METHOD_NOT_ALLOWED.to_string(),
            ApiError::Internal(_) => StoreErrorCategory::Unknown.message().to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match classify(&err) {
            StoreErrorCategory::UniqueViolation => ApiError::UniqueViolation,
            StoreErrorCategory::ForeignKeyViolation => ApiError::ForeignKeyViolation,
            StoreErrorCategory::Unknown => ApiError::Internal(err.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Internal(detail) => {
                error!("\x1B[1;31mINTERNAL SERVER ERROR:\x1B[0m {}", detail);
            }
            ApiError::UniqueViolation | ApiError::ForeignKeyViolation => {
                warn!("\x1B[1;33mCONSTRAINT ERROR:\x1B[0m {}", self);
            }
            ApiError::Validation(_) | ApiError::EmailTaken => {
                warn!("\x1B[1;33mVALIDATION ERROR:\x1B[0m {}", self);
            }
            ApiError::InvalidCredentials | ApiError::Unauthorized => {
                warn!("\x1B[1;33mAUTHENTICATION ERROR:\x1B[0m {}", self);
            }
            ApiError::NotFound(_) | ApiError::MethodNotAllowed => {
                debug!("\x1B[1;36m{}\x1B[0m", self);
            }
        }

        HttpResponse::build(self.status_code()).json(json!({ "error": self.client_message() }))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_)
            | ApiError::EmailTaken
            | ApiError::UniqueViolation
            | ApiError::ForeignKeyViolation => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Trims a required text field, rejecting it when missing or blank.
pub fn required_text(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::required(field)),
    }
}

pub fn required_value<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::required(field))
}
