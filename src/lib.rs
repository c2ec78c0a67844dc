// Exports all the modules for use by the server binary and the integration tests

pub mod client;
pub mod config;
pub mod db;
pub mod error_classifier;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod middleware;
pub mod models;
pub mod resources;
pub mod schema;
pub mod services;
pub mod session;

use actix_web::web;

// Re-export common types
pub use crate::config::AppConfig;
pub use crate::db::Store;
pub use crate::errors::ApiError;

/// JSON body extractor settings. Malformed bodies come back in the same
/// `{ "error": ... }` shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::Validation(format!("Cuerpo de la solicitud inválido: {}", err)).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|_err, _req| {
        ApiError::Validation("Identificador inválido".to_string()).into()
    })
}
