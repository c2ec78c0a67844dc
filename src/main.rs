use actix_web::{web, App, HttpServer};
use log::{error, info};

use tortugas::config::AppConfig;
use tortugas::db::Store;
use tortugas::handlers::{configure, health_check};
use tortugas::logger::setup_logger;
use tortugas::middleware::{cors_headers, RequestLogger};
use tortugas::{json_config, path_config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load and validate configuration before anything touches the database
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;
    setup_logger(config.is_production());

    if let Err(e) = config.validate() {
        error!("Configuration validation error: {}", e);
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
    }

    info!(
        "Connecting to database ({} mode)",
        if config.is_production() { "production" } else { "development" }
    );
    let store = Store::connect(&config).map_err(|e| {
        error!("Failed to create database connection pool: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
    })?;

    store.init_schema().await.map_err(|e| {
        error!("Failed to execute database initialization script: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let host = config.host.clone();
    let port = config.port;
    let workers = config.workers;
    info!("Starting HTTP server at http://{}:{}", host, port);

    let app_store = web::Data::new(store.clone());
    let app_config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_headers())
            .wrap(RequestLogger)
            .app_data(app_store.clone())
            .app_data(app_config.clone())
            .app_data(json_config())
            .app_data(path_config())
            .service(health_check)
            .service(web::scope("/api").configure(configure))
    })
    .workers(workers)
    .keep_alive(std::time::Duration::from_secs(75))
    .shutdown_timeout(30) // Graceful shutdown timeout in seconds
    .bind((host, port))?
    .run()
    .await?;

    info!("HTTP server stopped");
    store.close();
    Ok(())
}
