use actix_web::error::BlockingError;
use actix_web::web;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel::QueryResult;
use log::{debug, info};
use thiserror::Error;

use crate::config::AppConfig;

// Type aliases
pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

// Database initialization SQL
pub const DB_INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS personal (
    id SERIAL PRIMARY KEY,
    nombre VARCHAR(100) NOT NULL,
    apellido VARCHAR(100) NOT NULL,
    email VARCHAR(255) UNIQUE NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    cargo VARCHAR(100) NOT NULL,
    activo BOOLEAN NOT NULL DEFAULT TRUE,
    creado_en TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS especies (
    id SERIAL PRIMARY KEY,
    nombre_cientifico VARCHAR(255) UNIQUE NOT NULL,
    nombre_comun VARCHAR(255) NOT NULL,
    estado_conservacion VARCHAR(100) NOT NULL
);

CREATE TABLE IF NOT EXISTS campamentos (
    id SERIAL PRIMARY KEY,
    nombre VARCHAR(255) UNIQUE NOT NULL
);

CREATE TABLE IF NOT EXISTS nidos (
    id SERIAL PRIMARY KEY,
    codigo VARCHAR(50) UNIQUE NOT NULL,
    campamento_id INTEGER NOT NULL REFERENCES campamentos(id) ON DELETE RESTRICT,
    especie_id INTEGER NOT NULL REFERENCES especies(id) ON DELETE RESTRICT,
    fecha_puesta DATE NOT NULL,
    cantidad_huevos INTEGER NOT NULL CHECK (cantidad_huevos >= 0),
    estado VARCHAR(50) NOT NULL
);

CREATE TABLE IF NOT EXISTS eventos (
    id SERIAL PRIMARY KEY,
    tipo VARCHAR(100) NOT NULL,
    nido_id INTEGER REFERENCES nidos(id) ON DELETE RESTRICT,
    campamento_id INTEGER NOT NULL REFERENCES campamentos(id) ON DELETE RESTRICT,
    personal_id INTEGER NOT NULL REFERENCES personal(id) ON DELETE RESTRICT,
    fecha TIMESTAMP NOT NULL DEFAULT NOW(),
    descripcion TEXT
);

CREATE TABLE IF NOT EXISTS observaciones (
    id SERIAL PRIMARY KEY,
    nido_id INTEGER NOT NULL REFERENCES nidos(id) ON DELETE RESTRICT,
    personal_id INTEGER NOT NULL REFERENCES personal(id) ON DELETE RESTRICT,
    fecha TIMESTAMP NOT NULL DEFAULT NOW(),
    nota TEXT NOT NULL
);
"#;

/// Failures from the store, kept intact so the classifier can inspect them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not acquire a database connection: {0}")]
    Pool(#[from] r2d2::PoolError),

    #[error("database task was cancelled")]
    Blocking(#[from] BlockingError),

    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),
}

/// Ordered result rows plus their count.
#[derive(Debug, Clone, PartialEq)]
pub struct Rows<T> {
    pub rows: Vec<T>,
    pub count: usize,
}

impl<T> From<Vec<T>> for Rows<T> {
    fn from(rows: Vec<T>) -> Self {
        let count = rows.len();
        Rows { rows, count }
    }
}

/// Handle to the connection pool, built once at startup and shared with every
/// handler through `web::Data`.
#[derive(Clone)]
pub struct Store {
    pool: DbPool,
}

impl Store {
    /// Opens the pool and checks that at least one connection can be made.
    pub fn connect(config: &AppConfig) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<PgConnection>::new(config.connection_url());
        let pool = r2d2::Pool::builder()
            .max_size(config.pool_size)
            .build(manager)?;
        info!("Database pool ready (max {} connections)", config.pool_size);
        Ok(Store { pool })
    }

    /// Builds the pool without touching the database. Connections are only
    /// attempted when a query runs.
    pub fn connect_lazy(config: &AppConfig) -> Self {
        let manager = ConnectionManager::<PgConnection>::new(config.connection_url());
        let pool = r2d2::Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(std::time::Duration::from_secs(5))
            .build_unchecked(manager);
        Store { pool }
    }

    pub async fn init_schema(&self) -> Result<(), StoreError> {
        self.run(|conn| conn.batch_execute(DB_INIT_SQL)).await?;
        info!("Database initialization complete.");
        Ok(())
    }

    /// Runs `f` on a pooled connection on the blocking thread pool. The
    /// connection goes back to the pool when the closure returns, whatever
    /// the outcome.
    pub async fn run<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        web::block(move || {
            let mut conn = pool.get()?;
            f(&mut *conn).map_err(StoreError::from)
        })
        .await?
    }

    pub async fn fetch_all<F, T>(&self, f: F) -> Result<Rows<T>, StoreError>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<Vec<T>> + Send + 'static,
        T: Send + 'static,
    {
        let rows = self.run(f).await?;
        debug!("Fetched {} rows", rows.len());
        Ok(Rows::from(rows))
    }

    /// Drops the pool. Idle connections are closed immediately; any still
    /// checked out close when their request finishes.
    pub fn close(self) {
        let state = self.pool.state();
        info!(
            "Closing database pool ({} connections, {} idle)",
            state.connections, state.idle_connections
        );
    }
}
