//! Generic list/create/update/delete handlers over one table.
//!
//! Each entity implements [`Resource`]: it names its route, turns a request
//! payload into insertable values or an edit changeset, and supplies the four
//! diesel statements.
//! Everything HTTP-shaped (CORS pre-flight, 405s, session checks, error
//! classification, response envelopes) lives here once.

use actix_web::http::{Method, StatusCode};
use actix_web::{web, HttpResponse};
use diesel::pg::PgConnection;
use diesel::QueryResult;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::db::Store;
use crate::errors::ApiError;
use crate::middleware::ALLOWED_METHODS;
use crate::services::AuthService;
use crate::session::SessionContext;

pub mod camps;
pub mod events;
pub mod nests;
pub mod observations;
pub mod species;

pub use camps::CampResource;
pub use events::EventResource;
pub use nests::NestResource;
pub use observations::ObservationResource;
pub use species::SpeciesResource;

/// How a resource shapes successful bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{ "success": true, "data": ... }`
    Wrapped,
    /// The rows or row as-is.
    Bare,
}

impl Envelope {
    pub fn respond<T: Serialize>(&self, status: StatusCode, body: T) -> HttpResponse {
        let mut builder = HttpResponse::build(status);
        match self {
            Envelope::Wrapped => builder.json(json!({ "success": true, "data": body })),
            Envelope::Bare => builder.json(body),
        }
    }
}

pub trait Resource: 'static {
    /// Route segment under `/api`, also the table name.
    const NAME: &'static str;
    const ENVELOPE: Envelope;

    type Record: Serialize + Send + 'static;
    type Payload: DeserializeOwned + 'static;
    type Values: Send + 'static;
    type Changes: Send + 'static;

    /// Checks required fields and fills defaults for a new row. Runs before
    /// any database access.
    fn validate(payload: Self::Payload, session: &SessionContext) -> Result<Self::Values, ApiError>;

    /// Checks an edit. Columns that have a default on create are left as
    /// stored when the payload omits them.
    fn validate_changes(payload: Self::Payload) -> Result<Self::Changes, ApiError>;

    /// All rows, ordered by primary key.
    fn list(conn: &mut PgConnection) -> QueryResult<Vec<Self::Record>>;

    fn create(conn: &mut PgConnection, values: Self::Values) -> QueryResult<Self::Record>;

    /// `None` when no row has `id`.
    fn update(conn: &mut PgConnection, id: i32, changes: Self::Changes) -> QueryResult<Option<Self::Record>>;

    /// Number of rows removed.
    fn delete(conn: &mut PgConnection, id: i32) -> QueryResult<usize>;
}

/// Registers `/{name}` and `/{name}/{id}` for `R`.
pub fn register<R: Resource>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(format!("/{}", R::NAME))
            .route(web::get().to(list::<R>))
            .route(web::post().to(create::<R>))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::route().to(method_not_allowed)),
    )
    .service(
        web::resource(format!("/{}/{{id}}", R::NAME))
            .route(web::put().to(update::<R>))
            .route(web::delete().to(delete::<R>))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::route().to(method_not_allowed)),
    );
}

pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .insert_header(("Access-Control-Allow-Headers", "Content-Type"))
        .insert_header(("Access-Control-Allow-Methods", ALLOWED_METHODS))
        .finish()
}

pub async fn method_not_allowed() -> Result<HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed)
}

async fn list<R: Resource>(store: web::Data<Store>) -> Result<HttpResponse, ApiError> {
    let rows = store.fetch_all(R::list).await?;
    debug!("Listed {} {}", rows.count, R::NAME);
    Ok(R::ENVELOPE.respond(StatusCode::OK, rows.rows))
}

async fn create<R: Resource>(
    store: web::Data<Store>,
    session: SessionContext,
    payload: web::Json<R::Payload>,
) -> Result<HttpResponse, ApiError> {
    let values = R::validate(payload.into_inner(), &session)?;
    let actor = AuthService::require_active(session, &store).await?;

    let record = store.run(move |conn| R::create(conn, values)).await?;
    info!("{} created a row in {}", actor.email, R::NAME);
    Ok(R::ENVELOPE.respond(StatusCode::CREATED, record))
}

async fn update<R: Resource>(
    store: web::Data<Store>,
    session: SessionContext,
    path: web::Path<i32>,
    payload: web::Json<R::Payload>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let changes = R::validate_changes(payload.into_inner())?;
    let actor = AuthService::require_active(session, &store).await?;

    match store.run(move |conn| R::update(conn, id, changes)).await? {
        Some(record) => {
            info!("{} updated {} {}", actor.email, R::NAME, id);
            Ok(R::ENVELOPE.respond(StatusCode::OK, record))
        }
        None => Err(not_found::<R>(id)),
    }
}

async fn delete<R: Resource>(
    store: web::Data<Store>,
    session: SessionContext,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let actor = AuthService::require_active(session, &store).await?;

    // Rows still referenced elsewhere fail here with a foreign key violation.
    let removed = store.run(move |conn| R::delete(conn, id)).await?;
    if removed == 0 {
        return Err(not_found::<R>(id));
    }

    info!("{} deleted {} {}", actor.email, R::NAME, id);
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

fn not_found<R: Resource>(id: i32) -> ApiError {
    ApiError::NotFound(format!("No existe un registro {} en {}", id, R::NAME))
}
