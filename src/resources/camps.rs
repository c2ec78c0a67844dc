use diesel::pg::PgConnection;
use diesel::prelude::*;

use super::{Envelope, Resource};
use crate::errors::{required_text, ApiError};
use crate::models::{Camp, CampPayload, NewCamp};
use crate::schema::campamentos;
use crate::session::SessionContext;

/// Field camps. Names are unique.
pub struct CampResource;

impl Resource for CampResource {
    const NAME: &'static str = "campamentos";
    const ENVELOPE: Envelope = Envelope::Wrapped;

    type Record = Camp;
    type Payload = CampPayload;
    type Values = NewCamp;
    type Changes = NewCamp;

    fn validate(payload: CampPayload, _session: &SessionContext) -> Result<NewCamp, ApiError> {
        Self::validate_changes(payload)
    }

    fn validate_changes(payload: CampPayload) -> Result<NewCamp, ApiError> {
        Ok(NewCamp {
            nombre: required_text(payload.nombre, "nombre")?,
        })
    }

    fn list(conn: &mut PgConnection) -> QueryResult<Vec<Camp>> {
        campamentos::table.order(campamentos::id.asc()).load(conn)
    }

    fn create(conn: &mut PgConnection, values: NewCamp) -> QueryResult<Camp> {
        diesel::insert_into(campamentos::table).values(&values).get_result(conn)
    }

    fn update(conn: &mut PgConnection, id: i32, values: NewCamp) -> QueryResult<Option<Camp>> {
        diesel::update(campamentos::table.find(id))
            .set(&values)
            .get_result(conn)
            .optional()
    }

    fn delete(conn: &mut PgConnection, id: i32) -> QueryResult<usize> {
        diesel::delete(campamentos::table.find(id)).execute(conn)
    }
}
