use diesel::pg::PgConnection;
use diesel::prelude::*;

use super::{Envelope, Resource};
use crate::errors::{required_text, ApiError};
use crate::models::{NewSpecies, Species, SpeciesPayload};
use crate::schema::especies;
use crate::session::SessionContext;

/// Turtle species. The scientific name is unique.
pub struct SpeciesResource;

impl Resource for SpeciesResource {
    const NAME: &'static str = "especies";
    const ENVELOPE: Envelope = Envelope::Bare;

    type Record = Species;
    type Payload = SpeciesPayload;
    type Values = NewSpecies;
    type Changes = NewSpecies;

    fn validate(payload: SpeciesPayload, _session: &SessionContext) -> Result<NewSpecies, ApiError> {
        Self::validate_changes(payload)
    }

    fn validate_changes(payload: SpeciesPayload) -> Result<NewSpecies, ApiError> {
        Ok(NewSpecies {
            nombre_cientifico: required_text(payload.nombre_cientifico, "nombre_cientifico")?,
            nombre_comun: required_text(payload.nombre_comun, "nombre_comun")?,
            estado_conservacion: required_text(payload.estado_conservacion, "estado_conservacion")?,
        })
    }

    fn list(conn: &mut PgConnection) -> QueryResult<Vec<Species>> {
        especies::table.order(especies::id.asc()).load(conn)
    }

    fn create(conn: &mut PgConnection, values: NewSpecies) -> QueryResult<Species> {
        diesel::insert_into(especies::table).values(&values).get_result(conn)
    }

    fn update(conn: &mut PgConnection, id: i32, values: NewSpecies) -> QueryResult<Option<Species>> {
        diesel::update(especies::table.find(id))
            .set(&values)
            .get_result(conn)
            .optional()
    }

    fn delete(conn: &mut PgConnection, id: i32) -> QueryResult<usize> {
        diesel::delete(especies::table.find(id)).execute(conn)
    }
}
