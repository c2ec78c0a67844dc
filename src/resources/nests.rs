use diesel::pg::PgConnection;
use diesel::prelude::*;

use super::{Envelope, Resource};
use crate::errors::{required_text, required_value, ApiError};
use crate::models::{Nest, NestChanges, NestPayload, NewNest};
use crate::schema::nidos;
use crate::session::SessionContext;

pub const DEFAULT_NEST_STATE: &str = "incubando";

pub struct NestResource;

impl Resource for NestResource {
    const NAME: &'static str = "nidos";
    const ENVELOPE: Envelope = Envelope::Wrapped;

    type Record = Nest;
    type Payload = NestPayload;
    type Values = NewNest;
    type Changes = NestChanges;

    fn validate(payload: NestPayload, _session: &SessionContext) -> Result<NewNest, ApiError> {
        let changes = Self::validate_changes(payload)?;
        Ok(NewNest {
            codigo: changes.codigo,
            campamento_id: changes.campamento_id,
            especie_id: changes.especie_id,
            fecha_puesta: changes.fecha_puesta,
            cantidad_huevos: changes.cantidad_huevos,
            estado: changes.estado.unwrap_or_else(|| DEFAULT_NEST_STATE.to_string()),
        })
    }

    fn validate_changes(payload: NestPayload) -> Result<NestChanges, ApiError> {
        let cantidad_huevos = required_value(payload.cantidad_huevos, "cantidad_huevos")?;
        if cantidad_huevos < 0 {
            return Err(ApiError::Validation(
                "El campo cantidad_huevos no puede ser negativo".to_string(),
            ));
        }

        Ok(NestChanges {
            codigo: required_text(payload.codigo, "codigo")?,
            campamento_id: required_value(payload.campamento_id, "campamento_id")?,
            especie_id: required_value(payload.especie_id, "especie_id")?,
            fecha_puesta: required_value(payload.fecha_puesta, "fecha_puesta")?,
            cantidad_huevos,
            estado: payload
                .estado
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
        })
    }

    fn list(conn: &mut PgConnection) -> QueryResult<Vec<Nest>> {
        nidos::table.order(nidos::id.asc()).load(conn)
    }

    fn create(conn: &mut PgConnection, values: NewNest) -> QueryResult<Nest> {
        diesel::insert_into(nidos::table).values(&values).get_result(conn)
    }

    fn update(conn: &mut PgConnection, id: i32, changes: NestChanges) -> QueryResult<Option<Nest>> {
        diesel::update(nidos::table.find(id))
            .set(&changes)
            .get_result(conn)
            .optional()
    }

    fn delete(conn: &mut PgConnection, id: i32) -> QueryResult<usize> {
        diesel::delete(nidos::table.find(id)).execute(conn)
    }
}
