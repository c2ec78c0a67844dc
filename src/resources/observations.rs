use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use super::{Envelope, Resource};
use crate::errors::{required_text, required_value, ApiError};
use crate::models::{NewObservation, Observation, ObservationChanges, ObservationPayload};
use crate::schema::observaciones;
use crate::session::SessionContext;

pub struct ObservationResource;

impl Resource for ObservationResource {
    const NAME: &'static str = "observaciones";
    const ENVELOPE: Envelope = Envelope::Wrapped;

    type Record = Observation;
    type Payload = ObservationPayload;
    type Values = NewObservation;
    type Changes = ObservationChanges;

    fn validate(payload: ObservationPayload, session: &SessionContext) -> Result<NewObservation, ApiError> {
        let changes = Self::validate_changes(payload)?;
        Ok(NewObservation {
            nido_id: changes.nido_id,
            personal_id: changes.personal_id.unwrap_or(session.user_id),
            fecha: changes.fecha.unwrap_or_else(|| Utc::now().naive_utc()),
            nota: changes.nota,
        })
    }

    fn validate_changes(payload: ObservationPayload) -> Result<ObservationChanges, ApiError> {
        Ok(ObservationChanges {
            nido_id: required_value(payload.nido_id, "nido_id")?,
            personal_id: payload.personal_id,
            fecha: payload.fecha,
            nota: required_text(payload.nota, "nota")?,
        })
    }

    fn list(conn: &mut PgConnection) -> QueryResult<Vec<Observation>> {
        observaciones::table.order(observaciones::id.asc()).load(conn)
    }

    fn create(conn: &mut PgConnection, values: NewObservation) -> QueryResult<Observation> {
        diesel::insert_into(observaciones::table).values(&values).get_result(conn)
    }

    fn update(conn: &mut PgConnection, id: i32, changes: ObservationChanges) -> QueryResult<Option<Observation>> {
        diesel::update(observaciones::table.find(id))
            .set(&changes)
            .get_result(conn)
            .optional()
    }

    fn delete(conn: &mut PgConnection, id: i32) -> QueryResult<usize> {
        diesel::delete(observaciones::table.find(id)).execute(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn payload() -> ObservationPayload {
        ObservationPayload {
            nido_id: Some(14),
            nota: Some("huellas de mapache".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_observation_is_signed_by_session_user() {
        let values = ObservationResource::validate(payload(), &SessionContext { user_id: 4 }).unwrap();
        assert_eq!(values.personal_id, 4);
        assert_eq!(values.nota, "huellas de mapache");
    }

    #[test]
    fn test_edit_leaves_author_and_timestamp_alone() {
        let changes = ObservationResource::validate_changes(payload()).unwrap();
        assert_eq!(changes.personal_id, None);
        assert_eq!(changes.fecha, None);

        let fecha = NaiveDate::from_ymd_opt(2024, 10, 3)
            .and_then(|d| d.and_hms_opt(5, 0, 0))
            .unwrap();
        let dated = ObservationPayload { fecha: Some(fecha), ..payload() };
        let changes = ObservationResource::validate_changes(dated).unwrap();
        assert_eq!(changes.fecha, Some(fecha));
    }
}
