use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use super::{Envelope, Resource};
use crate::errors::{required_text, required_value, ApiError};
use crate::models::{Event, EventChanges, EventPayload, NewEvent};
use crate::schema::eventos;
use crate::session::SessionContext;

/// Nesting events (arrivals, hatchings, relocations...). `nido_id` is optional
/// because some events are logged before a nest exists.
pub struct EventResource;

fn description(text: Option<String>) -> Option<String> {
    text.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

impl Resource for EventResource {
    const NAME: &'static str = "eventos";
    const ENVELOPE: Envelope = Envelope::Wrapped;

    type Record = Event;
    type Payload = EventPayload;
    type Values = NewEvent;
    type Changes = EventChanges;

    fn validate(payload: EventPayload, session: &SessionContext) -> Result<NewEvent, ApiError> {
        Ok(NewEvent {
            tipo: required_text(payload.tipo, "tipo")?,
            nido_id: payload.nido_id.flatten(),
            campamento_id: required_value(payload.campamento_id, "campamento_id")?,
            // The logged-in staff member unless someone else is named.
            personal_id: payload.personal_id.unwrap_or(session.user_id),
            fecha: payload.fecha.unwrap_or_else(|| Utc::now().naive_utc()),
            descripcion: description(payload.descripcion.flatten()),
        })
    }

    fn validate_changes(payload: EventPayload) -> Result<EventChanges, ApiError> {
        Ok(EventChanges {
            tipo: required_text(payload.tipo, "tipo")?,
            nido_id: payload.nido_id,
            campamento_id: required_value(payload.campamento_id, "campamento_id")?,
            personal_id: payload.personal_id,
            fecha: payload.fecha,
            descripcion: payload.descripcion.map(description),
        })
    }

    fn list(conn: &mut PgConnection) -> QueryResult<Vec<Event>> {
        eventos::table.order(eventos::id.asc()).load(conn)
    }

    fn create(conn: &mut PgConnection, values: NewEvent) -> QueryResult<Event> {
        diesel::insert_into(eventos::table).values(&values).get_result(conn)
    }

    fn update(conn: &mut PgConnection, id: i32, changes: EventChanges) -> QueryResult<Option<Event>> {
        diesel::update(eventos::table.find(id))
            .set(&changes)
            .get_result(conn)
            .optional()
    }

    fn delete(conn: &mut PgConnection, id: i32) -> QueryResult<usize> {
        diesel::delete(eventos::table.find(id)).execute(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_author_defaults_to_session_user() {
        let session = SessionContext { user_id: 9 };
        let values = EventResource::validate(
            EventPayload {
                tipo: Some("eclosión".into()),
                campamento_id: Some(2),
                descripcion: Some(Some("   ".into())),
                ..Default::default()
            },
            &session,
        )
        .unwrap();
        assert_eq!(values.personal_id, 9);
        assert_eq!(values.nido_id, None);
        assert_eq!(values.descripcion, None);
    }

    #[test]
    fn test_type_is_required() {
        let session = SessionContext { user_id: 9 };
        let err = EventResource::validate(
            EventPayload { campamento_id: Some(2), ..Default::default() },
            &session,
        )
        .unwrap_err();
        assert_eq!(err.client_message(), "El campo tipo es obligatorio");
    }

    #[test]
    fn test_edit_keeps_author_and_timestamp() {
        let payload: EventPayload = serde_json::from_value(json!({
            "tipo": "reubicación",
            "campamento_id": 2,
            "descripcion": "trasladado al vivero"
        }))
        .unwrap();

        let changes = EventResource::validate_changes(payload).unwrap();
        assert_eq!(changes.personal_id, None);
        assert_eq!(changes.fecha, None);
        assert_eq!(changes.nido_id, None);
        assert_eq!(changes.descripcion, Some(Some("trasladado al vivero".to_string())));
    }

    #[test]
    fn test_edit_with_null_clears_the_column() {
        let payload: EventPayload = serde_json::from_value(json!({
            "tipo": "reubicación",
            "campamento_id": 2,
            "nido_id": null,
            "descripcion": ""
        }))
        .unwrap();

        let changes = EventResource::validate_changes(payload).unwrap();
        assert_eq!(changes.nido_id, Some(None));
        assert_eq!(changes.descripcion, Some(None));
    }
}
