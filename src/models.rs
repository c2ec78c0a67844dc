use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::{campamentos, especies, eventos, nidos, observaciones, personal};

#[derive(Queryable, Serialize, Debug, Clone)]
pub struct Personnel {
    pub id: i32,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub cargo: String,
    pub activo: bool,
    pub creado_en: NaiveDateTime,
}

impl Personnel {
    /// Given and family name joined for display.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido).trim().to_string()
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = personal)]
pub struct NewPersonnel {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub password_hash: String,
    pub cargo: String,
}

/// What the API is allowed to reveal about a staff member.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PublicUser {
    pub id: i32,
    pub nombre: String,
    pub email: String,
    pub cargo: String,
}

impl From<&Personnel> for PublicUser {
    fn from(p: &Personnel) -> Self {
        PublicUser {
            id: p.id,
            nombre: p.display_name(),
            email: p.email.clone(),
            cargo: p.cargo.clone(),
        }
    }
}

#[derive(Queryable, Serialize, Debug, Clone, PartialEq)]
pub struct Species {
    pub id: i32,
    pub nombre_cientifico: String,
    pub nombre_comun: String,
    pub estado_conservacion: String,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = especies)]
pub struct NewSpecies {
    pub nombre_cientifico: String,
    pub nombre_comun: String,
    pub estado_conservacion: String,
}

#[derive(Queryable, Serialize, Debug, Clone, PartialEq)]
pub struct Camp {
    pub id: i32,
    pub nombre: String,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = campamentos)]
pub struct NewCamp {
    pub nombre: String,
}

#[derive(Queryable, Serialize, Debug, Clone, PartialEq)]
pub struct Nest {
    pub id: i32,
    pub codigo: String,
    pub campamento_id: i32,
    pub especie_id: i32,
    pub fecha_puesta: NaiveDate,
    pub cantidad_huevos: i32,
    pub estado: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = nidos)]
pub struct NewNest {
    pub codigo: String,
    pub campamento_id: i32,
    pub especie_id: i32,
    pub fecha_puesta: NaiveDate,
    pub cantidad_huevos: i32,
    pub estado: String,
}

/// Edit of a nest. A `None` estado keeps the stored state.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = nidos)]
pub struct NestChanges {
    pub codigo: String,
    pub campamento_id: i32,
    pub especie_id: i32,
    pub fecha_puesta: NaiveDate,
    pub cantidad_huevos: i32,
    pub estado: Option<String>,
}

#[derive(Queryable, Serialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub id: i32,
    pub tipo: String,
    pub nido_id: Option<i32>,
    pub campamento_id: i32,
    pub personal_id: i32,
    pub fecha: NaiveDateTime,
    pub descripcion: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = eventos)]
pub struct NewEvent {
    pub tipo: String,
    pub nido_id: Option<i32>,
    pub campamento_id: i32,
    pub personal_id: i32,
    pub fecha: NaiveDateTime,
    pub descripcion: Option<String>,
}

/// Edit of an event. Outer `None` leaves a column as stored; `Some(None)`
/// clears a nullable one.
#[derive(AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = eventos)]
pub struct EventChanges {
    pub tipo: String,
    pub nido_id: Option<Option<i32>>,
    pub campamento_id: i32,
    pub personal_id: Option<i32>,
    pub fecha: Option<NaiveDateTime>,
    pub descripcion: Option<Option<String>>,
}

#[derive(Queryable, Serialize, Debug, Clone, PartialEq)]
pub struct Observation {
    pub id: i32,
    pub nido_id: i32,
    pub personal_id: i32,
    pub fecha: NaiveDateTime,
    pub nota: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = observaciones)]
pub struct NewObservation {
    pub nido_id: i32,
    pub personal_id: i32,
    pub fecha: NaiveDateTime,
    pub nota: String,
}

#[derive(AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = observaciones)]
pub struct ObservationChanges {
    pub nido_id: i32,
    pub personal_id: Option<i32>,
    pub fecha: Option<NaiveDateTime>,
    pub nota: String,
}

// Request bodies. Every field is optional so that a missing field becomes a
// field-specific validation error instead of a generic deserialization failure.

/// Tells an explicit `null` (`Some(None)`) apart from a missing key (`None`,
/// through `#[serde(default)]`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize, Debug, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RegisterRequest {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub cargo: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SpeciesPayload {
    pub nombre_cientifico: Option<String>,
    pub nombre_comun: Option<String>,
    pub estado_conservacion: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CampPayload {
    pub nombre: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct NestPayload {
    pub codigo: Option<String>,
    pub campamento_id: Option<i32>,
    pub especie_id: Option<i32>,
    pub fecha_puesta: Option<NaiveDate>,
    pub cantidad_huevos: Option<i32>,
    pub estado: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct EventPayload {
    pub tipo: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub nido_id: Option<Option<i32>>,
    pub campamento_id: Option<i32>,
    pub personal_id: Option<i32>,
    pub fecha: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "present")]
    pub descripcion: Option<Option<String>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ObservationPayload {
    pub nido_id: Option<i32>,
    pub personal_id: Option<i32>,
    pub fecha: Option<NaiveDateTime>,
    pub nota: Option<String>,
}
