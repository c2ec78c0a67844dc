//! Maps store failures onto the small set of categories the API is willing to
//! talk about. Everything here is pure; nothing is logged.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::error::Error as StdError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCategory {
    /// Duplicate value in a uniquely-constrained column (SQLSTATE 23505).
    UniqueViolation,
    /// Row still referenced, or referencing a missing row (SQLSTATE 23503).
    ForeignKeyViolation,
    Unknown,
}

impl StoreErrorCategory {
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCategory::UniqueViolation => "unique_violation",
            StoreErrorCategory::ForeignKeyViolation => "foreign_key_violation",
            StoreErrorCategory::Unknown => "unknown",
        }
    }

    /// User-safe text. Never includes anything from the driver.
    pub fn message(&self) -> &'static str {
        match self {
            StoreErrorCategory::UniqueViolation => "Ya existe un registro con ese valor",
            StoreErrorCategory::ForeignKeyViolation => {
                "El registro está relacionado con otros datos o hace referencia a un registro inexistente"
            }
            StoreErrorCategory::Unknown => "Error interno del servidor",
        }
    }
}

/// Walks the error and its `source()` chain looking for a diesel database
/// error with a recognized constraint kind.
pub fn classify(err: &(dyn StdError + 'static)) -> StoreErrorCategory {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(DieselError::DatabaseError(kind, _)) = e.downcast_ref::<DieselError>() {
            return match kind {
                DatabaseErrorKind::UniqueViolation => StoreErrorCategory::UniqueViolation,
                DatabaseErrorKind::ForeignKeyViolation => StoreErrorCategory::ForeignKeyViolation,
                _ => StoreErrorCategory::Unknown,
            };
        }
        current = e.source();
    }
    StoreErrorCategory::Unknown
}
