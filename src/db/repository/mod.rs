//! Repository layer: entity-scoped database operations.
//!
//! Every function takes the connection explicitly; callers own transactions
//! and connection lifetime.

mod document;
mod extraction_model;
mod label;
mod metric;
mod prediction;
mod taxonomy;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DatabaseError;

pub use document::*;
pub use extraction_model::*;
pub use label::*;
pub use metric::*;
pub use prediction::*;
pub use taxonomy::*;

pub(crate) fn parse_id(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("Bad timestamp '{s}': {e}")))
}

pub(crate) fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}
