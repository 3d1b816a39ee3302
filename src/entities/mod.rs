//! Entity type definitions
//!
//! - [`ComponentRecord`] - a catalogued part with its ratings
//! - [`StockMovement`] - one replenishment or withdrawal in the ledger
//!
//! Entities cross the caller boundary as [`Record`]s: plain maps from
//! column name to JSON value.

pub mod component;
pub mod movement;

pub use component::{
    ComponentAmendment, ComponentId, ComponentIdentity, ComponentRecord, NewComponent, Ratings,
};
pub use movement::{MovementId, MovementKind, MovementRequest, StockMovement};

use serde_json::Value;

use crate::error::{InventoryError, Result};

/// Boundary representation of an entity: field name to value
pub type Record = serde_json::Map<String, Value>;

pub(crate) fn required_text(record: &Record, field: &str) -> Result<String> {
    optional_text(record, field)?
        .ok_or_else(|| InventoryError::invalid_record(field, "is required"))
}

/// Missing, null and blank fields all read as `None`
pub(crate) fn optional_text(record: &Record, field: &str) -> Result<Option<String>> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.trim().to_string())),
        Some(other) => Err(InventoryError::invalid_record(
            field,
            format!("expected text, got {}", other),
        )),
    }
}
