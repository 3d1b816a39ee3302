//! Stock movement entity type - one ledger entry

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::core::dates::{decode_date, encode_date, DateFormatError};
use crate::entities::{optional_text, ComponentId, Record};
use crate::error::{InventoryError, Result};

/// Store-assigned movement identifier; increases with insertion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(pub i64);

impl fmt::Display for MovementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Replenishment,
    Withdrawal,
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementKind::Replenishment => write!(f, "replenishment"),
            MovementKind::Withdrawal => write!(f, "withdrawal"),
        }
    }
}

/// An immutable ledger entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub id: MovementId,
    pub component_id: ComponentId,
    /// Signed delta: positive replenishes, negative withdraws
    pub quantity: i64,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl StockMovement {
    pub fn kind(&self) -> MovementKind {
        if self.quantity > 0 {
            MovementKind::Replenishment
        } else {
            MovementKind::Withdrawal
        }
    }

    /// Number of units moved, regardless of direction
    pub fn units(&self) -> i64 {
        self.quantity.abs()
    }

    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("movement_id".into(), Value::from(self.id.0));
        record.insert("component_id".into(), Value::from(self.component_id.0));
        record.insert("kind".into(), Value::from(self.kind().to_string()));
        record.insert("quantity".into(), Value::from(self.quantity));
        record.insert("movement_date".into(), Value::from(encode_date(&self.date)));
        record.insert("note".into(), Value::from(self.note.clone()));
        record
    }
}

/// A movement to be recorded, as submitted on a stock form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRequest {
    pub component_id: ComponentId,
    /// Units moved; the direction comes from the operation
    pub quantity: i64,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl MovementRequest {
    /// Fields: `component_id`, `quantity`, `movement_date` (`YYYY-MM-DD`)
    /// and an optional `note`
    pub fn from_record(record: &Record) -> Result<Self> {
        let component_id = integer_field(record, "component_id")?;
        let quantity = integer_field(record, "quantity")?;
        let date = match optional_text(record, "movement_date")? {
            Some(text) => decode_date(&text)?,
            None => {
                return Err(DateFormatError::Missing {
                    column: "movement_date".to_string(),
                }
                .into())
            }
        };

        Ok(Self {
            component_id: ComponentId(component_id),
            quantity,
            date,
            note: optional_text(record, "note")?,
        })
    }
}

fn integer_field(record: &Record, field: &str) -> Result<i64> {
    match record.get(field) {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| InventoryError::invalid_record(field, "expected an integer")),
        Some(Value::String(text)) => text
            .trim()
            .parse()
            .map_err(|_| InventoryError::invalid_record(field, "expected an integer")),
        None | Some(Value::Null) => Err(InventoryError::invalid_record(field, "is required")),
        Some(other) => Err(InventoryError::invalid_record(
            field,
            format!("expected an integer, got {}", other),
        )),
    }
}
