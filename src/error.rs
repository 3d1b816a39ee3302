//! Error taxonomy for the inventory data layer
//!
//! Every operation returns an explicit `Result`. Write failures are rolled
//! back by the store before the error reaches the caller.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::dates::DateFormatError;
use crate::core::value::ValueError;
use crate::entities::ComponentId;

/// Result alias used throughout the store layer
pub type Result<T, E = InventoryError> = std::result::Result<T, E>;

/// Errors surfaced by the catalog, the ledger and the database controller
#[derive(Debug, Error, Diagnostic)]
pub enum InventoryError {
    #[error("no component '{part_number}' from {manufacturer}")]
    #[diagnostic(code(warehouse::not_found))]
    NotFound {
        part_number: String,
        manufacturer: String,
    },

    #[error("no component with id {0}")]
    #[diagnostic(code(warehouse::not_found))]
    ComponentNotFound(ComponentId),

    #[error("component '{part_number}' from {manufacturer} is already registered")]
    #[diagnostic(
        code(warehouse::duplicate_identity),
        help("part number and manufacturer together must be unique")
    )]
    DuplicateIdentity {
        part_number: String,
        manufacturer: String,
    },

    #[error("invalid quantity {0}: movements must move at least one unit")]
    #[diagnostic(code(warehouse::invalid_quantity))]
    InvalidQuantity(i64),

    #[error("insufficient stock: requested {requested}, available {available}")]
    #[diagnostic(
        code(warehouse::insufficient_stock),
        help("a withdrawal can never take the balance below zero")
    )]
    InsufficientStock { requested: i64, available: i64 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    DateFormat(#[from] DateFormatError),

    #[error("invalid field '{field}': {reason}")]
    #[diagnostic(code(warehouse::invalid_record))]
    InvalidRecord { field: String, reason: String },

    #[error("unknown column '{column}' in table '{table}'")]
    #[diagnostic(code(warehouse::unknown_column))]
    UnknownColumn { table: String, column: String },

    #[error("store unavailable at {}: {reason}", path.display())]
    #[diagnostic(code(warehouse::store_unavailable))]
    StoreUnavailable { path: PathBuf, reason: String },

    #[error("the store is not open")]
    #[diagnostic(
        code(warehouse::not_open),
        help("open the database before issuing queries")
    )]
    NotOpen,

    #[error("store error: {0}")]
    #[diagnostic(code(warehouse::store))]
    Store(#[from] rusqlite::Error),
}

impl InventoryError {
    pub(crate) fn invalid_record(field: &str, reason: impl Into<String>) -> Self {
        InventoryError::InvalidRecord {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// True for failures caused by caller input rather than by the store
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            InventoryError::StoreUnavailable { .. }
                | InventoryError::NotOpen
                | InventoryError::Store(_)
        )
    }
}
