//! Warehouse: inventory data layer for electronic components
//!
//! A component catalog keyed by part number and manufacturer, an
//! append-only stock ledger, and SI-prefixed engineering values for
//! component ratings, persisted in an embedded SQLite store.

pub mod cli;
pub mod core;
pub mod entities;
pub mod error;
pub mod store;

pub use error::{InventoryError, Result};
pub use store::DatabaseController;
