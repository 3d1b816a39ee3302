//! CLI command implementations

pub mod find;
pub mod history;
pub mod list;
pub mod register;
pub mod search;
pub mod show;
pub mod stock;
