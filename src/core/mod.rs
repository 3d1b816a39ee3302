//! Core module - engineering values, rating kinds, dates and configuration

pub mod config;
pub mod dates;
pub mod logging;
pub mod rating;
pub mod value;

pub use config::{Config, ConfigError};
pub use dates::{DateFormatError, DATE_FORMAT};
pub use rating::RatingKind;
pub use value::{EngineeringValue, SiPrefix, ValueError};
