//! Search criteria for component type searches
//!
//! All supplied criteria are ANDed. Rating bounds are expressed in the
//! kind's base unit (ohms, farads, ...).

use std::collections::BTreeMap;

use crate::core::rating::RatingKind;
use crate::core::value::{EngineeringValue, ValueError};

/// Relative slack when comparing stored floating-point ratings
const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Predicate over a single rating
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatingPredicate {
    /// Equal to the value, within floating-point tolerance
    Exact(f64),
    /// Inclusive range; an open side is unbounded
    Range { min: Option<f64>, max: Option<f64> },
}

impl RatingPredicate {
    pub fn exact(value: &EngineeringValue) -> Self {
        RatingPredicate::Exact(value.to_value())
    }

    /// Parse `4.7k`, `100..220`, `1k..` or `..50m`, with or without unit
    pub fn parse(text: &str, kind: RatingKind) -> Result<Self, ValueError> {
        let text = text.trim();
        let Some((low, high)) = text.split_once("..") else {
            return Ok(RatingPredicate::Exact(parse_bound(text, kind)?));
        };

        let min = optional_bound(low, kind)?;
        let max = optional_bound(high, kind)?;
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(ValueError::Parse {
                    input: text.to_string(),
                    reason: "range lower bound exceeds upper bound".to_string(),
                });
            }
        }
        Ok(RatingPredicate::Range { min, max })
    }

    /// SQL condition on the kind's column, with bound parameters in storage units
    pub(super) fn sql_condition(&self, kind: RatingKind) -> (String, Vec<f64>) {
        let column = format!("s.{}", kind.column());
        match *self {
            RatingPredicate::Exact(target) => {
                let stored = kind.base_to_column(target);
                (
                    format!("{} BETWEEN ? AND ?", column),
                    vec![stored - slack(stored), stored + slack(stored)],
                )
            }
            RatingPredicate::Range { min, max } => {
                let mut parts = vec![format!("{} IS NOT NULL", column)];
                let mut params = Vec::new();
                if let Some(min) = min {
                    let stored = kind.base_to_column(min);
                    parts.push(format!("{} >= ?", column));
                    params.push(stored - slack(stored));
                }
                if let Some(max) = max {
                    let stored = kind.base_to_column(max);
                    parts.push(format!("{} <= ?", column));
                    params.push(stored + slack(stored));
                }
                (parts.join(" AND "), params)
            }
        }
    }
}

fn slack(value: f64) -> f64 {
    value.abs() * RELATIVE_TOLERANCE
}

fn optional_bound(text: &str, kind: RatingKind) -> Result<Option<f64>, ValueError> {
    let text = text.trim();
    if text.is_empty() {
        Ok(None)
    } else {
        parse_bound(text, kind).map(Some)
    }
}

fn parse_bound(text: &str, kind: RatingKind) -> Result<f64, ValueError> {
    EngineeringValue::from_input(text, kind).map(|v| v.to_value())
}

/// Optional filters for a component type search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub ratings: BTreeMap<RatingKind, RatingPredicate>,
    pub package_code: Option<String>,
    pub manufacturer: Option<String>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rating(mut self, kind: RatingKind, predicate: RatingPredicate) -> Self {
        self.ratings.insert(kind, predicate);
        self
    }

    pub fn with_package_code(mut self, package_code: impl Into<String>) -> Self {
        self.package_code = Some(package_code.into());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty() && self.package_code.is_none() && self.manufacturer.is_none()
    }
}
