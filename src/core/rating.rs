//! Rating kinds - the electrical ratings a component can carry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::value::{EngineeringValue, SiPrefix, ValueError};

/// A component rating, each bound to a fixed unit
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RatingKind {
    Voltage,
    Current,
    Power,
    Resistance,
    Inductance,
    Capacitance,
    Frequency,
    Tolerance,
}

impl RatingKind {
    /// All rating kinds, in column order
    pub fn all() -> &'static [RatingKind] {
        &[
            RatingKind::Voltage,
            RatingKind::Current,
            RatingKind::Power,
            RatingKind::Resistance,
            RatingKind::Inductance,
            RatingKind::Capacitance,
            RatingKind::Frequency,
            RatingKind::Tolerance,
        ]
    }

    /// Display names of every rating kind
    pub fn names() -> Vec<&'static str> {
        Self::all().iter().map(|k| k.name()).collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            RatingKind::Voltage => "Voltage",
            RatingKind::Current => "Current",
            RatingKind::Power => "Power",
            RatingKind::Resistance => "Resistance",
            RatingKind::Inductance => "Inductance",
            RatingKind::Capacitance => "Capacitance",
            RatingKind::Frequency => "Frequency",
            RatingKind::Tolerance => "Tolerance",
        }
    }

    pub fn unit_symbol(&self) -> &'static str {
        match self {
            RatingKind::Voltage => "V",
            RatingKind::Current => "A",
            RatingKind::Power => "W",
            RatingKind::Resistance => "Ω",
            RatingKind::Inductance => "H",
            RatingKind::Capacitance => "F",
            RatingKind::Frequency => "Hz",
            RatingKind::Tolerance => "%",
        }
    }

    pub fn unit_name(&self) -> &'static str {
        match self {
            RatingKind::Voltage => "volt",
            RatingKind::Current => "ampere",
            RatingKind::Power => "watt",
            RatingKind::Resistance => "ohm",
            RatingKind::Inductance => "henry",
            RatingKind::Capacitance => "farad",
            RatingKind::Frequency => "hertz",
            RatingKind::Tolerance => "percent",
        }
    }

    /// Column holding this rating in the stock table
    pub fn column(&self) -> &'static str {
        match self {
            RatingKind::Voltage => "voltage_rating",
            RatingKind::Current => "current_rating",
            RatingKind::Power => "power_rating",
            RatingKind::Resistance => "resistance_rating",
            RatingKind::Inductance => "inductance_rating",
            RatingKind::Capacitance => "capacitance_rating",
            RatingKind::Frequency => "frequency_rating",
            RatingKind::Tolerance => "tolerance_rating",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.column() == column)
    }

    /// Tolerance is a plain percentage; everything else takes SI prefixes
    pub fn is_prefixable(&self) -> bool {
        !matches!(self, RatingKind::Tolerance)
    }

    /// Power of ten of the unit stored in the rating column.
    /// Capacitance is kept in microfarads.
    pub fn storage_exponent(&self) -> i32 {
        match self {
            RatingKind::Capacitance => -6,
            _ => 0,
        }
    }

    /// Every prefixed unit this kind accepts, smallest first
    pub fn prefixed_unit_symbols(&self) -> Vec<String> {
        if !self.is_prefixable() {
            return vec![self.unit_symbol().to_string()];
        }
        SiPrefix::all()
            .iter()
            .map(|p| format!("{}{}", p.symbol(), self.unit_symbol()))
            .collect()
    }

    /// Decode a stored column value
    pub fn value_from_column(&self, stored: f64) -> Result<EngineeringValue, ValueError> {
        let base = if self.storage_exponent() >= 0 {
            stored * 10f64.powi(self.storage_exponent())
        } else {
            stored / 10f64.powi(-self.storage_exponent())
        };
        EngineeringValue::from_value(base, *self)
    }

    /// Encode a value for its rating column
    pub fn column_value(&self, value: &EngineeringValue) -> f64 {
        value.value_in(self.storage_exponent())
    }

    /// Convert a base-unit quantity to the column's unit
    pub fn base_to_column(&self, base: f64) -> f64 {
        let exponent = self.storage_exponent();
        if exponent >= 0 {
            base / 10f64.powi(exponent)
        } else {
            base * 10f64.powi(-exponent)
        }
    }
}

impl fmt::Display for RatingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RatingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|k| k.name().to_lowercase() == lower || k.column() == lower)
            .ok_or_else(|| {
                format!(
                    "Invalid rating: {}. Use one of {}",
                    s,
                    Self::names().join(", ").to_lowercase()
                )
            })
    }
}
