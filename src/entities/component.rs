//! Component entity type - catalogued electronic parts and their ratings

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::core::rating::RatingKind;
use crate::core::value::EngineeringValue;
use crate::entities::{optional_text, required_text, Record};
use crate::error::{InventoryError, Result};

/// Store-assigned component identifier, stable after first insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub i64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ratings of a component, keyed by kind. Absent keys are unrated.
pub type Ratings = BTreeMap<RatingKind, EngineeringValue>;

/// Natural identity of a component: part number plus manufacturer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentIdentity {
    pub part_number: String,
    pub manufacturer: String,
}

impl ComponentIdentity {
    pub fn new(part_number: impl Into<String>, manufacturer: impl Into<String>) -> Self {
        Self {
            part_number: part_number.into(),
            manufacturer: manufacturer.into(),
        }
    }
}

impl fmt::Display for ComponentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.part_number, self.manufacturer)
    }
}

/// A component that has not been registered yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewComponent {
    pub component_type: String,
    pub part_number: String,
    pub manufacturer: String,
    pub package_code: Option<String>,
    pub comments: Option<String>,
    pub ratings: Ratings,
}

impl NewComponent {
    pub fn new(
        component_type: impl Into<String>,
        part_number: impl Into<String>,
        manufacturer: impl Into<String>,
    ) -> Self {
        Self {
            component_type: component_type.into(),
            part_number: part_number.into(),
            manufacturer: manufacturer.into(),
            package_code: None,
            comments: None,
            ratings: Ratings::new(),
        }
    }

    pub fn with_package_code(mut self, package_code: impl Into<String>) -> Self {
        self.package_code = Some(package_code.into());
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    /// Add a rating, keyed by the value's own kind
    pub fn with_rating(mut self, value: EngineeringValue) -> Self {
        self.ratings.insert(value.kind(), value);
        self
    }

    pub fn identity(&self) -> ComponentIdentity {
        ComponentIdentity::new(&self.part_number, &self.manufacturer)
    }

    /// Reject blank identity or type fields
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("component_type", &self.component_type),
            ("part_number", &self.part_number),
            ("manufacturer", &self.manufacturer),
        ] {
            if value.trim().is_empty() {
                return Err(InventoryError::invalid_record(field, "must not be empty"));
            }
        }
        Ok(())
    }

    /// Build from a registration form record
    ///
    /// Rating fields accept prefixed strings (`"4.7kΩ"`) or plain numbers in
    /// the column's storage unit. Empty strings and nulls mean "not rated".
    pub fn from_record(record: &Record) -> Result<Self> {
        let component = Self {
            component_type: required_text(record, "component_type")?,
            part_number: required_text(record, "part_number")?,
            manufacturer: required_text(record, "manufacturer")?,
            package_code: optional_text(record, "package_code")?,
            comments: optional_text(record, "comments")?,
            ratings: ratings_from_record(record)?,
        };
        component.validate()?;
        Ok(component)
    }
}

/// In-place changes to a registered component.
///
/// Identity and type are immutable. An untouched field (`None`, or a rating
/// kind missing from the map) keeps its stored value; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentAmendment {
    pub package_code: Option<Option<String>>,
    pub comments: Option<Option<String>>,
    pub ratings: BTreeMap<RatingKind, Option<EngineeringValue>>,
}

impl ComponentAmendment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package_code(mut self, package_code: Option<String>) -> Self {
        self.package_code = Some(package_code);
        self
    }

    pub fn with_comments(mut self, comments: Option<String>) -> Self {
        self.comments = Some(comments);
        self
    }

    pub fn with_rating(mut self, value: EngineeringValue) -> Self {
        self.ratings.insert(value.kind(), Some(value));
        self
    }

    pub fn clear_rating(mut self, kind: RatingKind) -> Self {
        self.ratings.insert(kind, None);
        self
    }

    /// True when no field is touched
    pub fn is_empty(&self) -> bool {
        self.package_code.is_none() && self.comments.is_none() && self.ratings.is_empty()
    }

    /// Only keys present in the record are touched; `null` or `""` clears
    pub fn from_record(record: &Record) -> Result<Self> {
        let touched_text = |field: &str| -> Result<Option<Option<String>>> {
            if record.contains_key(field) {
                optional_text(record, field).map(Some)
            } else {
                Ok(None)
            }
        };

        let mut ratings = BTreeMap::new();
        for kind in RatingKind::all() {
            if let Some(value) = rating_field(record, *kind)? {
                ratings.insert(*kind, value);
            }
        }

        Ok(Self {
            package_code: touched_text("package_code")?,
            comments: touched_text("comments")?,
            ratings,
        })
    }
}

/// A registered component as read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRecord {
    pub id: ComponentId,
    pub component_type: String,
    pub part_number: String,
    pub manufacturer: String,
    pub package_code: Option<String>,
    pub comments: Option<String>,
    pub ratings: Ratings,
    /// Balance derived from the ledger at read time, never stored
    pub stocked_quantity: i64,
}

impl ComponentRecord {
    pub fn identity(&self) -> ComponentIdentity {
        ComponentIdentity::new(&self.part_number, &self.manufacturer)
    }

    pub fn rating(&self, kind: RatingKind) -> Option<&EngineeringValue> {
        self.ratings.get(&kind)
    }

    /// Boundary representation: column name to value, ratings as prefixed strings
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("component_id".into(), Value::from(self.id.0));
        record.insert("component_type".into(), Value::from(self.component_type.clone()));
        record.insert("part_number".into(), Value::from(self.part_number.clone()));
        record.insert("manufacturer".into(), Value::from(self.manufacturer.clone()));
        record.insert("package_code".into(), Value::from(self.package_code.clone()));
        record.insert("comments".into(), Value::from(self.comments.clone()));
        for kind in RatingKind::all() {
            let value = self
                .rating(*kind)
                .map(|v| Value::from(v.to_prefixed_string()))
                .unwrap_or(Value::Null);
            record.insert(kind.column().into(), value);
        }
        record.insert("stock".into(), Value::from(self.stocked_quantity));
        record
    }
}

fn ratings_from_record(record: &Record) -> Result<Ratings> {
    let mut ratings = Ratings::new();
    for kind in RatingKind::all() {
        if let Some(Some(value)) = rating_field(record, *kind)? {
            ratings.insert(*kind, value);
        }
    }
    Ok(ratings)
}

/// `None` when the column is absent, `Some(None)` for null or blank
fn rating_field(record: &Record, kind: RatingKind) -> Result<Option<Option<EngineeringValue>>> {
    let value = match record.get(kind.column()) {
        None => return Ok(None),
        Some(Value::Null) => None,
        Some(Value::String(text)) if text.trim().is_empty() => None,
        Some(Value::String(text)) => Some(EngineeringValue::from_prefixed_str(text, kind)?),
        Some(Value::Number(number)) => {
            let stored = number.as_f64().ok_or_else(|| {
                InventoryError::invalid_record(kind.column(), "not a finite number")
            })?;
            Some(kind.value_from_column(stored)?)
        }
        Some(other) => {
            return Err(InventoryError::invalid_record(
                kind.column(),
                format!("expected a rating, got {}", other),
            ))
        }
    };
    Ok(Some(value))
}
