//! Component catalog queries
//!
//! Lookup, incremental search and type search over the `stock` table.
//! Every returned record carries the balance derived from the ledger in
//! the same read transaction.

use std::sync::Arc;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, info, warn};

use super::criteria::SearchCriteria;
use super::Store;
use crate::core::rating::RatingKind;
use crate::entities::{
    ComponentAmendment, ComponentId, ComponentIdentity, ComponentRecord, NewComponent, Ratings,
};
use crate::error::{InventoryError, Result};

/// Columns read for every component, in row order
const COMPONENT_SELECT: &str = r#"SELECT s.component_id, s.component_type, s.part_number,
       s.manufacturer, s.package_code, s.comments,
       s.voltage_rating, s.current_rating, s.power_rating, s.resistance_rating,
       s.inductance_rating, s.capacitance_rating, s.frequency_rating, s.tolerance_rating,
       COALESCE((SELECT SUM(m.quantity) FROM movements m
                 WHERE m.component_id = s.component_id), 0)
FROM stock s"#;

const ORDER_BY_IDENTITY: &str = " ORDER BY s.part_number COLLATE NOCASE, s.part_number, \
     s.manufacturer COLLATE NOCASE, s.manufacturer, s.component_id";

/// Raw row as stored, before ratings are decoded
struct ComponentRow {
    id: i64,
    component_type: String,
    part_number: String,
    manufacturer: String,
    package_code: Option<String>,
    comments: Option<String>,
    ratings: [Option<f64>; 8],
    stock: i64,
}

impl ComponentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let mut ratings = [None; 8];
        for (i, slot) in ratings.iter_mut().enumerate() {
            *slot = row.get(6 + i)?;
        }
        Ok(Self {
            id: row.get(0)?,
            component_type: row.get(1)?,
            part_number: row.get(2)?,
            manufacturer: row.get(3)?,
            package_code: row.get(4)?,
            comments: row.get(5)?,
            ratings,
            stock: row.get(14)?,
        })
    }

    fn into_record(self) -> Result<ComponentRecord> {
        let mut ratings = Ratings::new();
        for (kind, stored) in RatingKind::all().iter().zip(self.ratings) {
            if let Some(stored) = stored {
                ratings.insert(*kind, kind.value_from_column(stored)?);
            }
        }
        Ok(ComponentRecord {
            id: ComponentId(self.id),
            component_type: self.component_type,
            part_number: self.part_number,
            manufacturer: self.manufacturer,
            package_code: self.package_code,
            comments: self.comments,
            ratings,
            stocked_quantity: self.stock,
        })
    }
}

fn query_components(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<ComponentRecord>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt
        .query_map(params, ComponentRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(ComponentRow::into_record).collect()
}

fn component_by_id(conn: &Connection, id: ComponentId) -> Result<Option<ComponentRecord>> {
    let sql = format!("{} WHERE s.component_id = ?1", COMPONENT_SELECT);
    let row = conn
        .prepare_cached(&sql)?
        .query_row(params![id.0], ComponentRow::from_row)
        .optional()?;
    row.map(ComponentRow::into_record).transpose()
}

/// Escape LIKE wildcards so a typed prefix matches literally
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn rating_params(ratings: &Ratings) -> Vec<SqlValue> {
    RatingKind::all()
        .iter()
        .map(|kind| match ratings.get(kind) {
            Some(value) => SqlValue::Real(kind.column_value(value)),
            None => SqlValue::Null,
        })
        .collect()
}

fn optional_text(value: &Option<String>) -> SqlValue {
    match value {
        Some(text) => SqlValue::Text(text.clone()),
        None => SqlValue::Null,
    }
}

/// Catalog of registered components
pub struct Catalog {
    store: Arc<Store>,
}

impl Catalog {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Exact identity lookup. Without a manufacturer every manufacturer's
    /// part with that number is returned.
    pub fn lookup(
        &self,
        part_number: &str,
        manufacturer: Option<&str>,
    ) -> Result<Vec<ComponentRecord>> {
        let found = self.store.read(|conn| match manufacturer {
            Some(manufacturer) => query_components(
                conn,
                &format!(
                    "{} WHERE s.part_number = ?1 AND s.manufacturer = ?2{}",
                    COMPONENT_SELECT, ORDER_BY_IDENTITY
                ),
                params![part_number, manufacturer],
            ),
            None => query_components(
                conn,
                &format!(
                    "{} WHERE s.part_number = ?1{}",
                    COMPONENT_SELECT, ORDER_BY_IDENTITY
                ),
                params![part_number],
            ),
        })?;

        debug!(part_number, ?manufacturer, hits = found.len(), "lookup");
        if found.is_empty() {
            return Err(InventoryError::NotFound {
                part_number: part_number.to_string(),
                manufacturer: manufacturer.unwrap_or("any manufacturer").to_string(),
            });
        }
        Ok(found)
    }

    /// The single component with this identity
    pub fn record_for(&self, part_number: &str, manufacturer: &str) -> Result<ComponentRecord> {
        let mut found = self.lookup(part_number, Some(manufacturer))?;
        // The identity pair is unique, so an exact lookup yields one row
        Ok(found.remove(0))
    }

    pub fn component(&self, id: ComponentId) -> Result<ComponentRecord> {
        self.store
            .read(|conn| component_by_id(conn, id))?
            .ok_or(InventoryError::ComponentNotFound(id))
    }

    pub fn knows_part_number(&self, part_number: &str, manufacturer: &str) -> Result<bool> {
        self.store.read(|conn| {
            let known: Option<i64> = conn
                .prepare_cached(
                    "SELECT 1 FROM stock WHERE part_number = ?1 AND manufacturer = ?2",
                )?
                .query_row(params![part_number, manufacturer], |row| row.get(0))
                .optional()?;
            Ok(known.is_some())
        })
    }

    /// Case-insensitive part number prefix search for type-ahead.
    ///
    /// Results are ordered by part number, then manufacturer.
    pub fn incremental_search(
        &self,
        prefix: &str,
        manufacturer: Option<&str>,
    ) -> Result<Vec<ComponentRecord>> {
        let pattern = like_prefix(prefix);
        let found = self.store.read(|conn| match manufacturer {
            Some(manufacturer) => query_components(
                conn,
                &format!(
                    r"{} WHERE s.part_number LIKE ?1 ESCAPE '\' AND s.manufacturer = ?2{}",
                    COMPONENT_SELECT, ORDER_BY_IDENTITY
                ),
                params![pattern, manufacturer],
            ),
            None => query_components(
                conn,
                &format!(
                    r"{} WHERE s.part_number LIKE ?1 ESCAPE '\'{}",
                    COMPONENT_SELECT, ORDER_BY_IDENTITY
                ),
                params![pattern],
            ),
        })?;
        debug!(prefix, ?manufacturer, hits = found.len(), "incremental search");
        Ok(found)
    }

    /// Components of a type matching every supplied criterion
    pub fn search_by_type(
        &self,
        component_type: &str,
        criteria: Option<&SearchCriteria>,
    ) -> Result<Vec<ComponentRecord>> {
        let mut sql = format!("{} WHERE s.component_type = ?", COMPONENT_SELECT);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(component_type.to_string())];

        if let Some(criteria) = criteria {
            if let Some(ref package_code) = criteria.package_code {
                sql.push_str(" AND s.package_code = ?");
                params_vec.push(Box::new(package_code.clone()));
            }
            if let Some(ref manufacturer) = criteria.manufacturer {
                sql.push_str(" AND s.manufacturer = ?");
                params_vec.push(Box::new(manufacturer.clone()));
            }
            for (kind, predicate) in &criteria.ratings {
                let (condition, bounds) = predicate.sql_condition(*kind);
                sql.push_str(" AND ");
                sql.push_str(&condition);
                for bound in bounds {
                    params_vec.push(Box::new(bound));
                }
            }
        }
        sql.push_str(ORDER_BY_IDENTITY);

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let found = self
            .store
            .read(|conn| query_components(conn, &sql, params_refs.as_slice()))?;
        debug!(component_type, hits = found.len(), "type search");
        Ok(found)
    }

    /// Register a new component and return its store-assigned id
    pub fn register(&self, component: &NewComponent) -> Result<ComponentId> {
        component.validate()?;
        let identity = component.identity();

        let result = self.store.write(|tx| {
            if exists(tx, &identity)? {
                return Err(duplicate(&identity));
            }

            let mut values = vec![
                SqlValue::Text(component.component_type.clone()),
                SqlValue::Text(component.part_number.clone()),
                SqlValue::Text(component.manufacturer.clone()),
                optional_text(&component.package_code),
                optional_text(&component.comments),
            ];
            values.extend(rating_params(&component.ratings));

            tx.execute(
                r#"INSERT INTO stock (component_type, part_number, manufacturer, package_code,
                       comments, voltage_rating, current_rating, power_rating, resistance_rating,
                       inductance_rating, capacitance_rating, frequency_rating, tolerance_rating)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"#,
                params_from_iter(values),
            )
            .map_err(|e| map_constraint(e, &identity))?;
            Ok(ComponentId(tx.last_insert_rowid()))
        });

        match result {
            Ok(id) => {
                info!(%id, identity = %identity, "registered component");
                Ok(id)
            }
            Err(e) => {
                warn!(identity = %identity, error = %e, "registration rejected");
                Err(e)
            }
        }
    }

    /// Update the touched fields of a registered component; untouched
    /// columns keep their stored values
    pub fn amend(&self, id: ComponentId, amendment: &ComponentAmendment) -> Result<()> {
        let mut assignments = Vec::new();
        let mut values = Vec::new();
        if let Some(package_code) = &amendment.package_code {
            assignments.push("package_code = ?".to_string());
            values.push(optional_text(package_code));
        }
        if let Some(comments) = &amendment.comments {
            assignments.push("comments = ?".to_string());
            values.push(optional_text(comments));
        }
        for (kind, rating) in &amendment.ratings {
            assignments.push(format!("{} = ?", kind.column()));
            values.push(match rating {
                Some(value) => SqlValue::Real(kind.column_value(value)),
                None => SqlValue::Null,
            });
        }
        values.push(SqlValue::Integer(id.0));

        let result = self.store.write(|tx| {
            let found = if assignments.is_empty() {
                tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM stock WHERE component_id = ?1)",
                    params![id.0],
                    |row| row.get::<_, bool>(0),
                )?
            } else {
                let sql = format!(
                    "UPDATE stock SET {} WHERE component_id = ?",
                    assignments.join(", ")
                );
                tx.execute(&sql, params_from_iter(values.iter()))? > 0
            };
            if !found {
                return Err(InventoryError::ComponentNotFound(id));
            }
            Ok(())
        });

        match result {
            Ok(()) => {
                info!(%id, "amended component");
                Ok(())
            }
            Err(e) => {
                warn!(%id, error = %e, "amendment rejected");
                Err(e)
            }
        }
    }

    pub fn distinct_component_types(&self) -> Result<Vec<String>> {
        self.distinct("component_type")
    }

    pub fn distinct_manufacturers(&self) -> Result<Vec<String>> {
        self.distinct("manufacturer")
    }

    pub fn distinct_package_codes(&self) -> Result<Vec<String>> {
        self.distinct("package_code")
    }

    /// Sorted distinct non-null values of a catalog column
    fn distinct(&self, column: &'static str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {col} FROM stock WHERE {col} IS NOT NULL ORDER BY {col}",
            col = column
        );
        self.store.read(|conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            let values = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(values)
        })
    }
}

fn exists(conn: &Connection, identity: &ComponentIdentity) -> Result<bool> {
    let found: Option<i64> = conn
        .prepare_cached("SELECT component_id FROM stock WHERE part_number = ?1 AND manufacturer = ?2")?
        .query_row(
            params![identity.part_number, identity.manufacturer],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn duplicate(identity: &ComponentIdentity) -> InventoryError {
    InventoryError::DuplicateIdentity {
        part_number: identity.part_number.clone(),
        manufacturer: identity.manufacturer.clone(),
    }
}

/// A UNIQUE failure on insert means the identity pair is taken
fn map_constraint(error: rusqlite::Error, identity: &ComponentIdentity) -> InventoryError {
    match error.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => duplicate(identity),
        _ => InventoryError::Store(error),
    }
}
