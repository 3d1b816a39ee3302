//! Database schema initialization and introspection

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{InventoryError, Result};

/// Current schema version. Stores written by a newer version are refused.
pub const SCHEMA_VERSION: i32 = 1;

/// Component catalog table
pub const STOCK_TABLE: &str = "stock";

/// Stock movement ledger table
pub const MOVEMENTS_TABLE: &str = "movements";

/// Columns holding ISO 8601 calendar dates
pub const DATE_COLUMNS: &[&str] = &["movement_date"];

/// Create tables on first open and check the stored schema version
pub(super) fn init_schema(conn: &Connection, path: &Path) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );

        -- Component catalog; ratings are stored in base units
        -- except capacitance, which is kept in microfarads
        CREATE TABLE IF NOT EXISTS stock (
            component_id INTEGER PRIMARY KEY AUTOINCREMENT,
            component_type TEXT NOT NULL,
            part_number TEXT NOT NULL,
            manufacturer TEXT NOT NULL,
            package_code TEXT,
            voltage_rating REAL,
            current_rating REAL,
            power_rating REAL,
            resistance_rating REAL,
            inductance_rating REAL,
            capacitance_rating REAL,
            frequency_rating REAL,
            tolerance_rating REAL,
            comments TEXT,
            UNIQUE (part_number, manufacturer)
        );
        CREATE INDEX IF NOT EXISTS idx_stock_component_type ON stock(component_type);
        CREATE INDEX IF NOT EXISTS idx_stock_manufacturer ON stock(manufacturer);

        -- Append-only ledger: positive quantity replenishes, negative withdraws
        CREATE TABLE IF NOT EXISTS movements (
            movement_id INTEGER PRIMARY KEY AUTOINCREMENT,
            component_id INTEGER NOT NULL REFERENCES stock(component_id),
            quantity INTEGER NOT NULL CHECK (quantity <> 0),
            movement_date TEXT NOT NULL,
            note TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_movements_component
            ON movements(component_id, movement_date, movement_id);
        "#,
    )
    .map_err(|e| unavailable(path, e.to_string()))?;

    let stored: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .map_err(|e| unavailable(path, e.to_string()))?;

    match stored {
        None => {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(|e| unavailable(path, e.to_string()))?;
        }
        Some(version) if version > SCHEMA_VERSION => {
            return Err(unavailable(
                path,
                format!(
                    "schema version {} is newer than supported version {}",
                    version, SCHEMA_VERSION
                ),
            ));
        }
        Some(_) => {}
    }

    Ok(())
}

fn unavailable(path: &Path, reason: String) -> InventoryError {
    InventoryError::StoreUnavailable {
        path: path.to_path_buf(),
        reason,
    }
}

/// Whether `column` of `table` accepts NULL
pub(super) fn is_nullable_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let info: Option<(bool, i64)> = conn
        .query_row(
            r#"SELECT "notnull", pk FROM pragma_table_info(?1) WHERE name = ?2"#,
            params![table, column],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match info {
        Some((not_null, pk)) => Ok(!not_null && pk == 0),
        None => Err(InventoryError::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open(path: &Path) -> Connection {
        let conn = Connection::open(path).unwrap();
        init_schema(&conn, path).unwrap();
        conn
    }

    #[test]
    fn test_init_is_idempotent() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("inventory.db");
        let conn = open(&path);
        init_schema(&conn, &path).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("inventory.db");
        let conn = open(&path);
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION + 1],
        )
        .unwrap();

        let err = init_schema(&conn, &path).unwrap_err();
        assert!(matches!(err, InventoryError::StoreUnavailable { .. }));
    }

    #[test]
    fn test_nullable_columns() {
        let tmp = tempdir().unwrap();
        let conn = open(&tmp.path().join("inventory.db"));

        for column in [
            "voltage_rating",
            "current_rating",
            "power_rating",
            "resistance_rating",
            "inductance_rating",
            "capacitance_rating",
            "frequency_rating",
            "tolerance_rating",
            "package_code",
            "comments",
        ] {
            assert!(is_nullable_column(&conn, STOCK_TABLE, column).unwrap(), "{column}");
        }
        for column in ["component_id", "component_type", "part_number", "manufacturer"] {
            assert!(!is_nullable_column(&conn, STOCK_TABLE, column).unwrap(), "{column}");
        }
        assert!(!is_nullable_column(&conn, MOVEMENTS_TABLE, "movement_date").unwrap());
        assert!(is_nullable_column(&conn, MOVEMENTS_TABLE, "note").unwrap());
    }

    #[test]
    fn test_unknown_column() {
        let tmp = tempdir().unwrap();
        let conn = open(&tmp.path().join("inventory.db"));
        assert!(matches!(
            is_nullable_column(&conn, STOCK_TABLE, "colour"),
            Err(InventoryError::UnknownColumn { .. })
        ));
        assert!(matches!(
            is_nullable_column(&conn, "no_such_table", "comments"),
            Err(InventoryError::UnknownColumn { .. })
        ));
    }
}
