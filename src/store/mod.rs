//! SQLite-backed inventory store
//!
//! This module provides the persistent side of the data layer:
//! - [`Store`] owns the database handle and its open/closed lifecycle
//! - [`Catalog`] registers, looks up and searches components
//! - [`Ledger`] appends stock movements and derives balances
//! - [`DatabaseController`] is the single entry point tying them together
//!
//! Concurrency: one writer connection guarded by a mutex, plus a small set
//! of read-only connections reused across calls. The database runs in WAL
//! mode, so readers see either the state before or after a write
//! transaction, never a partial one.

mod catalog;
mod controller;
mod criteria;
mod events;
mod ledger;
mod schema;

pub use catalog::Catalog;
pub use controller::DatabaseController;
pub use criteria::{RatingPredicate, SearchCriteria};
pub use events::{EventBus, StoreEvent};
pub use ledger::{Ledger, Posting};
pub use schema::{DATE_COLUMNS, MOVEMENTS_TABLE, SCHEMA_VERSION, STOCK_TABLE};

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::error::{InventoryError, Result};

/// How long a statement waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle read-only connections kept for reuse
const MAX_IDLE_READERS: usize = 8;

/// Shared handle to the backing database
///
/// Cloned (via `Arc`) into the catalog and the ledger. Every operation
/// fails with [`InventoryError::NotOpen`] while the store is closed.
#[derive(Default)]
pub struct Store {
    backend: RwLock<Option<Arc<Backend>>>,
}

impl Store {
    /// Create a closed store
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or create) the database at `path`.
    ///
    /// An already open store is closed first.
    pub fn open(&self, path: &Path) -> Result<()> {
        let backend = Backend::open(path)?;
        let mut state = self.backend.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = state.replace(Arc::new(backend)) {
            info!(path = %previous.path.display(), "closed store");
        }
        info!(path = %path.display(), "opened store");
        Ok(())
    }

    /// Release the database. No-op when already closed.
    ///
    /// Calls already in flight finish on their own handle; the connections
    /// close when the last of them returns.
    pub fn close(&self) {
        let mut state = self.backend.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(backend) = state.take() {
            info!(path = %backend.path.display(), "closed store");
        }
    }

    pub fn is_open(&self) -> bool {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Path of the open database
    pub fn path(&self) -> Option<PathBuf> {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|b| b.path.clone())
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        self.backend().map(|_| ())
    }

    fn backend(&self) -> Result<Arc<Backend>> {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(InventoryError::NotOpen)
    }

    /// Run `f` inside a read transaction on a pooled read-only connection
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let backend = self.backend()?;
        let conn = backend.checkout()?;
        let result = read_transaction(&conn, f);
        backend.checkin(conn);
        result
    }

    /// Run `f` inside an immediate write transaction.
    ///
    /// Writers are serialized. If `f` fails, the transaction is rolled back
    /// before the error is returned.
    pub(crate) fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let backend = self.backend()?;
        let mut conn = backend.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// An open database: the writer plus idle readers
struct Backend {
    path: PathBuf,
    writer: Mutex<Connection>,
    readers: Mutex<Vec<Connection>>,
}

impl Backend {
    fn open(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| InventoryError::StoreUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        if path.as_os_str().is_empty() {
            return Err(unavailable("empty path".to_string()));
        }
        if path.is_dir() {
            return Err(unavailable("path is a directory".to_string()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| unavailable(e.to_string()))?;

        // Enable WAL mode so readers never see a half-applied write
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| unavailable(e.to_string()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| unavailable(e.to_string()))?;

        schema::init_schema(&conn, path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(conn),
            readers: Mutex::new(Vec::new()),
        })
    }

    /// Take an idle read-only connection, opening one if none is idle
    fn checkout(&self) -> Result<Connection> {
        let idle = self
            .readers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();

        if let Some(conn) = idle {
            return Ok(conn);
        }

        debug!(path = %self.path.display(), "opening read connection");
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Return a read connection to the idle set
    fn checkin(&self, conn: Connection) {
        let mut idle = self
            .readers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if idle.len() < MAX_IDLE_READERS {
            idle.push(conn);
        }
    }
}

fn read_transaction<T>(conn: &Connection, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    let tx = conn.unchecked_transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}
