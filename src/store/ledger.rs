//! Append-only stock movement ledger
//!
//! A component's balance is never stored. It is the sum of its movement
//! deltas, recomputed inside the same transaction that appends a new
//! movement, so a withdrawal is checked against the committed balance
//! while holding the writer lock.

use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::Store;
use crate::core::dates::{decode_date, encode_date};
use crate::entities::{ComponentId, MovementId, MovementKind, StockMovement};
use crate::error::{InventoryError, Result};

/// Outcome of an appended movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub movement_id: MovementId,
    pub component_id: ComponentId,
    /// Balance after the movement was committed
    pub balance: i64,
}

/// Stock movements keyed by component
pub struct Ledger {
    store: Arc<Store>,
}

impl Ledger {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Sum of all recorded deltas; zero when nothing was ever moved
    pub fn current_balance(&self, component_id: ComponentId) -> Result<i64> {
        let balance = self.store.read(|conn| {
            require_component(conn, component_id)?;
            balance_of(conn, component_id)
        })?;
        debug!(%component_id, balance, "balance");
        Ok(balance)
    }

    pub fn record_replenishment(
        &self,
        component_id: ComponentId,
        quantity: i64,
        date: NaiveDate,
        note: Option<&str>,
    ) -> Result<MovementId> {
        self.replenish(component_id, quantity, date, note)
            .map(|posting| posting.movement_id)
    }

    /// Fails with `InsufficientStock`, leaving the ledger untouched, when
    /// the withdrawal would take the balance below zero
    pub fn record_withdrawal(
        &self,
        component_id: ComponentId,
        quantity: i64,
        date: NaiveDate,
        note: Option<&str>,
    ) -> Result<MovementId> {
        self.withdraw(component_id, quantity, date, note)
            .map(|posting| posting.movement_id)
    }

    /// Append a replenishment and report the resulting balance
    pub fn replenish(
        &self,
        component_id: ComponentId,
        quantity: i64,
        date: NaiveDate,
        note: Option<&str>,
    ) -> Result<Posting> {
        self.post(component_id, MovementKind::Replenishment, quantity, date, note)
    }

    /// Append a withdrawal and report the resulting balance
    pub fn withdraw(
        &self,
        component_id: ComponentId,
        quantity: i64,
        date: NaiveDate,
        note: Option<&str>,
    ) -> Result<Posting> {
        self.post(component_id, MovementKind::Withdrawal, quantity, date, note)
    }

    fn post(
        &self,
        component_id: ComponentId,
        kind: MovementKind,
        quantity: i64,
        date: NaiveDate,
        note: Option<&str>,
    ) -> Result<Posting> {
        if quantity <= 0 {
            warn!(%component_id, %kind, quantity, "rejected movement");
            return Err(InventoryError::InvalidQuantity(quantity));
        }

        let result = self.store.write(|tx| {
            require_component(tx, component_id)?;
            let available = balance_of(tx, component_id)?;

            let delta = match kind {
                MovementKind::Replenishment => quantity,
                MovementKind::Withdrawal => {
                    if available < quantity {
                        return Err(InventoryError::InsufficientStock {
                            requested: quantity,
                            available,
                        });
                    }
                    -quantity
                }
            };
            let balance = available
                .checked_add(delta)
                .ok_or(InventoryError::InvalidQuantity(quantity))?;

            let note = note.map(str::trim).filter(|n| !n.is_empty());
            tx.execute(
                "INSERT INTO movements (component_id, quantity, movement_date, note) VALUES (?1, ?2, ?3, ?4)",
                params![component_id.0, delta, encode_date(&date), note],
            )?;

            Ok(Posting {
                movement_id: MovementId(tx.last_insert_rowid()),
                component_id,
                balance,
            })
        });

        match result {
            Ok(posting) => {
                info!(
                    %component_id,
                    %kind,
                    quantity,
                    date = %encode_date(&date),
                    movement_id = %posting.movement_id,
                    balance = posting.balance,
                    "recorded movement"
                );
                Ok(posting)
            }
            Err(e) => {
                warn!(%component_id, %kind, quantity, error = %e, "movement rolled back");
                Err(e)
            }
        }
    }

    /// Every movement, ordered by date then insertion order
    pub fn movements_for(&self, component_id: ComponentId) -> Result<Vec<StockMovement>> {
        self.query_movements(component_id, None)
    }

    pub fn replenishments_for(&self, component_id: ComponentId) -> Result<Vec<StockMovement>> {
        self.query_movements(component_id, Some(MovementKind::Replenishment))
    }

    pub fn withdrawals_for(&self, component_id: ComponentId) -> Result<Vec<StockMovement>> {
        self.query_movements(component_id, Some(MovementKind::Withdrawal))
    }

    fn query_movements(
        &self,
        component_id: ComponentId,
        kind: Option<MovementKind>,
    ) -> Result<Vec<StockMovement>> {
        let filter = match kind {
            None => "",
            Some(MovementKind::Replenishment) => " AND quantity > 0",
            Some(MovementKind::Withdrawal) => " AND quantity < 0",
        };
        let sql = format!(
            "SELECT movement_id, quantity, movement_date, note FROM movements \
             WHERE component_id = ?1{} ORDER BY movement_date, movement_id",
            filter
        );

        let rows = self.store.read(|conn| {
            require_component(conn, component_id)?;
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt
                .query_map(params![component_id.0], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        let movements = rows
            .into_iter()
            .map(|(id, quantity, date, note)| {
                Ok(StockMovement {
                    id: MovementId(id),
                    component_id,
                    quantity,
                    date: decode_date(&date)?,
                    note,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(%component_id, ?kind, count = movements.len(), "movements");
        Ok(movements)
    }
}

fn balance_of(conn: &Connection, component_id: ComponentId) -> Result<i64> {
    let balance = conn
        .prepare_cached("SELECT COALESCE(SUM(quantity), 0) FROM movements WHERE component_id = ?1")?
        .query_row(params![component_id.0], |row| row.get(0))?;
    Ok(balance)
}

fn require_component(conn: &Connection, component_id: ComponentId) -> Result<()> {
    let found: Option<i64> = conn
        .prepare_cached("SELECT component_id FROM stock WHERE component_id = ?1")?
        .query_row(params![component_id.0], |row| row.get(0))
        .optional()?;
    found
        .map(|_| ())
        .ok_or(InventoryError::ComponentNotFound(component_id))
}
