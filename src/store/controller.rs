//! The database controller: single entry point of the data layer
//!
//! Owns the store handle and its open/closed state, routes every catalog
//! and ledger operation through it, converts between entities and
//! boundary [`Record`]s, and notifies subscribers after each commit.

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

use chrono::NaiveDate;

use super::catalog::Catalog;
use super::criteria::SearchCriteria;
use super::events::{EventBus, StoreEvent};
use super::ledger::{Ledger, Posting};
use super::schema::{self, DATE_COLUMNS};
use super::Store;
use crate::core::dates;
use crate::entities::{
    ComponentAmendment, ComponentId, ComponentRecord, MovementId, MovementRequest, NewComponent,
    Record, StockMovement,
};
use crate::error::Result;

/// Open/closed front door to the catalog and the ledger.
///
/// All methods take `&self`; the controller can be shared across threads
/// behind an `Arc`.
pub struct DatabaseController {
    store: Arc<Store>,
    catalog: Catalog,
    ledger: Ledger,
    events: EventBus,
}

impl Default for DatabaseController {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseController {
    /// A closed controller
    pub fn new() -> Self {
        let store = Arc::new(Store::new());
        Self {
            catalog: Catalog::new(store.clone()),
            ledger: Ledger::new(store.clone()),
            store,
            events: EventBus::new(),
        }
    }

    /// Open (or create) the store at `path`
    pub fn open(&self, path: &Path) -> Result<()> {
        self.store.open(path)
    }

    /// Release the store. Idempotent.
    pub fn close(&self) {
        self.store.close()
    }

    pub fn is_open(&self) -> bool {
        self.store.is_open()
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.store.path()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Listen for committed changes
    pub fn subscribe(&self) -> mpsc::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ---- schema and date codec ----

    pub fn is_nullable_column(&self, column: &str, table: &str) -> Result<bool> {
        self.store
            .read(|conn| schema::is_nullable_column(conn, table, column))
    }

    /// Text date columns of the store
    pub fn date_columns(&self) -> Result<&'static [&'static str]> {
        self.store.ensure_open()?;
        Ok(DATE_COLUMNS)
    }

    /// Encode a date for `table.column`; a missing date is only accepted
    /// when the column is nullable
    pub fn encode_date(
        &self,
        table: &str,
        column: &str,
        date: Option<&NaiveDate>,
    ) -> Result<Option<String>> {
        let nullable = self.is_nullable_column(column, table)?;
        Ok(dates::encode_column(column, date, nullable)?)
    }

    pub fn decode_date(&self, text: &str) -> Result<NaiveDate> {
        self.store.ensure_open()?;
        Ok(dates::decode_date(text)?)
    }

    // ---- catalog ----

    pub fn distinct_component_types(&self) -> Result<Vec<String>> {
        self.catalog.distinct_component_types()
    }

    pub fn distinct_manufacturers(&self) -> Result<Vec<String>> {
        self.catalog.distinct_manufacturers()
    }

    pub fn distinct_package_codes(&self) -> Result<Vec<String>> {
        self.catalog.distinct_package_codes()
    }

    pub fn knows_part_number(&self, part_number: &str, manufacturer: &str) -> Result<bool> {
        self.catalog.knows_part_number(part_number, manufacturer)
    }

    pub fn lookup(
        &self,
        part_number: &str,
        manufacturer: Option<&str>,
    ) -> Result<Vec<ComponentRecord>> {
        self.catalog.lookup(part_number, manufacturer)
    }

    pub fn record_for(&self, part_number: &str, manufacturer: &str) -> Result<ComponentRecord> {
        self.catalog.record_for(part_number, manufacturer)
    }

    pub fn component(&self, id: ComponentId) -> Result<ComponentRecord> {
        self.catalog.component(id)
    }

    pub fn incremental_search(
        &self,
        prefix: &str,
        manufacturer: Option<&str>,
    ) -> Result<Vec<ComponentRecord>> {
        self.catalog.incremental_search(prefix, manufacturer)
    }

    pub fn search_by_type(
        &self,
        component_type: &str,
        criteria: Option<&SearchCriteria>,
    ) -> Result<Vec<ComponentRecord>> {
        self.catalog.search_by_type(component_type, criteria)
    }

    pub fn register(&self, component: &NewComponent) -> Result<ComponentId> {
        let id = self.catalog.register(component)?;
        self.events
            .publish(StoreEvent::ComponentRegistered { component_id: id });
        Ok(id)
    }

    pub fn amend_component(&self, id: ComponentId, amendment: &ComponentAmendment) -> Result<()> {
        self.catalog.amend(id, amendment)?;
        self.events
            .publish(StoreEvent::ComponentAmended { component_id: id });
        Ok(())
    }

    // ---- ledger ----

    pub fn current_balance(&self, id: ComponentId) -> Result<i64> {
        self.ledger.current_balance(id)
    }

    pub fn stock_for_component_id(&self, id: ComponentId) -> Result<i64> {
        self.ledger.current_balance(id)
    }

    /// Balance of the component with this identity
    pub fn stock_for(&self, part_number: &str, manufacturer: &str) -> Result<i64> {
        let component = self.catalog.record_for(part_number, manufacturer)?;
        self.ledger.current_balance(component.id)
    }

    pub fn record_replenishment(
        &self,
        id: ComponentId,
        quantity: i64,
        date: NaiveDate,
        note: Option<&str>,
    ) -> Result<MovementId> {
        let posting = self.ledger.replenish(id, quantity, date, note)?;
        Ok(self.announce(posting))
    }

    pub fn record_withdrawal(
        &self,
        id: ComponentId,
        quantity: i64,
        date: NaiveDate,
        note: Option<&str>,
    ) -> Result<MovementId> {
        let posting = self.ledger.withdraw(id, quantity, date, note)?;
        Ok(self.announce(posting))
    }

    pub fn movements_for(&self, id: ComponentId) -> Result<Vec<StockMovement>> {
        self.ledger.movements_for(id)
    }

    pub fn replenishments_for(&self, id: ComponentId) -> Result<Vec<StockMovement>> {
        self.ledger.replenishments_for(id)
    }

    pub fn withdrawals_for(&self, id: ComponentId) -> Result<Vec<StockMovement>> {
        self.ledger.withdrawals_for(id)
    }

    fn announce(&self, posting: Posting) -> MovementId {
        self.events.publish(StoreEvent::StockChanged {
            component_id: posting.component_id,
            movement_id: posting.movement_id,
            balance: posting.balance,
        });
        posting.movement_id
    }

    // ---- boundary records ----

    pub fn lookup_records(
        &self,
        part_number: &str,
        manufacturer: Option<&str>,
    ) -> Result<Vec<Record>> {
        Ok(to_records(self.lookup(part_number, manufacturer)?))
    }

    pub fn incremental_search_records(
        &self,
        prefix: &str,
        manufacturer: Option<&str>,
    ) -> Result<Vec<Record>> {
        Ok(to_records(self.incremental_search(prefix, manufacturer)?))
    }

    pub fn search_records_by_type(
        &self,
        component_type: &str,
        criteria: Option<&SearchCriteria>,
    ) -> Result<Vec<Record>> {
        Ok(to_records(self.search_by_type(component_type, criteria)?))
    }

    pub fn movement_records(&self, id: ComponentId) -> Result<Vec<Record>> {
        Ok(self
            .movements_for(id)?
            .iter()
            .map(StockMovement::to_record)
            .collect())
    }

    /// Register from a form record
    pub fn register_record(&self, record: &Record) -> Result<ComponentId> {
        self.register(&NewComponent::from_record(record)?)
    }

    pub fn amend_record(&self, id: ComponentId, record: &Record) -> Result<()> {
        self.amend_component(id, &ComponentAmendment::from_record(record)?)
    }

    pub fn replenish_with_record(&self, record: &Record) -> Result<MovementId> {
        let request = MovementRequest::from_record(record)?;
        self.record_replenishment(
            request.component_id,
            request.quantity,
            request.date,
            request.note.as_deref(),
        )
    }

    pub fn withdraw_with_record(&self, record: &Record) -> Result<MovementId> {
        let request = MovementRequest::from_record(record)?;
        self.record_withdrawal(
            request.component_id,
            request.quantity,
            request.date,
            request.note.as_deref(),
        )
    }
}

fn to_records(components: Vec<ComponentRecord>) -> Vec<Record> {
    components.iter().map(ComponentRecord::to_record).collect()
}
