//! End-to-end scenarios against the library surface
//!
//! A resistor is registered, stocked and drawn down; capacitance values
//! round-trip through the store; concurrent readers overlap a writer.

use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use tempfile::TempDir;
use warehouse::core::{EngineeringValue, RatingKind};
use warehouse::entities::{NewComponent, Record};
use warehouse::store::{DatabaseController, StoreEvent};
use warehouse::InventoryError;

fn open() -> (TempDir, DatabaseController) {
    let tmp = TempDir::new().unwrap();
    let controller = DatabaseController::new();
    controller.open(&tmp.path().join("inventory.db")).unwrap();
    (tmp, controller)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn acme_resistor() -> NewComponent {
    NewComponent::new("Resistor", "C1001", "ACME")
        .with_rating(EngineeringValue::from_value(4700.0, RatingKind::Resistance).unwrap())
}

#[test]
fn test_resistor_lifecycle() {
    let (_tmp, controller) = open();

    // Registration starts with an empty balance
    let id = controller.register(&acme_resistor()).unwrap();
    assert_eq!(controller.stock_for("C1001", "ACME").unwrap(), 0);

    // Two replenishments
    controller
        .record_replenishment(id, 100, date(2023, 1, 10), None)
        .unwrap();
    controller
        .record_replenishment(id, 50, date(2023, 1, 12), None)
        .unwrap();
    assert_eq!(controller.stock_for("C1001", "ACME").unwrap(), 150);

    // Overdraw is rejected without touching the ledger
    let err = controller
        .record_withdrawal(id, 200, date(2023, 1, 13), None)
        .unwrap_err();
    assert!(matches!(err, InventoryError::InsufficientStock { .. }));
    assert!(err.is_recoverable());
    assert_eq!(controller.stock_for("C1001", "ACME").unwrap(), 150);
    assert_eq!(controller.movements_for(id).unwrap().len(), 2);

    // Exact drawdown empties the bin
    controller
        .record_withdrawal(id, 150, date(2023, 1, 13), None)
        .unwrap();
    assert_eq!(controller.stock_for("C1001", "ACME").unwrap(), 0);
    assert_eq!(controller.withdrawals_for(id).unwrap().len(), 1);
}

#[test]
fn test_capacitance_rendering() {
    let stored = RatingKind::Capacitance.value_from_column(0.0047).unwrap();
    assert_eq!(stored.to_prefixed_string(), "4.7nF");

    let parsed = EngineeringValue::from_prefixed_str("4.7nF", RatingKind::Capacitance).unwrap();
    assert_eq!(parsed.significand(), 4.7);
    assert_eq!(parsed.order_of_magnitude(), -9);
    assert!(parsed.approx_eq(&stored));
}

#[test]
fn test_capacitance_survives_the_store() {
    let (_tmp, controller) = open();
    let cap = EngineeringValue::from_prefixed_str("4.7nF", RatingKind::Capacitance).unwrap();
    let id = controller
        .register(&NewComponent::new("Capacitor", "C0G-4N7", "TDK").with_rating(cap))
        .unwrap();

    let record = controller.component(id).unwrap();
    let stored = record.rating(RatingKind::Capacitance).unwrap();
    assert_eq!(stored.to_prefixed_string(), "4.7nF");
    assert_eq!(stored.order_of_magnitude(), -9);
}

#[test]
fn test_duplicate_identity_leaves_catalog_unchanged() {
    let (_tmp, controller) = open();
    controller.register(&acme_resistor()).unwrap();
    let before = controller.incremental_search("", None).unwrap();

    let mut record = Record::new();
    record.insert("component_type".into(), "Capacitor".into());
    record.insert("part_number".into(), "C1001".into());
    record.insert("manufacturer".into(), "ACME".into());
    assert!(matches!(
        controller.register_record(&record),
        Err(InventoryError::DuplicateIdentity { .. })
    ));

    assert_eq!(controller.incremental_search("", None).unwrap(), before);
    assert_eq!(
        controller.distinct_component_types().unwrap(),
        vec!["Resistor"]
    );
}

#[test]
fn test_incremental_search_is_deterministic() {
    let (_tmp, controller) = open();
    for (part, maker) in [
        ("LM358", "TI"),
        ("LM358", "ON Semi"),
        ("lm317", "ST"),
        ("LM7805", "Fairchild"),
        ("NE555", "TI"),
    ] {
        controller
            .register(&NewComponent::new("IC", part, maker))
            .unwrap();
    }

    let first = controller.incremental_search_records("lm", None).unwrap();
    let second = controller.incremental_search_records("lm", None).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);

    let identities: Vec<_> = first
        .iter()
        .map(|r| {
            (
                r["part_number"].as_str().unwrap().to_string(),
                r["manufacturer"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    let mut sorted = identities.clone();
    sorted.sort_by_key(|(part, maker)| (part.to_lowercase(), maker.to_lowercase()));
    assert_eq!(identities, sorted);
    assert_eq!(identities[0].0, "lm317");
}

#[test]
fn test_same_day_movements_keep_insertion_order() {
    let (_tmp, controller) = open();
    let id = controller.register(&acme_resistor()).unwrap();
    let day = date(2023, 3, 1);

    let ids: Vec<_> = (1..=5)
        .map(|n| controller.record_replenishment(id, n, day, None).unwrap())
        .collect();
    let recorded: Vec<_> = controller
        .movements_for(id)
        .unwrap()
        .iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(recorded, ids);
}

#[test]
fn test_concurrent_readers_and_writer() {
    let (_tmp, controller) = open();
    let controller = Arc::new(controller);
    let id = controller.register(&acme_resistor()).unwrap();
    let events = controller.subscribe();

    let writer = {
        let controller = Arc::clone(&controller);
        thread::spawn(move || {
            for _ in 0..50 {
                controller
                    .record_replenishment(id, 2, date(2023, 1, 1), None)
                    .unwrap();
                controller
                    .record_withdrawal(id, 1, date(2023, 1, 1), None)
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                for _ in 0..50 {
                    let found = controller.incremental_search("C10", None).unwrap();
                    assert_eq!(found.len(), 1);
                    // Balances move 0, 2, 1, 3, 2, ...; never negative, never past 51
                    let balance = found[0].stocked_quantity;
                    assert!((0..=51).contains(&balance));
                    assert!(controller.current_balance(id).unwrap() >= 0);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(controller.current_balance(id).unwrap(), 50);
    let stock_events = events
        .try_iter()
        .filter(|e| matches!(e, StoreEvent::StockChanged { .. }))
        .count();
    assert_eq!(stock_events, 100);
}

#[test]
fn test_concurrent_withdrawals_never_overdraw() {
    let (_tmp, controller) = open();
    let controller = Arc::new(controller);
    let id = controller.register(&acme_resistor()).unwrap();
    controller
        .record_replenishment(id, 10, date(2023, 1, 1), None)
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                (0..5)
                    .filter(|_| {
                        controller
                            .record_withdrawal(id, 1, date(2023, 1, 2), None)
                            .is_ok()
                    })
                    .count()
            })
        })
        .collect();

    let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(accepted, 10);
    assert_eq!(controller.current_balance(id).unwrap(), 0);
}
