mod common;

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use common::{engine_with, instant, memory_engine, options_at, FlakyStore};
use spend_tracker::{
    analytics::{self, BudgetState, SavingsStatus},
    core::SpendingEngine,
    errors::{EngineError, ImportError, StorageError},
    ledger::{period_start, Period, Transaction},
    storage::MemoryStore,
};

const NOW: &str = "2024-03-10T12:00:00Z";

fn seeded_json() -> &'static str {
    r#"[
        {"id": "a", "description": "Groceries", "amount": 60, "timestamp": "2024-03-02T10:00:00Z"},
        {"id": "b", "description": "Cinema", "amount": 40, "timestamp": "2024-03-09T20:00:00Z"},
        {"id": "c", "description": "Rent", "amount": 900, "timestamp": "2024-02-28T09:00:00Z"}
    ]"#
}

fn seeded_engine() -> SpendingEngine {
    let mut engine = memory_engine(NOW);
    engine.import_json(seeded_json()).expect("seed ledger");
    engine
}

fn triples(transactions: &[Transaction]) -> HashMap<String, (u64, DateTime<Utc>)> {
    transactions
        .iter()
        .map(|t| {
            (
                t.description.clone(),
                (t.amount.to_bits(), t.occurred_at()),
            )
        })
        .collect()
}

#[test]
fn valid_add_appears_exactly_once() {
    let mut engine = memory_engine(NOW);
    let added = engine.add_transaction("Coffee", 3.5).unwrap();
    let epoch = Utc.timestamp_opt(0, 0).unwrap();
    let since = engine.ledger().filter_since(&epoch);
    assert_eq!(since.len(), 1);
    assert_eq!(since[0], &added);
    assert_eq!(added.amount, 3.5);
}

#[test]
fn removing_unknown_id_changes_nothing() {
    let mut engine = seeded_engine();
    let before = engine.transactions().to_vec();
    assert!(!engine.remove_transaction("nope").unwrap());
    assert_eq!(engine.transactions(), before.as_slice());

    assert!(engine.remove_transaction("b").unwrap());
    assert_eq!(engine.ledger().len(), 2);
    assert!(engine.ledger().get("b").is_none());
}

#[test]
fn json_round_trip_preserves_records() {
    let mut engine = seeded_engine();
    engine.add_transaction("Late \"night\" snack, large", 7.25).unwrap();
    let exported = engine.export_json().unwrap();
    assert_eq!(exported.file_name, "spending.json");

    let mut other = memory_engine(NOW);
    other.import_json(&exported.content).unwrap();
    assert_eq!(triples(other.transactions()), triples(engine.transactions()));
    assert_eq!(other.transactions(), engine.transactions());
}

#[test]
fn csv_round_trip_preserves_descriptions_and_amounts() {
    let mut engine = memory_engine(NOW);
    engine.add_transaction("a,b", 10.0).unwrap();
    engine.add_transaction("a\"b", 5.5).unwrap();
    engine.add_transaction("line\nbreak", 1.25).unwrap();
    let exported = engine.export_csv().unwrap();
    assert_eq!(exported.mime_type, "text/csv");

    let mut other = memory_engine(NOW);
    let report = other.import_csv(&exported.content).unwrap();
    assert_eq!(report.accepted, 3);
    let pairs = |engine: &SpendingEngine| -> Vec<(String, f64)> {
        engine
            .transactions()
            .iter()
            .map(|t| (t.description.clone(), t.amount))
            .collect()
    };
    assert_eq!(pairs(&other), pairs(&engine));
}

#[test]
fn sums_of_simple_slices() {
    let ts = instant(NOW);
    assert_eq!(analytics::sum(&Vec::<Transaction>::new()), 0.0);
    let items = vec![
        Transaction::new("x", 10.0, ts),
        Transaction::new("y", 5.5, ts),
    ];
    assert_eq!(analytics::sum(&items), 15.5);
}

#[test]
fn period_starts_for_week_and_year() {
    let utc = FixedOffset::east_opt(0).unwrap();
    let friday = instant("2024-03-15T16:30:00Z");
    assert_eq!(
        period_start(&friday, Period::Week, &utc),
        instant("2024-03-11T00:00:00Z")
    );
    let new_year = instant("2024-01-01T08:00:00Z");
    assert_eq!(
        period_start(&new_year, Period::Year, &utc),
        instant("2024-01-01T00:00:00Z")
    );
}

#[test]
fn month_projection_from_engine_clock() {
    let engine = seeded_engine();
    let projection = engine.month_projection();
    assert_eq!(projection.month_to_date, 100.0);
    assert_eq!(projection.days_elapsed, 10);
    assert_eq!(projection.days_in_month, 31);
    assert_eq!(projection.projected, 310.0);

    let summary = engine.analytics_summary();
    assert_eq!(summary.entries, 3);
    let dates: Vec<String> = summary.series.iter().map(|b| b.date.to_string()).collect();
    assert_eq!(dates, vec!["2024-02-28", "2024-03-02", "2024-03-09"]);
}

#[test]
fn budget_equal_to_spend_is_within() {
    let mut engine = seeded_engine();
    assert!(engine.budget_status().is_none());
    engine.update_setting("budget-warning", "100").unwrap();
    let status = engine.budget_status().unwrap();
    assert_eq!(status.state, BudgetState::Within);

    engine.update_setting("budget-warning", "99.99").unwrap();
    assert_eq!(engine.budget_status().unwrap().state, BudgetState::Over);
}

#[test]
fn savings_goal_tracks_configured_period() {
    let mut engine = seeded_engine();
    assert_eq!(engine.savings_status(), SavingsStatus::InsufficientConfiguration);
    engine.update_setting("income", "1000").unwrap();
    engine.update_setting("save-target", "20").unwrap();
    match engine.savings_status() {
        SavingsStatus::OnTrack(progress) => {
            assert_eq!(progress.allowed, 800.0);
            assert_eq!(progress.spent, 100.0);
        }
        other => panic!("expected on-track status, got {other:?}"),
    }
    engine.update_setting("save-period", "year").unwrap();
    assert!(matches!(
        engine.savings_status(),
        SavingsStatus::Overspend(ref p) if p.spent == 1000.0
    ));
}

#[test]
fn csv_with_bad_third_row_keeps_the_rest() {
    let mut engine = memory_engine(NOW);
    let text = "description,amount,timestamp\r\n\
                One,1,2024-03-01T00:00:00Z\r\n\
                Two,2,2024-03-02T00:00:00Z\r\n\
                Three,three,2024-03-03T00:00:00Z\r\n\
                Four,4,2024-03-04T00:00:00Z";
    let report = engine.import_csv(text).unwrap();
    assert_eq!(report.skipped, 1);
    let names: Vec<_> = engine
        .transactions()
        .iter()
        .map(|t| t.description.as_str())
        .collect();
    assert_eq!(names, vec!["One", "Two", "Four"]);
}

#[test]
fn json_that_is_not_an_array_leaves_ledger_intact() {
    let mut engine = seeded_engine();
    let before = engine.transactions().to_vec();
    let err = engine.import_json("\"not an array\"").unwrap_err();
    assert!(matches!(err, EngineError::Import(ImportError::NotAnArray)));
    assert_eq!(engine.transactions(), before.as_slice());
}

#[test]
fn lenient_json_import_keeps_nan_amounts() {
    let mut engine = memory_engine(NOW);
    engine
        .import_json(r#"[{"description": "Mystery", "amount": "n/a", "timestamp": "2024-03-05T00:00:00Z"}]"#)
        .unwrap();
    assert!(engine.transactions()[0].amount.is_nan());
    assert!(engine.month_projection().month_to_date.is_nan());
}

#[test]
fn strict_json_import_drops_unusable_records() {
    let mut options = options_at(NOW, 0);
    options.import_policy = spend_tracker::codec::ImportPolicy::Strict;
    let mut engine = SpendingEngine::with_options(Box::new(MemoryStore::new()), options);
    assert_eq!(
        engine.import_policy(),
        spend_tracker::codec::ImportPolicy::Strict
    );
    let report = engine
        .import_json(
            r#"[
                {"description": "Mystery", "amount": "n/a"},
                {"description": "Known", "amount": 3}
            ]"#,
        )
        .unwrap();
    assert_eq!(report.accepted, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(engine.transactions()[0].description, "Known");
}

#[test]
fn duplicate_import_ids_are_rekeyed() {
    let mut engine = memory_engine(NOW);
    engine
        .import_json(
            r#"[
                {"id": "same", "description": "First", "amount": 1, "timestamp": "2024-03-01T00:00:00Z"},
                {"id": "same", "description": "Second", "amount": 2, "timestamp": "2024-03-01T00:00:00Z"}
            ]"#,
        )
        .unwrap();
    let ids: Vec<_> = engine.transactions().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids[0], "same");
    assert_ne!(ids[1], "same");
}

#[test]
fn failed_writes_leave_state_unchanged() {
    let store = FlakyStore::default();
    let mut engine = engine_with(store.clone(), NOW);
    engine.add_transaction("Coffee", 3.5).unwrap();

    store.set_failing(true);
    let err = engine.add_transaction("Tea", 2.0).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Storage(StorageError::Unavailable(_))
    ));
    assert!(engine.import_json("[]").is_err());
    assert!(engine.update_setting("budget-warning", "10").is_err());
    let id = engine.transactions()[0].id.clone();
    assert!(engine.remove_transaction(&id).is_err());

    assert_eq!(engine.ledger().len(), 1);
    assert_eq!(engine.settings().budget_warning, None);

    store.set_failing(false);
    let reopened = engine_with(store, NOW);
    assert_eq!(reopened.transactions(), engine.transactions());
}

#[test]
fn periods_follow_the_engine_timezone() {
    // 23:30 on March 31st in New York is already April in UTC.
    let store = MemoryStore::new();
    let mut engine =
        SpendingEngine::with_options(Box::new(store), options_at("2024-04-01T03:30:00Z", -4));
    engine
        .import_json(
            r#"[{"id": "a", "description": "Dinner", "amount": 50, "timestamp": "2024-03-31T22:00:00-04:00"}]"#,
        )
        .unwrap();
    let projection = engine.month_projection();
    assert_eq!(projection.days_elapsed, 31);
    assert_eq!(projection.month_to_date, 50.0);
}
