use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::ledger::Transaction;

/// Total spend on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Arithmetic sum of amounts. Empty input sums to zero.
pub fn sum<'a, I>(transactions: I) -> f64
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions.into_iter().map(|txn| txn.amount).sum()
}

/// Per-day totals keyed by the calendar date written in each timestamp,
/// ascending by date.
pub fn daily_series<'a, I>(transactions: I) -> Vec<DailyBucket>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for txn in transactions {
        *totals.entry(txn.calendar_date()).or_insert(0.0) += txn.amount;
    }
    totals
        .into_iter()
        .map(|(date, amount)| DailyBucket { date, amount })
        .collect()
}

/// `total / max(1, elapsed_days)`.
pub fn daily_average(total: f64, elapsed_days: u32) -> f64 {
    total / f64::from(elapsed_days.max(1))
}
