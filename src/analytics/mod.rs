//! Aggregation over ledger slices and the projections derived from it.

pub mod aggregate;
pub mod projection;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::ledger::Ledger;

pub use aggregate::{daily_average, daily_series, sum, DailyBucket};
pub use projection::{
    budget_status, month_projection, period_to_date, savings_status, BudgetState, BudgetStatus,
    MonthProjection, SavingsProgress, SavingsStatus,
};

/// Headline figures for the analytics view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub entries: usize,
    pub projection: MonthProjection,
    pub series: Vec<DailyBucket>,
}

pub fn analytics_summary<Tz: TimeZone>(ledger: &Ledger, now: &DateTime<Tz>) -> AnalyticsSummary {
    AnalyticsSummary {
        entries: ledger.len(),
        projection: month_projection(ledger, now),
        series: daily_series(ledger),
    }
}
