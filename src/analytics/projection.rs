use chrono::{DateTime, Datelike, TimeZone};
use serde::Serialize;

use crate::ledger::{days_in_month, period_start, Ledger, Period, Settings};

use super::aggregate::{daily_average, sum};

/// Month-to-date spend extrapolated linearly to the whole month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthProjection {
    pub month_to_date: f64,
    pub daily_average: f64,
    pub days_elapsed: u32,
    pub days_in_month: u32,
    pub projected: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetState {
    Within,
    Over,
}

/// Spend in the current budget period against the warning threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub state: BudgetState,
    pub period: Period,
    pub spent: f64,
    pub limit: f64,
}

impl BudgetStatus {
    pub fn is_over(&self) -> bool {
        self.state == BudgetState::Over
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsProgress {
    pub period: Period,
    pub income: f64,
    pub target_save: f64,
    /// Income minus the savings target. Negative when the target exceeds 100%.
    pub allowed: f64,
    pub spent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SavingsStatus {
    /// Income or the savings target is not configured.
    InsufficientConfiguration,
    OnTrack(SavingsProgress),
    Overspend(SavingsProgress),
}

impl SavingsStatus {
    pub fn progress(&self) -> Option<&SavingsProgress> {
        match self {
            SavingsStatus::InsufficientConfiguration => None,
            SavingsStatus::OnTrack(progress) | SavingsStatus::Overspend(progress) => Some(progress),
        }
    }
}

/// Sum of the ledger since the start of `period` around `now`, in `now`'s timezone.
pub fn period_to_date<Tz: TimeZone>(ledger: &Ledger, now: &DateTime<Tz>, period: Period) -> f64 {
    let start = period_start(now, period, &now.timezone());
    sum(ledger.filter_since(&start))
}

pub fn month_projection<Tz: TimeZone>(ledger: &Ledger, now: &DateTime<Tz>) -> MonthProjection {
    let month_to_date = period_to_date(ledger, now, Period::Month);
    let local = now.naive_local();
    let days_elapsed = local.day();
    let days_in_month = days_in_month(local.year(), local.month());
    let average = daily_average(month_to_date, days_elapsed);
    MonthProjection {
        month_to_date,
        daily_average: average,
        days_elapsed,
        days_in_month,
        projected: average * f64::from(days_in_month),
    }
}

/// `None` when no budget warning is configured. Spend equal to the limit is within.
pub fn budget_status<Tz: TimeZone>(
    ledger: &Ledger,
    now: &DateTime<Tz>,
    settings: &Settings,
) -> Option<BudgetStatus> {
    let limit = settings.budget_warning?;
    let spent = period_to_date(ledger, now, settings.budget_period);
    let state = if spent > limit {
        BudgetState::Over
    } else {
        BudgetState::Within
    };
    Some(BudgetStatus {
        state,
        period: settings.budget_period,
        spent,
        limit,
    })
}

pub fn savings_status<Tz: TimeZone>(
    ledger: &Ledger,
    now: &DateTime<Tz>,
    settings: &Settings,
) -> SavingsStatus {
    let (Some(income), Some(save_target)) = (settings.income, settings.save_target) else {
        return SavingsStatus::InsufficientConfiguration;
    };
    let target_save = income * (save_target / 100.0);
    let allowed = income - target_save;
    let spent = period_to_date(ledger, now, settings.save_period);
    let progress = SavingsProgress {
        period: settings.save_period,
        income,
        target_save,
        allowed,
        spent,
    };
    if spent <= allowed {
        SavingsStatus::OnTrack(progress)
    } else {
        SavingsStatus::Overspend(progress)
    }
}
