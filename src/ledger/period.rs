use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Longest daylight-saving gap we step over when local midnight does not exist.
const MAX_GAP_MINUTES: i64 = 3 * 60;

/// Calendar granularity used to window budget and savings aggregation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Day => "Daily",
            Period::Week => "Weekly",
            Period::Month => "Monthly",
            Period::Year => "Yearly",
        }
    }

    /// First calendar day of the period that contains `date`.
    pub fn anchor_date(self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Day => date,
            Period::Week => {
                let delta = date.weekday().num_days_from_monday() as i64;
                date - Duration::days(delta)
            }
            Period::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date),
            Period::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" | "d" => Ok(Period::Day),
            "week" | "weekly" | "w" => Ok(Period::Week),
            "month" | "monthly" | "m" => Ok(Period::Month),
            "year" | "yearly" | "y" => Ok(Period::Year),
            _ => Err(ValidationError::UnknownPeriod(raw.to_string())),
        }
    }
}

/// Returns local midnight (in `tz`) of the first day of the period enclosing `instant`.
///
/// Time of day is discarded. Weeks start on Monday, so a Sunday maps back six days.
pub fn period_start<T, Tz>(instant: &DateTime<T>, period: Period, tz: &Tz) -> DateTime<Tz>
where
    T: TimeZone,
    Tz: TimeZone,
{
    let local = instant.with_timezone(tz);
    let anchor = period.anchor_date(local.date_naive());
    local_midnight(anchor, tz)
}

/// Number of days in `month` of `year`, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last_current| last_current.day())
        .unwrap_or(31)
}

fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            (1..=MAX_GAP_MINUTES).find_map(|minutes| {
                tz.from_local_datetime(&(midnight + Duration::minutes(minutes)))
                    .earliest()
            })
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn week_start_is_previous_monday() {
        let friday = utc(2024, 3, 15, 14, 30);
        let start = period_start(&friday, Period::Week, &Utc);
        assert_eq!(start, utc(2024, 3, 11, 0, 0));
    }

    #[test]
    fn sunday_maps_back_six_days() {
        let sunday = utc(2024, 3, 17, 23, 59);
        let start = period_start(&sunday, Period::Week, &Utc);
        assert_eq!(start, utc(2024, 3, 11, 0, 0));
    }

    #[test]
    fn monday_is_its_own_week_start() {
        let monday = utc(2024, 3, 11, 8, 0);
        assert_eq!(
            period_start(&monday, Period::Week, &Utc),
            utc(2024, 3, 11, 0, 0)
        );
    }

    #[test]
    fn day_month_and_year_truncate_to_midnight() {
        let instant = utc(2024, 7, 19, 17, 45);
        assert_eq!(
            period_start(&instant, Period::Day, &Utc),
            utc(2024, 7, 19, 0, 0)
        );
        assert_eq!(
            period_start(&instant, Period::Month, &Utc),
            utc(2024, 7, 1, 0, 0)
        );
        assert_eq!(
            period_start(&instant, Period::Year, &Utc),
            utc(2024, 1, 1, 0, 0)
        );
    }

    #[test]
    fn first_of_year_is_its_own_year_start() {
        let new_year = utc(2024, 1, 1, 0, 0);
        assert_eq!(period_start(&new_year, Period::Year, &Utc), new_year);
    }

    #[test]
    fn truncation_uses_the_supplied_timezone() {
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        // 02:00 UTC on March 1st is still February 29th in New York.
        let instant = utc(2024, 3, 1, 2, 0);
        let start = period_start(&instant, Period::Month, &new_york);
        assert_eq!(
            start,
            new_york.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(start.with_timezone(&Utc), utc(2024, 2, 1, 5, 0));
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn parses_period_names() {
        assert_eq!("week".parse::<Period>().unwrap(), Period::Week);
        assert_eq!(" Monthly ".parse::<Period>().unwrap(), Period::Month);
        assert!(matches!(
            "fortnight".parse::<Period>(),
            Err(ValidationError::UnknownPeriod(_))
        ));
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Period::Year).unwrap();
        assert_eq!(json, "\"year\"");
        let parsed: Period = serde_json::from_str("\"day\"").unwrap();
        assert_eq!(parsed, Period::Day);
    }
}
