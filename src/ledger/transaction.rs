//! Spending transaction record and its timestamp format.

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single recorded spending event.
///
/// The timestamp keeps the offset it was written with, so the calendar date of
/// the stored representation survives a load/save cycle unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub description: String,
    pub amount: f64,
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<FixedOffset>,
}

impl Transaction {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self::with_id(new_id(), description, amount, timestamp)
    }

    pub fn with_id(
        id: impl Into<String>,
        description: impl Into<String>,
        amount: f64,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            amount,
            timestamp,
        }
    }

    /// Calendar day as written in the stored timestamp.
    pub fn calendar_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.timestamp.with_timezone(&Utc)
    }
}

/// Generates a fresh opaque transaction identifier.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Renders a timestamp as RFC 3339, using `Z` for UTC and only as many
/// fractional digits as needed.
pub fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parses RFC 3339 instants, falling back to offset-less date-times and bare
/// dates, both read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })?;
    Some(Utc.from_utc_datetime(&naive).into())
}

mod timestamp_format {
    use chrono::{DateTime, FixedOffset};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`")))
    }
}
