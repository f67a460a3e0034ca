use std::fmt;

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};

/// Clock abstracts access to the current instant so the engine stays deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

/// Zone that period boundaries are computed in.
///
/// `Local` follows the process timezone rules, daylight saving included, so
/// every boundary gets the offset in effect on that date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineZone {
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl EngineZone {
    /// A configured offset in minutes east of UTC, or the local zone when
    /// unset or out of range.
    pub fn from_minutes(minutes: Option<i32>) -> Self {
        minutes
            .and_then(offset_from_minutes)
            .map_or(EngineZone::Local, EngineZone::Fixed)
    }

    /// Offset in effect at `instant`.
    pub fn offset_at(&self, instant: &DateTime<Utc>) -> FixedOffset {
        match self {
            EngineZone::Local => Local.offset_from_utc_datetime(&instant.naive_utc()).fix(),
            EngineZone::Fixed(offset) => *offset,
        }
    }
}

impl fmt::Display for EngineZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineZone::Local => f.write_str("local"),
            EngineZone::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

/// Offset from whole minutes east of UTC. `None` when out of range.
fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_its_instant() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let clock = FixedClock::new(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn minute_offsets_are_bounded() {
        assert_eq!(
            offset_from_minutes(-300),
            FixedOffset::west_opt(5 * 3600)
        );
        assert_eq!(offset_from_minutes(330).unwrap().local_minus_utc(), 19_800);
        assert!(offset_from_minutes(24 * 60).is_none());
    }

    #[test]
    fn zone_from_minutes_falls_back_to_local() {
        assert_eq!(EngineZone::from_minutes(None), EngineZone::Local);
        assert_eq!(EngineZone::from_minutes(Some(24 * 60)), EngineZone::Local);
        let tokyo = EngineZone::from_minutes(Some(540));
        assert_eq!(tokyo, EngineZone::Fixed(FixedOffset::east_opt(9 * 3600).unwrap()));
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(tokyo.offset_at(&instant).local_minus_utc(), 9 * 3600);
        assert_eq!(tokyo.to_string(), "+09:00");
    }
}
