//! The spending engine and the seams it is built on.

pub mod engine;
pub mod time;

pub use engine::{EngineOptions, SpendingEngine, ENTRIES_KEY, SETTINGS_KEY};
pub use time::{Clock, EngineZone, FixedClock, SystemClock};
