//! Ledger data model: transactions, settings and period boundaries.

#[allow(clippy::module_inception)]
pub mod ledger;
pub mod period;
pub mod settings;
pub mod transaction;

pub use ledger::{validate_entry, Ledger};
pub use period::{days_in_month, period_start, Period};
pub use settings::Settings;
pub use transaction::{format_timestamp, new_id, parse_timestamp, Transaction};
