#![doc(test(attr(deny(warnings))))]

//! Spend Tracker records spending transactions and derives period totals,
//! month-end projections, budget warnings and savings-goal progress from them.

pub mod analytics;
pub mod cli;
pub mod codec;
pub mod config;
pub mod core;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("Spend Tracker tracing initialized.");
    });
}
