#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use chrono::{DateTime, FixedOffset, Utc};
use once_cell::sync::Lazy;
use spend_tracker::{
    codec::ImportPolicy,
    core::{EngineOptions, EngineZone, FixedClock, SpendingEngine},
    errors::StorageError,
    ledger::parse_timestamp,
    storage::{KeyValueStore, MemoryStore},
};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique directory that outlives the calling test.
pub fn temp_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn instant(raw: &str) -> DateTime<FixedOffset> {
    parse_timestamp(raw).expect("valid test timestamp")
}

pub fn options_at(now: &str, offset_hours: i32) -> EngineOptions {
    EngineOptions {
        clock: Box::new(FixedClock::new(instant(now).with_timezone(&Utc))),
        timezone: EngineZone::Fixed(
            FixedOffset::east_opt(offset_hours * 3600).expect("valid offset"),
        ),
        import_policy: ImportPolicy::Lenient,
    }
}

/// Engine over `store` whose clock is frozen at `now`, in UTC.
pub fn engine_with<S: KeyValueStore + 'static>(store: S, now: &str) -> SpendingEngine {
    SpendingEngine::with_options(Box::new(store), options_at(now, 0))
}

pub fn memory_engine(now: &str) -> SpendingEngine {
    engine_with(MemoryStore::new(), now)
}

/// Memory-backed store whose writes can be made to fail on demand.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    failing: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl KeyValueStore for FlakyStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("disk full".into()));
        }
        self.inner.save(key, value)
    }
}
