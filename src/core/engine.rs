//! Facade that owns the ledger and settings and keeps them persisted.

use chrono::{DateTime, FixedOffset, Local};
use tracing::{debug, info, warn};

use crate::{
    analytics::{
        self, AnalyticsSummary, BudgetStatus, DailyBucket, MonthProjection, SavingsStatus,
    },
    codec::{self, ExportPayload, ImportFormat, ImportPolicy, ImportReport},
    errors::EngineResult,
    ledger::{Ledger, Settings, Transaction},
    storage::KeyValueStore,
};

use super::time::{Clock, EngineZone, SystemClock};

/// Storage key of the JSON array of transactions.
pub const ENTRIES_KEY: &str = "spend.entries.v1";
/// Storage key of the settings object.
pub const SETTINGS_KEY: &str = "spend.settings.v1";

/// Binds `$now` to the clock's instant in the engine zone and evaluates `$body`.
macro_rules! zoned_now {
    ($engine:expr, $now:ident => $body:expr) => {{
        let utc = $engine.clock.now();
        match $engine.timezone {
            EngineZone::Local => {
                let $now = utc.with_timezone(&Local);
                $body
            }
            EngineZone::Fixed(offset) => {
                let $now = utc.with_timezone(&offset);
                $body
            }
        }
    }};
}

/// Construction-time knobs for [`SpendingEngine`].
pub struct EngineOptions {
    pub clock: Box<dyn Clock>,
    /// Zone used for period boundaries and month lengths.
    pub timezone: EngineZone,
    pub import_policy: ImportPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            clock: Box::new(SystemClock),
            timezone: EngineZone::Local,
            import_policy: ImportPolicy::default(),
        }
    }
}

/// Owns the ledger and settings. Every successful mutation is written to the
/// store before it becomes visible; a failed write leaves the engine as it was.
pub struct SpendingEngine {
    ledger: Ledger,
    settings: Settings,
    storage: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    timezone: EngineZone,
    import_policy: ImportPolicy,
}

impl SpendingEngine {
    pub fn open(storage: Box<dyn KeyValueStore>) -> Self {
        Self::with_options(storage, EngineOptions::default())
    }

    /// Loads persisted state. Missing or unreadable blobs fall back to an
    /// empty ledger and default settings.
    pub fn with_options(storage: Box<dyn KeyValueStore>, options: EngineOptions) -> Self {
        let EngineOptions {
            clock,
            timezone,
            import_policy,
        } = options;
        let mut engine = Self {
            ledger: Ledger::new(),
            settings: Settings::default(),
            storage,
            clock,
            timezone,
            import_policy,
        };
        engine.ledger = engine.load_ledger();
        engine.settings = engine.load_settings();
        debug!(
            entries = engine.ledger.len(),
            offset = %engine.timezone,
            "spending engine ready"
        );
        engine
    }

    fn load_ledger(&self) -> Ledger {
        let raw = match self.storage.load(ENTRIES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ledger::new(),
            Err(err) => {
                warn!(error = %err, "failed to read stored entries, starting empty");
                return Ledger::new();
            }
        };
        // Lenient so that NaN amounts stored as `null` survive a reload.
        match codec::decode_json(&raw, ImportPolicy::Lenient, self.stamp()) {
            Ok(decoded) => Ledger::from_transactions(decoded.transactions),
            Err(err) => {
                warn!(error = %err, "stored entries are malformed, starting empty");
                Ledger::new()
            }
        }
    }

    fn load_settings(&self) -> Settings {
        let raw = match self.storage.load(SETTINGS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Settings::default(),
            Err(err) => {
                warn!(error = %err, "failed to read stored settings, using defaults");
                return Settings::default();
            }
        };
        match serde_json::from_str::<Settings>(&raw) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(error = %err, "stored settings are malformed, using defaults");
                Settings::default()
            }
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.ledger.transactions()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn timezone(&self) -> EngineZone {
        self.timezone
    }

    pub fn import_policy(&self) -> ImportPolicy {
        self.import_policy
    }

    /// Current instant at the offset the engine zone has right now.
    pub fn now(&self) -> DateTime<FixedOffset> {
        let utc = self.clock.now();
        utc.with_timezone(&self.timezone.offset_at(&utc))
    }

    /// Timestamp given to new records: the current instant written in UTC.
    fn stamp(&self) -> DateTime<FixedOffset> {
        self.clock.now().into()
    }

    /// Validates, stamps with the current UTC instant and prepends a new
    /// transaction.
    pub fn add_transaction(&mut self, description: &str, amount: f64) -> EngineResult<Transaction> {
        let mut next = self.ledger.clone();
        let added = next
            .add(description, amount, self.stamp())?
            .clone();
        self.commit_ledger(next)?;
        debug!(id = %added.id, amount, "transaction added");
        Ok(added)
    }

    /// Returns `false`, without touching storage, when `id` is unknown.
    pub fn remove_transaction(&mut self, id: &str) -> EngineResult<bool> {
        if !self.ledger.contains(id) {
            return Ok(false);
        }
        let mut next = self.ledger.clone();
        next.remove(id);
        self.commit_ledger(next)?;
        debug!(id, "transaction removed");
        Ok(true)
    }

    pub fn save_settings(&mut self, settings: Settings) -> EngineResult<()> {
        settings.validate()?;
        let json = serde_json::to_string(&settings)?;
        self.storage.save(SETTINGS_KEY, &json)?;
        self.settings = settings;
        debug!("settings saved");
        Ok(())
    }

    /// Sets one settings field by its textual key, such as `budget-warning`.
    pub fn update_setting(&mut self, key: &str, value: &str) -> EngineResult<&Settings> {
        let mut next = self.settings.clone();
        next.set_field(key, value)?;
        self.save_settings(next)?;
        Ok(&self.settings)
    }

    pub fn import_json(&mut self, text: &str) -> EngineResult<ImportReport> {
        self.import(ImportFormat::Json, text)
    }

    pub fn import_csv(&mut self, text: &str) -> EngineResult<ImportReport> {
        self.import(ImportFormat::Csv, text)
    }

    /// Picks the format from the file name: `.json` is JSON, anything else CSV.
    pub fn import_file(&mut self, file_name: &str, text: &str) -> EngineResult<ImportReport> {
        self.import(ImportFormat::from_file_name(file_name), text)
    }

    /// Replaces the ledger wholesale once the whole input has parsed.
    pub fn import(&mut self, format: ImportFormat, text: &str) -> EngineResult<ImportReport> {
        let decoded = codec::decode(format, text, self.import_policy, self.stamp())?;
        for issue in &decoded.report.issues {
            warn!(
                format = %format,
                record = issue.record,
                field = issue.issue.field(),
                "{}",
                issue.issue
            );
        }
        self.commit_ledger(Ledger::from_transactions(decoded.transactions))?;
        info!(
            format = %format,
            accepted = decoded.report.accepted,
            skipped = decoded.report.skipped,
            "import complete"
        );
        Ok(decoded.report)
    }

    pub fn export_csv(&self) -> EngineResult<ExportPayload> {
        Ok(codec::export_csv(self.ledger.transactions())?)
    }

    pub fn export_json(&self) -> EngineResult<ExportPayload> {
        Ok(codec::export_json(self.ledger.transactions())?)
    }

    pub fn month_projection(&self) -> MonthProjection {
        zoned_now!(self, now => analytics::month_projection(&self.ledger, &now))
    }

    pub fn budget_status(&self) -> Option<BudgetStatus> {
        zoned_now!(self, now => analytics::budget_status(&self.ledger, &now, &self.settings))
    }

    pub fn savings_status(&self) -> SavingsStatus {
        zoned_now!(self, now => analytics::savings_status(&self.ledger, &now, &self.settings))
    }

    pub fn daily_series(&self) -> Vec<DailyBucket> {
        analytics::daily_series(&self.ledger)
    }

    pub fn analytics_summary(&self) -> AnalyticsSummary {
        zoned_now!(self, now => analytics::analytics_summary(&self.ledger, &now))
    }

    fn commit_ledger(&mut self, next: Ledger) -> EngineResult<()> {
        let json = serde_json::to_string(&next)?;
        self.storage.save(ENTRIES_KEY, &json)?;
        self.ledger = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::FixedClock;
    use crate::errors::{EngineError, ValidationError};
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn engine_at(store: MemoryStore) -> SpendingEngine {
        let options = EngineOptions {
            clock: Box::new(FixedClock::new(
                Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap(),
            )),
            timezone: EngineZone::Fixed(FixedOffset::east_opt(0).unwrap()),
            import_policy: ImportPolicy::Lenient,
        };
        SpendingEngine::with_options(Box::new(store), options)
    }

    #[test]
    fn add_prepends_and_stamps_now() {
        let mut engine = engine_at(MemoryStore::new());
        engine.add_transaction("Coffee", 3.5).unwrap();
        let latest = engine.add_transaction("  Lunch ", 12.0).unwrap();
        assert_eq!(latest.description, "Lunch");
        assert_eq!(engine.transactions()[0].id, latest.id);
        assert_eq!(
            crate::ledger::format_timestamp(&latest.timestamp),
            "2024-03-10T12:00:00Z"
        );
    }

    #[test]
    fn invalid_add_is_rejected_without_change() {
        let mut engine = engine_at(MemoryStore::new());
        let err = engine.add_transaction("   ", 5.0).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::EmptyDescription)
        ));
        assert!(engine.add_transaction("Tea", 0.0).is_err());
        assert!(engine.add_transaction("Tea", f64::INFINITY).is_err());
        assert!(engine.ledger().is_empty());
    }

    #[test]
    fn unknown_id_removal_is_a_no_op() {
        let mut engine = engine_at(MemoryStore::new());
        engine.add_transaction("Coffee", 3.5).unwrap();
        assert!(!engine.remove_transaction("missing").unwrap());
        assert_eq!(engine.ledger().len(), 1);
    }

    #[test]
    fn state_survives_reopen() {
        let store = MemoryStore::new();
        let mut engine = engine_at(store);
        let added = engine.add_transaction("Coffee", 3.5).unwrap();
        let mut settings = engine.settings().clone();
        settings.budget_warning = Some(100.0);
        engine.save_settings(settings).unwrap();

        let entries = engine.storage.load(ENTRIES_KEY).unwrap().unwrap();
        let stored_settings = engine.storage.load(SETTINGS_KEY).unwrap().unwrap();
        assert!(stored_settings.contains("\"budgetWarning\":100.0"));

        let seeded = MemoryStore::with_value(ENTRIES_KEY, entries);
        seeded.save(SETTINGS_KEY, &stored_settings).unwrap();
        let reopened = engine_at(seeded);
        assert_eq!(reopened.transactions(), &[added]);
        assert_eq!(reopened.settings().budget_warning, Some(100.0));
    }

    #[test]
    fn malformed_storage_falls_back_to_defaults() {
        let store = MemoryStore::with_value(ENTRIES_KEY, "{not json");
        store.save(SETTINGS_KEY, "currency=EUR").unwrap();
        let engine = engine_at(store);
        assert!(engine.ledger().is_empty());
        assert_eq!(engine.settings(), &Settings::default());
    }

    #[test]
    fn invalid_settings_are_not_saved() {
        let mut engine = engine_at(MemoryStore::new());
        assert!(engine.update_setting("save-target", "150").is_err());
        assert_eq!(engine.settings().save_target, None);
        engine.update_setting("save-target", "20").unwrap();
        assert_eq!(engine.settings().save_target, Some(20.0));
    }

    #[test]
    fn failed_import_keeps_the_ledger() {
        let mut engine = engine_at(MemoryStore::new());
        engine.add_transaction("Coffee", 3.5).unwrap();
        let err = engine.import_json("\"not an array\"").unwrap_err();
        assert!(matches!(err, EngineError::Import(_)));
        assert_eq!(engine.ledger().len(), 1);
    }

    #[test]
    fn import_file_dispatches_on_suffix() {
        let mut engine = engine_at(MemoryStore::new());
        let report = engine
            .import_file(
                "backup.json",
                r#"[{"id":"a","description":"Tea","amount":2,"timestamp":"2024-03-01T00:00:00Z"}]"#,
            )
            .unwrap();
        assert_eq!(report.format, ImportFormat::Json);
        let report = engine
            .import_file("spending.csv", "description,amount,timestamp\nBus,2,")
            .unwrap();
        assert_eq!(report.format, ImportFormat::Csv);
        assert_eq!(engine.transactions()[0].description, "Bus");
    }
}
