//! CSV and JSON import/export for the ledger.
//!
//! Decoding never touches a ledger: callers receive the parsed records and an
//! [`ImportReport`] and swap them in only once the whole input has parsed.

pub mod csv;
pub mod json;

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{ExportError, ImportError},
    ledger::Transaction,
};

pub use self::csv::{csv_escape, decode_csv, encode_csv, CSV_HEADER};
pub use self::json::{decode_json, encode_json, validate_record, RecordOutcome};

pub const CSV_FILE_NAME: &str = "spending.csv";
pub const CSV_MIME_TYPE: &str = "text/csv";
pub const JSON_FILE_NAME: &str = "spending.json";
pub const JSON_MIME_TYPE: &str = "application/json";

/// How JSON records that needed coercion are treated.
///
/// CSV import always drops rows without a description or a finite amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPolicy {
    /// Keep every record, substituting defaults (and NaN amounts) where needed.
    #[default]
    Lenient,
    /// Drop records whose description or amount could not be validated.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Csv,
    Json,
}

impl ImportFormat {
    /// `.json` files are JSON; everything else is read as CSV.
    pub fn from_file_name(name: &str) -> Self {
        if name.to_ascii_lowercase().ends_with(".json") {
            ImportFormat::Json
        } else {
            ImportFormat::Csv
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportFormat::Csv => f.write_str("CSV"),
            ImportFormat::Json => f.write_str("JSON"),
        }
    }
}

/// Reason a single field of an imported record was coerced or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldIssue {
    NotAnObject,
    MissingId,
    MissingDescription,
    DescriptionNotText,
    AmountNotNumeric,
    AmountNotPositive,
    MissingTimestamp,
    InvalidTimestamp,
}

impl FieldIssue {
    pub fn field(self) -> &'static str {
        match self {
            FieldIssue::NotAnObject => "record",
            FieldIssue::MissingId => "id",
            FieldIssue::MissingDescription | FieldIssue::DescriptionNotText => "description",
            FieldIssue::AmountNotNumeric | FieldIssue::AmountNotPositive => "amount",
            FieldIssue::MissingTimestamp | FieldIssue::InvalidTimestamp => "timestamp",
        }
    }

    /// Issues that make the record unusable under [`ImportPolicy::Strict`].
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            FieldIssue::NotAnObject
                | FieldIssue::MissingDescription
                | FieldIssue::AmountNotNumeric
                | FieldIssue::AmountNotPositive
        )
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            FieldIssue::NotAnObject => "not an object",
            FieldIssue::MissingId => "missing id, generated a new one",
            FieldIssue::MissingDescription => "missing description",
            FieldIssue::DescriptionNotText => "description was not text",
            FieldIssue::AmountNotNumeric => "amount is not a finite number",
            FieldIssue::AmountNotPositive => "amount is not positive",
            FieldIssue::MissingTimestamp => "missing timestamp, used the import time",
            FieldIssue::InvalidTimestamp => "unreadable timestamp, used the import time",
        };
        f.write_str(message)
    }
}

/// A field issue tied to its 1-based record number (data rows for CSV).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordIssue {
    pub record: usize,
    pub issue: FieldIssue,
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub format: ImportFormat,
    pub accepted: usize,
    pub skipped: usize,
    pub issues: Vec<RecordIssue>,
}

impl ImportReport {
    pub fn new(format: ImportFormat) -> Self {
        Self {
            format,
            accepted: 0,
            skipped: 0,
            issues: Vec::new(),
        }
    }

    fn note(&mut self, record: usize, issue: FieldIssue) {
        self.issues.push(RecordIssue { record, issue });
    }
}

/// Records parsed from an import together with what happened to them.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub transactions: Vec<Transaction>,
    pub report: ImportReport,
}

/// Export content plus the hints a file-transfer collaborator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub content: String,
}

/// Decodes `text` in `format`. `now` stamps records without a usable timestamp.
pub fn decode(
    format: ImportFormat,
    text: &str,
    policy: ImportPolicy,
    now: DateTime<FixedOffset>,
) -> Result<Decoded, ImportError> {
    match format {
        ImportFormat::Csv => decode_csv(text, now),
        ImportFormat::Json => decode_json(text, policy, now),
    }
}

pub fn export_csv(transactions: &[Transaction]) -> Result<ExportPayload, ExportError> {
    Ok(ExportPayload {
        file_name: CSV_FILE_NAME,
        mime_type: CSV_MIME_TYPE,
        content: encode_csv(transactions)?,
    })
}

pub fn export_json(transactions: &[Transaction]) -> Result<ExportPayload, ExportError> {
    Ok(ExportPayload {
        file_name: JSON_FILE_NAME,
        mime_type: JSON_MIME_TYPE,
        content: encode_json(transactions)?,
    })
}
