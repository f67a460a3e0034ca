use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    errors::ImportError,
    ledger::{new_id, parse_timestamp, Transaction},
};

use super::{Decoded, FieldIssue, ImportFormat, ImportPolicy, ImportReport};

/// Validation result for one element of an imported JSON array.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Valid(Transaction),
    /// Usable only after substituting defaults for the listed fields.
    Coerced {
        transaction: Transaction,
        issues: Vec<FieldIssue>,
    },
}

impl RecordOutcome {
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            RecordOutcome::Valid(_) => &[],
            RecordOutcome::Coerced { issues, .. } => issues,
        }
    }

    pub fn is_acceptable(&self, policy: ImportPolicy) -> bool {
        match policy {
            ImportPolicy::Lenient => true,
            ImportPolicy::Strict => !self.issues().iter().any(|issue| issue.is_fatal()),
        }
    }

    pub fn into_transaction(self) -> Transaction {
        match self {
            RecordOutcome::Valid(transaction) | RecordOutcome::Coerced { transaction, .. } => {
                transaction
            }
        }
    }
}

/// Pretty-printed array with fields in `id, description, amount, timestamp` order.
pub fn encode_json(transactions: &[Transaction]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(transactions)
}

/// Parses a JSON array of transactions. Anything other than an array fails
/// the whole import.
pub fn decode_json(
    text: &str,
    policy: ImportPolicy,
    now: DateTime<FixedOffset>,
) -> Result<Decoded, ImportError> {
    let Value::Array(items) = serde_json::from_str::<Value>(text)? else {
        return Err(ImportError::NotAnArray);
    };
    let mut report = ImportReport::new(ImportFormat::Json);
    let mut transactions = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let record = index + 1;
        let outcome = validate_record(item, now);
        for issue in outcome.issues() {
            report.note(record, *issue);
        }
        if outcome.is_acceptable(policy) {
            transactions.push(outcome.into_transaction());
            report.accepted += 1;
        } else {
            debug!(record, "dropping JSON record under strict import policy");
            report.skipped += 1;
        }
    }

    Ok(Decoded {
        transactions,
        report,
    })
}

/// Coerces one JSON value into a transaction, recording every substitution.
pub fn validate_record(value: &Value, now: DateTime<FixedOffset>) -> RecordOutcome {
    let empty = Map::new();
    let mut issues = Vec::new();
    let fields = match value {
        Value::Object(fields) => fields,
        _ => {
            issues.push(FieldIssue::NotAnObject);
            &empty
        }
    };

    let id = match fields.get("id").and_then(scalar_text) {
        Some(id) if !id.is_empty() => id,
        _ => {
            issues.push(FieldIssue::MissingId);
            new_id()
        }
    };

    let description = match fields.get("description") {
        Some(Value::String(text)) => text.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => {
            issues.push(FieldIssue::DescriptionNotText);
            scalar_text(other).unwrap_or_else(|| other.to_string())
        }
    };
    if description.trim().is_empty() {
        issues.push(FieldIssue::MissingDescription);
    }

    let amount = fields
        .get("amount")
        .and_then(coerce_number)
        .filter(|amount| amount.is_finite())
        .unwrap_or(f64::NAN);
    if amount.is_nan() {
        issues.push(FieldIssue::AmountNotNumeric);
    } else if amount <= 0.0 {
        issues.push(FieldIssue::AmountNotPositive);
    }

    let timestamp = match fields.get("timestamp") {
        None | Some(Value::Null) => {
            issues.push(FieldIssue::MissingTimestamp);
            now
        }
        Some(Value::String(raw)) if raw.trim().is_empty() => {
            issues.push(FieldIssue::MissingTimestamp);
            now
        }
        Some(raw) => coerce_timestamp(raw).unwrap_or_else(|| {
            issues.push(FieldIssue::InvalidTimestamp);
            now
        }),
    };

    let transaction = Transaction::with_id(id, description, amount, timestamp);
    if issues.is_empty() {
        RecordOutcome::Valid(transaction)
    } else {
        RecordOutcome::Coerced {
            transaction,
            issues,
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Strings are parsed as instants; numbers are epoch milliseconds.
fn coerce_timestamp(value: &Value) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::String(raw) => parse_timestamp(raw),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .map(Into::into),
        _ => None,
    }
}
