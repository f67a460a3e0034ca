use ::csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::{
    errors::{ExportError, ImportError},
    ledger::{format_timestamp, parse_timestamp, Transaction},
};

use super::{Decoded, FieldIssue, ImportFormat, ImportReport};

pub const CSV_HEADER: &str = "description,amount,timestamp";

/// Quotes a field when it contains a comma, a double quote or a line break,
/// doubling any embedded quotes. Agrees with what [`encode_csv`] writes.
pub fn csv_escape(field: &str) -> String {
    if field.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Header plus one row per transaction in ledger order, joined by `\n`,
/// without a trailing newline.
pub fn encode_csv(transactions: &[Transaction]) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER.split(','))?;
    for txn in transactions {
        let amount = txn.amount.to_string();
        let timestamp = format_timestamp(&txn.timestamp);
        writer.write_record([txn.description.as_str(), amount.as_str(), timestamp.as_str()])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ::csv::Error::from(err.into_error()))?;
    let mut out = String::from_utf8(bytes)?;
    if out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

/// Parses `description,amount,timestamp` rows after a header line.
///
/// Rows without a description or with an amount that is not a finite number
/// are skipped and reported; they never fail the import.
pub fn decode_csv(text: &str, now: DateTime<FixedOffset>) -> Result<Decoded, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.trim().as_bytes());
    let mut report = ImportReport::new(ImportFormat::Csv);
    let mut transactions = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = index + 1;

        let description = record.get(0).unwrap_or("");
        if description.is_empty() {
            report.skipped += 1;
            report.note(row, FieldIssue::MissingDescription);
            continue;
        }

        let amount = match record
            .get(1)
            .map(str::trim)
            .and_then(|raw| raw.parse::<f64>().ok())
        {
            Some(amount) if amount.is_finite() => amount,
            _ => {
                debug!(row, "skipping CSV row with unreadable amount");
                report.skipped += 1;
                report.note(row, FieldIssue::AmountNotNumeric);
                continue;
            }
        };
        if amount <= 0.0 {
            report.note(row, FieldIssue::AmountNotPositive);
        }

        let timestamp = match record.get(2).map(str::trim).filter(|raw| !raw.is_empty()) {
            None => {
                report.note(row, FieldIssue::MissingTimestamp);
                now
            }
            Some(raw) => parse_timestamp(raw).unwrap_or_else(|| {
                report.note(row, FieldIssue::InvalidTimestamp);
                now
            }),
        };

        transactions.push(Transaction::new(description, amount, timestamp));
        report.accepted += 1;
    }

    Ok(Decoded {
        transactions,
        report,
    })
}
