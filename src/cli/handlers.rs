use std::{fs, path::Path};

use tracing::info;

use crate::{
    analytics::{BudgetState, SavingsStatus},
    codec::{ExportPayload, ImportReport},
    core::SpendingEngine,
    currency::format_amount,
    errors::CliError,
    ledger::{format_timestamp, Settings},
    utils::build_info,
};

use super::{output, Command, USAGE};

/// Commands that never touch stored data.
pub fn run_static(command: &Command) -> Result<(), CliError> {
    match command {
        Command::Version => println!("{}", build_info::current().summary()),
        _ => println!("{USAGE}"),
    }
    Ok(())
}

pub fn dispatch(engine: &mut SpendingEngine, command: &Command) -> Result<(), CliError> {
    match command {
        Command::Add {
            description,
            amount,
        } => add(engine, description, *amount),
        Command::Delete { id } => delete(engine, id),
        Command::List => {
            list(engine);
            Ok(())
        }
        Command::Analytics => {
            analytics(engine);
            Ok(())
        }
        Command::Export { format, path } => export(engine, format, path.as_deref()),
        Command::Import { path } => import(engine, path),
        Command::ShowSettings => {
            show_settings(engine.settings());
            Ok(())
        }
        Command::SetSetting { key, value } => {
            let settings = engine.update_setting(key, value)?;
            output::success(format!("Updated {key}."));
            show_settings(settings);
            Ok(())
        }
        Command::Help | Command::Version => run_static(command),
    }
}

fn add(engine: &mut SpendingEngine, description: &str, amount: f64) -> Result<(), CliError> {
    let added = engine.add_transaction(description, amount)?;
    let currency = &engine.settings().currency;
    output::success(format!(
        "Added {} ({}) [{}]",
        added.description,
        format_amount(added.amount, currency),
        added.id
    ));
    if let Some(status) = engine.budget_status() {
        if status.is_over() {
            output::warning(format!(
                "Over your {} budget: spent {} of {}.",
                status.period.as_str(),
                format_amount(status.spent, currency),
                format_amount(status.limit, currency)
            ));
        }
    }
    Ok(())
}

fn delete(engine: &mut SpendingEngine, id: &str) -> Result<(), CliError> {
    if engine.remove_transaction(id)? {
        output::success(format!("Deleted {id}."));
    } else {
        output::warning(format!("No transaction with id {id}."));
    }
    Ok(())
}

fn list(engine: &SpendingEngine) {
    if engine.ledger().is_empty() {
        output::info("No transactions yet.");
        return;
    }
    let currency = &engine.settings().currency;
    for txn in engine.ledger() {
        println!(
            "{}  {}  {:<30} {:>14}",
            txn.id,
            format_timestamp(&txn.timestamp),
            txn.description,
            format_amount(txn.amount, currency)
        );
    }
}

fn analytics(engine: &SpendingEngine) {
    let summary = engine.analytics_summary();
    let currency = &engine.settings().currency;
    let projection = &summary.projection;

    output::section("Analytics");
    output::field(
        "As of",
        format!("{} ({})", format_timestamp(&engine.now()), engine.timezone()),
    );
    output::field("Entries", summary.entries);
    output::field("Month to date", format_amount(projection.month_to_date, currency));
    output::field(
        "Daily average",
        format!(
            "{} over {} days",
            format_amount(projection.daily_average, currency),
            projection.days_elapsed
        ),
    );
    output::field(
        "Projected month",
        format!(
            "{} ({} days)",
            format_amount(projection.projected, currency),
            projection.days_in_month
        ),
    );

    match engine.budget_status() {
        Some(status) => {
            let message = format!(
                "{} budget: spent {} of {}",
                status.period.label(),
                format_amount(status.spent, currency),
                format_amount(status.limit, currency)
            );
            match status.state {
                BudgetState::Within => output::success(format!("Within budget. {message}")),
                BudgetState::Over => output::warning(format!("Over budget. {message}")),
            }
        }
        None => output::info("No budget warning configured."),
    }

    match engine.savings_status() {
        SavingsStatus::InsufficientConfiguration => {
            output::info("Set income and save-target to track a savings goal.")
        }
        SavingsStatus::OnTrack(progress) => output::success(format!(
            "On track to save {} this {}: spent {} of {} allowed.",
            format_amount(progress.target_save, currency),
            progress.period.as_str(),
            format_amount(progress.spent, currency),
            format_amount(progress.allowed, currency)
        )),
        SavingsStatus::Overspend(progress) => output::warning(format!(
            "Overspending this {}: spent {} of {} allowed.",
            progress.period.as_str(),
            format_amount(progress.spent, currency),
            format_amount(progress.allowed, currency)
        )),
    }

    if !summary.series.is_empty() {
        output::section("Daily totals");
        for bucket in &summary.series {
            output::field(&bucket.date.to_string(), format_amount(bucket.amount, currency));
        }
    }
}

fn export(engine: &SpendingEngine, format: &str, path: Option<&str>) -> Result<(), CliError> {
    let payload: ExportPayload = match format {
        "csv" => engine.export_csv()?,
        "json" => engine.export_json()?,
        other => {
            return Err(CliError::Input(format!(
                "unknown export format `{other}` (expected csv or json)"
            )))
        }
    };
    match path {
        Some(path) => {
            fs::write(path, &payload.content)?;
            info!(path, mime = payload.mime_type, "export written");
            output::success(format!(
                "Exported {} transactions to {path}.",
                engine.ledger().len()
            ));
        }
        None => println!("{}", payload.content),
    }
    Ok(())
}

fn import(engine: &mut SpendingEngine, path: &str) -> Result<(), CliError> {
    let text = fs::read_to_string(path)?;
    let file_name = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path);
    let report = engine.import_file(file_name, &text)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &ImportReport) {
    output::success(format!(
        "Imported {} transactions from {}.",
        report.accepted, report.format
    ));
    if report.skipped > 0 {
        output::warning(format!("Skipped {} unusable records.", report.skipped));
    }
    for issue in &report.issues {
        output::warning(format!("record {}: {}", issue.record, issue.issue));
    }
}

fn show_settings(settings: &Settings) {
    let optional = |value: Option<f64>| match value {
        Some(value) => value.to_string(),
        None => "not set".to_string(),
    };
    output::section("Settings");
    output::field("currency", &settings.currency);
    output::field("budget-warning", optional(settings.budget_warning));
    output::field("budget-period", settings.budget_period);
    output::field("income", optional(settings.income));
    output::field(
        "save-target",
        match settings.save_target {
            Some(target) => format!("{target}%"),
            None => "not set".to_string(),
        },
    );
    output::field("save-period", settings.save_period);
}
