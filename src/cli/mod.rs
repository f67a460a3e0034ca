//! Command-line front end over [`SpendingEngine`].

pub mod handlers;
pub mod output;

use std::env;

use crate::{
    config::ConfigManager,
    core::{EngineOptions, SpendingEngine, SystemClock},
    errors::CliError,
    storage::JsonFileStore,
};

pub const USAGE: &str = "\
Usage: spend_tracker_cli <command> [args]

Commands:
  add <description> <amount>     Record a new spending transaction
  delete <id>                    Remove a transaction by id
  list                           List transactions, newest first
  analytics                      Month-to-date totals, projection and goals
  export csv|json [path]         Export to a file, or print when no path is given
  import <path>                  Replace all transactions from a .json or .csv file
  settings                       Show current settings
  settings set <key> <value>     Change a setting (currency, budget-warning,
                                 budget-period, income, save-target, save-period)
  version                        Show build information
  help                           Show this message";

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add { description: String, amount: f64 },
    Delete { id: String },
    List,
    Analytics,
    Export { format: String, path: Option<String> },
    Import { path: String },
    ShowSettings,
    SetSetting { key: String, value: String },
    Version,
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };
        match name.as_str() {
            "add" => {
                let Some((amount, words)) = rest.split_last() else {
                    return Err(missing("add <description> <amount>"));
                };
                if words.is_empty() {
                    return Err(missing("add <description> <amount>"));
                }
                let amount = amount
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| CliError::Input(format!("`{amount}` is not a number")))?;
                Ok(Command::Add {
                    description: words.join(" "),
                    amount,
                })
            }
            "delete" | "rm" => match rest {
                [id] => Ok(Command::Delete { id: id.clone() }),
                _ => Err(missing("delete <id>")),
            },
            "list" | "ls" => Ok(Command::List),
            "analytics" | "stats" => Ok(Command::Analytics),
            "export" => match rest {
                [format] => Ok(Command::Export {
                    format: format.to_ascii_lowercase(),
                    path: None,
                }),
                [format, path] => Ok(Command::Export {
                    format: format.to_ascii_lowercase(),
                    path: Some(path.clone()),
                }),
                _ => Err(missing("export csv|json [path]")),
            },
            "import" => match rest {
                [path] => Ok(Command::Import { path: path.clone() }),
                _ => Err(missing("import <path>")),
            },
            "settings" => match rest {
                [] => Ok(Command::ShowSettings),
                [set, key, value @ ..] if set == "set" => Ok(Command::SetSetting {
                    key: key.clone(),
                    value: value.join(" "),
                }),
                _ => Err(missing("settings set <key> <value>")),
            },
            "version" | "--version" | "-V" => Ok(Command::Version),
            "help" | "--help" | "-h" => Ok(Command::Help),
            other => Err(CliError::Input(format!(
                "unknown command `{other}` (try `help`)"
            ))),
        }
    }

    fn needs_engine(&self) -> bool {
        !matches!(self, Command::Help | Command::Version)
    }
}

fn missing(usage: &str) -> CliError {
    CliError::Input(format!("usage: spend_tracker_cli {usage}"))
}

/// Entry point used by the `spend_tracker_cli` binary.
pub fn run_cli() -> Result<(), CliError> {
    let args: Vec<String> = env::args().skip(1).collect();
    run_with_args(&args)
}

pub fn run_with_args(args: &[String]) -> Result<(), CliError> {
    let command = Command::parse(args)?;
    if !command.needs_engine() {
        return handlers::run_static(&command);
    }
    let mut engine = open_engine()?;
    handlers::dispatch(&mut engine, &command)
}

/// Builds an engine from the configuration in the app directory.
pub fn open_engine() -> Result<SpendingEngine, CliError> {
    let manager = ConfigManager::new()?;
    let config = manager.load()?;
    let store = JsonFileStore::new(Some(config.data_dir_or(manager.base_dir())))?;
    let options = EngineOptions {
        clock: Box::new(SystemClock),
        timezone: config.timezone(),
        import_policy: config.json_import_policy,
    };
    Ok(SpendingEngine::with_options(Box::new(store), options))
}
