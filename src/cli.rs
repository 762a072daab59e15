//! Command-line interface module for renamelog.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Configuration and history store setup
//! - Dispatching reveal, rename, undo and log commands
//! - Rendering outcomes and errors

use crate::config::AppConfig;
use crate::controller::{RenameController, RenameError, RenameOutcome, UndoOutcome, validate_path};
use crate::history::HistoryStore;
use crate::output::OutputFormatter;
use crate::type_sniffer::TypeSniffer;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Rename files with undo history and reveal their real type.
#[derive(Debug, Parser)]
#[command(name = "renamelog", version, about)]
pub struct Cli {
    /// History database file (overrides configuration)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Configuration file to load
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Detect a file's type from its content
    Reveal {
        /// File to inspect
        path: PathBuf,
    },
    /// Rename a file and record the change
    Rename {
        /// File to rename
        path: PathBuf,
        /// New file name (with extension); prompted for when omitted
        new_name: Option<String>,
    },
    /// Revert the latest rename that produced this file's name
    Undo {
        /// File to restore
        path: PathBuf,
    },
    /// Show every recorded rename
    Log {
        /// Print the history as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create the history database
    Init,
}

/// Runs the CLI application with parsed arguments.
///
/// Resolves the history database location, makes sure the history table
/// exists and then executes the requested command.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use renamelog::cli::{Cli, run};
///
/// let cli = Cli::parse_from(["renamelog", "undo", "vacation.jpg"]);
/// if let Err(e) = run(&cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run(cli: &Cli) -> Result<(), String> {
    let config = AppConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let store = HistoryStore::new(config.database_path(cli.db.as_deref()));

    run_command(&cli.command, &store)
}

/// Executes a single command against `store`.
///
/// The store is initialized first on every call.
pub fn run_command(command: &Command, store: &HistoryStore) -> Result<(), String> {
    store
        .initialize()
        .map_err(|e| format!("Error opening history: {}", e))?;

    match command {
        Command::Reveal { path } => reveal(path),
        Command::Rename { path, new_name } => {
            let new_name = match new_name {
                Some(name) => Some(name.clone()),
                None => {
                    // No point asking for a name for a file that isn't there.
                    validate_path(path).map_err(|e| e.to_string())?;
                    prompt_for_name().map_err(|e| format!("Error reading new name: {}", e))?
                }
            };
            rename(store, path, new_name.as_deref())
        }
        Command::Undo { path } => undo(store, path),
        Command::Log { json } => show_log(store, *json),
        Command::Init => {
            OutputFormatter::success(&format!(
                "History database ready at {}",
                store.path().display()
            ));
            Ok(())
        }
    }
}

fn reveal(path: &Path) -> Result<(), String> {
    let label = TypeSniffer::detect(path).map_err(|e| e.to_string())?;

    OutputFormatter::plain(&format!("The detected file extension is: {}", label));
    if let Some(mime) = label.mime() {
        OutputFormatter::info(&format!("MIME type: {}", mime));
    }
    Ok(())
}

fn rename(store: &HistoryStore, path: &Path, new_name: Option<&str>) -> Result<(), String> {
    let controller = RenameController::new(store.clone());

    match controller.rename(path, new_name) {
        Ok(RenameOutcome::Renamed { new_path, .. }) => {
            OutputFormatter::success(&format!("File renamed to: {}", new_path.display()));
            Ok(())
        }
        Ok(RenameOutcome::Cancelled) => {
            OutputFormatter::info("File not renamed.");
            Ok(())
        }
        Err(RenameError::HistoryWriteFailed { new_path, source }) => {
            OutputFormatter::warning(&format!("File renamed to: {}", new_path.display()));
            Err(format!(
                "Could not save history, this rename cannot be undone: {}",
                source
            ))
        }
        Err(e) => Err(e.to_string()),
    }
}

fn undo(store: &HistoryStore, path: &Path) -> Result<(), String> {
    let controller = RenameController::new(store.clone());

    match controller.undo(path).map_err(|e| e.to_string())? {
        UndoOutcome::Restored { restored_path, .. } => {
            OutputFormatter::success(&format!(
                "Undo: File reverted to original path: {}",
                restored_path.display()
            ));
        }
        UndoOutcome::NoHistory => {
            OutputFormatter::info("No renaming operation to undo.");
        }
    }
    Ok(())
}

fn show_log(store: &HistoryStore, json: bool) -> Result<(), String> {
    let records = store
        .list_all()
        .map_err(|e| format!("Error reading history: {}", e))?;

    if json {
        let rendered = serde_json::to_string_pretty(&records)
            .map_err(|e| format!("Error formatting history: {}", e))?;
        OutputFormatter::plain(&rendered);
    } else {
        OutputFormatter::history(&records);
    }
    Ok(())
}

/// Asks for a new name on stdin. A blank answer means "don't rename".
fn prompt_for_name() -> io::Result<Option<String>> {
    print!("Enter the desired file name (with extension), or leave blank to cancel: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let name = line.trim();
    Ok((!name.is_empty()).then(|| name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_rename_with_name() {
        let cli = Cli::parse_from(["renamelog", "rename", "photo", "vacation.jpg"]);
        match cli.command {
            Command::Rename { path, new_name } => {
                assert_eq!(path, PathBuf::from("photo"));
                assert_eq!(new_name.as_deref(), Some("vacation.jpg"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_db_after_subcommand() {
        let cli = Cli::parse_from(["renamelog", "log", "--json", "--db", "names.db"]);
        assert_eq!(cli.db, Some(PathBuf::from("names.db")));
        assert!(matches!(cli.command, Command::Log { json: true }));
    }

    #[test]
    fn test_rename_missing_file_fails_before_prompting() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let store = HistoryStore::new(temp_dir.path().join("log.db"));
        let command = Command::Rename {
            path: temp_dir.path().join("missing"),
            new_name: None,
        };

        // Would block on stdin if the prompt were reached.
        let result = run_command(&command, &store);

        let message = result.expect_err("missing file should be rejected");
        assert!(message.starts_with("Invalid file path"));
    }

    #[test]
    fn test_parse_rename_without_name() {
        let cli = Cli::parse_from(["renamelog", "rename", "photo"]);
        assert!(matches!(cli.command, Command::Rename { new_name: None, .. }));
    }
}
