//! renamelog - rename files with a reversible history
//!
//! This library renames files while recording each change in a SQLite
//! ledger so the rename can be undone later, and detects a file's real
//! type from its leading bytes rather than its extension.

pub mod cli;
pub mod config;
pub mod controller;
pub mod history;
pub mod output;
pub mod paths;
pub mod type_sniffer;

pub use config::{AppConfig, ConfigError};
pub use controller::{RenameController, RenameError, RenameOutcome, UndoOutcome};
pub use history::{HistoryStore, RenameRecord, StoreError};
pub use type_sniffer::{SniffError, TypeLabel, TypeSniffer};

pub use cli::{Cli, Command, run, run_command};
