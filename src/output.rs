//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output so the rest of the
//! crate never prints directly.

use crate::history::RenameRecord;
use colored::*;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - The rename history listing
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use renamelog::output::OutputFormatter;
    /// OutputFormatter::success("File renamed to: vacation.jpg");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("{}", header.bold());
    }

    /// Formats one history entry as `original -> renamed`.
    pub fn record_line(record: &RenameRecord) -> String {
        format!("{} -> {}", record.original_name, record.renamed_name)
    }

    /// Prints the rename history, oldest first.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use renamelog::history::RenameRecord;
    /// use renamelog::output::OutputFormatter;
    ///
    /// OutputFormatter::history(&[RenameRecord {
    ///     id: 1,
    ///     original_name: "photo".to_string(),
    ///     renamed_name: "vacation.jpg".to_string(),
    /// }]);
    /// ```
    pub fn history(records: &[RenameRecord]) {
        if records.is_empty() {
            Self::info("No changes in the log.");
            return;
        }

        Self::header("Changes in the log:");
        for record in records {
            Self::plain(&Self::record_line(record));
        }
    }
}
