/// Rename and undo orchestration.
///
/// A rename is a two-step sequence: the file-system rename, then a history
/// write. The two are not transactional. If the history write fails after
/// the file has moved, the rename is not rolled back; the caller receives
/// [`RenameError::HistoryWriteFailed`] carrying the file's new path.
///
/// Undo looks up the file's current base name in the history and renames
/// it back to the recorded original. Records are never consumed.
use crate::history::{HistoryStore, RecordId, RenameRecord, StoreError};
use crate::paths::trim_path;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Successful results of a rename request.
#[derive(Debug, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The file was renamed and the rename recorded.
    Renamed {
        new_path: PathBuf,
        record_id: RecordId,
    },
    /// No new name was supplied; nothing was touched.
    Cancelled,
}

/// Successful results of an undo request.
#[derive(Debug, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The file was renamed back to its recorded original name.
    Restored {
        restored_path: PathBuf,
        record: RenameRecord,
    },
    /// No history entry matches the file's current name.
    NoHistory,
}

/// Errors that can occur while renaming or undoing.
#[derive(Debug, Error)]
pub enum RenameError {
    /// The path is empty, does not exist, or is not a regular file.
    #[error("Invalid file path: {}", path.display())]
    InvalidPath { path: PathBuf },
    /// The requested name is not a plain file name.
    #[error("Invalid file name '{name}': expected a name without directory components")]
    InvalidName { name: String },
    /// The file-system rename itself failed.
    #[error("Failed to rename {} to {}: {source}", from.display(), to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The history store could not be queried.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
    /// The file was renamed but the history write failed.
    #[error("File renamed to {} but history was not saved: {source}", new_path.display())]
    HistoryWriteFailed {
        new_path: PathBuf,
        #[source]
        source: StoreError,
    },
}

/// Result type for controller operations.
pub type RenameResult<T> = Result<T, RenameError>;

/// Runs renames and undos against a history store.
#[derive(Debug, Clone)]
pub struct RenameController {
    store: HistoryStore,
}

impl RenameController {
    pub fn new(store: HistoryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Renames the file at `path` to `new_name` within the same directory.
    ///
    /// `None` or a blank name is a cancellation, not an error. On success
    /// the rename is appended to the history.
    ///
    /// # Errors
    ///
    /// * `InvalidPath` - `path` is empty or not an existing regular file
    /// * `InvalidName` - `new_name` contains directory components
    /// * `RenameFailed` - the target exists or the OS rejected the rename
    /// * `HistoryWriteFailed` - the rename happened but was not recorded
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use renamelog::controller::{RenameController, RenameOutcome};
    /// use renamelog::history::HistoryStore;
    /// use std::path::Path;
    ///
    /// let controller = RenameController::new(HistoryStore::new("log.db"));
    /// match controller.rename(Path::new("photo"), Some("vacation.jpg")) {
    ///     Ok(RenameOutcome::Renamed { new_path, .. }) => println!("File renamed to: {}", new_path.display()),
    ///     Ok(RenameOutcome::Cancelled) => println!("File not renamed."),
    ///     Err(e) => eprintln!("{}", e),
    /// }
    /// ```
    pub fn rename(&self, path: &Path, new_name: Option<&str>) -> RenameResult<RenameOutcome> {
        let path = validate_path(path)?;

        let Some(new_name) = new_name.map(str::trim).filter(|name| !name.is_empty()) else {
            return Ok(RenameOutcome::Cancelled);
        };
        validate_name(new_name)?;

        let original_name = base_name(&path)?;
        let new_path = path.with_file_name(new_name);

        rename_file(&path, &new_path)?;
        info!(from = %path.display(), to = %new_path.display(), "renamed file");

        match self.store.append(&original_name, new_name) {
            Ok(record_id) => Ok(RenameOutcome::Renamed {
                new_path,
                record_id,
            }),
            Err(source) => {
                warn!(
                    path = %new_path.display(),
                    error = %source,
                    "rename committed but history write failed"
                );
                Err(RenameError::HistoryWriteFailed { new_path, source })
            }
        }
    }

    /// Reverses the latest rename that produced the current name of `path`.
    ///
    /// Returns [`UndoOutcome::NoHistory`] without touching the file system
    /// when the history has no matching entry.
    pub fn undo(&self, path: &Path) -> RenameResult<UndoOutcome> {
        let path = validate_path(path)?;
        let renamed_name = base_name(&path)?;

        let Some(record) = self.store.find_latest_by_renamed_name(&renamed_name)? else {
            return Ok(UndoOutcome::NoHistory);
        };

        let restored_path = path.with_file_name(&record.original_name);
        rename_file(&path, &restored_path)?;
        info!(
            from = %path.display(),
            to = %restored_path.display(),
            record = record.id,
            "undid rename"
        );

        Ok(UndoOutcome::Restored {
            restored_path,
            record,
        })
    }
}

/// Trims the caller's path and checks it names an existing regular file.
pub fn validate_path(path: &Path) -> RenameResult<PathBuf> {
    let trimmed = trim_path(path);
    if trimmed.as_os_str().is_empty() || !trimmed.is_file() {
        return Err(RenameError::InvalidPath {
            path: path.to_path_buf(),
        });
    }
    Ok(trimmed)
}

/// Accepts only a single normal path component.
fn validate_name(name: &str) -> RenameResult<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        _ => Err(RenameError::InvalidName {
            name: name.to_string(),
        }),
    }
}

fn base_name(path: &Path) -> RenameResult<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| RenameError::InvalidPath {
            path: path.to_path_buf(),
        })
}

/// Renames `from` to `to`, refusing to overwrite an existing target.
///
/// The existence check and the rename are not atomic.
fn rename_file(from: &Path, to: &Path) -> RenameResult<()> {
    let failed = |source: io::Error| RenameError::RenameFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if to.symlink_metadata().is_ok() {
        return Err(failed(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "target already exists",
        )));
    }

    fs::rename(from, to).map_err(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, RenameController) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = HistoryStore::new(temp_dir.path().join("log.db"));
        store.initialize().expect("Failed to initialize store");
        (temp_dir, RenameController::new(store))
    }

    #[test]
    fn test_rename_records_history() {
        let (temp_dir, controller) = setup();
        let file_path = temp_dir.path().join("photo");
        fs::write(&file_path, [0xFF, 0xD8, 0xFF, 0xE0]).expect("Failed to write file");

        let outcome = controller
            .rename(&file_path, Some("vacation.jpg"))
            .expect("Rename failed");

        let expected = temp_dir.path().join("vacation.jpg");
        assert!(matches!(
            &outcome,
            RenameOutcome::Renamed { new_path, .. } if *new_path == expected
        ));
        assert!(!file_path.exists());
        assert!(expected.exists());

        let records = controller.store().list_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].original_name, "photo");
        assert_eq!(records[0].renamed_name, "vacation.jpg");
    }

    #[test]
    fn test_rename_without_name_is_cancelled() {
        let (temp_dir, controller) = setup();
        let file_path = temp_dir.path().join("keep.txt");
        fs::write(&file_path, "data").expect("Failed to write file");

        assert_eq!(
            controller.rename(&file_path, None).unwrap(),
            RenameOutcome::Cancelled
        );
        assert_eq!(
            controller.rename(&file_path, Some("   ")).unwrap(),
            RenameOutcome::Cancelled
        );
        assert!(file_path.exists());
        assert!(controller.store().list_all().unwrap().is_empty());
    }

    #[test]
    fn test_rename_invalid_path() {
        let (temp_dir, controller) = setup();

        assert!(matches!(
            controller.rename(Path::new(""), Some("x")),
            Err(RenameError::InvalidPath { .. })
        ));
        assert!(matches!(
            controller.rename(&temp_dir.path().join("missing"), Some("x")),
            Err(RenameError::InvalidPath { .. })
        ));
        // Directories are not renamed.
        assert!(matches!(
            controller.rename(temp_dir.path(), Some("x")),
            Err(RenameError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_rename_rejects_names_with_directories() {
        let (temp_dir, controller) = setup();
        let file_path = temp_dir.path().join("a.txt");
        fs::write(&file_path, "data").expect("Failed to write file");

        for name in ["sub/b.txt", "..", ".", "/abs.txt"] {
            assert!(
                matches!(
                    controller.rename(&file_path, Some(name)),
                    Err(RenameError::InvalidName { .. })
                ),
                "{name} should be rejected"
            );
        }
        assert!(file_path.exists());
    }

    #[test]
    fn test_rename_refuses_existing_target() {
        let (temp_dir, controller) = setup();
        let file_path = temp_dir.path().join("a.txt");
        let target = temp_dir.path().join("b.txt");
        fs::write(&file_path, "a").expect("Failed to write file");
        fs::write(&target, "b").expect("Failed to write file");

        let result = controller.rename(&file_path, Some("b.txt"));

        assert!(matches!(result, Err(RenameError::RenameFailed { .. })));
        assert_eq!(fs::read_to_string(&target).unwrap(), "b");
        assert!(file_path.exists());
        assert!(controller.store().list_all().unwrap().is_empty());
    }

    #[test]
    fn test_history_write_failure_keeps_rename() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let broken = HistoryStore::new(temp_dir.path().join("no_such_dir").join("log.db"));
        let controller = RenameController::new(broken);

        let file_path = temp_dir.path().join("a.txt");
        fs::write(&file_path, "a").expect("Failed to write file");

        let result = controller.rename(&file_path, Some("b.txt"));

        let expected = temp_dir.path().join("b.txt");
        match result {
            Err(RenameError::HistoryWriteFailed { new_path, .. }) => {
                assert_eq!(new_path, expected)
            }
            other => panic!("expected HistoryWriteFailed, got {:?}", other),
        }
        assert!(expected.exists());
        assert!(!file_path.exists());
    }

    #[test]
    fn test_undo_round_trip() {
        let (temp_dir, controller) = setup();
        let file_path = temp_dir.path().join("photo");
        fs::write(&file_path, "content").expect("Failed to write file");

        controller.rename(&file_path, Some("vacation.jpg")).unwrap();
        let renamed = temp_dir.path().join("vacation.jpg");

        let outcome = controller.undo(&renamed).expect("Undo failed");

        match outcome {
            UndoOutcome::Restored {
                restored_path,
                record,
            } => {
                assert_eq!(restored_path, file_path);
                assert_eq!(record.original_name, "photo");
            }
            UndoOutcome::NoHistory => panic!("expected a restore"),
        }
        assert!(file_path.exists());
        assert!(!renamed.exists());
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "content");
    }

    #[test]
    fn test_undo_without_history() {
        let (temp_dir, controller) = setup();
        let file_path = temp_dir.path().join("neverexisted.txt");
        fs::write(&file_path, "x").expect("Failed to write file");

        assert_eq!(controller.undo(&file_path).unwrap(), UndoOutcome::NoHistory);
        assert!(file_path.exists());
    }

    #[test]
    fn test_undo_does_not_consume_record() {
        let (temp_dir, controller) = setup();
        let file_path = temp_dir.path().join("a.txt");
        fs::write(&file_path, "x").expect("Failed to write file");

        controller.rename(&file_path, Some("b.txt")).unwrap();
        controller.undo(&temp_dir.path().join("b.txt")).unwrap();

        // The file is back at a.txt; nothing was ever renamed to a.txt.
        assert_eq!(controller.undo(&file_path).unwrap(), UndoOutcome::NoHistory);
        assert_eq!(controller.store().list_all().unwrap().len(), 1);
        assert!(
            controller
                .store()
                .find_latest_by_renamed_name("b.txt")
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_undo_uses_latest_record() {
        let (temp_dir, controller) = setup();
        controller.store().append("old.txt", "x.txt").unwrap();
        controller.store().append("newer.txt", "x.txt").unwrap();

        let file_path = temp_dir.path().join("x.txt");
        fs::write(&file_path, "x").expect("Failed to write file");

        controller.undo(&file_path).unwrap();

        assert!(temp_dir.path().join("newer.txt").exists());
        assert!(!temp_dir.path().join("old.txt").exists());
    }

    #[test]
    fn test_undo_refuses_existing_original() {
        let (temp_dir, controller) = setup();
        controller.store().append("a.txt", "b.txt").unwrap();
        fs::write(temp_dir.path().join("a.txt"), "occupied").unwrap();
        let file_path = temp_dir.path().join("b.txt");
        fs::write(&file_path, "renamed").unwrap();

        let result = controller.undo(&file_path);

        assert!(matches!(result, Err(RenameError::RenameFailed { .. })));
        assert!(file_path.exists());
    }

    #[test]
    fn test_undo_with_unavailable_store() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let controller =
            RenameController::new(HistoryStore::new(temp_dir.path().join("nope").join("log.db")));
        let file_path = temp_dir.path().join("a.txt");
        fs::write(&file_path, "x").expect("Failed to write file");

        assert!(matches!(
            controller.undo(&file_path),
            Err(RenameError::StoreUnavailable(_))
        ));
        assert!(file_path.exists());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("vacation.jpg").is_ok());
        assert!(validate_name("no extension").is_ok());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("./a").is_err());
    }
}
