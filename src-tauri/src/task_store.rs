// Persistence for the single daily task
// The task lives in $DATA_DIR/current-task.json and is only valid on the day it was written

use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// The one persisted task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(rename = "task")]
    pub text: String,
    /// Local calendar date the task belongs to, serialized as yyyy-MM-dd
    pub date: NaiveDate,
    pub created_at: DateTime<FixedOffset>,
}

impl TaskRecord {
    /// Record for `text` created now, without touching disk
    pub fn created_now(text: &str) -> Self {
        let now = Local::now().fixed_offset();
        Self {
            text: text.trim().to_string(),
            date: now.date_naive(),
            created_at: now,
        }
    }

    pub fn is_for(&self, day: NaiveDate) -> bool {
        self.date == day
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task text is empty")]
    EmptyTask,
    #[error("failed to {action} task file {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse task file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize task: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StoreError {
    fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Single-record store for the current task.
///
/// The infallible methods (`load`, `save`, `clear`) log failures and carry on;
/// the `try_*` variants expose the error and take an explicit clock.
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load today's task, removing a stale one
    pub fn load(&self) -> Option<TaskRecord> {
        match self.try_load_on(Local::now().date_naive()) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Error loading task");
                None
            }
        }
    }

    /// Persist `text` as today's task
    pub fn save(&self, text: &str) -> Option<TaskRecord> {
        match self.try_save_at(text, Local::now().fixed_offset()) {
            Ok(record) => {
                tracing::info!(task = %record.text, date = %record.date, "Task saved");
                Some(record)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error saving task");
                None
            }
        }
    }

    /// Remove the stored task if there is one
    pub fn clear(&self) {
        if let Err(e) = self.try_clear() {
            tracing::warn!(error = %e, "Error clearing task");
        }
    }

    /// Load the record valid on `today`.
    ///
    /// A record for any other day is deleted and reported as absent. A file
    /// that cannot be parsed is left untouched.
    pub fn try_load_on(&self, today: NaiveDate) -> Result<Option<TaskRecord>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io("read", &self.path, e)),
        };

        let record: TaskRecord =
            serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        if !record.is_for(today) {
            tracing::debug!(stored = %record.date, %today, "Removing stale task");
            self.try_clear()?;
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Build and write a record for the day of `now`, overwriting any existing one
    pub fn try_save_at(
        &self,
        text: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<TaskRecord, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::EmptyTask);
        }

        let record = TaskRecord {
            text: text.to_string(),
            date: now.date_naive(),
            created_at: now,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io("create directory for", &self.path, e))?;
        }

        let contents = serde_json::to_string_pretty(&record).map_err(StoreError::Serialize)?;
        atomic_write(&self.path, &contents)?;

        Ok(record)
    }

    pub fn try_clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io("remove", &self.path, e)),
        }
    }
}

/// Write via a temp file in the same directory and rename over the target
pub fn atomic_write(path: &Path, contents: &str) -> Result<(), StoreError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown"),
        std::process::id()
    ));

    fs::write(&temp_path, contents).map_err(|e| StoreError::io("write", &temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| StoreError::io("replace", path, e))?;

    Ok(())
}
