use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::Local;

use crate::domain::error::Result;
use crate::domain::log_entry::{LogEntry, LogLevel};

/// Entries kept in memory for quick display
const MAX_BUFFERED_ENTRIES: usize = 100;

/// Append-only activity log shown to the user.
///
/// Entries are buffered in memory and, when opened with a file, appended to it
/// one line each. Every entry is mirrored to `tracing`.
pub struct ActivityLog {
    entries: Mutex<Vec<LogEntry>>,
    file: Option<Mutex<File>>,
    path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn in_memory() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            file: None,
            path: None,
        }
    }

    /// Open (or create) the log file in append mode
    pub fn with_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            entries: Mutex::new(Vec::new()),
            file: Some(Mutex::new(file)),
            path: Some(path),
        })
    }

    pub fn add_log_entry(&self, level: LogLevel, source: &str, message: &str) -> LogEntry {
        let entry = LogEntry {
            time: Local::now().format("%Y-%m-%d %H:%M:%S,%3f").to_string(),
            level,
            source: source.to_string(),
            message: message.to_string(),
        };

        match level {
            LogLevel::Debug => tracing::debug!(source, "{}", message),
            LogLevel::Info => tracing::info!(source, "{}", message),
            LogLevel::Warning => tracing::warn!(source, "{}", message),
            LogLevel::Error => tracing::error!(source, "{}", message),
        }

        if let Some(file) = &self.file {
            let mut file = lock(file);
            // A failed append must not abort the run that is being logged
            if let Err(err) = writeln!(file, "{}", entry.to_line()) {
                tracing::error!(error = %err, "Failed to append to activity log file");
            }
        }

        let mut entries = lock(&self.entries);
        entries.push(entry.clone());
        if entries.len() > MAX_BUFFERED_ENTRIES {
            entries.remove(0);
        }
        entry
    }

    pub fn add_log(&self, level: LogLevel, source: &str, message: &str) {
        self.add_log_entry(level, source, message);
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        lock(&self.entries).clone()
    }

    pub fn entries_at(&self, level: LogLevel) -> Vec<LogEntry> {
        lock(&self.entries)
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    /// Full log text: the file when there is one, otherwise the buffered entries
    pub fn read_contents(&self) -> Result<String> {
        match &self.path {
            Some(path) => {
                if let Some(file) = &self.file {
                    lock(file).flush()?;
                }
                Ok(std::fs::read_to_string(path)?)
            }
            None => Ok(lock(&self.entries)
                .iter()
                .map(|e| format!("{}\n", e.to_line()))
                .collect()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
