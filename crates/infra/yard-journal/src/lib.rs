//! Append-only JSONL journal of mount attempts.
//!
//! Every finished attempt becomes one line in a daily file
//! (`mount_log_YYYY-MM-DD.jsonl`), appended under an exclusive file lock so
//! concurrent `yard` processes never interleave records. Set
//! `MOUNTING_YARD_JOURNAL_DISABLED=1` to turn writes into no-ops.

use chrono::{DateTime, NaiveDate, Utc};

// Re-export chrono types for downstream crates
pub use chrono;
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

pub const DISABLE_ENV: &str = "MOUNTING_YARD_JOURNAL_DISABLED";

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How an attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Mounted,
    Failed,
    AlreadyMounted,
    OpenedExternally,
    /// Rejected before a request was issued
    Rejected,
    /// Gave up waiting; the request may still complete later
    TimedOut,
}

/// One journal line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountRecord {
    pub record_id: String,
    /// Endpoint name
    pub endpoint: String,
    /// URI scheme of the address, lowercased; empty if it did not parse
    pub scheme: String,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u128,
}

/// Check if the journal is disabled via environment variable.
pub fn journal_disabled() -> bool {
    match std::env::var(DISABLE_ENV) {
        Ok(v) => matches!(v.as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => false,
    }
}

/// Measures one attempt from the moment the user asked for it
pub struct AttemptTimer {
    pub record_id: String,
    pub started_at: DateTime<Utc>,
    start_instant: std::time::Instant,
}

impl AttemptTimer {
    pub fn start() -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            start_instant: std::time::Instant::now(),
        }
    }

    /// Close the attempt and build its record
    pub fn finish(
        self,
        endpoint: impl Into<String>,
        scheme: impl Into<String>,
        outcome: AttemptOutcome,
    ) -> MountRecord {
        MountRecord {
            record_id: self.record_id,
            endpoint: endpoint.into(),
            scheme: scheme.into(),
            outcome,
            status: None,
            mount_path: None,
            started_at: self.started_at,
            completed_at: Utc::now(),
            duration_ms: self.start_instant.elapsed().as_millis(),
        }
    }
}

impl MountRecord {
    pub fn with_status(mut self, status: i32) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_mount_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.mount_path = Some(path.into());
        self
    }
}

/// Appends records to, and reads them back from, a journal directory
pub struct JournalWriter {
    dir: PathBuf,
}

impl JournalWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn day_file_name(date: NaiveDate) -> String {
        date.format("mount_log_%Y-%m-%d.jsonl").to_string()
    }

    pub fn day_file(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(Self::day_file_name(date))
    }

    /// Append a record to the file for its completion day.
    ///
    /// Returns Ok(()) without touching the filesystem if the journal is disabled.
    pub fn append(&self, record: &MountRecord) -> Result<(), JournalError> {
        if journal_disabled() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.day_file(record.completed_at.date_naive()))?;
        let mut lock = RwLock::new(file);
        let mut guard = lock.write()?;
        serde_json::to_writer(&mut *guard, record)?;
        guard.write_all(b"\n")?;
        Ok(())
    }

    /// Records for one day, oldest first. Lines that do not parse are skipped.
    pub fn read_day(&self, date: NaiveDate) -> Result<Vec<MountRecord>, JournalError> {
        let path = self.day_file(date);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(path)?;
        let lock = RwLock::new(file);
        let guard = lock.read()?;
        let mut records = Vec::new();
        for line in BufReader::new(&*guard).lines() {
            if let Ok(record) = serde_json::from_str(&line?) {
                records.push(record);
            }
        }
        Ok(records)
    }
}
