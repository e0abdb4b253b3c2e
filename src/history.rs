//! Durable test history.
//!
//! The history store persists an ordered sequence of [`TestRecord`]s as a
//! single JSON array, one file per store. Every mutation rewrites the whole
//! blob through a temp-file-and-rename so the stored sequence is never left
//! half-written. An unreadable or corrupt blob is logged and treated as an
//! empty history on read; write failures always surface to the caller.

use crate::errors::{Result, SpeedTestError};
use crate::results::TestRecord;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage key used as the file stem of the history blob.
pub const HISTORY_KEY: &str = "speedTestHistory";

/// Record count at which the store reports it is getting full.
pub const DEFAULT_WARN_THRESHOLD: usize = 20;

/// File-backed store of completed test records.
pub struct HistoryStore {
    /// Path of the JSON blob
    path: PathBuf,
    /// Length at which [`HistoryStore::is_near_capacity`] trips
    warn_threshold: usize,
}

impl HistoryStore {
    /// Create a store backed by the given file.
    ///
    /// The file is created lazily on the first mutation; a missing file
    /// reads as an empty history.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), warn_threshold: DEFAULT_WARN_THRESHOLD }
    }

    /// Override the near-capacity warning threshold.
    pub fn with_warn_threshold(mut self, threshold: usize) -> Self {
        self.warn_threshold = threshold;
        self
    }

    /// Create a store at the default per-user data path.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    /// Resolve the default history path following the XDG specification.
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
            PathBuf::from(xdg_data)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".local").join("share")
        } else if let Ok(appdata) = std::env::var("APPDATA") {
            PathBuf::from(appdata)
        } else {
            return Err(SpeedTestError::config(
                "could not determine a data directory; set XDG_DATA_HOME or HOME",
            ));
        };

        Ok(data_dir.join("speed-sim").join(format!("{}.json", HISTORY_KEY)))
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return all records in stored (insertion) order.
    ///
    /// The order is stable until the next mutation; display layers may
    /// re-sort by timestamp.
    pub fn all(&self) -> Result<Vec<TestRecord>> {
        self.load()
    }

    /// Return records with a timestamp strictly after `cutoff`.
    ///
    /// `None` means no filtering.
    pub fn filter(
        &self,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<TestRecord>> {
        let records = self.load()?;
        Ok(match cutoff {
            Some(cutoff) => records
                .into_iter()
                .filter(|record| record.timestamp > cutoff)
                .collect(),
            None => records,
        })
    }

    /// Append one record and persist, returning the new length.
    pub fn append(&self, record: &TestRecord) -> Result<usize> {
        let mut records = self.load()?;
        records.push(record.clone());
        self.persist(&records)?;
        debug!("appended record, history now holds {}", records.len());
        Ok(records.len())
    }

    /// Remove and return the record at `position` in stored order.
    ///
    /// An out-of-bounds position is an error and leaves the store
    /// untouched.
    pub fn delete_at(&self, position: usize) -> Result<TestRecord> {
        let mut records = self.load()?;
        if position >= records.len() {
            return Err(SpeedTestError::invalid_index(position, records.len()));
        }
        let removed = records.remove(position);
        self.persist(&records)?;
        Ok(removed)
    }

    /// Empty the store entirely. Irreversible.
    ///
    /// The blob file is removed outright; a missing file reads as empty.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SpeedTestError::storage(format!(
                "failed to clear history at {}: {}",
                self.path.display(),
                e
            ))
            .with_source(e)),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether the history has reached the warning threshold.
    pub fn is_near_capacity(&self) -> Result<bool> {
        Ok(self.len()? >= self.warn_threshold)
    }

    /// Load the blob, treating a missing or unreadable file as empty.
    fn load(&self) -> Result<Vec<TestRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!(
                    "history at {} is unreadable ({}), treating as empty",
                    self.path.display(),
                    e
                );
                return Ok(Vec::new());
            }
        };

        match serde_json::from_str(&contents) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(
                    "history at {} is corrupt ({}), treating as empty",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    /// Rewrite the full blob, replacing it as atomically as the filesystem
    /// allows (write to a sibling temp file, then rename over the target).
    fn persist(&self, records: &[TestRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    SpeedTestError::storage(format!(
                        "failed to create history directory {}: {}",
                        parent.display(),
                        e
                    ))
                    .with_source(e)
                })?;
            }
        }

        let json = serde_json::to_string_pretty(records).map_err(|e| {
            SpeedTestError::storage(format!(
                "failed to serialize history: {}",
                e
            ))
            .with_source(e)
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| {
            SpeedTestError::storage(format!(
                "failed to write history to {}: {}",
                tmp_path.display(),
                e
            ))
            .with_source(e)
        })?;

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            SpeedTestError::storage(format!(
                "failed to replace history at {}: {}",
                self.path.display(),
                e
            ))
            .with_source(e)
        })
    }
}
