//! Snapshot readers
//!
//! The aggregator only sees a `SnapshotReader`, so the same reduction runs
//! against the on-disk store or an in-memory archive.

use super::index::FileIndexEntry;
use crate::error::{HistoryError, Result};
use crate::types::DailySnapshot;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of parsed daily snapshots
pub trait SnapshotReader: Send + Sync {
    /// Read and parse the snapshot behind an index entry
    fn read(&self, entry: &FileIndexEntry) -> Result<DailySnapshot>;
}

/// Reads `YYYY-MM-DD.json` files from a snapshot directory
#[derive(Debug, Clone)]
pub struct DirectorySnapshotReader {
    root: PathBuf,
}

impl DirectorySnapshotReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SnapshotReader for DirectorySnapshotReader {
    fn read(&self, entry: &FileIndexEntry) -> Result<DailySnapshot> {
        let bytes =
            fs::read(self.root.join(&entry.filename)).map_err(|source| HistoryError::SnapshotRead {
                filename: entry.filename.clone(),
                source,
            })?;
        DailySnapshot::from_json_slice(entry.date, &bytes).map_err(|reason| {
            HistoryError::SnapshotParse {
                filename: entry.filename.clone(),
                reason,
            }
        })
    }
}

/// Raw snapshot bodies held in memory, keyed by filename.
///
/// Bodies go through the same parser as files on disk, so corrupt documents
/// behave identically.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotReader {
    bodies: HashMap<String, Vec<u8>>,
}

impl InMemorySnapshotReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw body under `filename`
    pub fn insert(&mut self, filename: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.bodies.insert(filename.into(), body.into());
    }

    /// Filenames currently held
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.bodies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl SnapshotReader for InMemorySnapshotReader {
    fn read(&self, entry: &FileIndexEntry) -> Result<DailySnapshot> {
        let bytes = self
            .bodies
            .get(&entry.filename)
            .ok_or_else(|| HistoryError::SnapshotRead {
                filename: entry.filename.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such snapshot"),
            })?;
        DailySnapshot::from_json_slice(entry.date, bytes).map_err(|reason| {
            HistoryError::SnapshotParse {
                filename: entry.filename.clone(),
                reason,
            }
        })
    }
}
