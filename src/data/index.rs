//! Chronological index of the daily snapshot store

use crate::calendar::{parse_snapshot_filename, FilenameRejection};
use crate::error::{HistoryError, Result};
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// A snapshot file known to exist in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIndexEntry {
    pub filename: String,
    pub date: NaiveDate,
}

impl FileIndexEntry {
    pub fn new(filename: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            filename: filename.into(),
            date,
        }
    }
}

/// Snapshot files sorted ascending by date
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIndex {
    entries: Vec<FileIndexEntry>,
}

impl FileIndex {
    /// Scan `store_path` for `YYYY-MM-DD.json` files.
    ///
    /// A missing directory is a cold start and yields an empty index. Any
    /// other failure to list the directory is fatal for the run.
    pub fn build(store_path: &Path) -> Result<Self> {
        let read_dir = match fs::read_dir(store_path) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!(
                    "Snapshot directory {} does not exist, nothing to index",
                    store_path.display()
                );
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(HistoryError::StoreUnreadable {
                    path: store_path.to_path_buf(),
                    source,
                })
            }
        };

        let mut names = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|source| HistoryError::StoreUnreadable {
                path: store_path.to_path_buf(),
                source,
            })?;
            // Non UTF-8 names can never match the pattern
            if let Ok(name) = dir_entry.file_name().into_string() {
                names.push(name);
            }
        }

        let index = Self::from_filenames(names);
        log::info!(
            "Indexed {} snapshot files in {}",
            index.len(),
            store_path.display()
        );
        Ok(index)
    }

    /// Build an index from bare filenames, dropping anything that is not a
    /// valid snapshot name
    pub fn from_filenames<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = names
            .into_iter()
            .filter_map(|name| {
                let name = name.into();
                match parse_snapshot_filename(&name) {
                    Ok(date) => Some(FileIndexEntry::new(name, date)),
                    Err(FilenameRejection::ImpossibleDate) => {
                        log::warn!("Skipping invalid date filename: {}", name);
                        None
                    }
                    Err(FilenameRejection::Pattern) => None,
                }
            })
            .collect();
        Self::from_entries(entries)
    }

    /// Build an index from already-parsed entries.
    ///
    /// Dates are unique in the index: of several entries sharing a date, the
    /// one with the smallest filename is kept.
    pub fn from_entries(mut entries: Vec<FileIndexEntry>) -> Self {
        entries.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.filename.cmp(&b.filename)));
        let before = entries.len();
        entries.dedup_by_key(|e| e.date);
        if entries.len() < before {
            log::warn!(
                "Dropped {} index entries with duplicate dates",
                before - entries.len()
            );
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[FileIndexEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileIndexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest indexed date
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|e| e.date)
    }

    /// Newest indexed date
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|e| e.date)
    }
}

impl<'a> IntoIterator for &'a FileIndex {
    type Item = &'a FileIndexEntry;
    type IntoIter = std::slice::Iter<'a, FileIndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
