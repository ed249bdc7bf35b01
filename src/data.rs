//! Snapshot store access
//!
//! - **index**: chronological index of `YYYY-MM-DD.json` files
//! - **snapshot**: readers that turn index entries into parsed snapshots

pub mod index;
pub mod snapshot;

pub use index::{FileIndex, FileIndexEntry};
pub use snapshot::{DirectorySnapshotReader, InMemorySnapshotReader, SnapshotReader};
