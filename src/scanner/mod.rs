use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use crate::Result;

pub mod local;

pub use local::LocalScanner;

/// A file observed in a directory scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Full path of the file, unique within its directory
    pub path: String,
    /// File name without extension
    pub name: String,
    /// Content fingerprint at scan time
    pub content_hash: String,
    /// Incremented once per detected content change, starts at 1
    pub version: u32,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, name: impl Into<String>, content_hash: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            content_hash: content_hash.into(),
            version: 1,
        }
    }
}

/// Point-in-time listing of a directory's immediate files and subdirectories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    /// Directory path, the identity key in persisted state
    pub path: String,
    /// Set once, on the first merge into persisted state
    pub first_scan_time: Option<DateTime<Utc>>,
    pub last_scan_time: Option<DateTime<Utc>>,
    /// Number of scans merged into persisted state
    pub scan_count: u32,
    /// Sorted by path when produced by a scanner
    pub files: Vec<FileRecord>,
    pub subdirectories: BTreeSet<String>,
}

impl DirectorySnapshot {
    /// Snapshot of a directory that has never been scanned.
    pub fn empty(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            first_scan_time: None,
            last_scan_time: None,
            scan_count: 0,
            files: Vec::new(),
            subdirectories: BTreeSet::new(),
        }
    }

    pub fn file(&self, path: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Carry scan history over from the previously persisted snapshot of the
    /// same directory. `previous` is `None` on the first scan.
    pub fn inherit_history(&mut self, previous: Option<&DirectorySnapshot>) {
        match previous {
            Some(prev) => {
                self.first_scan_time = prev.first_scan_time.or(self.last_scan_time);
                self.scan_count = prev.scan_count.saturating_add(1);
            }
            None => {
                self.first_scan_time = self.last_scan_time;
                self.scan_count = 1;
            }
        }
    }
}

/// Scanner trait
pub trait Scanner {
    /// Scan a directory's immediate entries and return its snapshot
    fn scan(&self, path: &Path) -> Result<DirectorySnapshot>;
}
