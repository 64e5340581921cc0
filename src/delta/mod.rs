//! Snapshot comparison.
//!
//! Compares the previous and current snapshot of one directory and produces a
//! [`ChangeSet`]. Files are matched by path; a renamed file shows up as one
//! deletion plus one creation. Comparison is pure: nothing here touches the
//! filesystem.

use crate::scanner::{DirectorySnapshot, FileRecord};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

pub mod dir_level;
pub mod file_level;

/// Result of comparing two snapshots of the same directory.
///
/// This is also the record persisted per directory: the snapshot feeds the
/// next comparison, the change lists describe the latest one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Current state, with file versions resolved
    pub snapshot: DirectorySnapshot,
    pub created_files: Vec<FileRecord>,
    pub modified_files: Vec<FileRecord>,
    pub deleted_files: Vec<FileRecord>,
    pub created_subdirectories: BTreeSet<String>,
    pub deleted_subdirectories: BTreeSet<String>,
    /// True when this was the first recorded scan of the directory
    #[serde(default)]
    pub is_new: bool,
}

impl ChangeSet {
    /// A change set reporting no differences.
    pub fn unchanged(snapshot: DirectorySnapshot) -> Self {
        Self {
            snapshot,
            created_files: Vec::new(),
            modified_files: Vec::new(),
            deleted_files: Vec::new(),
            created_subdirectories: BTreeSet::new(),
            deleted_subdirectories: BTreeSet::new(),
            is_new: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.snapshot.path
    }

    pub fn change_count(&self) -> usize {
        self.created_files.len()
            + self.modified_files.len()
            + self.deleted_files.len()
            + self.created_subdirectories.len()
            + self.deleted_subdirectories.len()
    }

    pub fn has_changes(&self) -> bool {
        self.change_count() > 0
    }
}

/// Compares two snapshots of a directory
pub trait SnapshotComparer {
    fn compare(&self, previous: &DirectorySnapshot, current: DirectorySnapshot) -> Result<ChangeSet>;
}

/// Matches files by path and detects content changes by hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLevelComparer;

impl SnapshotComparer for FileLevelComparer {
    fn compare(&self, previous: &DirectorySnapshot, current: DirectorySnapshot) -> Result<ChangeSet> {
        compare(previous, current)
    }
}

/// Compute the change set between `previous` and `current`.
///
/// Snapshots of different directories are not compared: the result carries
/// `current` unchanged with empty change lists.
pub fn compare(previous: &DirectorySnapshot, mut current: DirectorySnapshot) -> Result<ChangeSet> {
    if previous.path != current.path {
        warn!(
            "Refusing to compare snapshots of different directories: {:?} vs {:?}",
            previous.path, current.path
        );
        return Ok(ChangeSet::unchanged(current));
    }

    let files = std::mem::take(&mut current.files);
    let file_changes = file_level::compute_diff(&previous.files, files)?;
    current.files = file_changes.files;

    let (created_subdirectories, deleted_subdirectories) =
        dir_level::compute_diff(&previous.subdirectories, &current.subdirectories);

    let changes = ChangeSet {
        snapshot: current,
        created_files: file_changes.created,
        modified_files: file_changes.modified,
        deleted_files: file_changes.deleted,
        created_subdirectories,
        deleted_subdirectories,
        is_new: false,
    };
    debug!("{}: {} changes", changes.path(), changes.change_count());

    Ok(changes)
}
