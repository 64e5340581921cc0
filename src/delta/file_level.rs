use crate::scanner::FileRecord;
use crate::{ChangeTrackError, Result};
use std::collections::{HashMap, HashSet};

/// File-level outcome of comparing two listings of the same directory.
#[derive(Debug, Default)]
pub struct FileChanges {
    /// Current records with their versions resolved against history
    pub files: Vec<FileRecord>,
    pub created: Vec<FileRecord>,
    pub modified: Vec<FileRecord>,
    pub deleted: Vec<FileRecord>,
}

/// Compare `current` against `previous`, matching files by path.
///
/// A matched file keeps the previous version, bumped by one when its content
/// hash differs. Unmatched current files start at version 1. The created and
/// modified lists hold copies of the resolved records.
pub fn compute_diff(previous: &[FileRecord], current: Vec<FileRecord>) -> Result<FileChanges> {
    let previous_map = index_by_path(previous)?;
    let deleted: Vec<FileRecord> = {
        let current_paths = unique_paths(&current)?;
        previous
            .iter()
            .filter(|p| !current_paths.contains(p.path.as_str()))
            .cloned()
            .collect()
    };

    let mut changes = FileChanges {
        deleted,
        ..Default::default()
    };

    for mut record in current {
        match previous_map.get(record.path.as_str()) {
            Some(prev) => {
                record.version = prev.version;
                if prev.content_hash != record.content_hash {
                    record.version = record.version.saturating_add(1);
                    changes.modified.push(record.clone());
                }
            }
            None => {
                record.version = 1;
                changes.created.push(record.clone());
            }
        }
        changes.files.push(record);
    }

    Ok(changes)
}

fn index_by_path(records: &[FileRecord]) -> Result<HashMap<&str, &FileRecord>> {
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        if map.insert(record.path.as_str(), record).is_some() {
            return Err(duplicate(&record.path));
        }
    }
    Ok(map)
}

fn unique_paths(records: &[FileRecord]) -> Result<HashSet<&str>> {
    let mut set = HashSet::with_capacity(records.len());
    for record in records {
        if !set.insert(record.path.as_str()) {
            return Err(duplicate(&record.path));
        }
    }
    Ok(set)
}

fn duplicate(path: &str) -> ChangeTrackError {
    ChangeTrackError::State(format!("file '{}' appears more than once in a snapshot", path))
}
