use crate::config::Args;
use crate::delta::{ChangeSet, FileLevelComparer, SnapshotComparer};
use crate::scanner::{DirectorySnapshot, LocalScanner, Scanner};
use crate::store::{JsonSnapshotStore, MemorySnapshotStore, SnapshotStore};
use crate::{ChangeTrackError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Scans a directory, compares it with its stored snapshot and persists the
/// merged result.
///
/// Scans of the same path must not run concurrently; the engine assumes a
/// single writer per path.
pub struct ScanEngine {
    scanner: Box<dyn Scanner>,
    comparer: Box<dyn SnapshotComparer>,
    store: Box<dyn SnapshotStore>,
}

impl ScanEngine {
    pub fn new(
        scanner: Box<dyn Scanner>,
        comparer: Box<dyn SnapshotComparer>,
        store: Box<dyn SnapshotStore>,
    ) -> Self {
        Self { scanner, comparer, store }
    }

    /// Wire up the local scanner and JSON state file described by `args`.
    /// A dry run reads the state file, if any, and keeps every update in
    /// memory. It never creates or writes the file.
    pub fn from_args(args: &Args) -> Result<Self> {
        let scanner = LocalScanner::new(&args.exclude)?
            .with_parallel(args.parallel)
            .with_progress(args.progress && !args.quiet);

        let state_path = args.resolved_state_path()?;
        debug!("Using state file {:?}", state_path);
        let json_store = JsonSnapshotStore::new(state_path);

        let store: Box<dyn SnapshotStore> = if args.dry_run {
            Box::new(MemorySnapshotStore::with_records(json_store.read_all()?))
        } else {
            Box::new(json_store)
        };

        Ok(Self::new(Box::new(scanner), Box::new(FileLevelComparer), store))
    }

    /// Scan `path` and report what changed since the last recorded scan.
    ///
    /// A path that no longer exists is dropped from the store before the
    /// validation error is returned.
    pub fn scan_directory(&self, path: &str) -> Result<ChangeSet> {
        if path.trim().is_empty() {
            return Err(ChangeTrackError::Validation("the local directory path is required".into()));
        }

        let dir = Path::new(path);
        if !dir.is_dir() {
            if self.store.remove(path)? {
                warn!("Removed vanished directory {:?} from scan history", path);
            }
            return Err(ChangeTrackError::Validation(format!(
                "the directory on path '{}' doesn't exist",
                path
            )));
        }

        let previous = self.store.load_snapshot(path)?;
        match &previous {
            Some(prev) => debug!("Loaded snapshot for {:?} (scan #{})", path, prev.scan_count),
            None => debug!("No stored snapshot for {:?}", path),
        }

        info!("Scanning directory: {:?}", path);
        let current = self.scanner.scan(dir)?;

        let empty;
        let baseline = match &previous {
            Some(prev) => prev,
            None => {
                empty = DirectorySnapshot::empty(path);
                &empty
            }
        };

        let mut changes = self.comparer.compare(baseline, current)?;
        changes.snapshot.inherit_history(previous.as_ref());
        changes.is_new = previous.is_none();

        self.store.save_record(&changes)?;
        info!(
            "Scan #{} of {:?} recorded: {} created, {} modified, {} deleted files",
            changes.snapshot.scan_count,
            path,
            changes.created_files.len(),
            changes.modified_files.len(),
            changes.deleted_files.len()
        );

        Ok(changes)
    }

    /// Snapshots of every tracked directory, in the order they were first scanned.
    pub fn tracked(&self) -> Result<Vec<DirectorySnapshot>> {
        Ok(self.store.load_all()?.into_iter().map(|r| r.snapshot).collect())
    }

    /// Stop tracking `path`. Returns whether it was tracked.
    pub fn forget(&self, path: &str) -> Result<bool> {
        let removed = self.store.remove(path)?;
        if removed {
            info!("Forgot {:?}", path);
        }
        Ok(removed)
    }
}
