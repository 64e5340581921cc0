use crate::delta::ChangeSet;
use crate::store::SnapshotStore;
use crate::{ChangeTrackError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keeps all scan records in a single pretty-printed JSON array.
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored records without touching the filesystem. A missing
    /// file reads as no records.
    pub fn read_all(&self) -> Result<Vec<ChangeSet>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&self.path).map_err(|e| self.store_err(e))?;
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&json)?)
    }

    fn store_err(&self, source: std::io::Error) -> ChangeTrackError {
        ChangeTrackError::Store { path: self.path.clone(), source }
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load_all(&self) -> Result<Vec<ChangeSet>> {
        if !self.path.exists() {
            debug!("Creating empty state file {:?}", self.path);
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| self.store_err(e))?;
            }
            fs::write(&self.path, "[]").map_err(|e| self.store_err(e))?;
            return Ok(Vec::new());
        }

        self.read_all()
    }

    fn save_all(&self, records: &[ChangeSet]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;

        // Write next to the target and rename over it so readers never see a
        // half-written file.
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| self.store_err(e))?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(self.store_err(e));
        }

        debug!("Saved {} records to {:?}", records.len(), self.path);
        Ok(())
    }
}
