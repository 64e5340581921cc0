use crate::delta::ChangeSet;
use crate::scanner::DirectorySnapshot;
use crate::Result;

pub mod json;
pub mod memory;

pub use json::JsonSnapshotStore;
pub use memory::MemorySnapshotStore;

/// Persisted scan records, one per directory path.
///
/// Implementations only read and write the whole collection; the keyed
/// operations are built on top and rewrite everything on each update.
pub trait SnapshotStore {
    fn load_all(&self) -> Result<Vec<ChangeSet>>;
    fn save_all(&self, records: &[ChangeSet]) -> Result<()>;

    /// Latest snapshot stored for `path`, if the directory is tracked.
    fn load_snapshot(&self, path: &str) -> Result<Option<DirectorySnapshot>> {
        Ok(self
            .load_all()?
            .into_iter()
            .find(|r| r.path() == path)
            .map(|r| r.snapshot))
    }

    /// Insert `record`, replacing any record for the same path.
    fn save_record(&self, record: &ChangeSet) -> Result<()> {
        let mut records = self.load_all()?;
        match records.iter_mut().find(|r| r.path() == record.path()) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.save_all(&records)
    }

    /// Stop tracking `path`. Returns whether a record was removed.
    fn remove(&self, path: &str) -> Result<bool> {
        let mut records = self.load_all()?;
        let before = records.len();
        records.retain(|r| r.path() != path);
        if records.len() == before {
            return Ok(false);
        }
        self.save_all(&records)?;
        Ok(true)
    }
}
