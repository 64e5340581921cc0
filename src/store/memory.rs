use crate::delta::ChangeSet;
use crate::store::SnapshotStore;
use crate::Result;
use std::sync::Mutex;

/// Store that lives only as long as the process. Used for dry runs.
#[derive(Default)]
pub struct MemorySnapshotStore {
    records: Mutex<Vec<ChangeSet>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records.
    pub fn with_records(records: Vec<ChangeSet>) -> Self {
        Self { records: Mutex::new(records) }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load_all(&self) -> Result<Vec<ChangeSet>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.clone())
    }

    fn save_all(&self, records: &[ChangeSet]) -> Result<()> {
        let mut stored = self.records.lock().unwrap_or_else(|e| e.into_inner());
        *stored = records.to_vec();
        Ok(())
    }
}
