use std::collections::BTreeSet;

/// Subdirectories present only in `current` (created) and only in `previous` (deleted).
pub fn compute_diff(
    previous: &BTreeSet<String>,
    current: &BTreeSet<String>,
) -> (BTreeSet<String>, BTreeSet<String>) {
    let created = current.difference(previous).cloned().collect();
    let deleted = previous.difference(current).cloned().collect();
    (created, deleted)
}
