//! Human-readable rendering of scan results.

use crate::delta::ChangeSet;
use crate::scanner::DirectorySnapshot;
use chrono::{DateTime, Utc};
use std::fmt::Write;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "never".to_string())
}

pub fn render_text(changes: &ChangeSet) -> String {
    let snapshot = &changes.snapshot;
    let mut out = String::new();

    let _ = writeln!(out, "Directory: {}", snapshot.path);
    let _ = writeln!(out, "  First scan: {}", format_time(snapshot.first_scan_time));
    let _ = writeln!(out, "  Last scan:  {}", format_time(snapshot.last_scan_time));
    let _ = writeln!(out, "  Scans:      {}", snapshot.scan_count);
    let _ = writeln!(
        out,
        "  Contents:   {} files, {} subdirectories",
        snapshot.files.len(),
        snapshot.subdirectories.len()
    );

    if changes.is_new {
        let _ = writeln!(out, "First scan of this directory, everything is new.");
    } else if !changes.has_changes() {
        let _ = writeln!(out, "No changes since the last scan.");
        return out;
    }

    section(&mut out, "Created files", changes.created_files.iter().map(|f| format!("{} (v{})", f.path, f.version)));
    section(&mut out, "Modified files", changes.modified_files.iter().map(|f| format!("{} (v{})", f.path, f.version)));
    section(&mut out, "Deleted files", changes.deleted_files.iter().map(|f| f.path.clone()));
    section(&mut out, "Created subdirectories", changes.created_subdirectories.iter().cloned());
    section(&mut out, "Deleted subdirectories", changes.deleted_subdirectories.iter().cloned());

    out
}

fn section(out: &mut String, title: &str, items: impl Iterator<Item = String>) {
    let items: Vec<String> = items.collect();
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "{} ({}):", title, items.len());
    for item in items {
        let _ = writeln!(out, "  {}", item);
    }
}

pub fn render_tracked(snapshots: &[DirectorySnapshot]) -> String {
    if snapshots.is_empty() {
        return "No directories tracked yet.\n".to_string();
    }

    let mut out = String::new();
    for s in snapshots {
        let _ = writeln!(
            out,
            "{}  scans: {}  files: {}  last: {}",
            s.path,
            s.scan_count,
            s.files.len(),
            format_time(s.last_scan_time)
        );
    }
    out
}
