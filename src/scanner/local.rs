use crate::fingerprint::{Blake3Fingerprinter, Fingerprinter};
use crate::scanner::{DirectorySnapshot, FileRecord, Scanner};
use crate::{ChangeTrackError, Result};
use chrono::Utc;
use globset::{Glob, GlobSet, GlobSetBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

pub const DEFAULT_PARALLEL: usize = 4;

/// Scans the immediate entries of a local directory.
pub struct LocalScanner {
    excludes: GlobSet,
    parallel: usize,
    progress: bool,
    fingerprinter: Arc<dyn Fingerprinter>,
}

impl LocalScanner {
    /// `excludes` are glob patterns matched against entry names.
    pub fn new(excludes: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in excludes {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            excludes: builder.build()?,
            parallel: DEFAULT_PARALLEL,
            progress: false,
            fingerprinter: Arc::new(Blake3Fingerprinter::new()),
        })
    }

    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel.max(1);
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_fingerprinter(mut self, fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    /// Split the immediate children of `root` into files to fingerprint and
    /// subdirectory paths. Each file comes with its record key.
    fn list_entries(&self, root: &Path) -> Result<(Vec<(PathBuf, String)>, BTreeSet<String>)> {
        let metadata = std::fs::metadata(root)
            .map_err(|source| ChangeTrackError::Enumeration { path: root.to_path_buf(), source })?;
        if !metadata.is_dir() {
            return Err(ChangeTrackError::Enumeration {
                path: root.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
            });
        }

        let mut files = Vec::new();
        let mut subdirectories = BTreeSet::new();
        let mut keys = HashSet::new();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);

        for result in walker {
            let entry = result.map_err(|e| ChangeTrackError::enumeration(root, e))?;

            if self.excludes.is_match(entry.file_name()) {
                debug!("Excluded {:?}", entry.path());
                continue;
            }

            let kind = match entry_kind(&entry) {
                Some(kind) => kind,
                None => continue,
            };

            let key = path_key(entry.path());
            if !keys.insert(key.clone()) {
                return Err(ChangeTrackError::Enumeration {
                    path: entry.into_path(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("name collides with another entry as '{}'", key),
                    ),
                });
            }

            match kind {
                EntryKind::Dir => {
                    subdirectories.insert(key);
                }
                EntryKind::File => files.push((entry.into_path(), key)),
            }
        }

        Ok((files, subdirectories))
    }

    fn fingerprint_all(&self, paths: &[(PathBuf, String)]) -> Result<Vec<FileRecord>> {
        let pb = if self.progress {
            let pb = ProgressBar::new(paths.len() as u64);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .map_err(|e| ChangeTrackError::Config(format!("Invalid progress template: {}", e)))?;
            pb.set_style(style);
            Some(pb)
        } else {
            None
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallel)
            .build()
            .map_err(|e| ChangeTrackError::Config(format!("Failed to build thread pool: {}", e)))?;

        // Collecting into Result stops at the first failure and drops the
        // records other workers already produced.
        let records = pool.install(|| {
            paths
                .par_iter()
                .map(|(path, key)| {
                    let record = self.fingerprint_one(path, key);
                    if let Some(pb) = &pb {
                        pb.inc(1);
                    }
                    record
                })
                .collect::<Result<Vec<FileRecord>>>()
        });

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }

        records
    }

    fn fingerprint_one(&self, path: &Path, key: &str) -> Result<FileRecord> {
        let content_hash = self.fingerprinter.fingerprint_file(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(FileRecord::new(key, name, content_hash))
    }
}

enum EntryKind {
    File,
    Dir,
}

/// Classify a directory entry. Symlinks are classified by their target and
/// broken ones are skipped; anything that is neither a file nor a directory
/// (sockets, fifos, devices) is skipped too.
fn entry_kind(entry: &DirEntry) -> Option<EntryKind> {
    let file_type = if entry.path_is_symlink() {
        match std::fs::metadata(entry.path()) {
            Ok(target) => target.file_type(),
            Err(e) => {
                warn!("Skipping broken symlink {:?}: {}", entry.path(), e);
                return None;
            }
        }
    } else {
        entry.file_type()
    };

    if file_type.is_dir() {
        Some(EntryKind::Dir)
    } else if file_type.is_file() {
        Some(EntryKind::File)
    } else {
        debug!("Skipping {:?}: not a regular file or directory", entry.path());
        None
    }
}

/// String form of `path` used as a record key. Bytes that are not valid
/// UTF-8 are written as `\xNN` so distinct names stay distinct.
#[cfg(unix)]
fn path_key(path: &Path) -> String {
    use std::fmt::Write;
    use std::os::unix::ffi::OsStrExt;

    if let Some(s) = path.to_str() {
        return s.to_string();
    }

    let mut key = String::new();
    for chunk in path.as_os_str().as_bytes().utf8_chunks() {
        key.push_str(chunk.valid());
        for byte in chunk.invalid() {
            let _ = write!(key, "\\x{:02x}", byte);
        }
    }
    key
}

#[cfg(not(unix))]
fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl Scanner for LocalScanner {
    fn scan(&self, path: &Path) -> Result<DirectorySnapshot> {
        if path.as_os_str().is_empty() {
            return Err(ChangeTrackError::Validation("directory path is empty".into()));
        }

        let (file_paths, subdirectories) = self.list_entries(path)?;
        debug!("Fingerprinting {} files in {:?}", file_paths.len(), path);

        let mut files = self.fingerprint_all(&file_paths)?;
        files.sort_by(|a, b| a.path.cmp(&b.path));

        info!(
            "Scanned {:?}: {} files, {} subdirectories",
            path,
            files.len(),
            subdirectories.len()
        );

        let mut snapshot = DirectorySnapshot::empty(path_key(path));
        snapshot.files = files;
        snapshot.subdirectories = subdirectories;
        snapshot.last_scan_time = Some(Utc::now());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct FailingFingerprinter {
        fail_on: &'static str,
    }

    impl Fingerprinter for FailingFingerprinter {
        fn fingerprint_file(&self, path: &Path) -> Result<String> {
            if path.file_name().map_or(false, |n| n == self.fail_on) {
                return Err(ChangeTrackError::Read {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            Blake3Fingerprinter::new().fingerprint_file(path)
        }
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("b.tar.gz"), "beta").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("deep.txt"), "not scanned").unwrap();
        dir
    }

    #[test]
    fn test_scan_lists_immediate_entries() {
        let dir = fixture();
        let scanner = LocalScanner::new(&[]).unwrap();
        let snapshot = scanner.scan(dir.path()).unwrap();

        let root = dir.path().to_string_lossy().to_string();
        assert_eq!(snapshot.path, root);
        assert_eq!(snapshot.files.len(), 2);
        assert!(snapshot.files.iter().all(|f| f.path.starts_with(&root)));
        assert!(snapshot.files.iter().all(|f| f.version == 1));

        let names: Vec<&str> = snapshot.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b.tar"]);

        let sub = dir.path().join("sub").to_string_lossy().to_string();
        assert_eq!(snapshot.subdirectories.iter().collect::<Vec<_>>(), vec![&sub]);

        assert!(snapshot.last_scan_time.is_some());
        assert!(snapshot.first_scan_time.is_none());
        assert_eq!(snapshot.scan_count, 0);
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let dir = fixture();
        let scanner = LocalScanner::new(&[]).unwrap().with_parallel(2);

        let first = scanner.scan(dir.path()).unwrap();
        let second = scanner.scan(dir.path()).unwrap();

        assert_eq!(first.files, second.files);
        assert_eq!(first.subdirectories, second.subdirectories);
    }

    #[test]
    fn test_excludes_match_entry_names() {
        let dir = fixture();
        let scanner = LocalScanner::new(&["*.gz".to_string(), "sub".to_string()]).unwrap();
        let snapshot = scanner.scan(dir.path()).unwrap();

        assert_eq!(snapshot.files.len(), 1);
        assert_eq!(snapshot.files[0].name, "a");
        assert!(snapshot.subdirectories.is_empty());
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        assert!(matches!(
            LocalScanner::new(&["a[".to_string()]),
            Err(ChangeTrackError::Pattern(_))
        ));
    }

    #[test]
    fn test_single_read_failure_fails_scan() {
        let dir = fixture();
        let scanner = LocalScanner::new(&[])
            .unwrap()
            .with_fingerprinter(Arc::new(FailingFingerprinter { fail_on: "a.txt" }));

        match scanner.scan(dir.path()) {
            Err(ChangeTrackError::Read { path, .. }) => assert_eq!(path, dir.path().join("a.txt")),
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_directory_is_enumeration_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let scanner = LocalScanner::new(&[]).unwrap();

        assert!(matches!(
            scanner.scan(&missing),
            Err(ChangeTrackError::Enumeration { .. })
        ));
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let scanner = LocalScanner::new(&[]).unwrap();
        assert!(matches!(
            scanner.scan(Path::new("")),
            Err(ChangeTrackError::Validation(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_classified_by_target() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("real.txt"), "target bytes").unwrap();
        fs::create_dir(dir.path().join("d")).unwrap();
        symlink(dir.path().join("real.txt"), dir.path().join("link.txt")).unwrap();
        symlink(dir.path().join("d"), dir.path().join("linkdir")).unwrap();

        let snapshot = LocalScanner::new(&[]).unwrap().scan(dir.path()).unwrap();

        let link = dir.path().join("link.txt").to_string_lossy().to_string();
        let real = dir.path().join("real.txt").to_string_lossy().to_string();
        assert_eq!(snapshot.files.len(), 2);
        assert_eq!(
            snapshot.file(&link).map(|f| f.content_hash.clone()),
            snapshot.file(&real).map(|f| f.content_hash.clone())
        );

        let linkdir = dir.path().join("linkdir").to_string_lossy().to_string();
        assert!(snapshot.subdirectories.contains(&linkdir));
        assert_eq!(snapshot.subdirectories.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_and_socket_are_skipped() {
        use std::os::unix::fs::symlink;
        use std::os::unix::net::UnixListener;

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        symlink(dir.path().join("nowhere"), dir.path().join("dangling")).unwrap();
        let _listener = UnixListener::bind(dir.path().join("sock")).unwrap();

        let snapshot = LocalScanner::new(&[]).unwrap().scan(dir.path()).unwrap();

        assert_eq!(snapshot.files.len(), 1);
        assert_eq!(snapshot.files[0].name, "a");
        assert!(snapshot.subdirectories.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_stay_distinct() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        // Linux filesystems accept arbitrary bytes; skip where the fs refuses them.
        if fs::write(dir.path().join(OsStr::from_bytes(b"a\xff")), "one").is_err() {
            return;
        }
        fs::write(dir.path().join(OsStr::from_bytes(b"a\xfe")), "two").unwrap();

        let snapshot = LocalScanner::new(&[]).unwrap().scan(dir.path()).unwrap();

        let root = dir.path().to_string_lossy().to_string();
        let paths: Vec<String> = snapshot.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, vec![format!("{}/a\\xfe", root), format!("{}/a\\xff", root)]);
        assert!(paths.iter().all(|p| p.starts_with(&root)));
    }

    #[cfg(unix)]
    #[test]
    fn test_path_key() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        assert_eq!(path_key(Path::new("/data/é.txt")), "/data/é.txt");
        assert_eq!(path_key(Path::new(OsStr::from_bytes(b"/data/\xc3x\xff"))), "/data/\\xc3x\\xff");
    }
}
