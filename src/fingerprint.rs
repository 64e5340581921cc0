//! Content fingerprints used to detect file changes between scans.
//!
//! Digests are BLAKE3, rendered as lowercase hex. They identify content for
//! change detection only.

use crate::{ChangeTrackError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Computes a stable digest for a file's content.
pub trait Fingerprinter: Send + Sync {
    fn fingerprint_file(&self, path: &Path) -> Result<String>;
}

/// Digest of an in-memory byte slice.
pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Blake3Fingerprinter;

impl Blake3Fingerprinter {
    pub fn new() -> Self {
        Self
    }
}

impl Fingerprinter for Blake3Fingerprinter {
    fn fingerprint_file(&self, path: &Path) -> Result<String> {
        let read_err = |source| ChangeTrackError::Read { path: path.to_path_buf(), source };

        let mut file = File::open(path).map_err(read_err)?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];

        loop {
            let n = file.read(&mut buffer).map_err(read_err)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(hasher.finalize().to_hex().to_string())
    }
}
