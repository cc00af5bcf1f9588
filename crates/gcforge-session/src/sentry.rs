//! The device-authorization ("sentry") store.
//!
//! The platform proves a device was approved before by asking it to keep
//! a small binary file and present that file's SHA-1 hash on every
//! logon. The file arrives in chunks (machine-auth updates), each one
//! overwriting a byte range at an offset.
//!
//! Invariant: the hash we report always covers the *whole* file as it is
//! on disk after the write, never just the chunk we wrote. Out-of-order
//! or repeated chunks are plain positional overwrites.
//!
//! File I/O is synchronous and scoped to a single call; one account's
//! sentry file has exactly one writer (its session).

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use gcforge_protocol::SentryHash;
use sha1::{Digest, Sha1};

use crate::SentryError;

/// Result of applying one machine-auth update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentryWrite {
    /// Total file length after the write.
    pub file_size: u64,
    /// SHA-1 of the entire file after the write.
    pub hash: SentryHash,
}

/// Reads and writes one account's sentry file.
#[derive(Debug, Clone)]
pub struct SentryStore {
    path: PathBuf,
}

impl SentryStore {
    /// A store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The conventional location for `username`'s file inside `dir`:
    /// `<dir>/<username>.sentry`.
    ///
    /// Path separators, drive colons and NULs in the username become `_`,
    /// so the file always lands directly inside `dir`.
    pub fn for_account(dir: impl AsRef<Path>, username: &str) -> Self {
        let name: String = username
            .chars()
            .map(|c| {
                if matches!(c, '/' | '\\' | ':' | '\0') {
                    '_'
                } else {
                    c
                }
            })
            .collect();
        Self::new(dir.as_ref().join(format!("{name}.sentry")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whole-file hash of the current sentry file, or `None` if this
    /// device has never been authorized (no file yet).
    pub fn current_hash(&self) -> Result<Option<SentryHash>, SentryError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        hash_reader(file).map(Some).map_err(|e| self.io_error(e))
    }

    /// Applies one chunk: writes `data[..bytes_to_write]` at `offset`,
    /// creating the file (and its directory) if needed, then re-hashes
    /// the whole file.
    ///
    /// # Errors
    /// [`SentryError::ShortData`] if `bytes_to_write` exceeds `data`, or
    /// [`SentryError::Io`] if the file cannot be written or read back.
    pub fn apply_update(
        &self,
        offset: u64,
        data: &[u8],
        bytes_to_write: usize,
    ) -> Result<SentryWrite, SentryError> {
        let chunk = data.get(..bytes_to_write).ok_or(SentryError::ShortData {
            requested: bytes_to_write,
            available: data.len(),
        })?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        let written = (|| -> io::Result<SentryWrite> {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(chunk)?;
            file.flush()?;
            let file_size = file.metadata()?.len();
            file.seek(SeekFrom::Start(0))?;
            let hash = hash_reader(&mut file)?;
            Ok(SentryWrite { file_size, hash })
        })()
        .map_err(|e| self.io_error(e))?;

        tracing::debug!(
            path = %self.path.display(),
            offset,
            bytes = bytes_to_write,
            file_size = written.file_size,
            hash = %written.hash,
            "sentry file updated"
        );
        Ok(written)
    }

    fn io_error(&self, source: io::Error) -> SentryError {
        SentryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Streams `reader` through SHA-1.
fn hash_reader(mut reader: impl Read) -> io::Result<SentryHash> {
    let mut hasher = Sha1::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(SentryHash(hasher.finalize().into()))
}
