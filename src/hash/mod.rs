//! Content hashing and durable hash records.
//!
//! A hash record is one file per asset under the configured record
//! directory: `{stem}.md5` containing the raw hex digest. Records are
//! written on publish and read at URL-resolution time; they are never
//! regenerated implicitly on read.

use crate::core::PublishError;
use md5::{Digest, Md5};
use rustc_hash::FxHashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// A 128-bit content digest, kept as exactly 32 lowercase hex chars.
///
/// Pure function of file bytes: identical content always yields the
/// identical hash, which is what lets uploads short-circuit when the
/// object already exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash a byte slice.
    pub fn of_bytes<T: AsRef<[u8]> + ?Sized>(data: &T) -> Self {
        Self(hex::encode(Md5::digest(data.as_ref())))
    }

    /// Hash a file's full contents (streaming).
    ///
    /// Fails with `NotFound` unless `path` names a regular file.
    pub fn of_file(path: &Path) -> Result<Self, PublishError> {
        if !path.is_file() {
            return Err(PublishError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|e| PublishError::Io(path.to_path_buf(), e))?;

        let mut reader = BufReader::with_capacity(64 * 1024, file);
        let mut hasher = Md5::new();
        let mut buffer = [0u8; 64 * 1024];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => hasher.update(&buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(PublishError::Io(path.to_path_buf(), e)),
            }
        }
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Parse from a stored hex digest. Returns `None` for anything that
    /// is not exactly 32 hex characters.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(s.to_ascii_lowercase()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// HashStore
// ============================================================================

/// Durable store of one hash record per asset.
#[derive(Debug, Clone)]
pub struct HashStore {
    dir: PathBuf,
}

impl HashStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Filesystem path of the record for a given stem.
    pub fn record_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.md5"))
    }

    /// Hash a file and persist the result under `stem`.
    pub fn compute_and_store(&self, source: &Path, stem: &str) -> Result<ContentHash, PublishError> {
        let hash = ContentHash::of_file(source)?;
        self.store(stem, &hash)?;
        Ok(hash)
    }

    /// Persist a hash under `stem`, overwriting any previous record.
    pub fn store(&self, stem: &str, hash: &ContentHash) -> Result<(), PublishError> {
        // create_dir_all tolerates a concurrently created directory
        fs::create_dir_all(&self.dir).map_err(|e| PublishError::Io(self.dir.clone(), e))?;
        let record = self.record_path(stem);
        fs::write(&record, hash.as_str()).map_err(|e| PublishError::Io(record.clone(), e))
    }

    /// Look up the recorded hash for `stem`.
    ///
    /// A missing record is `None`, not an error. A malformed record is
    /// treated the same as a missing one.
    pub fn lookup(&self, stem: &str) -> Result<Option<ContentHash>, PublishError> {
        let record = self.record_path(stem);
        match fs::read_to_string(&record) {
            Ok(content) => Ok(ContentHash::from_hex(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PublishError::Io(record, e)),
        }
    }

    /// Overwrite `to`'s record with `from`'s current hash.
    ///
    /// Used after stylesheet translation so the original asset path
    /// resolves to the rewritten artifact's content.
    pub fn copy_record(&self, from: &str, to: &str) -> Result<(), PublishError> {
        let hash = self
            .lookup(from)?
            .ok_or_else(|| PublishError::NoHash(from.to_string()))?;
        self.store(to, &hash)
    }

    /// Every hash currently on record, across all tracked assets.
    ///
    /// This is the purge exclusion set: any hash on record protects its
    /// remote object regardless of age or of whether the asset is still
    /// referenced anywhere.
    pub fn all_hashes(&self) -> FxHashSet<String> {
        let mut hashes = FxHashSet::default();
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return hashes;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md5") {
                continue;
            }
            if let Ok(content) = fs::read_to_string(&path)
                && let Some(hash) = ContentHash::from_hex(&content)
            {
                hashes.insert(hash.as_str().to_string());
            }
        }
        hashes
    }
}
