//! Local cache store: fetched fixtures under a dedicated root directory.
//!
//! Layout mirrors identifiers: `CT/1.dcm` lives at `<root>/CT/1.dcm`. Writes go
//! to a hidden `.part` temp file in the destination directory and are renamed
//! into place, so the final path only ever holds complete, verified content.
//! Per-fixture advisory locks live flat under `<root>/.locks/`, one file per
//! identifier named by the SHA-256 of the identifier.

use crate::checksum;
use crate::identifier::FixtureId;
use anyhow::{bail, Context, Result};
use fs4::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

const LOCKS_DIR: &str = ".locks";

/// Exclusive advisory lock on one fixture, released on drop.
#[derive(Debug)]
pub struct EntryLock {
    _file: File,
    path: PathBuf,
}

impl EntryLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Directory of cached fixtures.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final location of `id`, whether or not it exists yet.
    pub fn path_for(&self, id: &FixtureId) -> PathBuf {
        self.root.join(id.relative_path())
    }

    /// Path of the cached file, or `None` on a miss.
    pub fn lookup(&self, id: &FixtureId) -> Option<PathBuf> {
        let path = self.path_for(id);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }

    /// Store `bytes` as `id`. `sha256` must be the digest of `bytes`.
    ///
    /// Idempotent: if the entry already exists with the same checksum nothing is
    /// written and the existing path is returned. An existing file with a
    /// different checksum is replaced.
    pub fn store(&self, id: &FixtureId, bytes: &[u8], sha256: &str) -> Result<PathBuf> {
        let actual = checksum::sha256_bytes(bytes);
        if actual != sha256 {
            bail!("refusing to store {id}: content hashes to {actual}, expected {sha256}");
        }

        let final_path = self.path_for(id);
        if self.lookup(id).is_some() {
            let existing = checksum::sha256_path(&final_path)?;
            if existing == sha256 {
                tracing::debug!(%id, "already stored");
                return Ok(final_path);
            }
            tracing::warn!(%id, existing = %existing, "replacing cached file with mismatching checksum");
        }

        let parent = final_path
            .parent()
            .with_context(|| format!("no parent directory for {}", final_path.display()))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;

        let prefix = format!(".{}.", id.file_name());
        let mut temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(parent)
            .with_context(|| format!("create temp file in {}", parent.display()))?;
        temp.write_all(bytes)
            .with_context(|| format!("write {}", temp.path().display()))?;
        temp.as_file().sync_all().context("sync temp file")?;
        temp.persist(&final_path).map_err(|e| {
            anyhow::Error::new(e.error).context(format!("rename into {}", final_path.display()))
        })?;

        tracing::info!(%id, path = %final_path.display(), bytes = bytes.len(), "stored fixture");
        Ok(final_path)
    }

    /// Block until this process holds the exclusive lock for `id`.
    pub fn lock(&self, id: &FixtureId) -> Result<EntryLock> {
        let dir = self.root.join(LOCKS_DIR);
        fs::create_dir_all(&dir).with_context(|| format!("create lock dir {}", dir.display()))?;
        let path = dir.join(format!(
            "{}.lock",
            checksum::sha256_bytes(id.as_str().as_bytes())
        ));

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("open lock {}", path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("lock {}", path.display()))?;
        Ok(EntryLock { _file: file, path })
    }
}
