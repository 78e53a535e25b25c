//! Fixture resolver: identifier in, verified local path out.
//!
//! Per identifier the state is either unresolved (no file at the final path)
//! or resolved (verified file present). The transition happens at most once
//! per cache root under the fixture's lock:
//!
//! 1. registry lookup; unknown ids fail without any I/O,
//! 2. cache lookup; a hit is returned as-is (trust on first use),
//! 3. lock, re-check, fetch, verify SHA-256, store via atomic rename.

use crate::checksum;
use crate::config::Settings;
use crate::error::Error;
use crate::fetch::{CurlFetcher, Fetch};
use crate::identifier::FixtureId;
use crate::registry::Registry;
use crate::store::CacheStore;
use std::path::PathBuf;

/// Cache state of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStatus {
    pub id: FixtureId,
    pub sha256: String,
    /// Local path if already fetched.
    pub cached: Option<PathBuf>,
}

pub struct Resolver<F = CurlFetcher> {
    registry: Registry,
    store: CacheStore,
    fetcher: F,
}

impl Resolver<CurlFetcher> {
    /// Build a curl-backed resolver. Uses `settings.manifest` when set, else
    /// the builtin fixture table.
    pub fn from_settings(settings: &Settings) -> Result<Self, Error> {
        let registry = match &settings.manifest {
            Some(path) => Registry::from_manifest_path(settings.base_url.clone(), path),
            None => Registry::builtin(settings.base_url.clone()),
        }
        .map_err(Error::Config)?;
        Ok(Self::new(
            registry,
            CacheStore::new(&settings.cache_root),
            CurlFetcher::new(settings.fetch, settings.retry),
        ))
    }

    /// Resolver configured from the config file (if any) and process environment.
    pub fn from_env() -> Result<Self, Error> {
        let settings = Settings::from_env().map_err(Error::Config)?;
        Self::from_settings(&settings)
    }
}

impl<F: Fetch> Resolver<F> {
    pub fn new(registry: Registry, store: CacheStore, fetcher: F) -> Self {
        Self {
            registry,
            store,
            fetcher,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Local path of fixture `name`, fetching and verifying it on first use.
    pub fn get(&self, name: &str) -> Result<PathBuf, Error> {
        let source = self.registry.resolve(name)?;
        let id = &source.id;

        if let Some(path) = self.store.lookup(id) {
            tracing::debug!(%id, "cache hit");
            return Ok(path);
        }

        let _lock = self.store.lock(id).map_err(Error::Cache)?;
        if let Some(path) = self.store.lookup(id) {
            tracing::debug!(%id, "stored by a concurrent caller");
            return Ok(path);
        }

        tracing::debug!(%id, "cache miss");
        let bytes = self.fetcher.fetch(&source)?;
        let actual = checksum::sha256_bytes(&bytes);
        if actual != source.sha256 {
            tracing::warn!(
                %id,
                url = %source.url,
                expected = %source.sha256,
                actual = %actual,
                "checksum mismatch; discarding download"
            );
            return Err(Error::Integrity {
                id: id.to_string(),
                expected: source.sha256,
                actual,
            });
        }

        self.store
            .store(id, &bytes, &source.sha256)
            .map_err(Error::Cache)
    }

    /// Fetch every known fixture, stopping at the first failure.
    pub fn get_all(&self) -> Result<Vec<PathBuf>, Error> {
        self.registry
            .iter()
            .map(|(id, _)| self.get(id.as_str()))
            .collect()
    }

    /// Attempt every known fixture and report each outcome.
    pub fn prefetch_all(&self) -> Vec<(FixtureId, Result<PathBuf, Error>)> {
        self.registry
            .iter()
            .map(|(id, _)| (id.clone(), self.get(id.as_str())))
            .collect()
    }

    /// Which registry entries are already cached. No network access.
    pub fn cached_status(&self) -> Vec<EntryStatus> {
        self.registry
            .iter()
            .map(|(id, sha256)| EntryStatus {
                id: id.clone(),
                sha256: sha256.to_string(),
                cached: self.store.lookup(id),
            })
            .collect()
    }
}

/// Fetch fixture `name` if needed and return its local path, using settings
/// from the environment (see [`Settings::from_env`]).
///
/// The fixture list is the builtin table unless `DICOM_TEST_FILES_MANIFEST`
/// (or `manifest` in config.toml) names a manifest. The builtin table is only
/// populated when the crate is built next to a `data/` tree (or with
/// `DICOM_TEST_FILES_DATA` set); otherwise it is empty and every name is
/// `NotFound`.
pub fn path(name: &str) -> Result<PathBuf, Error> {
    Resolver::from_env()?.get(name)
}
