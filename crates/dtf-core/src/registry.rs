//! Identifier registry: which fixtures exist and what they must hash to.
//!
//! Entries come from one of three places:
//! - the table generated at build time from the data directory (`builtin`),
//! - a TOML manifest (`[[fixture]]` entries with `name` and `sha256`),
//! - a local data tree hashed on the spot (`from_dir`).
//!
//! Lookups are pure; nothing here touches the network or the cache.

use crate::checksum;
use crate::error::Error;
use crate::identifier::FixtureId;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use url::Url;

include!(concat!(env!("OUT_DIR"), "/builtin_fixtures.rs"));

/// Where one fixture lives remotely and what it must hash to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSource {
    pub id: FixtureId,
    pub url: Url,
    /// Expected SHA-256, lowercase hex.
    pub sha256: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    #[serde(default, rename = "fixture")]
    fixtures: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestEntry {
    name: String,
    sha256: String,
}

/// Mapping from identifier to expected checksum, rooted at one archive base URL.
#[derive(Debug, Clone)]
pub struct Registry {
    base_url: Url,
    entries: BTreeMap<FixtureId, String>,
}

impl Registry {
    /// Empty registry. `base_url` should end with `/` so identifiers join beneath it.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            entries: BTreeMap::new(),
        }
    }

    /// Fixtures known when this crate was built.
    pub fn builtin(base_url: Url) -> Result<Self> {
        let mut registry = Self::new(base_url);
        for (name, sha256) in BUILTIN_FIXTURES {
            registry
                .insert(name, sha256)
                .with_context(|| format!("builtin fixture {name}"))?;
        }
        Ok(registry)
    }

    pub fn from_manifest_str(base_url: Url, data: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(data).context("parse fixture manifest")?;
        let mut registry = Self::new(base_url);
        for entry in manifest.fixtures {
            if registry.contains(&entry.name) {
                bail!("duplicate fixture {:?} in manifest", entry.name);
            }
            registry
                .insert(&entry.name, &entry.sha256)
                .with_context(|| format!("manifest entry {:?}", entry.name))?;
        }
        Ok(registry)
    }

    pub fn from_manifest_path(base_url: Url, path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("read manifest {}", path.display()))?;
        Self::from_manifest_str(base_url, &data)
            .with_context(|| format!("load manifest {}", path.display()))
    }

    /// Hash every file under `dir`; identifiers are paths relative to `dir`.
    /// Hidden files and directories are skipped.
    pub fn from_dir(base_url: Url, dir: &Path) -> Result<Self> {
        let mut registry = Self::new(base_url);
        let mut prefix = Vec::new();
        walk(dir, &mut prefix, &mut registry)?;
        Ok(registry)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, name: &str, sha256: &str) -> Result<()> {
        let id = FixtureId::parse(name)?;
        if !checksum::is_sha256_hex(sha256) {
            bail!("{sha256:?} is not a lowercase hex SHA-256 digest");
        }
        self.entries.insert(id, sha256.to_string());
        Ok(())
    }

    /// Look up an identifier. Unknown or malformed identifiers are `NotFound`.
    pub fn resolve(&self, name: &str) -> Result<RemoteSource, Error> {
        let id = FixtureId::parse(name).map_err(|_| self.not_found(name))?;
        self.resolve_id(&id)
    }

    pub fn resolve_id(&self, id: &FixtureId) -> Result<RemoteSource, Error> {
        let sha256 = self
            .entries
            .get(id)
            .ok_or_else(|| self.not_found(id.as_str()))?;
        Ok(RemoteSource {
            id: id.clone(),
            url: self.url_for(id)?,
            sha256: sha256.clone(),
        })
    }

    /// Archive URL of `id`: one percent-encoded path segment per identifier
    /// segment, always beneath `base_url`.
    pub fn url_for(&self, id: &FixtureId) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::Config(anyhow::anyhow!("base URL {} cannot have a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(id.segments());
        Ok(url)
    }

    fn not_found(&self, name: &str) -> Error {
        Error::NotFound {
            id: name.to_string(),
            registry_empty: self.entries.is_empty(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        FixtureId::parse(name)
            .map(|id| self.entries.contains_key(&id))
            .unwrap_or(false)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&FixtureId, &str)> {
        self.entries.iter().map(|(id, sha)| (id, sha.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a TOML manifest accepted by `from_manifest_str`.
    pub fn to_manifest(&self) -> Result<String> {
        let manifest = Manifest {
            fixtures: self
                .iter()
                .map(|(id, sha)| ManifestEntry {
                    name: id.to_string(),
                    sha256: sha.to_string(),
                })
                .collect(),
        };
        Ok(toml::to_string_pretty(&manifest)?)
    }
}

fn walk(dir: &Path, prefix: &mut Vec<String>, registry: &mut Registry) -> Result<()> {
    let mut children: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("read dir {}", dir.display()))?
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("read dir {}", dir.display()))?;
    children.sort_by_key(|e| e.file_name());

    for entry in children {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!("skipping non-UTF-8 path {}", entry.path().display());
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        let file_type = entry.file_type()?;
        prefix.push(name);
        if file_type.is_dir() {
            walk(&path, prefix, registry)?;
        } else if file_type.is_file() {
            let digest = checksum::sha256_path(&path)?;
            registry.insert(&prefix.join("/"), &digest)?;
        }
        prefix.pop();
    }
    Ok(())
}
