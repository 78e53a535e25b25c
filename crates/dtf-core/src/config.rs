//! Configuration: `~/.config/dtf/config.toml` plus environment overrides,
//! resolved into the explicit [`Settings`] a resolver is built from.

use crate::fetch::FetchOptions;
use crate::retry::RetryPolicy;
use crate::source;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "DICOM_TEST_FILES_DIR";
/// Environment variable pointing at a fixture manifest to use instead of the builtin table.
pub const MANIFEST_ENV: &str = "DICOM_TEST_FILES_MANIFEST";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per fixture (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/dtf/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DtfConfig {
    /// Archive base URL; None = upstream default (see `source`).
    pub base_url: Option<String>,
    /// Cache root; None = `$XDG_CACHE_HOME/dtf/files`.
    pub cache_dir: Option<PathBuf>,
    /// Fixture manifest replacing the builtin table.
    pub manifest: Option<PathBuf>,
    pub connect_timeout_secs: u64,
    /// Upper bound for one whole transfer.
    pub timeout_secs: u64,
    /// Abort transfers slower than this many bytes/s for `low_speed_time_secs`.
    pub low_speed_limit_bytes: u32,
    pub low_speed_time_secs: u64,
    /// Optional retry policy; if missing, each fixture is fetched once.
    pub retry: Option<RetryConfig>,
}

impl Default for DtfConfig {
    fn default() -> Self {
        let fetch = FetchOptions::default();
        Self {
            base_url: None,
            cache_dir: None,
            manifest: None,
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            timeout_secs: fetch.timeout.as_secs(),
            low_speed_limit_bytes: fetch.low_speed_limit,
            low_speed_time_secs: fetch.low_speed_time.as_secs(),
            retry: None,
        }
    }
}

impl DtfConfig {
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            low_speed_limit: self.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(self.low_speed_time_secs),
            ..FetchOptions::default()
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dtf")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// `$XDG_CACHE_HOME/dtf/files` (usually `~/.cache/dtf/files`).
pub fn default_cache_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dtf")?;
    Ok(xdg_dirs.get_cache_home().join("dtf").join("files"))
}

pub fn load_from_path(path: &Path) -> Result<DtfConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DtfConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DtfConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration if the file exists; never writes. Used by library callers
/// running inside other projects' test suites.
pub fn load_existing() -> Result<DtfConfig> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dtf")?;
    match xdg_dirs.find_config_file("config.toml") {
        Some(path) => load_from_path(&path),
        None => Ok(DtfConfig::default()),
    }
}

/// Everything a resolver needs, resolved up front and passed explicitly.
#[derive(Debug, Clone)]
pub struct Settings {
    pub cache_root: PathBuf,
    pub base_url: Url,
    /// Manifest to load instead of the builtin table.
    pub manifest: Option<PathBuf>,
    pub fetch: FetchOptions,
    pub retry: RetryPolicy,
}

impl Settings {
    /// Settings with default transfer limits and no retries.
    pub fn new(cache_root: impl Into<PathBuf>, base_url: Url) -> Self {
        Self {
            cache_root: cache_root.into(),
            base_url,
            manifest: None,
            fetch: FetchOptions::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Combine `cfg` with environment overrides read through `env`.
    pub fn resolve<E>(cfg: &DtfConfig, env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let cache_root = match non_empty(CACHE_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => match &cfg.cache_dir {
                Some(dir) => dir.clone(),
                None => default_cache_dir()?,
            },
        };
        let manifest = non_empty(MANIFEST_ENV)
            .map(PathBuf::from)
            .or_else(|| cfg.manifest.clone());
        let base_url = source::resolve_base_url(cfg.base_url.as_deref(), &env)?;

        Ok(Self {
            cache_root,
            base_url,
            manifest,
            fetch: cfg.fetch_options(),
            retry: cfg.retry_policy(),
        })
    }

    /// Settings from the config file (if any) and the process environment.
    pub fn from_env() -> Result<Self> {
        let cfg = load_existing()?;
        Self::resolve(&cfg, |key| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn default_config_values() {
        let cfg = DtfConfig::default();
        assert!(cfg.base_url.is_none());
        assert!(cfg.cache_dir.is_none());
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert_eq!(cfg.timeout_secs, 300);
        assert_eq!(cfg.retry_policy().max_attempts, 1);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = DtfConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: DtfConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.timeout_secs, cfg.timeout_secs);
        assert_eq!(parsed.low_speed_limit_bytes, cfg.low_speed_limit_bytes);
        assert!(parsed.retry.is_none());
    }

    #[test]
    fn config_toml_partial_uses_defaults() {
        let cfg: DtfConfig = toml::from_str(r#"cache_dir = "/srv/fixtures""#).unwrap();
        assert_eq!(cfg.cache_dir.as_deref(), Some(Path::new("/srv/fixtures")));
        assert_eq!(cfg.timeout_secs, 300);
    }

    #[test]
    fn config_toml_retry_and_timeouts() {
        let toml = r#"
            base_url = "http://127.0.0.1:9000/data"
            connect_timeout_secs = 5
            timeout_secs = 60

            [retry]
            max_attempts = 4
            base_delay_secs = 0.5
            max_delay_secs = 15
        "#;
        let cfg: DtfConfig = toml::from_str(toml).unwrap();
        let fetch = cfg.fetch_options();
        assert_eq!(fetch.connect_timeout, Duration::from_secs(5));
        assert_eq!(fetch.timeout, Duration::from_secs(60));
        let retry = cfg.retry_policy();
        assert_eq!(retry.max_attempts, 4);
        assert_eq!(retry.base_delay, Duration::from_millis(500));
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = 12\n").unwrap();
        assert_eq!(load_from_path(&path).unwrap().timeout_secs, 12);
        fs::write(&path, "timeout_secs = \"soon\"\n").unwrap();
        assert!(load_from_path(&path).is_err());
    }

    #[test]
    fn settings_env_overrides_config() {
        let cfg = DtfConfig {
            cache_dir: Some(PathBuf::from("/from/config")),
            base_url: Some("http://config.example/data/".into()),
            ..DtfConfig::default()
        };
        let env = env_from(&[
            (CACHE_DIR_ENV, "/from/env"),
            (MANIFEST_ENV, "/etc/fixtures.toml"),
            (source::URL_ENV, "http://env.example/data"),
        ]);
        let s = Settings::resolve(&cfg, env).unwrap();
        assert_eq!(s.cache_root, PathBuf::from("/from/env"));
        assert_eq!(s.manifest, Some(PathBuf::from("/etc/fixtures.toml")));
        assert_eq!(s.base_url.as_str(), "http://env.example/data/");
    }

    #[test]
    fn settings_fall_back_to_config() {
        let cfg = DtfConfig {
            cache_dir: Some(PathBuf::from("/from/config")),
            base_url: Some("http://config.example/data".into()),
            retry: Some(RetryConfig::default()),
            ..DtfConfig::default()
        };
        let s = Settings::resolve(&cfg, env_from(&[(CACHE_DIR_ENV, "  ")])).unwrap();
        assert_eq!(s.cache_root, PathBuf::from("/from/config"));
        assert_eq!(s.base_url.as_str(), "http://config.example/data/");
        assert!(s.manifest.is_none());
        assert_eq!(s.retry.max_attempts, 3);
    }
}
