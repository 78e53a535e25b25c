//! Error type returned by the resolver.

use crate::config::MANIFEST_ENV;
use crate::fetch::FetchError;

/// Failure of a fixture lookup.
///
/// `NotFound` is a caller mistake and `Integrity` means the archive entry is
/// corrupt or was tampered with; neither is worth retrying. `Fetch` is usually
/// transient and callers may retry it at their discretion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The identifier is not in the registry (or is not a valid identifier at all).
    #[error("unknown test file {id:?}; {}", not_found_hint(.registry_empty))]
    NotFound { id: String, registry_empty: bool },

    /// The remote archive could not be reached or returned an error status.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The fetched content does not hash to the recorded checksum.
    #[error("checksum mismatch for {id}: expected {expected}, got {actual}")]
    Integrity {
        id: String,
        expected: String,
        actual: String,
    },

    /// Local cache directory could not be read or written.
    #[error("cache store: {0:#}")]
    Cache(anyhow::Error),

    /// Settings or fixture list could not be loaded.
    #[error("configuration: {0:#}")]
    Config(anyhow::Error),
}

fn not_found_hint(registry_empty: &bool) -> String {
    if *registry_empty {
        format!(
            "the fixture list is empty; set {} to a manifest or build with fixture data",
            MANIFEST_ENV
        )
    } else {
        "a newer fixture list may be required".to_string()
    }
}

impl Error {
    pub fn not_found(id: impl Into<String>) -> Self {
        Error::NotFound {
            id: id.into(),
            registry_empty: false,
        }
    }

    /// True for errors a caller may reasonably retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Fetch(_))
    }
}
