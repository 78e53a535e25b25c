//! Fetcher: one plain GET per missing fixture.
//!
//! The fetcher only transfers bytes. Checksum verification and storage are the
//! resolver's job, so a fetcher never touches the cache directory.

mod error;

pub use error::FetchError;

use crate::registry::RemoteSource;
use crate::retry::{run_with_retry, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;

/// Transport that retrieves a fixture's raw bytes.
pub trait Fetch {
    fn fetch(&self, source: &RemoteSource) -> Result<Vec<u8>, FetchError>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, source: &RemoteSource) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(source)
    }
}

impl<T: Fetch + ?Sized> Fetch for Arc<T> {
    fn fetch(&self, source: &RemoteSource) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(source)
    }
}

/// Transfer limits applied to each GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    /// Upper bound for the whole transfer.
    pub timeout: Duration,
    /// Abort if throughput stays below `low_speed_limit` bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub max_redirections: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(300),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            max_redirections: 10,
        }
    }
}

/// libcurl-backed fetcher. Handles `http://`, `https://` and `file://` URLs.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    options: FetchOptions,
    retry: RetryPolicy,
}

impl CurlFetcher {
    pub fn new(options: FetchOptions, retry: RetryPolicy) -> Self {
        Self { options, retry }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }
}

impl Fetch for CurlFetcher {
    fn fetch(&self, source: &RemoteSource) -> Result<Vec<u8>, FetchError> {
        let url = source.url.as_str();
        tracing::info!(id = %source.id, url, "fetching fixture");
        let body = run_with_retry(&self.retry, || get_once(url, &self.options))?;
        tracing::debug!(id = %source.id, bytes = body.len(), "fetch complete");
        Ok(body)
    }
}

/// Single GET of `url` into memory.
fn get_once(url: &str, opts: &FetchOptions) -> Result<Vec<u8>, FetchError> {
    let transport = |source: curl::Error| FetchError::Transport {
        url: url.to_string(),
        source,
    };

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(transport)?;
    easy.useragent(concat!("dtf/", env!("CARGO_PKG_VERSION")))
        .map_err(transport)?;
    easy.follow_location(true).map_err(transport)?;
    easy.max_redirections(opts.max_redirections)
        .map_err(transport)?;
    easy.connect_timeout(opts.connect_timeout)
        .map_err(transport)?;
    easy.low_speed_limit(opts.low_speed_limit)
        .map_err(transport)?;
    easy.low_speed_time(opts.low_speed_time)
        .map_err(transport)?;
    easy.timeout(opts.timeout).map_err(transport)?;

    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(transport)?;
        transfer.perform().map_err(transport)?;
    }

    // file:// transfers report status 0.
    let code = easy.response_code().map_err(transport)?;
    if code != 0 && !(200..300).contains(&code) {
        return Err(FetchError::Http {
            url: url.to_string(),
            status: code,
        });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::FixtureId;
    use std::io::Write;

    fn file_source(path: &std::path::Path) -> RemoteSource {
        RemoteSource {
            id: FixtureId::parse("CT/1.dcm").unwrap(),
            url: url::Url::from_file_path(path).unwrap(),
            sha256: String::new(),
        }
    }

    #[test]
    fn default_options() {
        let o = FetchOptions::default();
        assert_eq!(o.connect_timeout, Duration::from_secs(30));
        assert_eq!(o.timeout, Duration::from_secs(300));
        assert_eq!(o.max_redirections, 10);
    }

    #[test]
    fn curl_fetches_file_url() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"DICM payload").unwrap();
        f.flush().unwrap();
        let body = CurlFetcher::default().fetch(&file_source(f.path())).unwrap();
        assert_eq!(body, b"DICM payload");
    }

    #[test]
    fn curl_missing_file_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CurlFetcher::default()
            .fetch(&file_source(&dir.path().join("missing.dcm")))
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
        assert!(err.url().starts_with("file://"));
    }
}
