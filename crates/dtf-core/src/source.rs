//! Remote archive base URL selection.
//!
//! Precedence: `DICOM_TEST_FILES_URL` → configured `base_url` → the pull
//! request's head branch when running in GitHub Actions for the fixture
//! repository itself → the upstream `master` branch.

use anyhow::{bail, Context, Result};
use url::Url;

/// Environment variable overriding the archive base URL.
pub const URL_ENV: &str = "DICOM_TEST_FILES_URL";

pub const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/robyoung/dicom-test-files/master/data/";

const RAW_GITHUBUSERCONTENT_URL: &str = "https://raw.githubusercontent.com";
const FIXTURE_REPOSITORY_SUFFIX: &str = "/dicom-test-files";

/// Parse a base URL, appending the trailing `/` that `Url::join` needs to keep
/// the last path segment.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&normalized).with_context(|| format!("invalid base URL {raw:?}"))?;
    if url.cannot_be_a_base() {
        bail!("base URL {raw:?} cannot have paths joined onto it");
    }
    Ok(url)
}

/// Pick the base URL from the environment (via `env`) and the configured value.
pub fn resolve_base_url<E>(configured: Option<&str>, env: &E) -> Result<Url>
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(url) = env(URL_ENV).filter(|u| !u.trim().is_empty()) {
        tracing::debug!(url = %url, "base URL from {}", URL_ENV);
        return parse_base_url(&url);
    }
    if let Some(url) = configured.filter(|u| !u.trim().is_empty()) {
        return parse_base_url(url);
    }
    if let Some(url) = pull_request_base_url(env) {
        tracing::debug!(url = %url, "base URL from pull request head");
        return parse_base_url(&url);
    }
    parse_base_url(DEFAULT_BASE_URL)
}

/// When CI builds a pull request against the fixture repository, serve the
/// fixtures from the PR's head branch so newly added files resolve.
fn pull_request_base_url<E>(env: &E) -> Option<String>
where
    E: Fn(&str) -> Option<String>,
{
    if env("CI").as_deref() != Some("true") {
        return None;
    }
    let repository = env("GITHUB_REPOSITORY")?;
    if !repository.ends_with(FIXTURE_REPOSITORY_SUFFIX) {
        return None;
    }
    if env("GITHUB_EVENT_NAME").as_deref() != Some("pull_request") {
        return None;
    }
    let head_ref = env("GITHUB_HEAD_REF").filter(|r| !r.is_empty())?;
    Some(format!(
        "{RAW_GITHUBUSERCONTENT_URL}/{repository}/{head_ref}/data/"
    ))
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
    fn default_when_nothing_set() {
        let url = resolve_base_url(None, &env_from(&[])).unwrap();
        assert_eq!(url.as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn env_override_gets_trailing_slash() {
        let env = env_from(&[(URL_ENV, "https://example.org/me/new/data")]);
        let url = resolve_base_url(Some("https://ignored.example/"), &env).unwrap();
        assert_eq!(url.as_str(), "https://example.org/me/new/data/");
    }

    #[test]
    fn empty_env_falls_through_to_config() {
        let env = env_from(&[(URL_ENV, "")]);
        let url = resolve_base_url(Some("http://127.0.0.1:8080/data"), &env).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/data/");
    }

    #[test]
    fn pull_request_uses_head_branch() {
        let env = env_from(&[
            ("CI", "true"),
            ("GITHUB_REPOSITORY", "someone/dicom-test-files"),
            ("GITHUB_EVENT_NAME", "pull_request"),
            ("GITHUB_HEAD_REF", "more-dicom"),
        ]);
        let url = resolve_base_url(None, &env).unwrap();
        assert_eq!(
            url.as_str(),
            "https://raw.githubusercontent.com/someone/dicom-test-files/more-dicom/data/"
        );
    }

    #[test]
    fn ci_push_or_other_repository_uses_default() {
        let push = env_from(&[
            ("CI", "true"),
            ("GITHUB_REPOSITORY", "someone/dicom-test-files"),
            ("GITHUB_EVENT_NAME", "push"),
        ]);
        assert_eq!(resolve_base_url(None, &push).unwrap().as_str(), DEFAULT_BASE_URL);

        let other = env_from(&[
            ("CI", "true"),
            ("GITHUB_REPOSITORY", "someone/dicom-rs"),
            ("GITHUB_EVENT_NAME", "pull_request"),
            ("GITHUB_HEAD_REF", "feature"),
        ]);
        assert_eq!(resolve_base_url(None, &other).unwrap().as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("mailto:someone@example.org").is_err());
    }
}
