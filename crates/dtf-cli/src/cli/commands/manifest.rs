//! `dtf manifest <dir>` – hash a data tree into a fixture manifest.

use anyhow::Result;
use dtf_core::source::{parse_base_url, DEFAULT_BASE_URL};
use dtf_core::Registry;
use std::path::Path;

pub fn run_manifest(dir: &Path) -> Result<()> {
    // The manifest records names and digests only; the base URL is not written.
    let registry = Registry::from_dir(parse_base_url(DEFAULT_BASE_URL)?, dir)?;
    tracing::info!(fixtures = registry.len(), dir = %dir.display(), "generated manifest");
    print!("{}", registry.to_manifest()?);
    Ok(())
}
