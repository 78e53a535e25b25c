//! `dtf get <id>...` – resolve fixtures and print their local paths.

use anyhow::{bail, Result};
use dtf_core::{Fetch, Resolver};

/// Prints one path per resolved id. Keeps going after a failure so every
/// problem is reported, then fails if any id could not be resolved.
pub fn run_get<F: Fetch>(resolver: &Resolver<F>, ids: &[String]) -> Result<()> {
    let mut failed = 0usize;
    for id in ids {
        match resolver.get(id) {
            Ok(path) => println!("{}", path.display()),
            Err(e) => {
                tracing::error!(id = %id, "get failed: {}", e);
                eprintln!("{id}: {e}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} fixtures could not be resolved", ids.len());
    }
    Ok(())
}
