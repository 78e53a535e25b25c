//! `dtf prefetch` – fetch every known fixture into the cache.

use anyhow::{bail, Result};
use dtf_core::{Error, Fetch, Resolver};

pub fn run_prefetch<F: Fetch>(resolver: &Resolver<F>) -> Result<()> {
    let total = resolver.registry().len();
    if total == 0 {
        println!("No fixtures known; pass --manifest or set DICOM_TEST_FILES_MANIFEST.");
        return Ok(());
    }

    let mut failed = 0usize;
    for (id, result) in resolver.prefetch_all() {
        match result {
            Ok(path) => println!("{:<6} {:<48} {}", "ok", id, path.display()),
            Err(e) => {
                failed += 1;
                let label = match &e {
                    Error::Integrity { .. } => "BAD",
                    _ => "FAIL",
                };
                println!("{:<6} {:<48} {}", label, id, e);
            }
        }
    }

    println!("{} of {} fixtures cached", total - failed, total);
    if failed > 0 {
        bail!("{failed} fixtures failed to prefetch");
    }
    Ok(())
}
