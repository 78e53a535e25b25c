//! `dtf list` – show known fixtures and cache state.

use anyhow::Result;
use dtf_core::{Fetch, Resolver};

pub fn run_list<F: Fetch>(resolver: &Resolver<F>, json: bool) -> Result<()> {
    let entries = resolver.cached_status();

    if json {
        let rows: Vec<_> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "id": e.id.as_str(),
                    "sha256": e.sha256,
                    "cached": e.cached.as_ref().map(|p| p.display().to_string()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No fixtures known.");
        return Ok(());
    }
    println!("{:<8} {:<16} {}", "CACHED", "SHA256", "ID");
    for e in &entries {
        println!(
            "{:<8} {:<16} {}",
            if e.cached.is_some() { "yes" } else { "no" },
            &e.sha256[..16],
            e.id
        );
    }
    Ok(())
}
