//! CLI for the DICOM test file resolver.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use dtf_core::source::parse_base_url;
use dtf_core::{config, Resolver, Settings};
use std::path::{Path, PathBuf};

use commands::{
    run_checksum, run_completions, run_get, run_list, run_manifest, run_prefetch,
};

/// Top-level CLI for dtf.
#[derive(Debug, Parser)]
#[command(name = "dtf")]
#[command(about = "dtf: fetch and cache DICOM test files by name", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub opts: GlobalOpts,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Overrides applied on top of config.toml and the environment.
#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Fixture manifest (TOML) to use instead of the builtin list.
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Cache directory for fetched files.
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Base URL of the remote archive.
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,
}

impl GlobalOpts {
    fn settings(&self) -> Result<Settings> {
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let mut settings = Settings::resolve(&cfg, |key| std::env::var(key).ok())?;
        if let Some(dir) = &self.cache_dir {
            settings.cache_root = dir.clone();
        }
        if let Some(url) = &self.base_url {
            settings.base_url = parse_base_url(url)?;
        }
        if let Some(manifest) = &self.manifest {
            settings.manifest = Some(manifest.clone());
        }
        Ok(settings)
    }

    fn resolver(&self) -> Result<Resolver> {
        let settings = self.settings()?;
        tracing::debug!(
            cache = %settings.cache_root.display(),
            base_url = %settings.base_url,
            "resolver settings"
        );
        Ok(Resolver::from_settings(&settings)?)
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Resolve fixtures by name, fetching if needed, and print their local paths.
    Get {
        /// Fixture identifiers, e.g. pydicom/liver.dcm.
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,
    },

    /// Fetch every known fixture into the cache.
    Prefetch,

    /// List known fixtures and whether each is cached.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: String,
    },

    /// Hash a local data directory and print a fixture manifest.
    Manifest {
        /// Root of the data tree; identifiers are relative to it.
        dir: PathBuf,
    },

    /// Print shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let opts = cli.opts;

        match cli.command {
            CliCommand::Get { ids } => run_get(&opts.resolver()?, &ids)?,
            CliCommand::Prefetch => run_prefetch(&opts.resolver()?)?,
            CliCommand::List { json } => run_list(&opts.resolver()?, json)?,
            CliCommand::Checksum { path } => run_checksum(Path::new(&path))?,
            CliCommand::Manifest { dir } => run_manifest(&dir)?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
