//! CLI command handlers, one per file.

mod checksum;
mod completions;
mod get;
mod list;
mod manifest;
mod prefetch;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use get::run_get;
pub use list::run_list;
pub use manifest::run_manifest;
pub use prefetch::run_prefetch;
