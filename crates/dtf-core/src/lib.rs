//! Fetch-on-first-use access to the DICOM test file collection.
//!
//! Test suites ask for a fixture by its relative name and get back a local
//! path. Files are downloaded from the archive the first time they are needed,
//! verified against a recorded SHA-256, and cached for later runs.
//!
//! ```no_run
//! # fn main() -> Result<(), dtf_core::Error> {
//! let liver = dtf_core::path("pydicom/liver.dcm")?;
//! # let _ = liver;
//! # Ok(())
//! # }
//! ```
//!
//! The archive location defaults to the upstream repository's `data` folder
//! and can be overridden with `DICOM_TEST_FILES_URL`; the cache root with
//! `DICOM_TEST_FILES_DIR`. For full control build a [`Resolver`] from explicit
//! [`Settings`].
//!
//! Known names come from a table generated at build time from a `data/` tree
//! (or `DICOM_TEST_FILES_DATA`). When the crate is built without one, that
//! table is empty: point `DICOM_TEST_FILES_MANIFEST` at a fixture manifest
//! (as written by `dtf manifest`) or every lookup fails with
//! [`Error::NotFound`].

pub mod checksum;
pub mod config;
pub mod error;
pub mod fetch;
pub mod identifier;
pub mod logging;
pub mod registry;
pub mod resolver;
pub mod retry;
pub mod source;
pub mod store;

pub use config::Settings;
pub use error::Error;
pub use fetch::{CurlFetcher, Fetch, FetchError, FetchOptions};
pub use identifier::FixtureId;
pub use registry::{Registry, RemoteSource};
pub use resolver::{path, EntryStatus, Resolver};
pub use store::CacheStore;
