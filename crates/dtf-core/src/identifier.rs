//! Fixture identifiers: stable, path-like names such as `pydicom/liver.dcm`.
//!
//! An identifier doubles as the fixture's relative location both in the remote
//! archive and in the local cache, so it must never be able to escape either
//! root. Parsing rejects anything that could.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Linux NAME_MAX; a longer segment could never be created on disk.
const SEGMENT_MAX: usize = 255;

/// Why a string is not a valid fixture identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier must be relative (no leading '/')")]
    Absolute,
    #[error("identifier contains an empty path segment")]
    EmptySegment,
    #[error("path segment {0:?} starts with '.'")]
    HiddenSegment(String),
    #[error("identifier contains forbidden character {0:?}")]
    ForbiddenChar(char),
    #[error("path segment is longer than 255 bytes")]
    SegmentTooLong,
}

/// Validated identifier of one fixture.
///
/// Segments are separated by `/` regardless of platform. Segments may not be
/// empty or start with `.`; the latter rules out `.`/`..` traversal as well as
/// the cache store's own hidden temp and lock files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixtureId(String);

impl FixtureId {
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        if s.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if s.starts_with('/') {
            return Err(IdentifierError::Absolute);
        }
        if let Some(c) = s
            .chars()
            .find(|&c| c == '\\' || c == '?' || c == '#' || c.is_control())
        {
            return Err(IdentifierError::ForbiddenChar(c));
        }
        for segment in s.split('/') {
            if segment.is_empty() {
                return Err(IdentifierError::EmptySegment);
            }
            if segment.starts_with('.') {
                return Err(IdentifierError::HiddenSegment(segment.to_string()));
            }
            if segment.len() > SEGMENT_MAX {
                return Err(IdentifierError::SegmentTooLong);
            }
        }
        Ok(FixtureId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Last segment, e.g. `liver.dcm` for `pydicom/liver.dcm`.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Relative filesystem path mirroring the identifier's directory structure.
    pub fn relative_path(&self) -> PathBuf {
        self.segments().collect()
    }
}

impl fmt::Display for FixtureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for FixtureId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FixtureId::parse(s)
    }
}

impl AsRef<str> for FixtureId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
