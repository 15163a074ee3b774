//! Upstream source adapters
//!
//! Three independently-formatted upstreams provide candidate version lists:
//!
//! - [`package_metadata`]: machine-readable XML metadata feed (preferred)
//! - [`artifact_browser`]: HTML artifact browser, needs browser-like headers
//! - [`release_notes`]: HTML release-notes site; also the library index
//!
//! Each adapter isolates its own markup assumptions and returns structured
//! errors; the reconciler absorbs those into an empty result with a
//! diagnostic, never letting one source's failure cross its boundary.

pub mod artifact_browser;
pub mod error;
pub mod package_metadata;
pub mod release_notes;

pub use artifact_browser::{ArtifactBrowserSource, BrowserSession};
pub use error::SourceError;
pub use package_metadata::PackageMetadataSource;
pub use release_notes::ReleaseNotesSource;

use std::fmt;

#[cfg(test)]
use mockall::automock;

use crate::version::types::VersionEntry;

/// A (groupId, artifactId) pair identifying a publishable unit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
}

impl Coordinate {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    /// Group id as a repository path segment (dots to slashes)
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// Everything extracted from one library's release-notes detail page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryPage {
    /// Explicit group id when the page carries one
    pub group_id: Option<String>,
    /// Version list embedded on the page (fallback of last resort)
    pub versions: Vec<VersionEntry>,
    /// Artifact coordinates listed under the page's artifacts section
    pub artifacts: Vec<Coordinate>,
}

/// Trait for pulling candidate version lists from one upstream shape
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionSource: Send + Sync {
    /// Short name used in diagnostics
    fn source_name(&self) -> &'static str;

    /// Fetches all published versions for a coordinate
    ///
    /// # Returns
    /// * `Ok(Vec<VersionEntry>)` - candidate versions, order unspecified
    /// * `Err(SourceError)` - if the fetch or extraction fails
    async fn fetch_versions(&self, coordinate: &Coordinate)
    -> Result<Vec<VersionEntry>, SourceError>;
}

/// Trait for the library index: enumeration and per-library detail pages
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait LibraryIndex: Send + Sync {
    /// Enumerates the trackable library names, in page order
    async fn fetch_library_names(&self) -> Result<Vec<String>, SourceError>;

    /// Fetches and parses one library's detail page
    async fn fetch_library_page(&self, name: &str) -> Result<LibraryPage, SourceError>;
}
