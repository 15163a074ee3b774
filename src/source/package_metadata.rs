//! Package-repository metadata feed adapter (preferred source)
//!
//! Reads the `maven-metadata.xml` published next to each artifact. The feed
//! lists every published version identifier but carries no per-version
//! release date, so the fetch time stands in as a placeholder.

use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::config::PACKAGE_METADATA_BASE_URL;
use crate::source::error::SourceError;
use crate::source::{Coordinate, VersionSource};
use crate::version::types::VersionEntry;

/// `<metadata>` document root
#[derive(Debug, Deserialize)]
struct MavenMetadata {
    versioning: Versioning,
}

#[derive(Debug, Deserialize)]
struct Versioning {
    #[serde(default)]
    versions: Versions,
}

#[derive(Debug, Default, Deserialize)]
struct Versions {
    #[serde(default, rename = "version")]
    version: Vec<String>,
}

/// Adapter for the raw package-repository metadata feed
pub struct PackageMetadataSource {
    client: reqwest::Client,
    base_url: String,
}

impl PackageMetadataSource {
    /// Creates a new PackageMetadataSource with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("androidx-tracker")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
        }
    }
}

impl Default for PackageMetadataSource {
    fn default() -> Self {
        Self::new(PACKAGE_METADATA_BASE_URL)
    }
}

#[async_trait::async_trait]
impl VersionSource for PackageMetadataSource {
    fn source_name(&self) -> &'static str {
        "package-metadata"
    }

    async fn fetch_versions(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Vec<VersionEntry>, SourceError> {
        let url = format!(
            "{}/{}/{}/maven-metadata.xml",
            self.base_url,
            coordinate.group_path(),
            coordinate.artifact_id
        );

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(coordinate.to_string()));
        }

        if !status.is_success() {
            warn!("metadata feed returned status {}: {}", status, url);
            return Err(SourceError::Status { status, url });
        }

        let body = response.text().await?;
        let metadata: MavenMetadata = quick_xml::de::from_str(&body).map_err(|e| {
            warn!("Failed to parse metadata feed for {}: {}", coordinate, e);
            SourceError::MalformedPayload(e.to_string())
        })?;

        // No release-date granularity in this feed; synthesize the fetch time.
        let fetched_at = Utc::now();
        let entries = metadata
            .versioning
            .versions
            .version
            .into_iter()
            .map(|version| VersionEntry::new(version, Some(fetched_at)))
            .collect();

        Ok(entries)
    }
}
