//! Query and analysis surface over the tracked libraries.
//!
//! Everything the CLI exposes goes through [`Api`]: listings, single-library
//! lookups, sync runs, catalog generation, and manifest analysis.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{self, CatalogError, VersionCatalog};
use crate::config;
use crate::store::{LibraryRecord, LibrarySummary, Repository, StoreError};
use crate::sync::{Coordinator, SyncError, SyncRunStats};
use crate::version::{ChannelLatest, Staleness, classify};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("library '{0}' not found")]
    NotFound(String),

    #[error("invalid dependency manifest: {0}")]
    BadManifest(#[from] CatalogError),

    #[error("a sync run is already in progress")]
    SyncInProgress,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::AlreadyRunning => ApiError::SyncInProgress,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// One analyzed manifest entry with its freshness verdict.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedDependency {
    pub key: String,
    pub module: String,
    pub declared_version: String,
    pub resolved_version: String,
    pub status: Staleness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<ChannelLatest>,
}

/// Stored library record paired with its release-notes page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseNotesLookup {
    pub library: LibraryRecord,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeReport {
    pub entries: Vec<AnalyzedDependency>,
    pub outdated: usize,
    pub up_to_date: usize,
    pub unknown: usize,
}

pub struct Api<R> {
    repository: Arc<R>,
    coordinator: Arc<Coordinator<R>>,
}

impl<R: Repository> Api<R> {
    pub fn new(repository: Arc<R>, coordinator: Arc<Coordinator<R>>) -> Self {
        Self {
            repository,
            coordinator,
        }
    }

    /// Summaries of every tracked library, name ascending.
    pub fn list_libraries(&self) -> Result<Vec<LibrarySummary>, ApiError> {
        Ok(self.repository.find_all_summaries()?)
    }

    /// Full record for one library.
    pub fn get_library(&self, name: &str) -> Result<LibraryRecord, ApiError> {
        self.repository
            .find_one(name)?
            .ok_or_else(|| ApiError::NotFound(name.to_string()))
    }

    /// Runs one full sync, rejecting overlap with an active run.
    pub async fn run_sync(&self) -> Result<SyncRunStats, ApiError> {
        Ok(self.coordinator.run().await?)
    }

    /// Drops every tracked record, returning how many were removed.
    pub fn clear_libraries(&self) -> Result<usize, ApiError> {
        Ok(self.repository.delete_all()?)
    }

    /// Renders a version catalog for the named libraries, or for all
    /// tracked libraries when no names are given.
    pub fn generate_catalog(&self, names: &[String]) -> Result<String, ApiError> {
        let records = if names.is_empty() {
            self.repository.find_all()?
        } else {
            let mut records = Vec::with_capacity(names.len());
            for name in names {
                records.push(self.get_library(name)?);
            }
            records
        };
        Ok(catalog::generate(&records))
    }

    /// Parses a dependency manifest and grades every entry against the
    /// tracked version data.
    pub fn analyze_manifest(&self, manifest: &str) -> Result<AnalyzeReport, ApiError> {
        let parsed: VersionCatalog = catalog::parse(manifest)?;

        let mut report = AnalyzeReport::default();
        for dependency in parsed.dependencies {
            let artifact = dependency
                .module
                .split(':')
                .nth(1)
                .unwrap_or(&dependency.module);

            let record = self.lookup_by_artifact(artifact)?;
            let entry = match record {
                Some(record) => {
                    let channels = record.channel_latest();
                    let verdict = classify(&dependency.resolved_version, &channels);
                    AnalyzedDependency {
                        key: dependency.key,
                        module: dependency.module,
                        declared_version: dependency.declared_version,
                        resolved_version: dependency.resolved_version,
                        status: verdict.status,
                        latest_version: verdict.latest_version,
                        channels: Some(channels),
                    }
                }
                None => AnalyzedDependency {
                    key: dependency.key,
                    module: dependency.module,
                    declared_version: dependency.declared_version,
                    resolved_version: dependency.resolved_version,
                    status: Staleness::Unknown,
                    latest_version: None,
                    channels: None,
                },
            };

            match entry.status {
                Staleness::Outdated => report.outdated += 1,
                Staleness::UpToDate => report.up_to_date += 1,
                Staleness::Unknown => report.unknown += 1,
                _ => {}
            }
            report.entries.push(entry);
        }
        Ok(report)
    }

    /// Stored record plus its release-notes URL, optionally anchored at a
    /// specific version. Only answers for libraries we actually track.
    pub fn release_notes_lookup(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<ReleaseNotesLookup, ApiError> {
        let library = self.get_library(name)?;
        let mut url = format!(
            "{}/jetpack/androidx/releases/{}",
            config::RELEASE_NOTES_BASE_URL,
            library.name
        );
        if let Some(version) = version {
            url.push('#');
            url.push_str(version);
        }
        Ok(ReleaseNotesLookup { library, url })
    }

    /// A module's artifact may be tracked as a library in its own right
    /// or as a sub-artifact of one; try both.
    fn lookup_by_artifact(&self, artifact: &str) -> Result<Option<LibraryRecord>, ApiError> {
        if let Some(record) = self.repository.find_one(artifact)? {
            return Ok(Some(record));
        }
        Ok(self.repository.find_one_by_dependency_artifact(artifact)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::source::MockLibraryIndex;
    use crate::store::{MockRepository, SubArtifact};
    use crate::sync::Reconciler;
    use crate::version::VersionEntry;
    use std::sync::atomic::AtomicBool;

    fn record(name: &str, versions: &[&str]) -> LibraryRecord {
        LibraryRecord {
            name: name.to_string(),
            group_id: format!("androidx.{}", name),
            versions: versions
                .iter()
                .map(|v| VersionEntry::new(v.to_string(), None))
                .collect(),
            ..Default::default()
        }
    }

    fn api(repository: MockRepository) -> Api<MockRepository> {
        let repository = Arc::new(repository);
        let index = Arc::new(MockLibraryIndex::new());
        let reconciler = Arc::new(Reconciler::new(
            repository.clone(),
            index.clone() as Arc<dyn crate::source::LibraryIndex>,
            vec![],
            &[],
        ));
        let coordinator = Arc::new(Coordinator::new(
            reconciler,
            index,
            SyncConfig::default(),
            Arc::new(AtomicBool::new(false)),
        ));
        Api::new(repository, coordinator)
    }

    #[test]
    fn get_library_maps_missing_record_to_not_found() {
        let mut repository = MockRepository::new();
        repository.expect_find_one().returning(|_| Ok(None));

        let result = api(repository).get_library("ghost");
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[test]
    fn analyze_grades_each_entry_and_totals_exact_statuses() {
        let mut repository = MockRepository::new();
        repository.expect_find_one().returning(|name| {
            Ok(match name {
                "room-runtime" => Some(record("room-runtime", &["2.7.0-rc01", "2.6.1"])),
                "core-ktx" => Some(record("core-ktx", &["1.12.0"])),
                _ => None,
            })
        });
        repository
            .expect_find_one_by_dependency_artifact()
            .returning(|_| Ok(None));

        let manifest = r#"
[versions]
room = "2.6.0"
core = "1.12.0"
mystery = "0.1.0"

[libraries]
room = { module = "androidx.room:room-runtime", version.ref = "room" }
core = { module = "androidx.core:core-ktx", version.ref = "core" }
mystery = { module = "androidx.mystery:mystery", version.ref = "mystery" }
"#;

        let report = api(repository).analyze_manifest(manifest).unwrap();

        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.outdated, 1);
        assert_eq!(report.up_to_date, 1);
        assert_eq!(report.unknown, 1);

        let room = &report.entries[0];
        assert_eq!(room.status, Staleness::Outdated);
        assert_eq!(room.latest_version.as_deref(), Some("2.6.1"));
        assert_eq!(
            room.channels.as_ref().unwrap().rc.as_deref(),
            Some("2.7.0-rc01")
        );
    }

    #[test]
    fn analyze_falls_back_to_sub_artifact_lookup() {
        let mut repository = MockRepository::new();
        repository.expect_find_one().returning(|_| Ok(None));
        repository
            .expect_find_one_by_dependency_artifact()
            .withf(|artifact: &str| artifact == "room-ktx")
            .returning(|_| {
                let mut room = record("room", &["2.6.1"]);
                room.dependencies = vec![SubArtifact {
                    name: "room-ktx".to_string(),
                    artifact: "room-ktx".to_string(),
                    group_id: "androidx.room".to_string(),
                    versions: Vec::new(),
                }];
                Ok(Some(room))
            });

        let manifest = r#"
[libraries]
room-ktx = "androidx.room:room-ktx:2.6.1"
"#;
        let report = api(repository).analyze_manifest(manifest).unwrap();
        assert_eq!(report.entries[0].status, Staleness::UpToDate);
    }

    #[test]
    fn analyze_rejects_unparseable_manifest() {
        let result = api(MockRepository::new()).analyze_manifest("");
        assert!(matches!(result, Err(ApiError::BadManifest(_))));
    }

    #[test]
    fn release_notes_lookup_appends_version_anchor() {
        let mut repository = MockRepository::new();
        repository
            .expect_find_one()
            .returning(|_| Ok(Some(record("room", &["2.6.1"]))));

        let api = api(repository);
        let plain = api.release_notes_lookup("room", None).unwrap();
        assert_eq!(
            plain.url,
            "https://developer.android.com/jetpack/androidx/releases/room"
        );
        assert_eq!(plain.library.name, "room");
        assert_eq!(
            api.release_notes_lookup("room", Some("2.6.1")).unwrap().url,
            "https://developer.android.com/jetpack/androidx/releases/room#2.6.1"
        );
    }

    #[test]
    fn generate_catalog_reports_unknown_names() {
        let mut repository = MockRepository::new();
        repository.expect_find_one().returning(|_| Ok(None));

        let result = api(repository).generate_catalog(&["ghost".to_string()]);
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[test]
    fn clear_libraries_returns_removed_count() {
        let mut repository = MockRepository::new();
        repository.expect_delete_all().returning(|| Ok(7));

        assert_eq!(api(repository).clear_libraries().unwrap(), 7);
    }
}
