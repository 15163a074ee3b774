//! Per-library reconciliation: merge what the upstream sources know about
//! one library into a single stored record.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config;
use crate::source::{Coordinate, LibraryIndex, LibraryPage, VersionSource};
use crate::store::{LibraryRecord, Repository, SubArtifact};
use crate::sync::{Reconciled, SyncError};
use crate::version::{VersionEntry, compare};

pub struct Reconciler<R> {
    repository: Arc<R>,
    index: Arc<dyn LibraryIndex>,
    sources: Vec<Arc<dyn VersionSource>>,
    detailed_artifacts: HashSet<String>,
    // Serializes writers per library name so overlapping reconciles of the
    // same library cannot interleave their upserts.
    name_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<R: Repository> Reconciler<R> {
    pub fn new(
        repository: Arc<R>,
        index: Arc<dyn LibraryIndex>,
        sources: Vec<Arc<dyn VersionSource>>,
        detailed_artifacts: &[String],
    ) -> Self {
        Self {
            repository,
            index,
            sources,
            detailed_artifacts: detailed_artifacts.iter().cloned().collect(),
            name_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Brings one library's stored record up to date.
    ///
    /// The detail page is best effort: when it cannot be fetched the
    /// library is reconciled from the version sources alone, and skipped
    /// entirely if they also come up empty.
    pub async fn reconcile(
        &self,
        name: &str,
        run_time: DateTime<Utc>,
    ) -> Result<Reconciled, SyncError> {
        let (page, page_known) = match self.index.fetch_library_page(name).await {
            Ok(page) => (page, true),
            Err(e) => {
                warn!("Failed to fetch detail page for '{}': {}", name, e);
                (LibraryPage::default(), false)
            }
        };

        let group_id = page
            .group_id
            .clone()
            .unwrap_or_else(|| default_group_id(name));
        let coordinate = Coordinate::new(group_id.clone(), name);

        let mut versions = self.fetch_from_sources(&coordinate).await;
        if versions.is_empty() {
            versions = page.versions.clone();
        }
        if versions.is_empty() {
            if !page_known {
                let reason = format!("no detail page and no source returned versions for '{}'", name);
                debug!("Skipping '{}': {}", name, reason);
                return Ok(Reconciled::Skipped { reason });
            }
            // The library exists upstream but exposes no version list;
            // record it with a baseline so it still shows up in listings.
            versions = vec![VersionEntry::new("1.0.0".to_string(), Some(run_time))];
        }

        versions.sort_by(|a, b| compare(&b.version, &a.version));
        versions.dedup_by(|a, b| a.version == b.version);

        let last_update = versions
            .iter()
            .filter_map(|entry| entry.release_date)
            .max()
            .unwrap_or(run_time);

        let dependencies = self.collect_sub_artifacts(&page).await;
        let artifacts_discovered = dependencies.len();

        let record = LibraryRecord {
            name: name.to_string(),
            group_id: group_id.clone(),
            versions,
            dependencies,
            maven_url: format!(
                "{}/artifact/{}/{}",
                config::ARTIFACT_BROWSER_BASE_URL,
                group_id,
                name
            ),
            last_update,
        };

        let lock = self.name_lock(name).await;
        let _guard = lock.lock().await;
        self.repository
            .upsert(&record)
            .map_err(|source| SyncError::Persistence {
                library: name.to_string(),
                source,
            })?;

        debug!(
            "Reconciled '{}': {} versions, {} sub-artifacts",
            name,
            record.versions.len(),
            artifacts_discovered
        );
        Ok(Reconciled::Updated {
            artifacts_discovered,
        })
    }

    /// Asks each source in priority order; the first non-empty answer wins.
    /// Failures are absorbed with a diagnostic so a broken source never
    /// masks a working one further down the chain.
    async fn fetch_from_sources(&self, coordinate: &Coordinate) -> Vec<VersionEntry> {
        for source in &self.sources {
            match source.fetch_versions(coordinate).await {
                Ok(versions) if !versions.is_empty() => {
                    debug!(
                        "{} returned {} versions for {}",
                        source.source_name(),
                        versions.len(),
                        coordinate
                    );
                    return versions;
                }
                Ok(_) => {
                    debug!("{} had no versions for {}", source.source_name(), coordinate);
                }
                Err(e) => {
                    warn!(
                        "{} failed for {}: {}",
                        source.source_name(),
                        coordinate,
                        e
                    );
                }
            }
        }
        Vec::new()
    }

    async fn collect_sub_artifacts(&self, page: &LibraryPage) -> Vec<SubArtifact> {
        let fetches = page.artifacts.iter().map(|coordinate| async move {
            let mut versions = Vec::new();
            if self.detailed_artifacts.contains(&coordinate.artifact_id) {
                versions = self.fetch_from_sources(coordinate).await;
                versions.sort_by(|a, b| compare(&b.version, &a.version));
                versions.dedup_by(|a, b| a.version == b.version);
            }
            SubArtifact {
                name: coordinate.artifact_id.clone(),
                artifact: coordinate.artifact_id.clone(),
                group_id: coordinate.group_id.clone(),
                versions,
            }
        });
        futures::future::join_all(fetches).await
    }

    async fn name_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.name_locks.lock().await;
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Default group id when the detail page does not state one: the prefix
/// before the first dash names the group (`lifecycle-runtime` lives in
/// `androidx.lifecycle`).
fn default_group_id(name: &str) -> String {
    let head = name.split('-').next().unwrap_or(name);
    format!("androidx.{}", head)
}
