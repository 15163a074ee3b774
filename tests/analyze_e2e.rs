//! End-to-end flows against mocked upstreams: sync into a real SQLite
//! database, then query and analyze through the public API.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::Utc;
use mockito::Server;
use tempfile::TempDir;

use androidx_tracker::api::Api;
use androidx_tracker::config::SyncConfig;
use androidx_tracker::source::{LibraryIndex, PackageMetadataSource, ReleaseNotesSource};
use androidx_tracker::store::{LibraryRecord, Repository, SqliteRepository};
use androidx_tracker::sync::{Coordinator, Reconciled, Reconciler};
use androidx_tracker::version::{Channel, Staleness};

const ROOM_METADATA_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>androidx.room</groupId>
  <artifactId>room</artifactId>
  <versioning>
    <latest>2.6.1</latest>
    <release>2.6.1</release>
    <versions>
      <version>2.6.0</version>
      <version>2.6.1</version>
    </versions>
  </versioning>
</metadata>"#;

fn fast_config() -> SyncConfig {
    SyncConfig {
        backoff_unit_ms: 0,
        pacing_min_ms: 0,
        pacing_max_ms: 0,
        detailed_artifacts: Vec::new(),
    }
}

struct Harness {
    _temp_dir: TempDir,
    repository: Arc<SqliteRepository>,
    reconciler: Arc<Reconciler<SqliteRepository>>,
    api: Api<SqliteRepository>,
}

fn harness(notes_url: &str, metadata_url: &str) -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let repository = Arc::new(SqliteRepository::new(&temp_dir.path().join("test.db")).unwrap());

    let index = Arc::new(ReleaseNotesSource::new(notes_url)) as Arc<dyn LibraryIndex>;
    let reconciler = Arc::new(Reconciler::new(
        repository.clone(),
        index.clone(),
        vec![Arc::new(PackageMetadataSource::new(metadata_url))],
        &[],
    ));
    let coordinator = Arc::new(Coordinator::new(
        reconciler.clone(),
        index,
        fast_config(),
        Arc::new(AtomicBool::new(false)),
    ));
    let api = Api::new(repository.clone(), coordinator);

    Harness {
        _temp_dir: temp_dir,
        repository,
        reconciler,
        api,
    }
}

#[tokio::test]
async fn reconcile_then_analyze_flags_outdated_dependency() {
    let mut notes = Server::new_async().await;
    let mut metadata = Server::new_async().await;

    notes
        .mock("GET", "/jetpack/androidx/releases/room")
        .with_status(404)
        .create_async()
        .await;
    let metadata_mock = metadata
        .mock("GET", "/androidx/room/room/maven-metadata.xml")
        .with_status(200)
        .with_body(ROOM_METADATA_XML)
        .create_async()
        .await;

    let harness = harness(&notes.url(), &metadata.url());
    let outcome = harness
        .reconciler
        .reconcile("room", Utc::now())
        .await
        .unwrap();
    assert!(matches!(outcome, Reconciled::Updated { .. }));
    metadata_mock.assert_async().await;

    let record = harness.api.get_library("room").unwrap();
    assert_eq!(record.group_id, "androidx.room");
    assert_eq!(record.versions[0].version, "2.6.1");

    let report = harness
        .api
        .analyze_manifest(
            r#"
[versions]
room = "2.6.0"

[libraries]
room = { module = "androidx.room:room", version.ref = "room" }
"#,
        )
        .unwrap();

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].status, Staleness::Outdated);
    assert_eq!(report.entries[0].latest_version.as_deref(), Some("2.6.1"));
    assert_eq!(report.outdated, 1);
}

#[tokio::test]
async fn reconcile_twice_leaves_a_single_record() {
    let mut notes = Server::new_async().await;
    let mut metadata = Server::new_async().await;

    notes
        .mock("GET", "/jetpack/androidx/releases/room")
        .with_status(404)
        .expect(2)
        .create_async()
        .await;
    metadata
        .mock("GET", "/androidx/room/room/maven-metadata.xml")
        .with_status(200)
        .with_body(ROOM_METADATA_XML)
        .expect(2)
        .create_async()
        .await;

    let harness = harness(&notes.url(), &metadata.url());
    harness.reconciler.reconcile("room", Utc::now()).await.unwrap();
    let first = harness.repository.find_one("room").unwrap().unwrap();
    harness.reconciler.reconcile("room", Utc::now()).await.unwrap();

    let records = harness.repository.find_all().unwrap();
    assert_eq!(records.len(), 1);
    let second = &records[0];

    // The second pass must reproduce the first record exactly, apart from
    // the synthesized fetch timestamps.
    assert_eq!(second.name, first.name);
    assert_eq!(second.group_id, first.group_id);
    assert_eq!(second.maven_url, first.maven_url);
    assert_eq!(second.dependencies, first.dependencies);
    let shape = |record: &LibraryRecord| -> Vec<(String, Channel)> {
        record
            .versions
            .iter()
            .map(|entry| (entry.version.clone(), entry.channel))
            .collect()
    };
    assert_eq!(shape(second), shape(&first));
}

#[tokio::test]
async fn full_run_updates_every_enumerated_library() {
    let mut notes = Server::new_async().await;
    let mut metadata = Server::new_async().await;

    notes
        .mock("GET", "/jetpack/androidx/versions")
        .with_status(200)
        .with_body(
            r#"<table><tbody>
              <tr><td>core</td></tr>
              <tr><td>room</td></tr>
            </tbody></table>"#,
        )
        .create_async()
        .await;
    notes
        .mock(
            "GET",
            mockito::Matcher::Regex("^/jetpack/androidx/releases/".to_string()),
        )
        .with_status(404)
        .expect_at_least(2)
        .create_async()
        .await;
    metadata
        .mock("GET", "/androidx/core/core/maven-metadata.xml")
        .with_status(200)
        .with_body(ROOM_METADATA_XML.replace("room", "core").as_str())
        .create_async()
        .await;
    metadata
        .mock("GET", "/androidx/room/room/maven-metadata.xml")
        .with_status(200)
        .with_body(ROOM_METADATA_XML)
        .create_async()
        .await;

    let harness = harness(&notes.url(), &metadata.url());
    let stats = harness.api.run_sync().await.unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(stats.updated, 2);
    assert_eq!(stats.failed, 0);

    let names: Vec<String> = harness
        .api
        .list_libraries()
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["core", "room"]);
}

#[tokio::test]
async fn full_run_with_dead_upstreams_skips_rather_than_fails() {
    let mut notes = Server::new_async().await;
    let metadata = Server::new_async().await;

    notes
        .mock("GET", "/jetpack/androidx/versions")
        .with_status(200)
        .with_body(
            r#"<table><tbody>
              <tr><td>core</td></tr>
              <tr><td>room</td></tr>
            </tbody></table>"#,
        )
        .create_async()
        .await;
    notes
        .mock(
            "GET",
            mockito::Matcher::Regex("^/jetpack/androidx/releases/".to_string()),
        )
        .with_status(404)
        .expect_at_least(2)
        .create_async()
        .await;
    // metadata server answers nothing: every lookup 501s

    let harness = harness(&notes.url(), &metadata.url());
    let stats = harness.api.run_sync().await.unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.failed, 0);
    assert!(harness.api.list_libraries().unwrap().is_empty());
}
