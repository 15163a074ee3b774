//! Library persistence on SQLite.
//!
//! One row per tracked library, keyed by name; version histories and
//! sub-artifacts are stored as JSON columns since they are only ever read
//! and written whole.

pub mod error;
pub mod types;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use rusqlite::Connection;
use tracing::{debug, info};

pub use error::StoreError;
pub use types::{LibraryRecord, LibrarySummary, SubArtifact};

/// Storage seam for everything above the database.
#[cfg_attr(test, automock)]
pub trait Repository: Send + Sync {
    /// All records, name ascending.
    fn find_all(&self) -> Result<Vec<LibraryRecord>, StoreError>;

    /// Listing projection of all records, name ascending.
    fn find_all_summaries(&self) -> Result<Vec<LibrarySummary>, StoreError>;

    fn find_one(&self, name: &str) -> Result<Option<LibraryRecord>, StoreError>;

    /// Finds the library that tracks the given artifact as a sub-artifact.
    fn find_one_by_dependency_artifact(
        &self,
        artifact: &str,
    ) -> Result<Option<LibraryRecord>, StoreError>;

    /// Inserts or fully replaces the record stored under its name.
    fn upsert(&self, record: &LibraryRecord) -> Result<(), StoreError>;

    /// Removes every record, returning how many were deleted.
    fn delete_all(&self) -> Result<usize, StoreError>;
}

pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    pub fn new(db_path: &Path) -> Result<Self, StoreError> {
        info!("Opening library database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let repository = Self {
            conn: Mutex::new(conn),
        };
        repository.create_schema()?;

        debug!("Library database ready");
        Ok(repository)
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS libraries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                group_id TEXT NOT NULL,
                versions TEXT NOT NULL,
                dependencies TEXT NOT NULL,
                maven_url TEXT NOT NULL,
                last_update TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(())
    }

    fn record_from_row(row: &rusqlite::Row<'_>) -> Result<LibraryRecord, StoreError> {
        let versions: String = row.get("versions")?;
        let dependencies: String = row.get("dependencies")?;
        let last_update: String = row.get("last_update")?;

        Ok(LibraryRecord {
            name: row.get("name")?,
            group_id: row.get("group_id")?,
            versions: serde_json::from_str(&versions)?,
            dependencies: serde_json::from_str(&dependencies)?,
            maven_url: row.get("maven_url")?,
            last_update: DateTime::parse_from_rfc3339(&last_update)?.with_timezone(&Utc),
        })
    }
}

const SELECT_COLUMNS: &str =
    "name, group_id, versions, dependencies, maven_url, last_update";

impl Repository for SqliteRepository {
    fn find_all(&self) -> Result<Vec<LibraryRecord>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM libraries ORDER BY name ASC",
            SELECT_COLUMNS
        ))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>("name")?,
                    row.get::<_, String>("group_id")?,
                    row.get::<_, String>("versions")?,
                    row.get::<_, String>("dependencies")?,
                    row.get::<_, String>("maven_url")?,
                    row.get::<_, String>("last_update")?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for (name, group_id, versions, dependencies, maven_url, last_update) in rows {
            records.push(LibraryRecord {
                name,
                group_id,
                versions: serde_json::from_str(&versions)?,
                dependencies: serde_json::from_str(&dependencies)?,
                maven_url,
                last_update: DateTime::parse_from_rfc3339(&last_update)?.with_timezone(&Utc),
            });
        }
        Ok(records)
    }

    fn find_all_summaries(&self) -> Result<Vec<LibrarySummary>, StoreError> {
        Ok(self.find_all()?.iter().map(LibrarySummary::from).collect())
    }

    fn find_one(&self, name: &str) -> Result<Option<LibraryRecord>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM libraries WHERE name = ?1",
            SELECT_COLUMNS
        ))?;
        let mut rows = stmt.query([name])?;

        match rows.next()? {
            Some(row) => Ok(Some(Self::record_from_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_one_by_dependency_artifact(
        &self,
        artifact: &str,
    ) -> Result<Option<LibraryRecord>, StoreError> {
        // Sub-artifacts live inside the JSON column, so the match happens
        // here rather than in SQL. Name ascending keeps the answer stable
        // when several libraries claim the same artifact.
        Ok(self.find_all()?.into_iter().find(|record| {
            record
                .dependencies
                .iter()
                .any(|d| d.name == artifact || d.artifact == artifact)
        }))
    }

    fn upsert(&self, record: &LibraryRecord) -> Result<(), StoreError> {
        debug!(
            "Upserting '{}' with {} versions",
            record.name,
            record.versions.len()
        );

        let versions = serde_json::to_string(&record.versions)?;
        let dependencies = serde_json::to_string(&record.dependencies)?;

        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO libraries (name, group_id, versions, dependencies, maven_url, last_update)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(name) DO UPDATE SET
                group_id = excluded.group_id,
                versions = excluded.versions,
                dependencies = excluded.dependencies,
                maven_url = excluded.maven_url,
                last_update = excluded.last_update
            "#,
            (
                &record.name,
                &record.group_id,
                &versions,
                &dependencies,
                &record.maven_url,
                record.last_update.to_rfc3339(),
            ),
        )?;
        Ok(())
    }

    fn delete_all(&self) -> Result<usize, StoreError> {
        let conn = self.lock_conn()?;
        let deleted = conn.execute("DELETE FROM libraries", [])?;
        info!("Deleted {} library records", deleted);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionEntry;
    use tempfile::TempDir;

    fn open(temp_dir: &TempDir) -> SqliteRepository {
        SqliteRepository::new(&temp_dir.path().join("test.db")).unwrap()
    }

    fn record(name: &str, versions: &[&str]) -> LibraryRecord {
        LibraryRecord {
            name: name.to_string(),
            group_id: format!("androidx.{}", name),
            versions: versions
                .iter()
                .map(|v| VersionEntry::new(v.to_string(), None))
                .collect(),
            maven_url: format!("https://mvnrepository.com/artifact/androidx.{n}/{n}", n = name),
            ..Default::default()
        }
    }

    #[test]
    fn upsert_then_find_one_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let repository = open(&temp_dir);

        let original = record("room", &["2.6.1", "2.6.0"]);
        repository.upsert(&original).unwrap();

        let loaded = repository.find_one("room").unwrap().unwrap();
        assert_eq!(loaded.name, original.name);
        assert_eq!(loaded.group_id, original.group_id);
        assert_eq!(loaded.versions, original.versions);
        assert_eq!(loaded.maven_url, original.maven_url);
    }

    #[test]
    fn upsert_replaces_existing_record() {
        let temp_dir = TempDir::new().unwrap();
        let repository = open(&temp_dir);

        repository.upsert(&record("room", &["2.6.0"])).unwrap();
        repository.upsert(&record("room", &["2.6.1", "2.6.0"])).unwrap();

        let records = repository.find_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].versions.len(), 2);
        assert_eq!(records[0].versions[0].version, "2.6.1");
    }

    #[test]
    fn find_one_returns_none_for_unknown_name() {
        let temp_dir = TempDir::new().unwrap();
        let repository = open(&temp_dir);

        assert!(repository.find_one("nonexistent").unwrap().is_none());
    }

    #[test]
    fn find_all_orders_by_name_ascending() {
        let temp_dir = TempDir::new().unwrap();
        let repository = open(&temp_dir);

        repository.upsert(&record("work", &["2.9.0"])).unwrap();
        repository.upsert(&record("activity", &["1.9.0"])).unwrap();
        repository.upsert(&record("room", &["2.6.1"])).unwrap();

        let names: Vec<String> = repository
            .find_all_summaries()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["activity", "room", "work"]);
    }

    #[test]
    fn find_one_by_dependency_artifact_matches_sub_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let repository = open(&temp_dir);

        let mut room = record("room", &["2.6.1"]);
        room.dependencies = vec![SubArtifact {
            name: "room-ktx".to_string(),
            artifact: "room-ktx".to_string(),
            group_id: "androidx.room".to_string(),
            versions: Vec::new(),
        }];
        repository.upsert(&room).unwrap();
        repository.upsert(&record("core", &["1.12.0"])).unwrap();

        let found = repository
            .find_one_by_dependency_artifact("room-ktx")
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "room");

        assert!(repository
            .find_one_by_dependency_artifact("nonexistent")
            .unwrap()
            .is_none());
    }

    #[test]
    fn delete_all_reports_removed_count() {
        let temp_dir = TempDir::new().unwrap();
        let repository = open(&temp_dir);

        repository.upsert(&record("room", &["2.6.1"])).unwrap();
        repository.upsert(&record("core", &["1.12.0"])).unwrap();

        assert_eq!(repository.delete_all().unwrap(), 2);
        assert!(repository.find_all().unwrap().is_empty());
        assert_eq!(repository.delete_all().unwrap(), 0);
    }

    #[test]
    fn last_update_survives_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let repository = open(&temp_dir);

        let mut entry = record("room", &["2.6.1"]);
        entry.last_update = "2024-03-01T12:00:00Z".parse().unwrap();
        repository.upsert(&entry).unwrap();

        let loaded = repository.find_one("room").unwrap().unwrap();
        assert_eq!(loaded.last_update, entry.last_update);
    }
}
