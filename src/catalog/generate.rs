//! Version-catalog generation from tracked library records.

use std::fmt::Write;

use crate::store::types::LibraryRecord;
use crate::version::Channel;

/// Picks the version a generated catalog should pin: the most stable
/// channel with a known latest wins.
fn pinned_version(record: &LibraryRecord) -> Option<String> {
    let channels = record.channel_latest();
    [Channel::Stable, Channel::Rc, Channel::Beta, Channel::Alpha]
        .into_iter()
        .find_map(|channel| channels.get(channel).map(str::to_string))
}

fn alias_key(name: &str) -> String {
    name.replace('-', "_")
}

/// Renders a `[versions]`/`[libraries]` catalog covering the given records
/// and their tracked sub-artifacts. Records without any known version are
/// left out.
pub fn generate(records: &[LibraryRecord]) -> String {
    let mut versions = String::from("[versions]\n");
    let mut libraries = String::from("[libraries]\n");

    for record in records {
        let Some(version) = pinned_version(record) else {
            continue;
        };
        let key = alias_key(&record.name);
        let _ = writeln!(versions, "{} = \"{}\"", key, version);
        let _ = writeln!(
            libraries,
            "{} = {{ module = \"{}:{}\", version.ref = \"{}\" }}",
            key, record.group_id, record.name, key
        );

        for dependency in &record.dependencies {
            let dependency_key = format!("{}_{}", key, alias_key(&dependency.name));
            // Independently versioned sub-artifacts get their own alias;
            // the rest ride on the parent's.
            let reference = match dependency.latest_version() {
                Some(own_version) if own_version != version => {
                    let _ = writeln!(versions, "{} = \"{}\"", dependency_key, own_version);
                    dependency_key.clone()
                }
                _ => key.clone(),
            };
            // Sub-artifacts usually share the parent's group but may state
            // their own; rows stored before the group was kept fall back.
            let group = if dependency.group_id.is_empty() {
                &record.group_id
            } else {
                &dependency.group_id
            };
            let _ = writeln!(
                libraries,
                "{} = {{ module = \"{}:{}\", version.ref = \"{}\" }}",
                dependency_key, group, dependency.artifact, reference
            );
        }
    }

    format!("{}\n{}", versions, libraries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::{LibraryRecord, SubArtifact};
    use crate::version::VersionEntry;

    fn record(name: &str, group: &str, versions: &[&str]) -> LibraryRecord {
        LibraryRecord {
            name: name.to_string(),
            group_id: group.to_string(),
            versions: versions
                .iter()
                .map(|v| VersionEntry::new(v.to_string(), None))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn generates_versions_and_libraries_sections() {
        let records = vec![record("room", "androidx.room", &["2.6.1", "2.7.0-alpha01"])];
        let catalog = generate(&records);

        assert!(catalog.contains("room = \"2.6.1\""));
        assert!(catalog.contains(
            "room = { module = \"androidx.room:room\", version.ref = \"room\" }"
        ));
    }

    #[test]
    fn hyphenated_names_become_underscored_keys() {
        let records = vec![record("activity-compose", "androidx.activity", &["1.9.0"])];
        let catalog = generate(&records);

        assert!(catalog.contains("activity_compose = \"1.9.0\""));
        assert!(catalog.contains("module = \"androidx.activity:activity-compose\""));
    }

    #[test]
    fn sub_artifacts_ride_on_parent_alias() {
        let mut parent = record("room", "androidx.room", &["2.6.1"]);
        parent.dependencies = vec![SubArtifact {
            name: "room-ktx".to_string(),
            artifact: "room-ktx".to_string(),
            group_id: "androidx.room".to_string(),
            versions: Vec::new(),
        }];
        let catalog = generate(&[parent]);

        assert!(catalog.contains(
            "room_room_ktx = { module = \"androidx.room:room-ktx\", version.ref = \"room\" }"
        ));
    }

    #[test]
    fn sub_artifact_under_foreign_group_keeps_its_own_group() {
        let mut parent = record("room", "androidx.room", &["2.6.1"]);
        parent.dependencies = vec![SubArtifact {
            name: "widget".to_string(),
            artifact: "widget".to_string(),
            group_id: "androidx.other".to_string(),
            versions: Vec::new(),
        }];
        let catalog = generate(&[parent]);

        assert!(catalog.contains("module = \"androidx.other:widget\""));
        assert!(!catalog.contains("androidx.room:widget"));
    }

    #[test]
    fn sub_artifact_without_stored_group_falls_back_to_parent() {
        let mut parent = record("room", "androidx.room", &["2.6.1"]);
        parent.dependencies = vec![SubArtifact {
            name: "room-ktx".to_string(),
            artifact: "room-ktx".to_string(),
            group_id: String::new(),
            versions: Vec::new(),
        }];
        let catalog = generate(&[parent]);

        assert!(catalog.contains("module = \"androidx.room:room-ktx\""));
    }

    #[test]
    fn independently_versioned_sub_artifact_gets_own_alias() {
        let mut parent = record("room", "androidx.room", &["2.6.1"]);
        parent.dependencies = vec![SubArtifact {
            name: "room-paging".to_string(),
            artifact: "room-paging".to_string(),
            group_id: "androidx.room".to_string(),
            versions: vec![VersionEntry::new("2.5.0".to_string(), None)],
        }];
        let catalog = generate(&[parent]);

        assert!(catalog.contains("room_room_paging = \"2.5.0\""));
        assert!(catalog.contains("version.ref = \"room_room_paging\""));
    }

    #[test]
    fn versionless_records_are_skipped() {
        let catalog = generate(&[record("ghost", "androidx.ghost", &[])]);
        assert!(!catalog.contains("ghost"));
    }
}
