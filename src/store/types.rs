use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::version::{Channel, ChannelLatest, VersionEntry, latest_per_channel};

/// A companion artifact listed on a tracked library's page (e.g.
/// `room-ktx` next to `room`). Usually lives in the parent's group but may
/// carry its own, so the group id is stored alongside the artifact id.
/// Versions stay empty unless the artifact is tracked in detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubArtifact {
    pub name: String,
    pub artifact: String,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
}

impl SubArtifact {
    /// Latest known version, preferring the most stable channel.
    pub fn latest_version(&self) -> Option<String> {
        pick_most_stable(&latest_per_channel(&self.versions))
    }
}

/// A tracked library with its full version history, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryRecord {
    pub name: String,
    pub group_id: String,
    pub versions: Vec<VersionEntry>,
    #[serde(default)]
    pub dependencies: Vec<SubArtifact>,
    pub maven_url: String,
    pub last_update: DateTime<Utc>,
}

impl Default for LibraryRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            group_id: String::new(),
            versions: Vec::new(),
            dependencies: Vec::new(),
            maven_url: String::new(),
            last_update: Utc::now(),
        }
    }
}

impl LibraryRecord {
    pub fn channel_latest(&self) -> ChannelLatest {
        latest_per_channel(&self.versions)
    }

    /// Newest version across all channels (versions are held newest first).
    pub fn latest_version(&self) -> Option<&VersionEntry> {
        self.versions.first()
    }
}

/// Listing projection: enough to render an overview without hydrating
/// full version histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySummary {
    pub name: String,
    pub group_id: String,
    pub channels: ChannelLatest,
    pub version_count: usize,
    pub dependency_count: usize,
    pub last_update: DateTime<Utc>,
}

impl From<&LibraryRecord> for LibrarySummary {
    fn from(record: &LibraryRecord) -> Self {
        Self {
            name: record.name.clone(),
            group_id: record.group_id.clone(),
            channels: record.channel_latest(),
            version_count: record.versions.len(),
            dependency_count: record.dependencies.len(),
            last_update: record.last_update,
        }
    }
}

fn pick_most_stable(channels: &ChannelLatest) -> Option<String> {
    [Channel::Stable, Channel::Rc, Channel::Beta, Channel::Alpha]
        .into_iter()
        .find_map(|channel| channels.get(channel).map(str::to_string))
}
