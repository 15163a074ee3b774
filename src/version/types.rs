//! Common types for the version layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Release maturity tier.
///
/// Precedence for "most stable" is Stable > RC > Beta > Alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Stable,
    #[serde(rename = "RC")]
    Rc,
    Beta,
    Alpha,
}

impl Channel {
    /// Returns the string representation of the channel
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Stable => "Stable",
            Channel::Rc => "RC",
            Channel::Beta => "Beta",
            Channel::Alpha => "Alpha",
        }
    }

    /// Stability rank, higher is more stable
    pub fn precedence(&self) -> u8 {
        match self {
            Channel::Stable => 3,
            Channel::Rc => 2,
            Channel::Beta => 1,
            Channel::Alpha => 0,
        }
    }
}

/// A single published version as observed from one upstream source.
/// Immutable once produced by a source adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: String,
    pub release_date: Option<DateTime<Utc>>,
    pub channel: Channel,
}

impl VersionEntry {
    /// Builds an entry, classifying the channel from the version string
    pub fn new(version: impl Into<String>, release_date: Option<DateTime<Utc>>) -> Self {
        let version = version.into();
        let channel = crate::version::ordering::classify_channel(&version);
        Self {
            version,
            release_date,
            channel,
        }
    }
}

/// Latest known version per channel; a field is absent iff no version of
/// that channel was observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLatest {
    pub stable: Option<String>,
    pub rc: Option<String>,
    pub beta: Option<String>,
    pub alpha: Option<String>,
}

impl ChannelLatest {
    pub fn get(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Stable => self.stable.as_deref(),
            Channel::Rc => self.rc.as_deref(),
            Channel::Beta => self.beta.as_deref(),
            Channel::Alpha => self.alpha.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stable.is_none() && self.rc.is_none() && self.beta.is_none() && self.alpha.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_entry_new_classifies_channel() {
        assert_eq!(VersionEntry::new("2.6.1", None).channel, Channel::Stable);
        assert_eq!(
            VersionEntry::new("2.7.0-alpha01", None).channel,
            Channel::Alpha
        );
        assert_eq!(
            VersionEntry::new("2.7.0-beta02", None).channel,
            Channel::Beta
        );
        assert_eq!(VersionEntry::new("2.7.0-rc01", None).channel, Channel::Rc);
    }

    #[test]
    fn channel_precedence_orders_stable_above_prereleases() {
        assert!(Channel::Stable.precedence() > Channel::Rc.precedence());
        assert!(Channel::Rc.precedence() > Channel::Beta.precedence());
        assert!(Channel::Beta.precedence() > Channel::Alpha.precedence());
    }

    #[test]
    fn channel_latest_get_returns_matching_field() {
        let latest = ChannelLatest {
            stable: Some("1.0.0".to_string()),
            rc: None,
            beta: Some("1.1.0-beta01".to_string()),
            alpha: None,
        };

        assert_eq!(latest.get(Channel::Stable), Some("1.0.0"));
        assert_eq!(latest.get(Channel::Rc), None);
        assert_eq!(latest.get(Channel::Beta), Some("1.1.0-beta01"));
        assert!(!latest.is_empty());
        assert!(ChannelLatest::default().is_empty());
    }
}
