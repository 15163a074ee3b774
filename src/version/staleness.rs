//! Staleness classification of a declared version against channel data

use serde::Serialize;

use crate::version::ordering::classify_channel;
use crate::version::types::{Channel, ChannelLatest};

/// Status of a declared version relative to the tracked channel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Staleness {
    UpToDate,
    Outdated,
    RcAvailable,
    BetaAvailable,
    AlphaAvailable,
    /// Library entirely unknown to the repository
    Unknown,
}

/// Result of classifying one declared version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StalenessReport {
    pub status: Staleness,
    pub latest_version: Option<String>,
}

impl StalenessReport {
    pub fn unknown() -> Self {
        Self {
            status: Staleness::Unknown,
            latest_version: None,
        }
    }
}

/// Classifies a declared version against per-channel latest versions.
///
/// Decision order, first match wins: a stable release that differs from the
/// declared version is `outdated`; otherwise any available pre-release of a
/// channel the declared version has not already reached is flagged as an
/// upgrade opportunity (`rc-available`, `beta-available`, `alpha-available`);
/// otherwise `up-to-date`. Pre-release precedence over plain
/// outdated-vs-stable is deliberate and user-visible; do not reorder.
pub fn classify(declared: &str, channels: &ChannelLatest) -> StalenessReport {
    let declared_channel = classify_channel(declared);

    if let Some(stable) = &channels.stable
        && stable != declared
    {
        return StalenessReport {
            status: Staleness::Outdated,
            latest_version: Some(stable.clone()),
        };
    }

    if let Some(rc) = &channels.rc
        && declared_channel != Channel::Rc
    {
        return StalenessReport {
            status: Staleness::RcAvailable,
            latest_version: Some(rc.clone()),
        };
    }

    if let Some(beta) = &channels.beta
        && declared_channel != Channel::Rc
        && declared_channel != Channel::Beta
    {
        return StalenessReport {
            status: Staleness::BetaAvailable,
            latest_version: Some(beta.clone()),
        };
    }

    if let Some(alpha) = &channels.alpha
        && declared_channel == Channel::Stable
    {
        return StalenessReport {
            status: Staleness::AlphaAvailable,
            latest_version: Some(alpha.clone()),
        };
    }

    StalenessReport {
        status: Staleness::UpToDate,
        latest_version: channels.stable.clone(),
    }
}
