//! Channel-aware total ordering over version strings
//!
//! AndroidX version strings are not semver: pre-release markers like
//! `alpha01` or `rc02` appear as plain dash-separated suffixes. This module
//! provides the deterministic ordering the rest of the crate depends on for
//! "latest per channel" selection and staleness comparison.

use std::cmp::Ordering;

use crate::version::types::{Channel, ChannelLatest, VersionEntry};

/// Classifies a version string into its release channel.
///
/// A string containing (case-insensitive) "alpha" is Alpha, then "beta" is
/// Beta, then "rc" is RC; anything else is Stable.
pub fn classify_channel(version: &str) -> Channel {
    let lower = version.to_ascii_lowercase();
    if lower.contains("alpha") {
        Channel::Alpha
    } else if lower.contains("beta") {
        Channel::Beta
    } else if lower.contains("rc") {
        Channel::Rc
    } else {
        Channel::Stable
    }
}

/// Compares two version strings.
///
/// Each string is split on `.` and `-`; numeric parts compare numerically,
/// non-numeric parts compare channel-aware (alpha < beta < rc < anything
/// else, same-rank tokens lexically). If all compared parts are equal, the
/// string with fewer parts sorts lower (older/less specific). Total and
/// deterministic for any input; unparsable tokens fall back to lexical
/// comparison rather than failing.
pub fn compare(a: &str, b: &str) -> Ordering {
    let parts_a = split_parts(a);
    let parts_b = split_parts(b);

    for (x, y) in parts_a.iter().zip(parts_b.iter()) {
        let ord = compare_part(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    parts_a.len().cmp(&parts_b.len())
}

/// Computes the per-channel maximum version among the given entries.
pub fn latest_per_channel(entries: &[VersionEntry]) -> ChannelLatest {
    let mut latest = ChannelLatest::default();
    for entry in entries {
        let slot = match entry.channel {
            Channel::Stable => &mut latest.stable,
            Channel::Rc => &mut latest.rc,
            Channel::Beta => &mut latest.beta,
            Channel::Alpha => &mut latest.alpha,
        };
        match slot {
            Some(current) if compare(&entry.version, current) != Ordering::Greater => {}
            _ => *slot = Some(entry.version.clone()),
        }
    }
    latest
}

fn split_parts(version: &str) -> Vec<&str> {
    version
        .split(['.', '-'])
        .filter(|part| !part.is_empty())
        .collect()
}

fn compare_part(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => {
            let rank_a = token_rank(a);
            let rank_b = token_rank(b);
            if rank_a != rank_b {
                rank_a.cmp(&rank_b)
            } else {
                a.cmp(b)
            }
        }
    }
}

/// Channel markers order below any other token: alpha < beta < rc < other.
fn token_rank(token: &str) -> u8 {
    let lower = token.to_ascii_lowercase();
    if lower.contains("alpha") {
        0
    } else if lower.contains("beta") {
        1
    } else if lower.contains("rc") {
        2
    } else {
        3
    }
}
