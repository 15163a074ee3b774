//! Version layer: channel classification, ordering and staleness
//!
//! - [`types`]: `Channel`, `VersionEntry`, `ChannelLatest`
//! - [`ordering`]: channel-aware total ordering over version strings
//! - [`staleness`]: classification of a declared version against
//!   per-channel latest versions

pub mod ordering;
pub mod staleness;
pub mod types;

pub use ordering::{classify_channel, compare, latest_per_channel};
pub use staleness::{Staleness, StalenessReport, classify};
pub use types::{Channel, ChannelLatest, VersionEntry};
