use serde::Deserialize;
use std::path::PathBuf;

// =============================================================================
// Upstream endpoints
// =============================================================================

/// Base URL for the release-notes site (library index + per-library pages)
pub const RELEASE_NOTES_BASE_URL: &str = "https://developer.android.com";

/// Base URL for the artifact browser (HTML, needs browser-like headers)
pub const ARTIFACT_BROWSER_BASE_URL: &str = "https://mvnrepository.com";

/// Base URL for the raw package-repository metadata feed
pub const PACKAGE_METADATA_BASE_URL: &str = "https://dl.google.com/android/maven2";

// =============================================================================
// Sync pacing and retry
// =============================================================================

/// Maximum reconciliation attempts per library within one sync run
pub const MAX_SYNC_ATTEMPTS: u32 = 3;

/// Backoff unit for retries; attempt n waits n * unit (5s, 10s, 15s)
pub const RETRY_BACKOFF_UNIT_MS: u64 = 5_000;

/// Bounds for the randomized pause between libraries, to stay under
/// upstream rate limits
pub const PACING_MIN_MS: u64 = 500;
pub const PACING_MAX_MS: u64 = 1_500;

/// Tracker configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerConfig {
    pub sync: SyncConfig,
    pub sources: SourcesConfig,
}

/// Sync-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Backoff unit in milliseconds for retry delays
    pub backoff_unit_ms: u64,
    /// Lower bound for the inter-library pacing delay
    pub pacing_min_ms: u64,
    /// Upper bound for the inter-library pacing delay
    pub pacing_max_ms: u64,
    /// Libraries whose sub-artifacts are fetched and versioned individually
    pub detailed_artifacts: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backoff_unit_ms: RETRY_BACKOFF_UNIT_MS,
            pacing_min_ms: PACING_MIN_MS,
            pacing_max_ms: PACING_MAX_MS,
            detailed_artifacts: Vec::new(),
        }
    }
}

/// Per-source configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SourcesConfig {
    pub package_metadata: SourceConfig,
    pub artifact_browser: SourceConfig,
}

/// Individual source configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub enabled: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Returns the path to the data directory for androidx-tracker.
/// Uses $XDG_DATA_HOME/androidx-tracker if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/androidx-tracker,
/// or ./androidx-tracker if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the database file.
pub fn db_path() -> PathBuf {
    data_dir().join("libraries.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("androidx-tracker.log")
}

/// Returns the path to the browser session credential file, refreshed
/// by an external process.
pub fn session_path() -> PathBuf {
    data_dir().join("browser-session.json")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("androidx-tracker")
}
