//! Artifact browser adapter (HTML, browser-emulating)
//!
//! The upstream only answers requests that look like a regular browser
//! session, so this adapter takes an explicit, expiring [`BrowserSession`]
//! supplied by the caller and refreshed by an external process. Prefer the
//! package-metadata feed when it is available; this adapter exists as the
//! middle rung of the fallback chain.

use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ARTIFACT_BROWSER_BASE_URL;
use crate::source::error::SourceError;
use crate::source::{Coordinate, VersionSource};
use crate::version::types::VersionEntry;

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table tr").unwrap());
static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());

/// A version identifier: leading digit, then digits/letters/dots/dashes
static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d[\w.\-]*$").unwrap());

/// Date formats the browser pages have been observed to use
const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d"];

/// Expiring browser credentials, externally supplied and refreshed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserSession {
    pub user_agent: String,
    pub cookies: Vec<(String, String)>,
    pub expires_at: DateTime<Utc>,
}

impl BrowserSession {
    /// Session with a generic desktop user agent and no cookies, valid for
    /// one hour from now
    pub fn anonymous() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0"
                .to_string(),
            cookies: Vec::new(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }
    }

    /// Loads a session from a JSON file, if one exists and parses
    pub fn load(path: &Path) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&raw)
            .inspect_err(|e| warn!("Ignoring unreadable browser session file: {}", e))
            .ok()
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Adapter for the HTML artifact browser
pub struct ArtifactBrowserSource {
    client: reqwest::Client,
    base_url: String,
    session: BrowserSession,
}

impl ArtifactBrowserSource {
    /// Creates a new ArtifactBrowserSource with a custom base URL
    pub fn new(base_url: &str, session: BrowserSession) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(session.user_agent.clone())
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
            session,
        }
    }

    pub fn with_default_base_url(session: BrowserSession) -> Self {
        Self::new(ARTIFACT_BROWSER_BASE_URL, session)
    }
}

#[async_trait::async_trait]
impl VersionSource for ArtifactBrowserSource {
    fn source_name(&self) -> &'static str {
        "artifact-browser"
    }

    async fn fetch_versions(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Vec<VersionEntry>, SourceError> {
        if self.session.is_expired() {
            return Err(SourceError::SessionExpired(self.session.expires_at));
        }

        let url = format!(
            "{}/artifact/{}/{}",
            self.base_url, coordinate.group_id, coordinate.artifact_id
        );

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "en-US,en;q=0.9");
        if let Some(cookie) = self.session.cookie_header() {
            request = request.header("Cookie", cookie);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(coordinate.to_string()));
        }
        if !status.is_success() {
            warn!("artifact browser returned status {}: {}", status, url);
            return Err(SourceError::Status { status, url });
        }

        let body = response.text().await?;
        Ok(parse_version_rows(&Html::parse_document(&body)))
    }
}

/// Extracts `(version, releaseDate?)` rows from the version-family tables.
///
/// The page groups rows into tables per version family; the grouping itself
/// carries no information we need, so every table row with a version-shaped
/// cell is taken, with the first parseable date cell as its release date.
pub(crate) fn parse_version_rows(document: &Html) -> Vec<VersionEntry> {
    let mut entries = Vec::new();
    for row in document.select(&ROW_SELECTOR) {
        let cells: Vec<String> = row
            .select(&CELL_SELECTOR)
            .map(|c: ElementRef<'_>| c.text().collect::<String>().trim().to_string())
            .collect();

        let Some(version) = cells.iter().find(|c| VERSION_REGEX.is_match(c)) else {
            continue;
        };
        let release_date = cells.iter().find_map(|c| parse_date(c));

        entries.push(VersionEntry::new(version.clone(), release_date));
    }
    entries
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }
    None
}
