//! Release-notes site adapter: library index and per-library pages
//!
//! The site carries the trackable library list, and each library's page
//! embeds a group id, an artifacts list, and a table of current versions
//! keyed by channel column headers (Artifact/Stable/RC/Beta/Alpha). Markup
//! drift degrades to partial or empty extraction, never to a panic.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::config::RELEASE_NOTES_BASE_URL;
use crate::source::error::SourceError;
use crate::source::{Coordinate, LibraryIndex, LibraryPage};
use crate::version::types::{Channel, VersionEntry};

macro_rules! selector {
    ($name:ident, $css:expr) => {
        static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

selector!(TABLE_SELECTOR, "table");
selector!(ROW_SELECTOR, "tr");
selector!(CELL_SELECTOR, "th, td");
selector!(INDEX_ROW_SELECTOR, "table tbody tr td:first-child");
selector!(HEADING_SELECTOR, "h2, h3");
selector!(LIST_ITEM_SELECTOR, "li");

/// Placeholder cell values meaning "no release in this channel"
const PLACEHOLDERS: &[&str] = &["-", "\u{2013}", "\u{2014}"];

/// Adapter for the release-notes site
pub struct ReleaseNotesSource {
    client: reqwest::Client,
    base_url: String,
}

impl ReleaseNotesSource {
    /// Creates a new ReleaseNotesSource with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("androidx-tracker")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
        }
    }

    async fn fetch_html(&self, url: &str) -> Result<String, SourceError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            warn!("release-notes site returned status {}: {}", status, url);
            return Err(SourceError::Status {
                status,
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

impl Default for ReleaseNotesSource {
    fn default() -> Self {
        Self::new(RELEASE_NOTES_BASE_URL)
    }
}

#[async_trait::async_trait]
impl LibraryIndex for ReleaseNotesSource {
    async fn fetch_library_names(&self) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/jetpack/androidx/versions", self.base_url);
        let body = self.fetch_html(&url).await?;
        Ok(parse_library_names(&Html::parse_document(&body)))
    }

    async fn fetch_library_page(&self, name: &str) -> Result<LibraryPage, SourceError> {
        let url = format!("{}/jetpack/androidx/releases/{}", self.base_url, name);
        let body = self.fetch_html(&url).await?;
        let document = Html::parse_document(&body);

        Ok(LibraryPage {
            group_id: parse_group_id(&document),
            versions: parse_channel_table(&document, name),
            artifacts: parse_artifact_list(&document),
        })
    }
}

/// Extracts library names from the versions index table, in page order.
pub(crate) fn parse_library_names(document: &Html) -> Vec<String> {
    let mut names = Vec::new();
    for cell in document.select(&INDEX_ROW_SELECTOR) {
        let name = cell_text(&cell);
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Extracts the explicit group id from a "Group" table row, when present.
pub(crate) fn parse_group_id(document: &Html) -> Option<String> {
    for row in document.select(&ROW_SELECTOR) {
        let cells: Vec<String> = row.select(&CELL_SELECTOR).map(|c| cell_text(&c)).collect();
        if cells.len() >= 2 && cells[0].eq_ignore_ascii_case("group") {
            let value = cells.last().unwrap().clone();
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Extracts version entries for one artifact from the channel-column table.
///
/// The table is identified by an "Artifact" header column; the remaining
/// known headers map to channels. Missing columns are tolerated and
/// placeholder dashes mean "no release in this channel". The row matching
/// the requested artifact wins; if none matches, the first body row is
/// used so a library page still yields its embedded version list.
pub(crate) fn parse_channel_table(document: &Html, artifact: &str) -> Vec<VersionEntry> {
    for table in document.select(&TABLE_SELECTOR) {
        let mut rows = table.select(&ROW_SELECTOR);
        let Some(header_row) = rows.next() else {
            continue;
        };

        let headers: Vec<String> = header_row
            .select(&CELL_SELECTOR)
            .map(|c| cell_text(&c).to_ascii_lowercase())
            .collect();
        let Some(artifact_idx) = headers.iter().position(|h| h == "artifact") else {
            continue;
        };

        let channel_columns: Vec<(usize, Channel)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, header)| match header.as_str() {
                "stable" | "stable release" => Some((i, Channel::Stable)),
                "rc" | "release candidate" => Some((i, Channel::Rc)),
                "beta" | "beta release" => Some((i, Channel::Beta)),
                "alpha" | "alpha release" => Some((i, Channel::Alpha)),
                _ => None,
            })
            .collect();
        if channel_columns.is_empty() {
            continue;
        }

        let body: Vec<Vec<String>> = rows
            .map(|row| row.select(&CELL_SELECTOR).map(|c| cell_text(&c)).collect())
            .filter(|cells: &Vec<String>| !cells.is_empty())
            .collect();

        let row = body
            .iter()
            .find(|cells| {
                cells
                    .get(artifact_idx)
                    .is_some_and(|cell| cell == artifact || cell.contains(artifact))
            })
            .or_else(|| body.first());
        let Some(row) = row else {
            continue;
        };

        let mut entries = Vec::new();
        for (idx, channel) in channel_columns {
            let Some(value) = row.get(idx) else {
                continue;
            };
            if value.is_empty() || PLACEHOLDERS.contains(&value.as_str()) {
                continue;
            }
            entries.push(VersionEntry {
                version: value.clone(),
                release_date: None,
                channel,
            });
        }
        return entries;
    }

    Vec::new()
}

/// Extracts `group:artifact` coordinates listed under an "Artifacts" heading.
pub(crate) fn parse_artifact_list(document: &Html) -> Vec<Coordinate> {
    for heading in document.select(&HEADING_SELECTOR) {
        let text = heading.text().collect::<String>();
        if !text.to_ascii_lowercase().contains("artifact") {
            continue;
        }

        let mut coordinates = Vec::new();
        for sibling in heading.next_siblings() {
            let Some(element) = ElementRef::wrap(sibling) else {
                continue;
            };
            let tag = element.value().name();
            if tag == "h2" || tag == "h3" {
                break;
            }

            let items = if tag == "li" {
                vec![element]
            } else {
                element.select(&LIST_ITEM_SELECTOR).collect()
            };
            for item in items {
                let line = cell_text(&item);
                let parts: Vec<&str> = line.split(':').map(str::trim).collect();
                if parts.len() >= 2 && !parts[0].is_empty() && !parts[1].is_empty() {
                    coordinates.push(Coordinate::new(parts[0], parts[1]));
                }
            }
        }

        if !coordinates.is_empty() {
            return coordinates;
        }
    }

    Vec::new()
}

fn cell_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
