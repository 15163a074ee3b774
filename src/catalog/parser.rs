//! Tolerant version-catalog parser
//!
//! Attempts a strict TOML parse first, after a light preprocessing pass
//! that repairs the malformations real manifests arrive with (missing
//! section headers, unquoted dotted keys, bare numeric-looking values).
//! When the strict parse fails, a permissive line-oriented parser recovers
//! whatever it can and never raises; only when both yield nothing is the
//! original strict error surfaced, with its position when available.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::types::{DeclaredDependency, VersionCatalog};

static KEY_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*"?([A-Za-z0-9_][A-Za-z0-9_.\-]*)"?\s*=\s*(.+?)\s*$"#).unwrap()
});
static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[\s*([A-Za-z0-9_.\-]+)\s*\]").unwrap());
static BARE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)([A-Za-z0-9_]+[A-Za-z0-9_.\-]*)(\s*=)").unwrap());
static BARE_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?=\s*)(\d[\w.\-+]*)\s*$").unwrap());
static MODULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"module\s*=\s*["']([^"']+)["']"#).unwrap());
static GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"group\s*=\s*["']([^"']+)["']"#).unwrap());
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name\s*=\s*["']([^"']+)["']"#).unwrap());
static VERSION_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"version\s*\.\s*ref\s*=\s*["']([^"']+)["']|\{\s*ref\s*=\s*["']([^"']+)["']"#)
        .unwrap()
});
static VERSION_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"version\s*=\s*["']([^"']+)["']"#).unwrap());

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unparseable manifest: {message}")]
    Unparseable {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },
}

/// A dependency as collected, before alias resolution
#[derive(Debug, Clone)]
enum RawVersion {
    Literal(String),
    Alias(String),
}

#[derive(Debug, Clone)]
struct RawDependency {
    key: String,
    module: String,
    version: RawVersion,
}

/// Parses a version-catalog manifest into aliases and declared dependencies.
pub fn parse(raw: &str) -> Result<VersionCatalog, CatalogError> {
    let preprocessed = preprocess(raw);

    let strict_error = match toml::from_str::<toml::Table>(&preprocessed) {
        Ok(document) => {
            let (aliases, raw_dependencies) = extract_strict(&document);
            if aliases.is_empty() && raw_dependencies.is_empty() {
                // An empty or pure-comment manifest parses as valid TOML;
                // that is still a failure for the caller.
                return Err(CatalogError::Unparseable {
                    message: "manifest declares no versions or libraries".to_string(),
                    line: None,
                    column: None,
                });
            }
            return Ok(resolve(aliases, raw_dependencies));
        }
        Err(e) => e,
    };

    debug!(
        "Strict catalog parse failed, trying permissive parser: {}",
        strict_error.message()
    );
    let (aliases, raw_dependencies) = parse_permissive(raw);
    if aliases.is_empty() && raw_dependencies.is_empty() {
        let (line, column) = strict_error
            .span()
            .map(|span| position_of(&preprocessed, span.start))
            .map_or((None, None), |(l, c)| (Some(l), Some(c)));
        return Err(CatalogError::Unparseable {
            message: strict_error.message().to_string(),
            line,
            column,
        });
    }

    Ok(resolve(aliases, raw_dependencies))
}

/// Repairs known malformations ahead of the strict parse.
fn preprocess(raw: &str) -> String {
    let mut lines = Vec::new();
    let mut in_section = false;

    for line in raw.lines() {
        let trimmed = line.trim();
        if SECTION_RE.is_match(trimmed) {
            in_section = true;
            lines.push(line.to_string());
            continue;
        }
        if trimmed.is_empty() || trimmed.starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        if !in_section && KEY_VALUE_RE.is_match(trimmed) {
            // Bare key/value lines before any header belong to [versions]
            lines.push("[versions]".to_string());
            in_section = true;
        }

        lines.push(quote_bare_value(&quote_bare_key(line)));
    }

    lines.join("\n")
}

/// Quotes dotted/hyphenated bare keys so they stay single keys rather than
/// becoming nested tables.
fn quote_bare_key(line: &str) -> String {
    BARE_KEY_RE
        .replace(line, |caps: &regex::Captures<'_>| {
            if caps[2].contains('.') || caps[2].contains('-') {
                format!("{}\"{}\"{}", &caps[1], &caps[2], &caps[3])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Quotes bare numeric-looking values ("1.0.0" written without quotes).
/// Plain integers are left alone since they are already valid TOML.
fn quote_bare_value(line: &str) -> String {
    BARE_VALUE_RE
        .replace(line, |caps: &regex::Captures<'_>| {
            if caps[2].parse::<i64>().is_err() {
                format!("{}\"{}\"", &caps[1], &caps[2])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn extract_strict(document: &toml::Table) -> (IndexMap<String, String>, Vec<RawDependency>) {
    let mut aliases = IndexMap::new();
    if let Some(toml::Value::Table(versions)) = document.get("versions") {
        flatten_aliases(versions, String::new(), &mut aliases);
    }

    let mut dependencies = Vec::new();
    if let Some(toml::Value::Table(libraries)) = document.get("libraries") {
        for (key, value) in libraries {
            match raw_dependency_from_value(key, value) {
                Some(dependency) => dependencies.push(dependency),
                None => warn!("Skipping unrecognized library entry '{}'", key),
            }
        }
    }

    (aliases, dependencies)
}

/// Flattens nested alias tables (from dotted keys the preprocessor did not
/// catch) back into dotted alias names.
fn flatten_aliases(table: &toml::Table, prefix: String, out: &mut IndexMap<String, String>) {
    for (key, value) in table {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::String(literal) => {
                out.insert(name, literal.clone());
            }
            toml::Value::Table(nested) => flatten_aliases(nested, name, out),
            other => {
                out.insert(name, other.to_string());
            }
        }
    }
}

fn raw_dependency_from_value(key: &str, value: &toml::Value) -> Option<RawDependency> {
    match value {
        // "group:artifact:version" shorthand
        toml::Value::String(coordinate) => {
            let parts: Vec<&str> = coordinate.splitn(3, ':').collect();
            if parts.len() == 3 {
                Some(RawDependency {
                    key: key.to_string(),
                    module: format!("{}:{}", parts[0], parts[1]),
                    version: RawVersion::Literal(parts[2].to_string()),
                })
            } else {
                None
            }
        }
        toml::Value::Table(entry) => {
            let module = match entry.get("module") {
                Some(toml::Value::String(module)) => module.clone(),
                _ => {
                    let group = entry.get("group")?.as_str()?;
                    let name = entry.get("name")?.as_str()?;
                    format!("{}:{}", group, name)
                }
            };
            let version = match entry.get("version")? {
                toml::Value::String(literal) => RawVersion::Literal(literal.clone()),
                toml::Value::Table(table) => {
                    RawVersion::Alias(table.get("ref")?.as_str()?.to_string())
                }
                _ => return None,
            };
            Some(RawDependency {
                key: key.to_string(),
                module,
                version,
            })
        }
        _ => None,
    }
}

/// Line-oriented fallback: extracts what it can, never raises.
fn parse_permissive(raw: &str) -> (IndexMap<String, String>, Vec<RawDependency>) {
    let mut aliases = IndexMap::new();
    let mut dependencies = Vec::new();
    let mut section = "versions".to_string();

    for line in raw.lines() {
        let line = line.split('#').next().unwrap_or("");
        if let Some(caps) = SECTION_RE.captures(line) {
            section = caps[1].to_ascii_lowercase();
            continue;
        }
        let Some(caps) = KEY_VALUE_RE.captures(line) else {
            continue;
        };
        let key = caps[1].to_string();
        let value = caps[2].trim();

        if section == "libraries" {
            if let Some(dependency) = permissive_dependency(&key, value) {
                dependencies.push(dependency);
            }
        } else if section == "versions" {
            let literal = value.trim_matches(|c| c == '"' || c == '\'').to_string();
            if !literal.is_empty() && !literal.starts_with('{') {
                aliases.insert(key, literal);
            }
        }
    }

    (aliases, dependencies)
}

fn permissive_dependency(key: &str, value: &str) -> Option<RawDependency> {
    if value.starts_with('{') {
        let module = MODULE_RE
            .captures(value)
            .map(|c| c[1].to_string())
            .or_else(|| {
                let group = GROUP_RE.captures(value)?[1].to_string();
                let name = NAME_RE.captures(value)?[1].to_string();
                Some(format!("{}:{}", group, name))
            })?;
        let version = if let Some(caps) = VERSION_REF_RE.captures(value) {
            let alias = caps.get(1).or(caps.get(2))?.as_str().to_string();
            RawVersion::Alias(alias)
        } else if let Some(caps) = VERSION_LITERAL_RE.captures(value) {
            RawVersion::Literal(caps[1].to_string())
        } else {
            return None;
        };
        return Some(RawDependency {
            key: key.to_string(),
            module,
            version,
        });
    }

    // "group:artifact:version" shorthand
    let literal = value.trim_matches(|c| c == '"' || c == '\'');
    let parts: Vec<&str> = literal.splitn(3, ':').collect();
    if parts.len() == 3 {
        return Some(RawDependency {
            key: key.to_string(),
            module: format!("{}:{}", parts[0], parts[1]),
            version: RawVersion::Literal(parts[2].to_string()),
        });
    }
    None
}

/// Resolves alias references; unresolved aliases are dropped with a
/// diagnostic rather than failing the whole parse.
fn resolve(
    aliases: IndexMap<String, String>,
    raw_dependencies: Vec<RawDependency>,
) -> VersionCatalog {
    let mut dependencies = Vec::new();
    for raw in raw_dependencies {
        let (declared, resolved) = match raw.version {
            RawVersion::Literal(literal) => (literal.clone(), Some(literal)),
            RawVersion::Alias(alias) => {
                let resolved = aliases.get(&alias).cloned();
                (alias, resolved)
            }
        };
        match resolved {
            Some(resolved_version) => dependencies.push(DeclaredDependency {
                key: raw.key,
                module: raw.module,
                declared_version: declared,
                resolved_version,
            }),
            None => warn!(
                "Dropping '{}': version alias '{}' is not declared",
                raw.key, declared
            ),
        }
    }

    VersionCatalog {
        version_aliases: aliases,
        dependencies,
    }
}

fn position_of(text: &str, offset: usize) -> (usize, usize) {
    let clamped = offset.min(text.len());
    let prefix = &text[..clamped];
    let line = prefix.matches('\n').count() + 1;
    let column = clamped - prefix.rfind('\n').map_or(0, |i| i + 1) + 1;
    (line, column)
}
