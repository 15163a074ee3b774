//! Common types for the catalog layer

use indexmap::IndexMap;
use serde::Serialize;

/// One dependency declared in a version catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredDependency {
    /// Key of the entry in the `[libraries]` section
    pub key: String,
    /// Module coordinate, `groupId:artifactId`
    pub module: String,
    /// Version as written: a literal, or an alias into `[versions]`
    pub declared_version: String,
    /// Literal version after alias resolution
    pub resolved_version: String,
}

/// Structured result of parsing a version catalog manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionCatalog {
    /// `[versions]` section: alias -> literal, in declaration order
    pub version_aliases: IndexMap<String, String>,
    /// `[libraries]` section entries with resolved versions
    pub dependencies: Vec<DeclaredDependency>,
}

impl VersionCatalog {
    pub fn is_empty(&self) -> bool {
        self.version_aliases.is_empty() && self.dependencies.is_empty()
    }
}
