//! Gradle-style version catalogs: a tolerant parser for dependency
//! manifests and a generator that renders tracked libraries back out as
//! a catalog.

pub mod generate;
pub mod parser;
pub mod types;

pub use generate::generate;
pub use parser::{CatalogError, parse};
pub use types::{DeclaredDependency, VersionCatalog};
