pub mod api;
pub mod catalog;
pub mod config;
pub mod source;
pub mod store;
pub mod sync;
pub mod version;
