/// filevault - document upload and archival service
///
/// Accepts office documents over HTTP, compresses each into a zip archive on
/// disk and keeps a catalog of the archives in SQLite.

pub mod account;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod files;
pub mod server;
pub mod storage;

pub use config::ServerConfig;
pub use context::AppContext;
pub use error::{VaultError, VaultResult};
