/// File catalog
///
/// Durable record of every archived upload. The `CatalogStore` trait is the
/// seam the ingest pipeline depends on; `SqliteCatalog` is the production
/// implementation.

pub mod sqlite;

pub use sqlite::SqliteCatalog;

use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle label of a file record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Created,
    Updated,
    Deleted,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Created => "created",
            FileStatus::Updated => "updated",
            FileStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> VaultResult<Self> {
        match s {
            "created" => Ok(FileStatus::Created),
            "updated" => Ok(FileStatus::Updated),
            "deleted" => Ok(FileStatus::Deleted),
            _ => Err(VaultError::Internal(format!("Invalid file status: {}", s))),
        }
    }
}

/// File record in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub size: i64,
    pub status: FileStatus,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a record about to be created
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub name: String,
    pub url: String,
    pub size: i64,
    pub status: FileStatus,
    pub active: bool,
}

/// Targeted column update
#[derive(Debug, Clone, Default)]
pub struct FilePatch {
    pub name: Option<String>,
    pub status: Option<FileStatus>,
    pub active: Option<bool>,
}

/// Catalog store trait
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Record with this exact name, active or not
    async fn find_by_name(&self, name: &str) -> VaultResult<Option<FileRecord>>;

    async fn find_by_id(&self, id: i64, active_only: bool) -> VaultResult<Option<FileRecord>>;

    /// Insert a record; a name collision is `DuplicateName`
    async fn create(&self, fields: NewFileRecord) -> VaultResult<FileRecord>;

    /// Persist name, status and active flag of an existing record
    async fn save(&self, record: &FileRecord) -> VaultResult<()>;

    async fn update(&self, id: i64, patch: FilePatch) -> VaultResult<()>;

    /// Active records, newest first, with the total active count
    async fn paginate(&self, limit: i64, offset: i64) -> VaultResult<(Vec<FileRecord>, i64)>;
}

/// Message used for every name collision
pub fn duplicate_name(name: &str) -> VaultError {
    VaultError::DuplicateName(format!("File with name {} already exists on database.", name))
}
