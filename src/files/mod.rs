/// File management
///
/// The ingest pipeline and the read/update/delete operations on archived
/// uploads, plus staging of multipart uploads onto disk.

pub mod pipeline;
pub mod staging;

pub use pipeline::FileService;
pub use staging::stage_field;

use crate::{
    catalog::FileRecord,
    error::{VaultError, VaultResult},
    storage::StorageKey,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Human-readable confirmation returned by mutating operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub msg: String,
}

impl Receipt {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// A raw upload already written below the upload root
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub key: StorageKey,
    pub original_name: String,
    pub media_type: String,
}

/// Page of active files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePage {
    pub count: i64,
    pub files: Vec<FileRecord>,
}

/// Open archive ready to be streamed
#[derive(Debug)]
pub struct Download {
    pub file: tokio::fs::File,
    pub filename: String,
    pub size: u64,
}

/// Rename request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RenameFileRequest {
    #[validate(length(min = 2, message = "name must be longer than or equal to 2 characters"))]
    pub name: String,
}

/// Pagination query
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PaginationQuery {
    #[validate(range(min = 1, message = "limit must not be less than 1"))]
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[validate(range(min = 0, message = "offset must not be less than 0"))]
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    10
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// Declared names must carry at least two visible characters
pub fn validate_name(name: &str) -> VaultResult<()> {
    if name.trim().chars().count() < 2 {
        return Err(VaultError::InvalidInput(
            "name must be longer than or equal to 2 characters".to_string(),
        ));
    }
    Ok(())
}
