/// Resolution and removal of files below the upload root
use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Janitor trait
///
/// Maps storage keys onto the upload tree. `resolve` and `remove` fail with
/// `NotFound` when the file does not exist; callers decide whether that is
/// fatal.
#[async_trait]
pub trait Janitor: Send + Sync {
    /// Path a key maps to, without checking that it exists
    fn path_for(&self, key: &str) -> VaultResult<PathBuf>;

    /// Path of an existing file
    fn resolve(&self, key: &str) -> VaultResult<PathBuf> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Err(VaultError::NotFound(format!("No file found with path {}", key)));
        }
        Ok(path)
    }

    /// Delete the file a key maps to
    async fn remove(&self, key: &str) -> VaultResult<()>;
}

/// Janitor over a directory on local disk
#[derive(Debug, Clone)]
pub struct DiskJanitor {
    root: PathBuf,
}

impl DiskJanitor {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Relative, traversal-free form of a key
    fn relative<'a>(&self, key: &'a str) -> VaultResult<&'a Path> {
        let path = Path::new(key);
        let path = if path.is_absolute() {
            path.strip_prefix(&self.root).map_err(|_| {
                VaultError::InvalidInput(format!("Path {} is outside the upload root", key))
            })?
        } else {
            path
        };

        let clean = path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !clean || path.as_os_str().is_empty() {
            return Err(VaultError::InvalidInput(format!("Invalid storage key {}", key)));
        }

        Ok(path)
    }
}

#[async_trait]
impl Janitor for DiskJanitor {
    fn path_for(&self, key: &str) -> VaultResult<PathBuf> {
        Ok(self.root.join(self.relative(key)?))
    }

    async fn remove(&self, key: &str) -> VaultResult<()> {
        let path = self.resolve(key)?;

        fs::remove_file(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                VaultError::NotFound(format!("No file found with path {}", key))
            }
            _ => VaultError::StorageFault(format!("Failed to delete {}: {}", key, e)),
        })?;

        tracing::debug!("Removed {}", path.display());
        Ok(())
    }
}
