/// Storage key generation
use crate::{
    error::{VaultError, VaultResult},
    storage::ARCHIVE_EXTENSION,
};
use std::fmt;
use uuid::Uuid;

/// Extension of a file name: text after the last dot, lower-cased
///
/// Returns `None` when there is no dot or nothing follows it.
pub fn file_extension(original_name: &str) -> Option<String> {
    let (_, ext) = original_name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Collision-resistant storage key of the form `<namespace>/<uuid>.<ext>`
///
/// The key never contains user input other than the lower-cased extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    namespace: String,
    token: Uuid,
    extension: String,
}

impl StorageKey {
    /// Generate a fresh key for an incoming file
    pub fn generate(namespace: &str, original_name: &str) -> VaultResult<Self> {
        let extension = file_extension(original_name).ok_or_else(|| {
            VaultError::InvalidInput(format!(
                "File {} has no extension",
                original_name
            ))
        })?;

        Ok(Self {
            namespace: namespace.to_string(),
            token: Uuid::new_v4(),
            extension,
        })
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Key of the archive derived from this raw upload
    pub fn archive_key(&self) -> String {
        if self.extension == ARCHIVE_EXTENSION {
            format!("{}/{}.{}.{}", self.namespace, self.token, self.extension, ARCHIVE_EXTENSION)
        } else {
            format!("{}/{}.{}", self.namespace, self.token, ARCHIVE_EXTENSION)
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.namespace, self.token, self.extension)
    }
}
