/// Upload storage
///
/// Everything that touches the upload tree on disk: storage key generation,
/// the upload filter, the archiver and the janitor that resolves and removes
/// files below the upload root.

pub mod archive;
pub mod filter;
pub mod janitor;
pub mod naming;

pub use archive::{Archiver, ZipArchiver};
pub use filter::UploadFilter;
pub use janitor::{DiskJanitor, Janitor};
pub use naming::{file_extension, StorageKey};

/// Extension of every archive written by the service
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Content type served for archive downloads
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";
