/// Single-entry zip archiver
use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// Archiver trait
///
/// Wraps one raw file into a compressed container at `dest` and returns the
/// final byte size of the container. The size is only reported once the
/// container is completely written and flushed. Dropping the returned future
/// abandons the archive: nothing is left under `dest` or its `.part` path
/// once the work in flight has stopped.
#[async_trait]
pub trait Archiver: Send + Sync {
    async fn archive(&self, raw: &Path, entry_name: &str, dest: &Path) -> VaultResult<u64>;
}

/// Flag shared between the awaiting future and the blocking writer
#[derive(Debug, Clone, Default)]
struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cancels the writer when the archive future is dropped before completion
struct CancelOnDrop(Cancellation);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Source reader that stops feeding the compressor once cancelled
struct CancellableReader<R> {
    inner: R,
    cancel: Cancellation,
}

impl<R: Read> Read for CancellableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cancel.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Other, "archive abandoned"));
        }
        self.inner.read(buf)
    }
}

/// Zip archiver using Deflate at maximum compression
#[derive(Debug, Clone)]
pub struct ZipArchiver {
    level: i64,
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self { level: 9 }
    }
}

impl ZipArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path the archive is written to before it is moved into place
    fn part_path(dest: &Path) -> PathBuf {
        let mut part = dest.as_os_str().to_owned();
        part.push(".part");
        PathBuf::from(part)
    }

    /// Entry name inside the container: the bare file name, no directories
    fn entry_name(name: &str) -> &str {
        name.rsplit(['/', '\\']).next().unwrap_or(name)
    }

    fn write_part(
        raw: &Path,
        entry_name: &str,
        part: &Path,
        level: i64,
        cancel: &Cancellation,
    ) -> VaultResult<()> {
        let source = File::open(raw).map_err(|e| {
            VaultError::StorageFault(format!("Failed to open {}: {}", raw.display(), e))
        })?;
        let mut source = CancellableReader {
            inner: BufReader::new(source),
            cancel: cancel.clone(),
        };

        let target = File::create(part).map_err(|e| {
            VaultError::StorageFault(format!("Failed to create {}: {}", part.display(), e))
        })?;

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(level));

        let mut writer = ZipWriter::new(target);
        writer
            .start_file(Self::entry_name(entry_name), options)
            .map_err(|e| VaultError::StorageFault(format!("Failed to start archive entry: {}", e)))?;

        io::copy(&mut source, &mut writer).map_err(|e| {
            VaultError::StorageFault(format!("Failed to compress {}: {}", raw.display(), e))
        })?;

        let target = writer
            .finish()
            .map_err(|e| VaultError::StorageFault(format!("Failed to finish archive: {}", e)))?;

        target.sync_all().map_err(|e| {
            VaultError::StorageFault(format!("Failed to flush {}: {}", part.display(), e))
        })?;

        Ok(())
    }

    /// Whole archive lifecycle on the blocking pool, cleanup included
    ///
    /// The cancellation flag is checked again after the rename, so a caller
    /// that gave up after that point finds the archive under `dest` and
    /// removes it itself.
    fn write_archive(
        raw: &Path,
        entry_name: &str,
        dest: &Path,
        level: i64,
        cancel: &Cancellation,
    ) -> VaultResult<u64> {
        let part = Self::part_path(dest);
        let abandoned = || {
            VaultError::StorageFault(format!("Archive {} abandoned", dest.display()))
        };

        let written = Self::write_part(raw, entry_name, &part, level, cancel).and_then(|()| {
            if cancel.is_cancelled() {
                Err(abandoned())
            } else {
                Ok(())
            }
        });
        if let Err(e) = written {
            remove_quietly(&part);
            return Err(e);
        }

        if let Err(e) = fs::rename(&part, dest) {
            remove_quietly(&part);
            return Err(VaultError::StorageFault(format!(
                "Failed to move archive into {}: {}",
                dest.display(),
                e
            )));
        }

        if cancel.is_cancelled() {
            remove_quietly(dest);
            return Err(abandoned());
        }

        let size = fs::metadata(dest)
            .map_err(|e| VaultError::StorageFault(format!("Failed to stat {}: {}", dest.display(), e)))?
            .len();

        Ok(size)
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove partial archive {}: {}", path.display(), e);
        }
    }
}

#[async_trait]
impl Archiver for ZipArchiver {
    async fn archive(&self, raw: &Path, entry_name: &str, dest: &Path) -> VaultResult<u64> {
        let cancel = Cancellation::default();
        let _guard = CancelOnDrop(cancel.clone());

        let size = {
            let raw = raw.to_path_buf();
            let dest = dest.to_path_buf();
            let entry_name = entry_name.to_string();
            let level = self.level;

            tokio::task::spawn_blocking(move || {
                Self::write_archive(&raw, &entry_name, &dest, level, &cancel)
            })
            .await
            .map_err(|e| VaultError::Internal(format!("Archiver task failed: {}", e)))??
        };

        tracing::debug!("Archived {} into {} ({} bytes)", raw.display(), dest.display(), size);

        Ok(size)
    }
}
