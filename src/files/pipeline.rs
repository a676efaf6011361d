/// File service: the ingest pipeline and the simpler catalog operations
///
/// `ingest` runs duplicate check, archive, raw cleanup and catalog write in
/// that order. Any failure after the raw file reached disk removes it (and
/// any archive already written) before the original error is returned.
use crate::{
    catalog::{duplicate_name, CatalogStore, FilePatch, FileRecord, FileStatus, NewFileRecord},
    error::{VaultError, VaultResult},
    files::{validate_name, Download, FilePage, Receipt, StagedUpload},
    storage::{Archiver, Janitor},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct FileService {
    catalog: Arc<dyn CatalogStore>,
    archiver: Arc<dyn Archiver>,
    janitor: Arc<dyn Janitor>,
    namespace: String,
    timeout: Duration,
}

impl FileService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        archiver: Arc<dyn Archiver>,
        janitor: Arc<dyn Janitor>,
        namespace: String,
        timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            archiver,
            janitor,
            namespace,
            timeout,
        }
    }

    /// Namespace new storage keys are generated in
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn janitor(&self) -> &Arc<dyn Janitor> {
        &self.janitor
    }

    /// Accept a staged upload: archive it and record it in the catalog
    pub async fn ingest(&self, declared_name: &str, upload: StagedUpload) -> VaultResult<Receipt> {
        let raw_key = upload.key.to_string();
        let name = declared_name.trim().to_uppercase();

        if let Err(e) = self.check_name_available(&name).await {
            self.discard(&raw_key).await;
            return Err(e);
        }

        let archive_key = upload.key.archive_key();
        let size = match self.archive(&upload, &raw_key, &archive_key).await {
            Ok(size) => size,
            Err(e) => {
                self.discard(&raw_key).await;
                return Err(e);
            }
        };

        // The archive is complete; the raw upload is an intermediate artifact
        let mut raw_present = false;
        if let Err(e) = self.janitor.remove(&raw_key).await {
            tracing::warn!("Failed to remove raw upload {}: {}", raw_key, e);
            raw_present = true;
        }

        let fields = NewFileRecord {
            name: name.clone(),
            url: archive_key.clone(),
            size: size as i64,
            status: FileStatus::Created,
            active: true,
        };

        let created = match tokio::time::timeout(self.timeout, self.catalog.create(fields)).await {
            Ok(result) => result,
            Err(_) => self.confirm_timed_out_create(&name, &archive_key).await,
        };

        match created {
            Ok(record) => {
                tracing::info!(
                    id = record.id,
                    name = %record.name,
                    url = %record.url,
                    size = record.size,
                    "File ingested"
                );
                Ok(Receipt::new("File was uploaded successfully"))
            }
            Err(e) => {
                if raw_present {
                    self.discard(&raw_key).await;
                }
                self.discard(&archive_key).await;
                Err(e)
            }
        }
    }

    /// Rename an active file
    pub async fn rename(&self, id: i64, new_name: &str) -> VaultResult<Receipt> {
        validate_name(new_name)?;

        let mut record = self.find_active(id).await?;
        record.name = new_name.trim().to_uppercase();
        record.status = FileStatus::Updated;

        self.catalog.save(&record).await?;

        tracing::info!(id, name = %record.name, "File renamed");
        Ok(Receipt::new("File name was updated successfully."))
    }

    /// Active record by id
    pub async fn retrieve(&self, id: i64) -> VaultResult<FileRecord> {
        self.find_active(id).await
    }

    /// Active records, newest first
    pub async fn list(&self, limit: i64, offset: i64) -> VaultResult<FilePage> {
        if limit < 1 || offset < 0 {
            return Err(VaultError::InvalidInput(
                "limit must be at least 1 and offset must not be negative".to_string(),
            ));
        }

        let (files, count) = self.catalog.paginate(limit, offset).await?;
        Ok(FilePage { count, files })
    }

    /// Mark a record inactive; the archive stays on disk
    pub async fn soft_delete(&self, id: i64) -> VaultResult<Receipt> {
        let record = self.catalog.find_by_id(id, true).await?.ok_or_else(|| {
            VaultError::NotFound(format!("File with ID:{} not found or was already deleted", id))
        })?;

        self.catalog
            .update(
                record.id,
                FilePatch {
                    active: Some(false),
                    status: Some(FileStatus::Deleted),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(id, name = %record.name, "File soft deleted");
        Ok(Receipt::new("File was soft deleted successfully"))
    }

    /// Open the archive of an active record for streaming
    pub async fn open_download(&self, id: i64) -> VaultResult<Download> {
        let record = self.find_active(id).await?;
        let path = self.janitor.resolve(&record.url)?;

        let file = tokio::fs::File::open(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                VaultError::NotFound(format!("No file found with path {}", record.url))
            }
            _ => VaultError::StorageFault(format!("Failed to open {}: {}", record.url, e)),
        })?;
        let size = file.metadata().await?.len();

        let filename = record
            .url
            .rsplit('/')
            .next()
            .unwrap_or(&record.url)
            .to_string();

        Ok(Download {
            file,
            filename,
            size,
        })
    }

    async fn find_active(&self, id: i64) -> VaultResult<FileRecord> {
        self.catalog
            .find_by_id(id, true)
            .await?
            .ok_or_else(|| VaultError::NotFound(format!("File with ID: {} not found", id)))
    }

    async fn check_name_available(&self, name: &str) -> VaultResult<()> {
        validate_name(name)?;

        let existing = self
            .bounded(self.catalog.find_by_name(name), || {
                VaultError::Internal(format!("Catalog lookup for {} timed out", name))
            })
            .await?;
        if existing.is_some() {
            return Err(duplicate_name(name));
        }
        Ok(())
    }

    async fn archive(
        &self,
        upload: &StagedUpload,
        raw_key: &str,
        archive_key: &str,
    ) -> VaultResult<u64> {
        let raw = self.janitor.resolve(raw_key)?;
        let dest = self.janitor.path_for(archive_key)?;

        let archived = tokio::time::timeout(
            self.timeout,
            self.archiver.archive(&raw, &upload.original_name, &dest),
        )
        .await;

        match archived {
            Ok(result) => result,
            Err(_) => {
                // The writer may have moved the archive into place just before it was cancelled
                self.discard_if_present(archive_key).await;
                Err(VaultError::StorageFault(format!("Archiving {} timed out", raw_key)))
            }
        }
    }

    /// An insert that outlived the timeout may still have committed
    async fn confirm_timed_out_create(&self, name: &str, archive_key: &str) -> VaultResult<FileRecord> {
        let timed_out = || VaultError::Internal(format!("Catalog write for {} timed out", name));

        match self.bounded(self.catalog.find_by_name(name), timed_out).await {
            Ok(Some(record)) if record.url == archive_key => {
                tracing::warn!(id = record.id, name = %record.name, "Catalog write finished after the timeout");
                Ok(record)
            }
            _ => Err(timed_out()),
        }
    }

    /// Run one pipeline step under the configured timeout
    async fn bounded<T, F>(
        &self,
        step: F,
        on_timeout: impl FnOnce() -> VaultError,
    ) -> VaultResult<T>
    where
        F: Future<Output = VaultResult<T>>,
    {
        match tokio::time::timeout(self.timeout, step).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout()),
        }
    }

    /// Like `discard`, for files that may legitimately be absent
    async fn discard_if_present(&self, key: &str) {
        match self.janitor.remove(key).await {
            Ok(()) => tracing::debug!("Discarded {}", key),
            Err(VaultError::NotFound(_)) => {}
            Err(e) => tracing::warn!("Cleanup of {} failed: {}", key, e),
        }
    }

    /// Compensating delete; failures are logged and never replace the caller's error
    async fn discard(&self, key: &str) {
        match self.janitor.remove(key).await {
            Ok(()) => tracing::debug!("Discarded {}", key),
            Err(e) => tracing::warn!("Cleanup of {} failed: {}", key, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::SqliteCatalog,
        db::{create_pool, run_migrations, DatabaseOptions},
        storage::{DiskJanitor, StorageKey, ZipArchiver},
    };
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        catalog: Arc<SqliteCatalog>,
        janitor: Arc<DiskJanitor>,
    }

    impl Fixture {
        async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let pool = create_pool(&dir.path().join("vault.sqlite"), DatabaseOptions::default())
                .await
                .unwrap();
            run_migrations(&pool).await.unwrap();

            let root = dir.path().join("uploads");
            std::fs::create_dir_all(root.join("files")).unwrap();

            Self {
                catalog: Arc::new(SqliteCatalog::new(pool)),
                janitor: Arc::new(DiskJanitor::new(root)),
                dir,
            }
        }

        fn service(&self) -> FileService {
            self.service_with(self.catalog.clone(), Arc::new(ZipArchiver::new()))
        }

        fn service_with(
            &self,
            catalog: Arc<dyn CatalogStore>,
            archiver: Arc<dyn Archiver>,
        ) -> FileService {
            FileService::new(
                catalog,
                archiver,
                self.janitor.clone(),
                "files".to_string(),
                Duration::from_secs(5),
            )
        }

        /// Write raw bytes the way the upload handler does
        fn stage(&self, original_name: &str, media_type: &str, content: &[u8]) -> StagedUpload {
            let key = StorageKey::generate("files", original_name).unwrap();
            let path = self.janitor.path_for(&key.to_string()).unwrap();
            std::fs::write(path, content).unwrap();

            StagedUpload {
                key,
                original_name: original_name.to_string(),
                media_type: media_type.to_string(),
            }
        }

        fn upload_files(&self) -> Vec<PathBuf> {
            std::fs::read_dir(self.dir.path().join("uploads/files"))
                .unwrap()
                .map(|e| e.unwrap().path())
                .collect()
        }
    }

    struct FailingArchiver;

    #[async_trait]
    impl Archiver for FailingArchiver {
        async fn archive(&self, _raw: &Path, _entry: &str, _dest: &Path) -> VaultResult<u64> {
            Err(VaultError::StorageFault("No space left on device".to_string()))
        }
    }

    struct StalledArchiver;

    #[async_trait]
    impl Archiver for StalledArchiver {
        async fn archive(&self, _raw: &Path, _entry: &str, _dest: &Path) -> VaultResult<u64> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(0)
        }
    }

    /// Catalog whose writes always fail with a driver error
    struct BrokenCatalog(Arc<SqliteCatalog>);

    #[async_trait]
    impl CatalogStore for BrokenCatalog {
        async fn find_by_name(&self, name: &str) -> VaultResult<Option<FileRecord>> {
            self.0.find_by_name(name).await
        }

        async fn find_by_id(&self, id: i64, active_only: bool) -> VaultResult<Option<FileRecord>> {
            self.0.find_by_id(id, active_only).await
        }

        async fn create(&self, _fields: NewFileRecord) -> VaultResult<FileRecord> {
            Err(VaultError::PersistenceFault(sqlx::Error::PoolTimedOut))
        }

        async fn save(&self, record: &FileRecord) -> VaultResult<()> {
            self.0.save(record).await
        }

        async fn update(&self, id: i64, patch: FilePatch) -> VaultResult<()> {
            self.0.update(id, patch).await
        }

        async fn paginate(&self, limit: i64, offset: i64) -> VaultResult<(Vec<FileRecord>, i64)> {
            self.0.paginate(limit, offset).await
        }
    }

    /// Catalog with no records; writes are not expected
    struct EmptyCatalog;

    #[async_trait]
    impl CatalogStore for EmptyCatalog {
        async fn find_by_name(&self, _name: &str) -> VaultResult<Option<FileRecord>> {
            Ok(None)
        }

        async fn find_by_id(&self, _id: i64, _active_only: bool) -> VaultResult<Option<FileRecord>> {
            Ok(None)
        }

        async fn create(&self, _fields: NewFileRecord) -> VaultResult<FileRecord> {
            Err(VaultError::Internal("unexpected catalog write".to_string()))
        }

        async fn save(&self, _record: &FileRecord) -> VaultResult<()> {
            Ok(())
        }

        async fn update(&self, _id: i64, _patch: FilePatch) -> VaultResult<()> {
            Ok(())
        }

        async fn paginate(&self, _limit: i64, _offset: i64) -> VaultResult<(Vec<FileRecord>, i64)> {
            Ok((Vec::new(), 0))
        }
    }

    /// Catalog whose inserts never return, with or without committing first
    struct HangingCatalog {
        inner: Arc<SqliteCatalog>,
        commit: bool,
    }

    #[async_trait]
    impl CatalogStore for HangingCatalog {
        async fn find_by_name(&self, name: &str) -> VaultResult<Option<FileRecord>> {
            self.inner.find_by_name(name).await
        }

        async fn find_by_id(&self, id: i64, active_only: bool) -> VaultResult<Option<FileRecord>> {
            self.inner.find_by_id(id, active_only).await
        }

        async fn create(&self, fields: NewFileRecord) -> VaultResult<FileRecord> {
            if self.commit {
                self.inner.create(fields).await?;
            }
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(VaultError::Internal("insert hung".to_string()))
        }

        async fn save(&self, record: &FileRecord) -> VaultResult<()> {
            self.inner.save(record).await
        }

        async fn update(&self, id: i64, patch: FilePatch) -> VaultResult<()> {
            self.inner.update(id, patch).await
        }

        async fn paginate(&self, limit: i64, offset: i64) -> VaultResult<(Vec<FileRecord>, i64)> {
            self.inner.paginate(limit, offset).await
        }
    }

    /// Incompressible bytes, so Deflate has real work to do
    fn noise(len: usize) -> Vec<u8> {
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 24) as u8
            })
            .collect()
    }

    #[tokio::test]
    async fn test_ingest_archives_and_records() {
        let fx = Fixture::new().await;
        let service = fx.service();
        let upload = fx.stage("budget.pdf", "application/pdf", &b"%PDF-1.7 ".repeat(200));
        let raw_path = fx.janitor.path_for(&upload.key.to_string()).unwrap();

        let receipt = service.ingest("budget", upload).await.unwrap();
        assert_eq!(receipt.msg, "File was uploaded successfully");
        assert!(!raw_path.exists());

        let record = fx.catalog.find_by_name("BUDGET").await.unwrap().unwrap();
        assert_eq!(record.status, FileStatus::Created);
        assert!(record.active);
        assert!(record.url.ends_with(".zip"));

        let archive = fx.janitor.resolve(&record.url).unwrap();
        assert_eq!(record.size as u64, std::fs::metadata(archive).unwrap().len());
        assert_eq!(fx.upload_files().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_and_raw_removed() {
        let fx = Fixture::new().await;
        let service = fx.service();

        service
            .ingest("budget", fx.stage("a.pdf", "application/pdf", b"%PDF first"))
            .await
            .unwrap();

        let second = fx.stage("b.pdf", "application/pdf", b"%PDF second");
        let second_raw = fx.janitor.path_for(&second.key.to_string()).unwrap();

        let err = service.ingest("Budget", second).await.unwrap_err();
        assert!(matches!(err, VaultError::DuplicateName(_)));
        assert!(err.to_string().contains("BUDGET"));
        assert!(!second_raw.exists());
        assert_eq!(fx.upload_files().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_same_name_exactly_one_wins() {
        let fx = Fixture::new().await;
        let service = fx.service();

        let a = fx.stage("a.txt", "text/plain", b"alpha");
        let b = fx.stage("b.txt", "text/plain", b"beta");

        let (ra, rb) = futures::join!(service.ingest("race", a), service.ingest("race", b));

        let outcomes = [ra, rb];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(VaultError::DuplicateName(_)))));

        // Only the winner's archive survives; no raw files remain
        let files = fx.upload_files();
        assert_eq!(files.len(), 1);
        assert!(files[0].to_string_lossy().ends_with(".zip"));
    }

    #[tokio::test]
    async fn test_archiver_failure_removes_raw() {
        let fx = Fixture::new().await;
        let service = fx.service_with(fx.catalog.clone(), Arc::new(FailingArchiver));

        let upload = fx.stage("sheet.csv", "text/csv", b"a,b\n");
        let err = service.ingest("sheet", upload).await.unwrap_err();

        assert!(matches!(err, VaultError::StorageFault(_)));
        assert!(fx.upload_files().is_empty());
        assert!(fx.catalog.find_by_name("SHEET").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_archiver_timeout_is_a_fault() {
        let fx = Fixture::new().await;
        let service = FileService::new(
            fx.catalog.clone(),
            Arc::new(StalledArchiver),
            fx.janitor.clone(),
            "files".to_string(),
            Duration::from_millis(50),
        );

        let upload = fx.stage("notes.txt", "text/plain", b"slow");
        let err = service.ingest("notes", upload).await.unwrap_err();

        assert!(matches!(err, VaultError::StorageFault(_)));
        assert!(fx.upload_files().is_empty());
    }

    #[tokio::test]
    async fn test_archiver_timeout_leaves_upload_dir_empty() {
        let fx = Fixture::new().await;
        let service = FileService::new(
            Arc::new(EmptyCatalog),
            Arc::new(ZipArchiver::new()),
            fx.janitor.clone(),
            "files".to_string(),
            Duration::from_millis(5),
        );

        let upload = fx.stage("big.txt", "text/plain", &noise(16 * 1024 * 1024));
        let err = service.ingest("big", upload).await.unwrap_err();
        assert!(matches!(err, VaultError::StorageFault(_)));

        // The zip writer notices the cancellation on its next read
        let mut leftovers = fx.upload_files();
        for _ in 0..200 {
            if leftovers.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            leftovers = fx.upload_files();
        }
        assert!(leftovers.is_empty(), "left behind: {:?}", leftovers);
    }

    #[tokio::test]
    async fn test_insert_committed_after_timeout_is_kept() {
        let fx = Fixture::new().await;
        let catalog = Arc::new(HangingCatalog {
            inner: fx.catalog.clone(),
            commit: true,
        });
        let service = FileService::new(
            catalog,
            Arc::new(ZipArchiver::new()),
            fx.janitor.clone(),
            "files".to_string(),
            Duration::from_millis(300),
        );

        let receipt = service
            .ingest("late", fx.stage("late.txt", "text/plain", b"late"))
            .await
            .unwrap();
        assert_eq!(receipt.msg, "File was uploaded successfully");

        let record = fx.catalog.find_by_name("LATE").await.unwrap().unwrap();
        assert!(fx.janitor.resolve(&record.url).is_ok());
        assert_eq!(fx.upload_files().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_timeout_without_commit_cleans_up() {
        let fx = Fixture::new().await;
        let catalog = Arc::new(HangingCatalog {
            inner: fx.catalog.clone(),
            commit: false,
        });
        let service = FileService::new(
            catalog,
            Arc::new(ZipArchiver::new()),
            fx.janitor.clone(),
            "files".to_string(),
            Duration::from_millis(300),
        );

        let err = service
            .ingest("lost", fx.stage("lost.txt", "text/plain", b"lost"))
            .await
            .unwrap_err();

        assert!(matches!(err, VaultError::Internal(_)));
        assert!(fx.upload_files().is_empty());
        assert!(fx.catalog.find_by_name("LOST").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_removes_raw_and_archive() {
        let fx = Fixture::new().await;
        let broken = Arc::new(BrokenCatalog(fx.catalog.clone()));
        let service = fx.service_with(broken, Arc::new(ZipArchiver::new()));

        let upload = fx.stage("doc.doc", "application/msword", b"doc bytes");
        let err = service.ingest("doc", upload).await.unwrap_err();

        assert!(matches!(err, VaultError::PersistenceFault(_)));
        assert!(fx.upload_files().is_empty());
    }

    #[tokio::test]
    async fn test_missing_raw_surfaces_not_found() {
        let fx = Fixture::new().await;
        let service = fx.service();

        let upload = StagedUpload {
            key: StorageKey::generate("files", "ghost.pdf").unwrap(),
            original_name: "ghost.pdf".to_string(),
            media_type: "application/pdf".to_string(),
        };

        let err = service.ingest("ghost", upload).await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rename_round_trip() {
        let fx = Fixture::new().await;
        let service = fx.service();
        service
            .ingest("draft", fx.stage("d.txt", "text/plain", b"draft"))
            .await
            .unwrap();
        let id = fx.catalog.find_by_name("DRAFT").await.unwrap().unwrap().id;

        service.rename(id, "report").await.unwrap();

        let record = service.retrieve(id).await.unwrap();
        assert_eq!(record.name, "REPORT");
        assert_eq!(record.status, FileStatus::Updated);
    }

    #[tokio::test]
    async fn test_rename_to_existing_name_is_duplicate() {
        let fx = Fixture::new().await;
        let service = fx.service();
        service
            .ingest("alpha", fx.stage("a.txt", "text/plain", b"alpha"))
            .await
            .unwrap();
        service
            .ingest("beta", fx.stage("b.txt", "text/plain", b"beta"))
            .await
            .unwrap();
        let beta = fx.catalog.find_by_name("BETA").await.unwrap().unwrap();

        let err = service.rename(beta.id, "Alpha").await.unwrap_err();
        assert!(matches!(err, VaultError::DuplicateName(_)));
        assert!(err.to_string().contains("ALPHA"));

        let unchanged = service.retrieve(beta.id).await.unwrap();
        assert_eq!(unchanged.name, "BETA");
        assert_eq!(unchanged.status, FileStatus::Created);
    }

    #[tokio::test]
    async fn test_rename_missing_is_not_found() {
        let fx = Fixture::new().await;
        let err = fx.service().rename(42, "report").await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_record_but_keeps_archive() {
        let fx = Fixture::new().await;
        let service = fx.service();
        service
            .ingest("old", fx.stage("o.txt", "text/plain", b"old"))
            .await
            .unwrap();
        let record = fx.catalog.find_by_name("OLD").await.unwrap().unwrap();

        service.soft_delete(record.id).await.unwrap();

        assert!(matches!(
            service.retrieve(record.id).await,
            Err(VaultError::NotFound(_))
        ));
        assert_eq!(service.list(10, 0).await.unwrap().count, 0);
        assert!(fx.janitor.resolve(&record.url).is_ok());

        let again = service.soft_delete(record.id).await.unwrap_err();
        assert!(matches!(again, VaultError::NotFound(_)));

        let stored = fx.catalog.find_by_id(record.id, false).await.unwrap().unwrap();
        assert_eq!(stored.status, FileStatus::Deleted);
    }

    #[tokio::test]
    async fn test_list_pages_newest_first() {
        let fx = Fixture::new().await;
        let service = fx.service();

        for i in 0..15 {
            let upload = fx.stage(&format!("f{}.txt", i), "text/plain", b"x");
            service.ingest(&format!("file{:02}", i), upload).await.unwrap();
        }

        let first = service.list(10, 0).await.unwrap();
        assert_eq!(first.count, 15);
        assert_eq!(first.files.len(), 10);
        assert_eq!(first.files[0].name, "FILE14");

        let rest = service.list(10, 10).await.unwrap();
        assert_eq!(rest.files.len(), 5);

        assert!(service.list(0, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_open_download() {
        let fx = Fixture::new().await;
        let service = fx.service();
        service
            .ingest("budget", fx.stage("budget.pdf", "application/pdf", b"%PDF"))
            .await
            .unwrap();
        let record = fx.catalog.find_by_name("BUDGET").await.unwrap().unwrap();

        let download = service.open_download(record.id).await.unwrap();
        assert!(download.filename.ends_with(".zip"));
        assert!(!download.filename.contains('/'));
        assert_eq!(download.size as i64, record.size);

        // Archive vanished from disk
        std::fs::remove_file(fx.janitor.resolve(&record.url).unwrap()).unwrap();
        assert!(matches!(
            service.open_download(record.id).await,
            Err(VaultError::NotFound(_))
        ));
    }
}
