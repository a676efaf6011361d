/// Staging of raw uploads onto disk
///
/// The filter runs before the first byte is written. The body is streamed
/// chunk by chunk into the path of a freshly generated storage key and synced
/// before the upload is handed to the ingest pipeline.
use crate::{
    error::{VaultError, VaultResult},
    files::StagedUpload,
    storage::{Janitor, StorageKey, UploadFilter},
};
use axum::{body::Bytes, extract::multipart::Field};
use futures::{Stream, StreamExt};
use tokio::{fs, io::AsyncWriteExt};

/// Stage one multipart file field
pub async fn stage_field(
    field: Field<'_>,
    janitor: &dyn Janitor,
    namespace: &str,
) -> VaultResult<StagedUpload> {
    let original_name = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| VaultError::InvalidInput("File is missing".to_string()))?;
    let media_type = field.content_type().map(str::to_string).unwrap_or_default();

    stage_stream(Box::pin(field), &original_name, &media_type, janitor, namespace).await
}

/// Stage any byte stream under a new storage key
pub async fn stage_stream<S, E>(
    mut body: S,
    original_name: &str,
    media_type: &str,
    janitor: &dyn Janitor,
    namespace: &str,
) -> VaultResult<StagedUpload>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    UploadFilter::check(media_type, original_name)?;

    let key = StorageKey::generate(namespace, original_name)?;
    let path = janitor.path_for(&key.to_string())?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            VaultError::StorageFault(format!("Failed to create upload directory: {}", e))
        })?;
    }

    let mut file = fs::File::create(&path)
        .await
        .map_err(|e| VaultError::StorageFault(format!("Failed to create {}: {}", key, e)))?;

    let written = async {
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| VaultError::InvalidInput(format!("Failed to read upload: {}", e)))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| VaultError::StorageFault(format!("Failed to write {}: {}", key, e)))?;
        }
        file.flush().await?;
        file.sync_all().await?;
        Ok::<(), VaultError>(())
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(cleanup) = fs::remove_file(&path).await {
            tracing::warn!("Failed to remove partial upload {}: {}", key, cleanup);
        }
        return Err(e);
    }

    tracing::debug!("Staged {} as {}", original_name, key);

    Ok(StagedUpload {
        key,
        original_name: original_name.to_string(),
        media_type: media_type.to_string(),
    })
}
