/// File endpoints: upload, list, retrieve, rename, soft delete and download
use crate::{
    account::Role,
    api::extract::{ValidatedJson, ValidatedQuery},
    auth::{AuthUser, RoleGuard},
    catalog::FileRecord,
    context::AppContext,
    error::{VaultError, VaultResult},
    files::{stage_field, FilePage, FileService, PaginationQuery, Receipt, RenameFileRequest, StagedUpload},
    storage::{UploadFilter, ARCHIVE_CONTENT_TYPE},
};
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio_util::io::ReaderStream;

/// Multipart field carrying the declared display name
const NAME_FIELD: &str = "name";
/// Multipart field carrying the file part
const FILES_FIELD: &str = "files";

/// Build file routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/file", get(list_files).post(upload_file))
        .route(
            "/file/:id",
            get(retrieve_file).patch(rename_file).delete(delete_file),
        )
        .route("/file/:id/download", get(download_file))
}

/// Fields collected from an upload form
#[derive(Default)]
struct UploadForm {
    name: Option<String>,
    staged: Option<StagedUpload>,
    files: usize,
}

/// Upload endpoint
async fn upload_file(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> VaultResult<(StatusCode, Json<Receipt>)> {
    let service = &ctx.file_service;
    let mut form = UploadForm::default();

    if let Err(e) = read_form(&mut multipart, service, &mut form).await {
        if let Some(staged) = form.staged.take() {
            discard_staged(service, &staged).await;
        }
        return Err(e);
    }

    let Some(upload) = form.staged else {
        return Err(VaultError::InvalidInput("File is missing".to_string()));
    };

    tracing::debug!(
        "User {} uploading {} ({})",
        user.id,
        upload.original_name,
        upload.media_type
    );

    // An absent name fails validation inside ingest, which removes the staged file
    let name = form.name.unwrap_or_default();
    let receipt = service.ingest(&name, upload).await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn read_form(
    multipart: &mut Multipart,
    service: &FileService,
    form: &mut UploadForm,
) -> VaultResult<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| VaultError::InvalidInput(e.body_text()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            NAME_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| VaultError::InvalidInput(e.body_text()))?;
                form.name = Some(text);
            }
            FILES_FIELD => {
                form.files += 1;
                UploadFilter::check_count(form.files)?;
                let staged = stage_field(field, service.janitor().as_ref(), service.namespace()).await?;
                form.staged = Some(staged);
            }
            other => {
                return Err(VaultError::InvalidInput(format!(
                    "property {} should not exist",
                    other
                )));
            }
        }
    }

    Ok(())
}

async fn discard_staged(service: &FileService, staged: &StagedUpload) {
    let key = staged.key.to_string();
    if let Err(e) = service.janitor().remove(&key).await {
        tracing::warn!("Failed to remove staged upload {}: {}", key, e);
    }
}

/// List active files
async fn list_files(
    State(ctx): State<AppContext>,
    ValidatedQuery(query): ValidatedQuery<PaginationQuery>,
) -> VaultResult<Json<FilePage>> {
    let page = ctx.file_service.list(query.limit, query.offset).await?;
    Ok(Json(page))
}

/// Retrieve one active file
async fn retrieve_file(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> VaultResult<Json<FileRecord>> {
    let record = ctx.file_service.retrieve(id).await?;
    Ok(Json(record))
}

/// Rename a file
async fn rename_file(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<RenameFileRequest>,
) -> VaultResult<Json<Receipt>> {
    let receipt = ctx.file_service.rename(id, &req.name).await?;
    Ok(Json(receipt))
}

/// Soft delete a file
async fn delete_file(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> VaultResult<Json<Receipt>> {
    RoleGuard::check(&user, &[Role::SuperAdmin, Role::Admin])?;

    let receipt = ctx.file_service.soft_delete(id).await?;
    tracing::info!("User {} soft deleted file {}", user.id, id);

    Ok(Json(receipt))
}

/// Stream the archive of a file
async fn download_file(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> VaultResult<Response> {
    let download = ctx.file_service.open_download(id).await?;

    let body = Body::from_stream(ReaderStream::new(download.file));

    Ok((
        [
            (header::CONTENT_TYPE, ARCHIVE_CONTENT_TYPE.to_string()),
            (header::CONTENT_LENGTH, download.size.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download.filename),
            ),
        ],
        body,
    )
        .into_response())
}
