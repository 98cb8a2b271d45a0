//! v1 File record handlers.
//!
//! Only metadata is stored here. Bytes live at `storagePath`, written by
//! whatever upload path the client used.

use axum::extract::{Path, State};

use super::{new_id, not_found};
use crate::api::extractors::{AppJson, AppQuery, ValidatedJson};
use crate::api::v1::dto::common::{date_range, non_blank, normalize_tags};
use crate::api::v1::dto::{
    CreateFileRequest, DeletedResponse, FileResponse, FileStatsResponse, ListFilesQuery,
    SetVisibilityRequest, UpdateFileRequest,
};
use crate::api::v1::middleware::AuthUser;
use crate::api::v1::response::ApiResponse;
use crate::api::AppState;
use crate::error::{AideckError, Result};
use crate::models::{mime_type_allowed, utc_now, FileRecord, ListFilesFilter, PageRequest};
use crate::services::Quota;

/// Explicit mime type, else a guess from the filename extension.
fn resolve_mime_type(filename: &str, explicit: Option<String>) -> String {
    match non_blank(explicit) {
        Some(mime) => mime.trim().to_ascii_lowercase(),
        None => mime_guess::from_path(filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

/// `POST /api/v1/files`
#[utoipa::path(
    post,
    path = "/api/v1/files",
    tag = "files",
    operation_id = "files.create",
    request_body = CreateFileRequest,
    responses(
        (status = 201, description = "File registered", body = FileResponse),
        (status = 400, description = "Invalid request, oversized file or disallowed mime type"),
        (status = 403, description = "Storage quota exceeded"),
    )
)]
pub async fn create_file(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFileRequest>,
) -> Result<ApiResponse<FileResponse>> {
    let uploads = &state.config.uploads;
    let size = req.size.max(0) as u64;
    if uploads.max_file_size > 0 && size > uploads.max_file_size {
        return Err(AideckError::invalid_field(
            "size",
            format!("must be at most {} bytes", uploads.max_file_size),
        ));
    }

    let filename = req.filename.trim().to_string();
    let mime_type = resolve_mime_type(&filename, req.mime_type);
    if !mime_type_allowed(&mime_type, &uploads.allowed_mime_types) {
        return Err(AideckError::invalid_field(
            "mimeType",
            format!("{mime_type} is not an accepted file type"),
        ));
    }

    state
        .usage
        .ensure_within(&user.user_id, user.plan, Quota::StorageBytes, size)
        .await?;

    let mut file = FileRecord::new(
        new_id(),
        user.user_id.clone(),
        filename,
        mime_type,
        req.size,
        req.storage_path.trim().to_string(),
    );
    if let Some(category) = req.category {
        file.category = category;
    }
    file.is_public = req.is_public;
    file.description = non_blank(req.description);
    file.tags = normalize_tags(req.tags);

    state.db.create_file(&file).await?;
    tracing::debug!(
        file_id = %file.id,
        mime_type = %file.mime_type,
        size = file.size,
        "File registered"
    );

    Ok(ApiResponse::created(file.into()))
}

/// `GET /api/v1/files/{id}`
#[utoipa::path(
    get,
    path = "/api/v1/files/{id}",
    tag = "files",
    operation_id = "files.get",
    params(("id" = String, Path, description = "File ID")),
    responses(
        (status = 200, description = "File found", body = FileResponse),
        (status = 404, description = "File not found"),
    )
)]
pub async fn get_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<FileResponse>> {
    let file = state
        .db
        .get_file(&user.user_id, &id)
        .await?
        .ok_or_else(|| not_found("File", &id))?;

    Ok(ApiResponse::success(file.into()))
}

/// `PATCH /api/v1/files/{id}`
///
/// Size, mime type and storage path are fixed once registered.
#[utoipa::path(
    patch,
    path = "/api/v1/files/{id}",
    tag = "files",
    operation_id = "files.update",
    params(("id" = String, Path, description = "File ID")),
    request_body = UpdateFileRequest,
    responses(
        (status = 200, description = "File updated", body = FileResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "File not found"),
    )
)]
pub async fn update_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateFileRequest>,
) -> Result<ApiResponse<FileResponse>> {
    let mut file = state
        .db
        .get_file(&user.user_id, &id)
        .await?
        .ok_or_else(|| not_found("File", &id))?;

    if let Some(filename) = req.filename {
        file.filename = filename.trim().to_string();
    }
    if let Some(category) = req.category {
        file.category = category;
    }
    if let Some(description) = req.description {
        file.description = non_blank(Some(description));
    }
    if let Some(tags) = req.tags {
        file.tags = normalize_tags(tags);
    }
    file.updated_at = utc_now();

    if !state.db.update_file(&file).await? {
        return Err(not_found("File", &id));
    }

    Ok(ApiResponse::success(file.into()))
}

/// `POST /api/v1/files/{id}/visibility`
#[utoipa::path(
    post,
    path = "/api/v1/files/{id}/visibility",
    tag = "files",
    operation_id = "files.setVisibility",
    params(("id" = String, Path, description = "File ID")),
    request_body = SetVisibilityRequest,
    responses(
        (status = 200, description = "Visibility changed", body = FileResponse),
        (status = 404, description = "File not found"),
    )
)]
pub async fn set_visibility(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<SetVisibilityRequest>,
) -> Result<ApiResponse<FileResponse>> {
    if !state
        .db
        .set_file_visibility(&user.user_id, &id, req.is_public)
        .await?
    {
        return Err(not_found("File", &id));
    }

    let file = state
        .db
        .get_file(&user.user_id, &id)
        .await?
        .ok_or_else(|| not_found("File", &id))?;

    Ok(ApiResponse::success(file.into()))
}

/// `DELETE /api/v1/files/{id}`
#[utoipa::path(
    delete,
    path = "/api/v1/files/{id}",
    tag = "files",
    operation_id = "files.delete",
    params(("id" = String, Path, description = "File ID")),
    responses(
        (status = 200, description = "File deleted", body = DeletedResponse),
        (status = 404, description = "File not found"),
    )
)]
pub async fn delete_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<DeletedResponse>> {
    if !state.db.delete_file(&user.user_id, &id).await? {
        return Err(not_found("File", &id));
    }
    Ok(ApiResponse::success(DeletedResponse { id }).with_message("File deleted"))
}

/// `GET /api/v1/files`
#[utoipa::path(
    get,
    path = "/api/v1/files",
    tag = "files",
    operation_id = "files.list",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "Files listed", body = Vec<FileResponse>),
    )
)]
pub async fn list_files(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<ListFilesQuery>,
) -> Result<ApiResponse<Vec<FileResponse>>> {
    let filter = ListFilesFilter {
        category: query.category,
        mime_type_prefix: non_blank(query.mime_type).map(|m| m.trim().to_ascii_lowercase()),
        is_public: query.is_public,
        search: non_blank(query.search),
        min_size: query.min_size,
        max_size: query.max_size,
        created: date_range(query.created_from, query.created_to),
    };
    let page = PageRequest::new(query.page, query.limit);

    let result = state.db.list_files(&user.user_id, &filter, page).await?;

    Ok(ApiResponse::paginated(result.map(Into::into)))
}

/// `GET /api/v1/files:stats`
#[utoipa::path(
    get,
    path = "/api/v1/files:stats",
    tag = "files",
    operation_id = "files.stats",
    responses(
        (status = 200, description = "File statistics", body = FileStatsResponse),
    )
)]
pub async fn file_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<FileStatsResponse>> {
    let stats = state.db.file_stats(&user.user_id).await?;
    Ok(ApiResponse::success(stats.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_guessed_from_extension() {
        assert_eq!(resolve_mime_type("photo.PNG", None), "image/png");
        assert_eq!(resolve_mime_type("notes.pdf", None), "application/pdf");
        assert_eq!(
            resolve_mime_type("blob.unknownext", None),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_explicit_mime_type_wins() {
        assert_eq!(
            resolve_mime_type("photo.png", Some(" Image/WebP ".into())),
            "image/webp"
        );
        assert_eq!(resolve_mime_type("photo.png", Some("  ".into())), "image/png");
    }
}
