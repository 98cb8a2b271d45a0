//! File record request/response DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::{validate_filename, validate_not_blank, validate_tags};
use crate::models::{self, FileCategory};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/files`. Registers metadata for bytes already
/// stored at `storagePath`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    #[validate(
        length(min = 1, max = 255, message = "must be 1 to 255 characters"),
        custom(function = "validate_filename")
    )]
    pub filename: String,
    /// Guessed from the filename extension when omitted.
    #[validate(length(min = 3, max = 255))]
    pub mime_type: Option<String>,
    /// Size in bytes.
    #[validate(range(min = 0, message = "must not be negative"))]
    pub size: i64,
    #[validate(
        length(min = 1, max = 1024),
        custom(function = "validate_not_blank")
    )]
    pub storage_path: String,
    /// Derived from the mime type when omitted.
    pub category: Option<FileCategory>,
    #[serde(default)]
    pub is_public: bool,
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
}

/// Request body for `PATCH /v1/files/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFileRequest {
    #[validate(
        length(min = 1, max = 255, message = "must be 1 to 255 characters"),
        custom(function = "validate_filename")
    )]
    pub filename: Option<String>,
    pub category: Option<FileCategory>,
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
}

/// Request body for `POST /v1/files/{id}/visibility`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetVisibilityRequest {
    pub is_public: bool,
}

/// Query parameters for `GET /v1/files`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListFilesQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[param(value_type = Option<String>)]
    pub category: Option<FileCategory>,
    /// Mime type prefix such as `image/` or `application/pdf`.
    pub mime_type: Option<String>,
    pub is_public: Option<bool>,
    /// Case-insensitive substring of the filename.
    pub search: Option<String>,
    pub min_size: Option<i64>,
    pub max_size: Option<i64>,
    #[param(value_type = Option<String>)]
    pub created_from: Option<DateTime<Utc>>,
    #[param(value_type = Option<String>)]
    pub created_to: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub storage_path: String,
    pub category: FileCategory,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<models::FileRecord> for FileResponse {
    fn from(file: models::FileRecord) -> Self {
        Self {
            id: file.id,
            filename: file.filename,
            mime_type: file.mime_type,
            size: file.size,
            storage_path: file.storage_path,
            category: file.category,
            is_public: file.is_public,
            description: file.description,
            tags: file.tags,
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileCategoryStatResponse {
    pub category: String,
    pub count: u64,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileStatsResponse {
    pub total: u64,
    pub total_bytes: u64,
    pub public_count: u64,
    pub by_category: Vec<FileCategoryStatResponse>,
}

impl From<models::FileStats> for FileStatsResponse {
    fn from(stats: models::FileStats) -> Self {
        Self {
            total: stats.total,
            total_bytes: stats.total_bytes,
            public_count: stats.public_count,
            by_category: stats
                .by_category
                .into_iter()
                .map(|c| FileCategoryStatResponse {
                    category: c.category,
                    count: c.count,
                    total_bytes: c.total_bytes,
                })
                .collect(),
        }
    }
}
