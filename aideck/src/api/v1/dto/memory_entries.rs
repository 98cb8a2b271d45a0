//! Memory entry request/response DTOs for the v1 API.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::{normalize_tags, validate_not_blank, validate_tags};
use crate::models::{self, GroupCount, MemoryType, IMPORTANCE_DEFAULT};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/memory-entries` and `PUT /v1/memory-entries:upsert`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemoryEntryRequest {
    #[serde(default)]
    pub memory_type: MemoryType,
    #[validate(
        length(min = 1, max = 200, message = "must be 1 to 200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub key: String,
    /// Any JSON value.
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    /// 1 (trivia) to 10 (critical). Defaults to 5.
    #[validate(range(min = 1, max = 10, message = "must be between 1 and 10"))]
    pub importance: Option<i64>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
    #[schema(value_type = Option<String>)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Relative alternative to `expiresAt`.
    #[validate(range(min = 1, max = 315_360_000))]
    pub ttl_seconds: Option<i64>,
}

impl CreateMemoryEntryRequest {
    pub fn into_entry(self, id: String, user_id: String) -> models::MemoryEntry {
        let mut entry = models::MemoryEntry::new(id, user_id, self.memory_type, self.key, self.value)
            .with_importance(self.importance.unwrap_or(IMPORTANCE_DEFAULT as i64));
        entry.tags = normalize_tags(self.tags);
        entry.expires_at = match self.ttl_seconds {
            Some(secs) => Some(entry.created_at + Duration::seconds(secs)),
            None => self.expires_at,
        };
        entry
    }
}

/// Request body for `PATCH /v1/memory-entries/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemoryEntryRequest {
    #[schema(value_type = Option<Object>)]
    pub value: Option<serde_json::Value>,
    #[validate(range(min = 1, max = 10, message = "must be between 1 and 10"))]
    pub importance: Option<i64>,
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
    #[schema(value_type = Option<String>)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Remove any expiry. Ignored when `expiresAt` is also given.
    #[serde(default)]
    pub clear_expiry: bool,
}

/// Query parameters for `GET /v1/memory-entries:by-key`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MemoryEntryByKeyQuery {
    pub key: String,
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub memory_type: MemoryType,
}

/// Query parameters for `GET /v1/memory-entries`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListMemoryEntriesQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[param(value_type = Option<String>)]
    pub memory_type: Option<MemoryType>,
    pub tag: Option<String>,
    /// Case-insensitive substring of the key.
    pub search: Option<String>,
    pub min_importance: Option<i32>,
    /// Include entries past their expiry that have not been swept yet.
    pub include_expired: Option<bool>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntryResponse {
    pub id: String,
    pub memory_type: MemoryType,
    pub key: String,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    pub importance: i32,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub expires_at: Option<DateTime<Utc>>,
    pub access_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub last_accessed_at: Option<DateTime<Utc>>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<models::MemoryEntry> for MemoryEntryResponse {
    fn from(entry: models::MemoryEntry) -> Self {
        Self {
            id: entry.id,
            memory_type: entry.memory_type,
            key: entry.key,
            value: entry.value,
            importance: entry.importance,
            tags: entry.tags,
            expires_at: entry.expires_at,
            access_count: entry.access_count,
            last_accessed_at: entry.last_accessed_at,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryTypeStatResponse {
    pub memory_type: String,
    pub count: u64,
    pub avg_importance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntryStatsResponse {
    pub total: u64,
    pub by_type: Vec<MemoryTypeStatResponse>,
    pub top_tags: Vec<GroupCount>,
    pub expired_pending_cleanup: u64,
}

impl From<models::MemoryEntryStats> for MemoryEntryStatsResponse {
    fn from(stats: models::MemoryEntryStats) -> Self {
        Self {
            total: stats.total,
            by_type: stats
                .by_type
                .into_iter()
                .map(|s| MemoryTypeStatResponse {
                    memory_type: s.memory_type,
                    count: s.count,
                    avg_importance: s.avg_importance,
                })
                .collect(),
            top_tags: stats.top_tags,
            expired_pending_cleanup: stats.expired_pending_cleanup,
        }
    }
}
