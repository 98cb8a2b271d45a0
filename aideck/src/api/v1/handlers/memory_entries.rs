//! v1 Memory entry handlers.
//!
//! Reads through `get`/`by-key` count as accesses and bump `accessCount`.
//! Entries past `expiresAt` behave as absent until the sweeper deletes them.

use axum::extract::{Path, State};

use super::{new_id, not_found};
use crate::api::extractors::{AppQuery, ValidatedJson};
use crate::api::v1::dto::common::{non_blank, normalize_tags};
use crate::api::v1::dto::{
    CreateMemoryEntryRequest, DeletedResponse, ListMemoryEntriesQuery, MemoryEntryByKeyQuery,
    MemoryEntryResponse, MemoryEntryStatsResponse, UpdateMemoryEntryRequest,
};
use crate::api::v1::middleware::AuthUser;
use crate::api::v1::response::ApiResponse;
use crate::api::AppState;
use crate::error::{AideckError, Result};
use crate::models::{clamp_importance, utc_now, ListMemoryEntriesFilter, PageRequest};
use crate::services::Quota;

/// `POST /api/v1/memory-entries`
///
/// A live entry with the same key and type is a 409; use the upsert route to
/// overwrite.
#[utoipa::path(
    post,
    path = "/api/v1/memory-entries",
    tag = "memory-entries",
    operation_id = "memoryEntries.create",
    request_body = CreateMemoryEntryRequest,
    responses(
        (status = 201, description = "Memory entry created", body = MemoryEntryResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Plan limit reached"),
        (status = 409, description = "Key already used for this memory type"),
    )
)]
pub async fn create_memory_entry(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateMemoryEntryRequest>,
) -> Result<ApiResponse<MemoryEntryResponse>> {
    state
        .usage
        .ensure_within(&user.user_id, user.plan, Quota::MemoryEntries, 1)
        .await?;

    let entry = req.into_entry(new_id(), user.user_id.clone());
    state.db.create_memory_entry(&entry).await?;
    tracing::debug!(
        memory_entry_id = %entry.id,
        memory_type = %entry.memory_type,
        "Memory entry created"
    );

    Ok(ApiResponse::created(entry.into()))
}

/// `PUT /api/v1/memory-entries:upsert`
///
/// Overwrites the value of an existing (key, type) entry in place, keeping its
/// id and access history. Only a brand new key counts against the plan.
#[utoipa::path(
    put,
    path = "/api/v1/memory-entries:upsert",
    tag = "memory-entries",
    operation_id = "memoryEntries.upsert",
    request_body = CreateMemoryEntryRequest,
    responses(
        (status = 200, description = "Memory entry stored", body = MemoryEntryResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Plan limit reached"),
    )
)]
pub async fn upsert_memory_entry(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateMemoryEntryRequest>,
) -> Result<ApiResponse<MemoryEntryResponse>> {
    let exists = state
        .db
        .memory_entry_exists(&user.user_id, &req.key, req.memory_type, utc_now())
        .await?;
    if !exists {
        state
            .usage
            .ensure_within(&user.user_id, user.plan, Quota::MemoryEntries, 1)
            .await?;
    }

    let entry = req.into_entry(new_id(), user.user_id.clone());
    let stored = state.db.upsert_memory_entry(&entry).await?;

    Ok(ApiResponse::success(stored.into()))
}

/// `GET /api/v1/memory-entries:by-key`
#[utoipa::path(
    get,
    path = "/api/v1/memory-entries:by-key",
    tag = "memory-entries",
    operation_id = "memoryEntries.getByKey",
    params(MemoryEntryByKeyQuery),
    responses(
        (status = 200, description = "Memory entry found", body = MemoryEntryResponse),
        (status = 404, description = "No live entry for this key"),
    )
)]
pub async fn get_memory_entry_by_key(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<MemoryEntryByKeyQuery>,
) -> Result<ApiResponse<MemoryEntryResponse>> {
    let entry = state
        .db
        .get_memory_entry_by_key(&user.user_id, &query.key, query.memory_type, utc_now())
        .await?
        .ok_or_else(|| {
            AideckError::NotFound(format!(
                "Memory entry {} ({}) not found",
                query.key, query.memory_type
            ))
        })?;

    Ok(ApiResponse::success(entry.into()))
}

/// `GET /api/v1/memory-entries/{id}`
#[utoipa::path(
    get,
    path = "/api/v1/memory-entries/{id}",
    tag = "memory-entries",
    operation_id = "memoryEntries.get",
    params(("id" = String, Path, description = "Memory entry ID")),
    responses(
        (status = 200, description = "Memory entry found", body = MemoryEntryResponse),
        (status = 404, description = "Memory entry not found or expired"),
    )
)]
pub async fn get_memory_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<MemoryEntryResponse>> {
    let entry = state
        .db
        .get_memory_entry(&user.user_id, &id, utc_now())
        .await?
        .ok_or_else(|| not_found("Memory entry", &id))?;

    Ok(ApiResponse::success(entry.into()))
}

/// `PATCH /api/v1/memory-entries/{id}`
#[utoipa::path(
    patch,
    path = "/api/v1/memory-entries/{id}",
    tag = "memory-entries",
    operation_id = "memoryEntries.update",
    params(("id" = String, Path, description = "Memory entry ID")),
    request_body = UpdateMemoryEntryRequest,
    responses(
        (status = 200, description = "Memory entry updated", body = MemoryEntryResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Memory entry not found or expired"),
    )
)]
pub async fn update_memory_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateMemoryEntryRequest>,
) -> Result<ApiResponse<MemoryEntryResponse>> {
    let now = utc_now();
    let mut entry = state
        .db
        .find_memory_entry(&user.user_id, &id, now)
        .await?
        .ok_or_else(|| not_found("Memory entry", &id))?;

    if let Some(value) = req.value {
        entry.value = value;
    }
    if let Some(importance) = req.importance {
        entry.importance = clamp_importance(importance);
    }
    if let Some(tags) = req.tags {
        entry.tags = normalize_tags(tags);
    }
    match req.expires_at {
        Some(at) => entry.expires_at = Some(at),
        None if req.clear_expiry => entry.expires_at = None,
        None => {}
    }
    entry.updated_at = now;

    if !state.db.update_memory_entry(&entry).await? {
        return Err(not_found("Memory entry", &id));
    }

    Ok(ApiResponse::success(entry.into()))
}

/// `DELETE /api/v1/memory-entries/{id}`
#[utoipa::path(
    delete,
    path = "/api/v1/memory-entries/{id}",
    tag = "memory-entries",
    operation_id = "memoryEntries.delete",
    params(("id" = String, Path, description = "Memory entry ID")),
    responses(
        (status = 200, description = "Memory entry deleted", body = DeletedResponse),
        (status = 404, description = "Memory entry not found"),
    )
)]
pub async fn delete_memory_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<DeletedResponse>> {
    if !state.db.delete_memory_entry(&user.user_id, &id).await? {
        return Err(not_found("Memory entry", &id));
    }
    Ok(ApiResponse::success(DeletedResponse { id }).with_message("Memory entry deleted"))
}

/// `GET /api/v1/memory-entries`
///
/// Most important first, then most recently updated.
#[utoipa::path(
    get,
    path = "/api/v1/memory-entries",
    tag = "memory-entries",
    operation_id = "memoryEntries.list",
    params(ListMemoryEntriesQuery),
    responses(
        (status = 200, description = "Memory entries listed", body = Vec<MemoryEntryResponse>),
    )
)]
pub async fn list_memory_entries(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<ListMemoryEntriesQuery>,
) -> Result<ApiResponse<Vec<MemoryEntryResponse>>> {
    let filter = ListMemoryEntriesFilter {
        memory_type: query.memory_type,
        tag: non_blank(query.tag).map(|t| t.trim().to_string()),
        search: non_blank(query.search),
        min_importance: query.min_importance,
        include_expired: query.include_expired.unwrap_or(false),
    };
    let page = PageRequest::new(query.page, query.limit);

    let result = state
        .db
        .list_memory_entries(&user.user_id, &filter, page, utc_now())
        .await?;

    Ok(ApiResponse::paginated(result.map(Into::into)))
}

/// `GET /api/v1/memory-entries:stats`
#[utoipa::path(
    get,
    path = "/api/v1/memory-entries:stats",
    tag = "memory-entries",
    operation_id = "memoryEntries.stats",
    responses(
        (status = 200, description = "Memory entry statistics", body = MemoryEntryStatsResponse),
    )
)]
pub async fn memory_entry_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<MemoryEntryStatsResponse>> {
    let stats = state
        .db
        .memory_entry_stats(&user.user_id, utc_now())
        .await?;
    Ok(ApiResponse::success(stats.into()))
}
