//! v1 Conversation handlers.

use axum::extract::{Path, State};

use super::{new_id, not_found};
use crate::api::extractors::{AppQuery, ValidatedJson};
use crate::api::v1::dto::common::{date_range, non_blank};
use crate::api::v1::dto::{
    AppendMessageRequest, ConversationResponse, ConversationStatsResponse,
    ConversationSummaryResponse, CreateConversationRequest, DeletedResponse,
    ListConversationsQuery, UpdateConversationRequest,
};
use crate::api::v1::middleware::AuthUser;
use crate::api::v1::response::ApiResponse;
use crate::api::AppState;
use crate::error::Result;
use crate::models::{utc_now, Conversation, ListConversationsFilter, PageRequest};
use crate::services::Quota;

/// `POST /api/v1/conversations`
#[utoipa::path(
    post,
    path = "/api/v1/conversations",
    tag = "conversations",
    operation_id = "conversations.create",
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = ConversationResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Plan limit reached"),
    )
)]
pub async fn create_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateConversationRequest>,
) -> Result<ApiResponse<ConversationResponse>> {
    state
        .usage
        .ensure_within(&user.user_id, user.plan, Quota::Conversations, 1)
        .await?;

    let mut conv = Conversation::new(new_id(), user.user_id.clone());
    if let Some(title) = req.title {
        conv.set_title(title.trim().to_string());
    }
    conv.model = req.model;
    if let Some(first) = req.first_message {
        conv.push_message(first.into_message());
    }

    state.db.create_conversation(&conv).await?;
    tracing::debug!(conversation_id = %conv.id, user_id = %user.user_id, "Conversation created");

    Ok(ApiResponse::created(conv.into()))
}

/// `GET /api/v1/conversations/{id}`
///
/// Returns deactivated conversations too, so history stays readable.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}",
    tag = "conversations",
    operation_id = "conversations.get",
    params(("id" = String, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation found", body = ConversationResponse),
        (status = 404, description = "Conversation not found"),
    )
)]
pub async fn get_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<ConversationResponse>> {
    let conv = state
        .db
        .get_conversation(&user.user_id, &id)
        .await?
        .ok_or_else(|| not_found("Conversation", &id))?;

    Ok(ApiResponse::success(conv.into()))
}

/// `PATCH /api/v1/conversations/{id}`
#[utoipa::path(
    patch,
    path = "/api/v1/conversations/{id}",
    tag = "conversations",
    operation_id = "conversations.update",
    params(("id" = String, Path, description = "Conversation ID")),
    request_body = UpdateConversationRequest,
    responses(
        (status = 200, description = "Conversation updated", body = ConversationResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Conversation not found"),
    )
)]
pub async fn update_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateConversationRequest>,
) -> Result<ApiResponse<ConversationResponse>> {
    let mut conv = state
        .db
        .get_conversation(&user.user_id, &id)
        .await?
        .ok_or_else(|| not_found("Conversation", &id))?;

    if let Some(title) = req.title {
        conv.set_title(title.trim().to_string());
    }
    if let Some(model) = req.model {
        conv.model = Some(model);
    }
    conv.updated_at = utc_now();

    if !state.db.update_conversation(&conv).await? {
        return Err(not_found("Conversation", &id));
    }

    Ok(ApiResponse::success(conv.into()))
}

/// `DELETE /api/v1/conversations/{id}`
///
/// Soft delete: the conversation is deactivated and stops accepting messages.
#[utoipa::path(
    delete,
    path = "/api/v1/conversations/{id}",
    tag = "conversations",
    operation_id = "conversations.deactivate",
    params(("id" = String, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation deactivated", body = DeletedResponse),
        (status = 404, description = "Conversation not found or already inactive"),
    )
)]
pub async fn deactivate_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<DeletedResponse>> {
    if !state.db.deactivate_conversation(&user.user_id, &id).await? {
        return Err(not_found("Conversation", &id));
    }

    Ok(ApiResponse::success(DeletedResponse { id }).with_message("Conversation deactivated"))
}

/// `POST /api/v1/conversations/{id}/messages`
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/messages",
    tag = "conversations",
    operation_id = "conversations.appendMessage",
    params(("id" = String, Path, description = "Conversation ID")),
    request_body = AppendMessageRequest,
    responses(
        (status = 201, description = "Message appended", body = ConversationResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Conversation not found or inactive"),
    )
)]
pub async fn append_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<AppendMessageRequest>,
) -> Result<ApiResponse<ConversationResponse>> {
    let message = req.into_message();
    if !state.db.append_message(&user.user_id, &id, &message).await? {
        return Err(not_found("Conversation", &id));
    }

    let conv = state
        .db
        .get_conversation(&user.user_id, &id)
        .await?
        .ok_or_else(|| not_found("Conversation", &id))?;

    Ok(ApiResponse::created(conv.into()))
}

/// `GET /api/v1/conversations`
///
/// Active conversations by default, most recent activity first.
#[utoipa::path(
    get,
    path = "/api/v1/conversations",
    tag = "conversations",
    operation_id = "conversations.list",
    params(ListConversationsQuery),
    responses(
        (status = 200, description = "Conversations listed", body = Vec<ConversationSummaryResponse>),
    )
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<ListConversationsQuery>,
) -> Result<ApiResponse<Vec<ConversationSummaryResponse>>> {
    let is_active = if query.include_inactive.unwrap_or(false) {
        None
    } else {
        Some(query.is_active.unwrap_or(true))
    };
    let filter = ListConversationsFilter {
        is_active,
        search: non_blank(query.search),
        model: non_blank(query.model),
        created: date_range(query.created_from, query.created_to),
    };
    let page = PageRequest::new(query.page, query.limit);

    let result = state
        .db
        .list_conversations(&user.user_id, &filter, page)
        .await?;

    Ok(ApiResponse::paginated(result.map(Into::into)))
}

/// `GET /api/v1/conversations:stats`
#[utoipa::path(
    get,
    path = "/api/v1/conversations:stats",
    tag = "conversations",
    operation_id = "conversations.stats",
    responses(
        (status = 200, description = "Conversation statistics", body = ConversationStatsResponse),
    )
)]
pub async fn conversation_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<ConversationStatsResponse>> {
    let stats = state.db.conversation_stats(&user.user_id).await?;
    Ok(ApiResponse::success(stats.into()))
}
