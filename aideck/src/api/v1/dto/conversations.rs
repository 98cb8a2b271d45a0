//! Conversation request/response DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::validate_not_blank;
use crate::models::{self, GroupCount, MessageRole};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// A message to append. Also used for the optional first message on create.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppendMessageRequest {
    pub role: MessageRole,
    #[validate(
        length(min = 1, max = 32000, message = "must be 1 to 32000 characters"),
        custom(function = "validate_not_blank")
    )]
    pub content: String,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub token_count: Option<i64>,
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
}

impl AppendMessageRequest {
    pub fn into_message(self) -> models::ChatMessage {
        let mut message = models::ChatMessage::new(self.role, self.content);
        message.token_count = self.token_count.unwrap_or(0);
        message.model = self.model;
        message
    }
}

/// Request body for `POST /v1/conversations`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    /// Explicit title. When omitted the first user message names the conversation.
    #[validate(
        length(min = 1, max = 200, message = "must be 1 to 200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
    #[validate(nested)]
    pub first_message: Option<AppendMessageRequest>,
}

/// Request body for `PATCH /v1/conversations/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConversationRequest {
    #[validate(
        length(min = 1, max = 200, message = "must be 1 to 200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
}

/// Query parameters for `GET /v1/conversations`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListConversationsQuery {
    /// 1-based page number (default 1).
    pub page: Option<u32>,
    /// Page size, clamped to 1..=100 (default 20).
    pub limit: Option<u32>,
    /// Active flag to match (default `true`).
    pub is_active: Option<bool>,
    /// List active and inactive conversations together.
    pub include_inactive: Option<bool>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    pub model: Option<String>,
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
pub struct ChatMessageResponse {
    /// Message id (UUID v4).
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[schema(value_type = String)]
    pub timestamp: DateTime<Utc>,
    pub token_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl From<models::ChatMessage> for ChatMessageResponse {
    fn from(msg: models::ChatMessage) -> Self {
        Self {
            id: msg.id,
            role: msg.role,
            content: msg.content,
            timestamp: msg.timestamp,
            token_count: msg.token_count,
            model: msg.model,
        }
    }
}

/// Full conversation including its message history.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessageResponse>,
    pub message_count: i64,
    pub total_tokens: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<models::Conversation> for ConversationResponse {
    fn from(conv: models::Conversation) -> Self {
        Self {
            id: conv.id,
            title: conv.title,
            messages: conv.messages.into_iter().map(Into::into).collect(),
            message_count: conv.message_count,
            total_tokens: conv.total_tokens,
            model: conv.model,
            is_active: conv.is_active,
            last_message_at: conv.last_message_at,
            created_at: conv.created_at,
            updated_at: conv.updated_at,
        }
    }
}

/// Conversation without its messages, as returned by listings.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummaryResponse {
    pub id: String,
    pub title: String,
    pub message_count: i64,
    pub total_tokens: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<models::Conversation> for ConversationSummaryResponse {
    fn from(conv: models::Conversation) -> Self {
        Self {
            id: conv.id,
            title: conv.title,
            message_count: conv.message_count,
            total_tokens: conv.total_tokens,
            model: conv.model,
            is_active: conv.is_active,
            last_message_at: conv.last_message_at,
            created_at: conv.created_at,
            updated_at: conv.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStatsResponse {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub total_messages: u64,
    pub total_tokens: u64,
    pub avg_messages_per_active: f64,
    pub by_model: Vec<GroupCount>,
}

impl From<models::ConversationStats> for ConversationStatsResponse {
    fn from(stats: models::ConversationStats) -> Self {
        Self {
            total: stats.total,
            active: stats.active,
            inactive: stats.inactive,
            total_messages: stats.total_messages,
            total_tokens: stats.total_tokens,
            avg_messages_per_active: stats.avg_messages_per_active,
            by_model: stats.by_model,
        }
    }
}
