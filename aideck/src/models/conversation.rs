use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use super::DateRange;

pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";

/// Titles derived from a first message keep at most this many characters
/// before the ellipsis.
pub const AUTO_TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            _ => Err(format!("Unknown message role: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub token_count: i64,
    pub model: Option<String>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: super::utc_now(),
            token_count: 0,
            model: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// True until the first user message has had the chance to name the
    /// conversation. Explicit titles clear it.
    pub auto_title_pending: bool,
    pub messages: Vec<ChatMessage>,
    pub message_count: i64,
    pub total_tokens: i64,
    pub model: Option<String>,
    pub is_active: bool,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: String, user_id: String) -> Self {
        let now = super::utc_now();
        Self {
            id,
            user_id,
            title: DEFAULT_CONVERSATION_TITLE.to_string(),
            auto_title_pending: true,
            messages: Vec::new(),
            message_count: 0,
            total_tokens: 0,
            model: None,
            is_active: true,
            last_message_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the title with an explicit one; auto-titling no longer applies.
    pub fn set_title(&mut self, title: String) {
        self.title = title;
        self.auto_title_pending = false;
    }

    /// Append a message, keeping the denormalized counters in step and
    /// deriving the title from the first user message.
    pub fn push_message(&mut self, message: ChatMessage) {
        if self.auto_title_pending && message.role == MessageRole::User {
            self.title = derive_title(&message.content);
            self.auto_title_pending = false;
        }
        self.message_count += 1;
        self.total_tokens += message.token_count;
        self.last_message_at = Some(message.timestamp);
        self.updated_at = message.timestamp;
        self.messages.push(message);
    }
}

/// Build a conversation title from the first user message.
///
/// Content of at most 50 characters (grapheme clusters, after trimming) is
/// used verbatim; longer content is cut to 50 characters and suffixed `...`.
pub fn derive_title(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.graphemes(true).count() <= AUTO_TITLE_MAX_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.graphemes(true).take(AUTO_TITLE_MAX_CHARS).collect();
    format!("{head}...")
}

#[derive(Debug, Clone, Default)]
pub struct ListConversationsFilter {
    /// `None` lists both active and inactive conversations.
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub model: Option<String>,
    pub created: DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub total_messages: u64,
    pub total_tokens: u64,
    pub avg_messages_per_active: f64,
    pub by_model: Vec<super::GroupCount>,
}
