use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GroupCount;

pub const IMPORTANCE_MIN: i32 = 1;
pub const IMPORTANCE_MAX: i32 = 10;
pub const IMPORTANCE_DEFAULT: i32 = 5;

/// Kind of thing the assistant remembers about a user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Preference,
    #[default]
    Fact,
    Context,
    Skill,
    Goal,
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preference => write!(f, "preference"),
            Self::Fact => write!(f, "fact"),
            Self::Context => write!(f, "context"),
            Self::Skill => write!(f, "skill"),
            Self::Goal => write!(f, "goal"),
        }
    }
}

impl std::str::FromStr for MemoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preference" => Ok(Self::Preference),
            "fact" => Ok(Self::Fact),
            "context" => Ok(Self::Context),
            "skill" => Ok(Self::Skill),
            "goal" => Ok(Self::Goal),
            _ => Err(format!("Unknown memory type: {s}")),
        }
    }
}

/// Clamp an importance score into `[1, 10]`.
pub fn clamp_importance(value: i64) -> i32 {
    value.clamp(IMPORTANCE_MIN as i64, IMPORTANCE_MAX as i64) as i32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub user_id: String,
    pub memory_type: MemoryType,
    pub key: String,
    pub value: serde_json::Value,
    pub importance: i32,
    pub tags: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub access_count: i64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemoryEntry {
    pub fn new(
        id: String,
        user_id: String,
        memory_type: MemoryType,
        key: String,
        value: serde_json::Value,
    ) -> Self {
        let now = super::utc_now();
        Self {
            id,
            user_id,
            memory_type,
            key,
            value,
            importance: IMPORTANCE_DEFAULT,
            tags: Vec::new(),
            expires_at: None,
            access_count: 0,
            last_accessed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_importance(mut self, importance: i64) -> Self {
        self.importance = clamp_importance(importance);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListMemoryEntriesFilter {
    pub memory_type: Option<MemoryType>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub min_importance: Option<i32>,
    pub include_expired: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryTypeStat {
    pub memory_type: String,
    pub count: u64,
    pub avg_importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntryStats {
    pub total: u64,
    pub by_type: Vec<MemoryTypeStat>,
    pub top_tags: Vec<GroupCount>,
    pub expired_pending_cleanup: u64,
}
