use serde::{Deserialize, Serialize};

/// Subscription tier that decides a user's usage ceilings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
            Self::Enterprise => write!(f, "enterprise"),
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(format!("Unknown plan: {s}")),
        }
    }
}

/// Current consumption of every plan-limited resource for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounts {
    /// Active conversations only; deactivated ones free their slot.
    pub conversations: u64,
    pub memory_entries: u64,
    /// Design projects created in the rolling credit window.
    pub design_projects_recent: u64,
    pub tasks: u64,
    pub storage_bytes: u64,
}

/// Is `current + additional` within `limit`? A limit of zero is unlimited.
pub fn within_limit(limit: u64, current: u64, additional: u64) -> bool {
    limit == 0 || current.saturating_add(additional) <= limit
}
