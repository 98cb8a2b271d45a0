//! Usage DTOs for the v1 API.

use serde::{Deserialize, Serialize};

use crate::config::PlanLimits;
use crate::models::{Plan, UsageCounts};
use crate::services::UsageSnapshot;

/// Plan ceilings. Zero means unlimited.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimitsResponse {
    pub max_conversations: u64,
    pub max_memory_entries: u64,
    /// Design projects that may be created per rolling 30 days.
    pub design_credits: u64,
    pub max_tasks: u64,
    pub storage_bytes: u64,
}

impl From<PlanLimits> for PlanLimitsResponse {
    fn from(limits: PlanLimits) -> Self {
        Self {
            max_conversations: limits.max_conversations,
            max_memory_entries: limits.max_memory_entries,
            design_credits: limits.design_credits,
            max_tasks: limits.max_tasks,
            storage_bytes: limits.storage_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageCountsResponse {
    pub conversations: u64,
    pub memory_entries: u64,
    pub design_projects_recent: u64,
    pub tasks: u64,
    pub storage_bytes: u64,
}

impl From<UsageCounts> for UsageCountsResponse {
    fn from(usage: UsageCounts) -> Self {
        Self {
            conversations: usage.conversations,
            memory_entries: usage.memory_entries,
            design_projects_recent: usage.design_projects_recent,
            tasks: usage.tasks,
            storage_bytes: usage.storage_bytes,
        }
    }
}

/// Response for `GET /v1/usage`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub plan: Plan,
    pub limits: PlanLimitsResponse,
    pub usage: UsageCountsResponse,
}

impl From<UsageSnapshot> for UsageResponse {
    fn from(snapshot: UsageSnapshot) -> Self {
        Self {
            plan: snapshot.plan,
            limits: snapshot.limits.into(),
            usage: snapshot.usage.into(),
        }
    }
}
