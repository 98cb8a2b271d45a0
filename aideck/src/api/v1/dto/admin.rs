//! Admin DTOs for the v1 API.

use serde::{Deserialize, Serialize};

use crate::services::MaintenanceReport;

/// Response for `POST /v1/admin/maintenance:run`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRunResponse {
    /// Memory entries deleted because their expiry had passed.
    pub expired_memory_entries_deleted: u64,
    /// Design projects failed after sitting in `generating` too long.
    pub stuck_design_projects_failed: u64,
}

impl From<MaintenanceReport> for MaintenanceRunResponse {
    fn from(report: MaintenanceReport) -> Self {
        Self {
            expired_memory_entries_deleted: report.expired_memory_entries_deleted,
            stuck_design_projects_failed: report.stuck_design_projects_failed,
        }
    }
}
