//! v1 Admin handlers.

use axum::extract::State;

use crate::api::v1::dto::MaintenanceRunResponse;
use crate::api::v1::middleware::AuthUser;
use crate::api::v1::response::ApiResponse;
use crate::api::AppState;
use crate::error::Result;

/// `POST /api/v1/admin/maintenance:run`
///
/// Runs the expired-memory and stuck-design sweeps immediately. Both sweeps
/// span every user, not just the caller.
#[utoipa::path(
    post,
    path = "/api/v1/admin/maintenance:run",
    tag = "admin",
    operation_id = "admin.runMaintenance",
    responses(
        (status = 200, description = "Maintenance pass completed", body = MaintenanceRunResponse),
    )
)]
pub async fn run_maintenance(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<MaintenanceRunResponse>> {
    tracing::info!(requested_by = %user.user_id, "Manual maintenance pass requested");
    let report = state.maintenance.run_once().await?;
    Ok(ApiResponse::success(report.into()))
}

#[cfg(test)]
mod tests {
    use crate::api::v1::dto::MaintenanceRunResponse;
    use crate::services::MaintenanceReport;

    #[test]
    fn maintenance_run_response_serializes_camel_case() {
        let resp = MaintenanceRunResponse::from(MaintenanceReport {
            expired_memory_entries_deleted: 3,
            stuck_design_projects_failed: 1,
        });
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["expiredMemoryEntriesDeleted"], 3);
        assert_eq!(json["stuckDesignProjectsFailed"], 1);
    }
}
