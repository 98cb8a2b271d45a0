//! v1 Usage handler.

use axum::extract::State;

use crate::api::v1::dto::UsageResponse;
use crate::api::v1::middleware::AuthUser;
use crate::api::v1::response::ApiResponse;
use crate::api::AppState;
use crate::error::Result;

/// `GET /api/v1/usage`
///
/// The caller's plan, its ceilings, and how much of each is used.
#[utoipa::path(
    get,
    path = "/api/v1/usage",
    tag = "usage",
    operation_id = "usage.get",
    responses(
        (status = 200, description = "Plan limits and current usage", body = UsageResponse),
    )
)]
pub async fn get_usage(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<UsageResponse>> {
    let snapshot = state.usage.snapshot(&user.user_id, user.plan).await?;
    Ok(ApiResponse::success(snapshot.into()))
}
