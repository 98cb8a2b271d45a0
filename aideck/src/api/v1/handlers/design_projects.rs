//! v1 Design project handlers.

use axum::extract::{Path, State};

use super::{new_id, not_found};
use crate::api::extractors::{AppQuery, ValidatedJson};
use crate::api::v1::dto::common::{date_range, non_blank};
use crate::api::v1::dto::{
    AddAssetRequest, CreateDesignProjectRequest, DeletedResponse, DesignProjectResponse,
    DesignProjectStatsResponse, ListDesignProjectsQuery, TransitionStatusRequest,
    UpdateDesignProjectRequest,
};
use crate::api::v1::middleware::AuthUser;
use crate::api::v1::response::ApiResponse;
use crate::api::AppState;
use crate::error::{AideckError, Result};
use crate::models::{
    utc_now, DesignProject, DesignStatus, ListDesignProjectsFilter, PageRequest,
};
use crate::services::Quota;

const DEFAULT_FAILURE_MESSAGE: &str = "Generation failed";

async fn load(state: &AppState, user_id: &str, id: &str) -> Result<DesignProject> {
    state
        .db
        .get_design_project(user_id, id)
        .await?
        .ok_or_else(|| not_found("Design project", id))
}

/// `POST /api/v1/design-projects`
///
/// Consumes one design credit. New projects start in `generating`.
#[utoipa::path(
    post,
    path = "/api/v1/design-projects",
    tag = "design-projects",
    operation_id = "designProjects.create",
    request_body = CreateDesignProjectRequest,
    responses(
        (status = 201, description = "Design project created", body = DesignProjectResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "No design credits left in the window"),
    )
)]
pub async fn create_design_project(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateDesignProjectRequest>,
) -> Result<ApiResponse<DesignProjectResponse>> {
    state
        .usage
        .ensure_within(&user.user_id, user.plan, Quota::DesignCredits, 1)
        .await?;

    let mut project = DesignProject::new(
        new_id(),
        user.user_id.clone(),
        req.name.trim().to_string(),
        req.prompt,
    );
    project.design_type = req.design_type.unwrap_or_default();
    project.color_palette = req.color_palette;
    project.metadata = req.metadata.unwrap_or_default();

    state.db.create_design_project(&project).await?;
    tracing::debug!(
        design_project_id = %project.id,
        design_type = %project.design_type,
        "Design project created"
    );

    Ok(ApiResponse::created(project.into()))
}

/// `GET /api/v1/design-projects/{id}`
#[utoipa::path(
    get,
    path = "/api/v1/design-projects/{id}",
    tag = "design-projects",
    operation_id = "designProjects.get",
    params(("id" = String, Path, description = "Design project ID")),
    responses(
        (status = 200, description = "Design project found", body = DesignProjectResponse),
        (status = 404, description = "Design project not found"),
    )
)]
pub async fn get_design_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<DesignProjectResponse>> {
    let project = load(&state, &user.user_id, &id).await?;
    Ok(ApiResponse::success(project.into()))
}

/// `PATCH /api/v1/design-projects/{id}`
#[utoipa::path(
    patch,
    path = "/api/v1/design-projects/{id}",
    tag = "design-projects",
    operation_id = "designProjects.update",
    params(("id" = String, Path, description = "Design project ID")),
    request_body = UpdateDesignProjectRequest,
    responses(
        (status = 200, description = "Design project updated", body = DesignProjectResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Design project not found"),
    )
)]
pub async fn update_design_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateDesignProjectRequest>,
) -> Result<ApiResponse<DesignProjectResponse>> {
    let mut project = load(&state, &user.user_id, &id).await?;

    if let Some(name) = req.name {
        project.name = name.trim().to_string();
    }
    if let Some(design_type) = req.design_type {
        project.design_type = design_type;
    }
    if let Some(palette) = req.color_palette {
        project.color_palette = palette;
    }
    project.updated_at = utc_now();

    let patch = req.metadata.unwrap_or_default();
    if !state.db.update_design_project(&project, &patch).await? {
        return Err(not_found("Design project", &id));
    }

    let project = load(&state, &user.user_id, &id).await?;
    Ok(ApiResponse::success(project.into()))
}

/// `DELETE /api/v1/design-projects/{id}`
#[utoipa::path(
    delete,
    path = "/api/v1/design-projects/{id}",
    tag = "design-projects",
    operation_id = "designProjects.delete",
    params(("id" = String, Path, description = "Design project ID")),
    responses(
        (status = 200, description = "Design project deleted", body = DeletedResponse),
        (status = 404, description = "Design project not found"),
    )
)]
pub async fn delete_design_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<DeletedResponse>> {
    if !state.db.delete_design_project(&user.user_id, &id).await? {
        return Err(not_found("Design project", &id));
    }
    Ok(ApiResponse::success(DeletedResponse { id }).with_message("Design project deleted"))
}

/// `POST /api/v1/design-projects/{id}/status`
///
/// Allowed moves: `generating → completed | failed` and
/// `completed | failed → generating`. Anything else is a 409.
#[utoipa::path(
    post,
    path = "/api/v1/design-projects/{id}/status",
    tag = "design-projects",
    operation_id = "designProjects.transitionStatus",
    params(("id" = String, Path, description = "Design project ID")),
    request_body = TransitionStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = DesignProjectResponse),
        (status = 404, description = "Design project not found"),
        (status = 409, description = "Transition not allowed from the current status"),
    )
)]
pub async fn transition_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<TransitionStatusRequest>,
) -> Result<ApiResponse<DesignProjectResponse>> {
    let project = load(&state, &user.user_id, &id).await?;
    let from = project.status;
    let to = req.status;

    if !from.can_transition_to(to) {
        return Err(AideckError::Conflict(format!(
            "Cannot move design project from {from} to {to}"
        )));
    }

    let error_message = (to == DesignStatus::Failed).then(|| {
        req.error_message
            .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string())
    });

    let moved = state
        .db
        .transition_design_status(
            &user.user_id,
            &id,
            from,
            to,
            error_message.as_deref(),
            utc_now(),
        )
        .await?;
    if !moved {
        return Err(AideckError::Conflict(
            "Design project status changed concurrently, reload and retry".to_string(),
        ));
    }
    tracing::info!(design_project_id = %id, %from, %to, "Design project status changed");

    let project = load(&state, &user.user_id, &id).await?;
    Ok(ApiResponse::success(project.into()))
}

/// `POST /api/v1/design-projects/{id}/assets`
#[utoipa::path(
    post,
    path = "/api/v1/design-projects/{id}/assets",
    tag = "design-projects",
    operation_id = "designProjects.addAsset",
    params(("id" = String, Path, description = "Design project ID")),
    request_body = AddAssetRequest,
    responses(
        (status = 201, description = "Asset added", body = DesignProjectResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Design project not found"),
    )
)]
pub async fn add_asset(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<AddAssetRequest>,
) -> Result<ApiResponse<DesignProjectResponse>> {
    let asset = req.into_asset();
    if !state
        .db
        .add_design_asset(&user.user_id, &id, &asset)
        .await?
    {
        return Err(not_found("Design project", &id));
    }

    let project = load(&state, &user.user_id, &id).await?;
    Ok(ApiResponse::created(project.into()))
}

/// `GET /api/v1/design-projects`
#[utoipa::path(
    get,
    path = "/api/v1/design-projects",
    tag = "design-projects",
    operation_id = "designProjects.list",
    params(ListDesignProjectsQuery),
    responses(
        (status = 200, description = "Design projects listed", body = Vec<DesignProjectResponse>),
    )
)]
pub async fn list_design_projects(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<ListDesignProjectsQuery>,
) -> Result<ApiResponse<Vec<DesignProjectResponse>>> {
    let filter = ListDesignProjectsFilter {
        status: query.status,
        design_type: query.design_type,
        search: non_blank(query.search),
        created: date_range(query.created_from, query.created_to),
    };
    let page = PageRequest::new(query.page, query.limit);

    let result = state
        .db
        .list_design_projects(&user.user_id, &filter, page)
        .await?;

    Ok(ApiResponse::paginated(result.map(Into::into)))
}

/// `GET /api/v1/design-projects:stats`
#[utoipa::path(
    get,
    path = "/api/v1/design-projects:stats",
    tag = "design-projects",
    operation_id = "designProjects.stats",
    responses(
        (status = 200, description = "Design project statistics", body = DesignProjectStatsResponse),
    )
)]
pub async fn design_project_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<DesignProjectStatsResponse>> {
    let stats = state
        .db
        .design_project_stats(&user.user_id, utc_now())
        .await?;
    Ok(ApiResponse::success(stats.into()))
}
