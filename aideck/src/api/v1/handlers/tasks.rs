//! v1 Task handlers.

use axum::extract::{Path, State};

use super::{new_id, not_found};
use crate::api::extractors::{AppQuery, ValidatedJson};
use crate::api::v1::dto::common::{date_range, non_blank, normalize_tags};
use crate::api::v1::dto::{
    CreateTaskRequest, DeletedResponse, ListTasksQuery, TaskResponse, TaskStatsResponse,
    UpdateTaskRequest,
};
use crate::api::v1::middleware::AuthUser;
use crate::api::v1::response::ApiResponse;
use crate::api::AppState;
use crate::error::Result;
use crate::models::{utc_now, ListTasksFilter, PageRequest};
use crate::services::Quota;

/// `POST /api/v1/tasks`
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    tag = "tasks",
    operation_id = "tasks.create",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Plan limit reached"),
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> Result<ApiResponse<TaskResponse>> {
    state
        .usage
        .ensure_within(&user.user_id, user.plan, Quota::Tasks, 1)
        .await?;

    let task = req.into_task(new_id(), user.user_id.clone());
    state.db.create_task(&task).await?;
    tracing::debug!(task_id = %task.id, status = %task.status, "Task created");

    Ok(ApiResponse::created(task.into()))
}

/// `GET /api/v1/tasks/{id}`
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    tag = "tasks",
    operation_id = "tasks.get",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = TaskResponse),
        (status = 404, description = "Task not found"),
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<TaskResponse>> {
    let task = state
        .db
        .get_task(&user.user_id, &id)
        .await?
        .ok_or_else(|| not_found("Task", &id))?;

    Ok(ApiResponse::success(task.into()))
}

/// `PATCH /api/v1/tasks/{id}`
///
/// Moving to `done` stamps `completedAt`; moving anywhere else clears it.
#[utoipa::path(
    patch,
    path = "/api/v1/tasks/{id}",
    tag = "tasks",
    operation_id = "tasks.update",
    params(("id" = String, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Task not found"),
    )
)]
pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> Result<ApiResponse<TaskResponse>> {
    let mut task = state
        .db
        .get_task(&user.user_id, &id)
        .await?
        .ok_or_else(|| not_found("Task", &id))?;
    let now = utc_now();

    if let Some(title) = req.title {
        task.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        task.description = non_blank(Some(description));
    }
    if let Some(status) = req.status {
        task.set_status(status, now);
    }
    if let Some(priority) = req.priority {
        task.priority = priority;
    }
    match req.due_date {
        Some(due) => task.due_date = Some(due),
        None if req.clear_due_date => task.due_date = None,
        None => {}
    }
    if let Some(email) = req.assignee_email {
        task.assignee_email = non_blank(Some(email));
    }
    if let Some(tags) = req.tags {
        task.tags = normalize_tags(tags);
    }
    task.updated_at = now;

    if !state.db.update_task(&task).await? {
        return Err(not_found("Task", &id));
    }

    Ok(ApiResponse::success(task.into()))
}

/// `DELETE /api/v1/tasks/{id}`
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    tag = "tasks",
    operation_id = "tasks.delete",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted", body = DeletedResponse),
        (status = 404, description = "Task not found"),
    )
)]
pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<DeletedResponse>> {
    if !state.db.delete_task(&user.user_id, &id).await? {
        return Err(not_found("Task", &id));
    }
    Ok(ApiResponse::success(DeletedResponse { id }).with_message("Task deleted"))
}

/// `GET /api/v1/tasks`
///
/// Highest priority first, then earliest due date with undated tasks last.
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    tag = "tasks",
    operation_id = "tasks.list",
    params(ListTasksQuery),
    responses(
        (status = 200, description = "Tasks listed", body = Vec<TaskResponse>),
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<ListTasksQuery>,
) -> Result<ApiResponse<Vec<TaskResponse>>> {
    let filter = ListTasksFilter {
        status: query.status,
        priority: query.priority,
        tag: non_blank(query.tag).map(|t| t.trim().to_string()),
        search: non_blank(query.search),
        due: date_range(query.due_from, query.due_to),
        overdue: query.overdue,
    };
    let page = PageRequest::new(query.page, query.limit);

    let result = state
        .db
        .list_tasks(&user.user_id, &filter, page, utc_now())
        .await?;

    Ok(ApiResponse::paginated(result.map(Into::into)))
}

/// `GET /api/v1/tasks:stats`
#[utoipa::path(
    get,
    path = "/api/v1/tasks:stats",
    tag = "tasks",
    operation_id = "tasks.stats",
    responses(
        (status = 200, description = "Task statistics", body = TaskStatsResponse),
    )
)]
pub async fn task_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<TaskStatsResponse>> {
    let stats = state.db.task_stats(&user.user_id, utc_now()).await?;
    Ok(ApiResponse::success(stats.into()))
}
