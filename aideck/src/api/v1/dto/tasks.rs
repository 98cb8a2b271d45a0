//! Task request/response DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::{normalize_tags, validate_not_blank, validate_tags};
use crate::models::{self, GroupCount, TaskPriority, TaskStatus};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/tasks`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(
        length(min = 1, max = 200, message = "must be 1 to 200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    #[validate(length(max = 5000, message = "must be at most 5000 characters"))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[schema(value_type = Option<String>)]
    pub due_date: Option<DateTime<Utc>>,
    #[validate(email(message = "must be a valid email address"))]
    pub assignee_email: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
}

impl CreateTaskRequest {
    pub fn into_task(self, id: String, user_id: String) -> models::Task {
        let mut task = models::Task::new(id, user_id, self.title.trim().to_string());
        task.description = self.description;
        task.priority = self.priority.unwrap_or_default();
        task.due_date = self.due_date;
        task.assignee_email = self.assignee_email;
        task.tags = normalize_tags(self.tags);
        let created_at = task.created_at;
        task.set_status(self.status.unwrap_or_default(), created_at);
        task
    }
}

/// Request body for `PATCH /v1/tasks/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(
        length(min = 1, max = 200, message = "must be 1 to 200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,
    #[validate(length(max = 5000, message = "must be at most 5000 characters"))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[schema(value_type = Option<String>)]
    pub due_date: Option<DateTime<Utc>>,
    /// Remove the due date. Ignored when `dueDate` is also given.
    #[serde(default)]
    pub clear_due_date: bool,
    #[validate(email(message = "must be a valid email address"))]
    pub assignee_email: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
}

/// Query parameters for `GET /v1/tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListTasksQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[param(value_type = Option<String>)]
    pub status: Option<TaskStatus>,
    #[param(value_type = Option<String>)]
    pub priority: Option<TaskPriority>,
    pub tag: Option<String>,
    /// Case-insensitive substring of the title or description.
    pub search: Option<String>,
    #[param(value_type = Option<String>)]
    pub due_from: Option<DateTime<Utc>>,
    #[param(value_type = Option<String>)]
    pub due_to: Option<DateTime<Utc>>,
    /// Only open tasks past their due date (`true`) or everything else (`false`).
    pub overdue: Option<bool>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_email: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub completed_at: Option<DateTime<Utc>>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<models::Task> for TaskResponse {
    fn from(task: models::Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            assignee_email: task.assignee_email,
            tags: task.tags,
            completed_at: task.completed_at,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatsResponse {
    pub total: u64,
    pub by_status: Vec<GroupCount>,
    pub by_priority: Vec<GroupCount>,
    pub overdue: u64,
}

impl From<models::TaskStats> for TaskStatsResponse {
    fn from(stats: models::TaskStats) -> Self {
        Self {
            total: stats.total,
            by_status: stats.by_status,
            by_priority: stats.by_priority,
            overdue: stats.overdue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_email_fails_validation() {
        let req: CreateTaskRequest = serde_json::from_value(serde_json::json!({
            "title": "Ship it", "assigneeEmail": "not-an-email"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn created_done_task_is_stamped() {
        let req: CreateTaskRequest = serde_json::from_value(serde_json::json!({
            "title": "  Already finished ", "status": "done", "priority": "urgent"
        }))
        .unwrap();
        let task = req.into_task("t1".into(), "u1".into());
        assert_eq!(task.title, "Already finished");
        assert_eq!(task.priority, TaskPriority::Urgent);
        assert_eq!(task.completed_at, Some(task.created_at));
    }

    #[test]
    fn unknown_priority_is_rejected_by_serde() {
        let parsed: Result<CreateTaskRequest, _> =
            serde_json::from_value(serde_json::json!({ "title": "x", "priority": "asap" }));
        assert!(parsed.is_err());
    }
}
