use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;
use crate::error::FieldError;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Aideck API",
        version = "1.0.0",
        description = "Multi-tenant AI assistant backend: conversations, design projects, memory entries, files, tasks and plan usage.",
    ),
    paths(
        handlers::health::health_check,
        handlers::conversations::create_conversation,
        handlers::conversations::get_conversation,
        handlers::conversations::update_conversation,
        handlers::conversations::deactivate_conversation,
        handlers::conversations::append_message,
        handlers::conversations::list_conversations,
        handlers::conversations::conversation_stats,
        handlers::design_projects::create_design_project,
        handlers::design_projects::get_design_project,
        handlers::design_projects::update_design_project,
        handlers::design_projects::delete_design_project,
        handlers::design_projects::transition_status,
        handlers::design_projects::add_asset,
        handlers::design_projects::list_design_projects,
        handlers::design_projects::design_project_stats,
        handlers::memory_entries::create_memory_entry,
        handlers::memory_entries::upsert_memory_entry,
        handlers::memory_entries::get_memory_entry_by_key,
        handlers::memory_entries::get_memory_entry,
        handlers::memory_entries::update_memory_entry,
        handlers::memory_entries::delete_memory_entry,
        handlers::memory_entries::list_memory_entries,
        handlers::memory_entries::memory_entry_stats,
        handlers::files::create_file,
        handlers::files::get_file,
        handlers::files::update_file,
        handlers::files::set_visibility,
        handlers::files::delete_file,
        handlers::files::list_files,
        handlers::files::file_stats,
        handlers::tasks::create_task,
        handlers::tasks::get_task,
        handlers::tasks::update_task,
        handlers::tasks::delete_task,
        handlers::tasks::list_tasks,
        handlers::tasks::task_stats,
        handlers::usage::get_usage,
        handlers::admin::run_maintenance,
    ),
    components(schemas(
        // Envelope
        response::ErrorCode,
        FieldError,
        models::Pagination,
        models::GroupCount,
        // Enums
        models::MessageRole,
        models::DesignType,
        models::DesignStatus,
        models::AssetFormat,
        models::MemoryType,
        models::FileCategory,
        models::TaskStatus,
        models::TaskPriority,
        models::Plan,
        // Common
        dto::common::DeletedResponse,
        // Conversations
        dto::conversations::AppendMessageRequest,
        dto::conversations::CreateConversationRequest,
        dto::conversations::UpdateConversationRequest,
        dto::conversations::ChatMessageResponse,
        dto::conversations::ConversationResponse,
        dto::conversations::ConversationSummaryResponse,
        dto::conversations::ConversationStatsResponse,
        // Design projects
        dto::design_projects::CreateDesignProjectRequest,
        dto::design_projects::UpdateDesignProjectRequest,
        dto::design_projects::TransitionStatusRequest,
        dto::design_projects::AddAssetRequest,
        dto::design_projects::DesignAssetResponse,
        dto::design_projects::DesignProjectResponse,
        dto::design_projects::DesignProjectStatsResponse,
        // Memory entries
        dto::memory_entries::CreateMemoryEntryRequest,
        dto::memory_entries::UpdateMemoryEntryRequest,
        dto::memory_entries::MemoryEntryResponse,
        dto::memory_entries::MemoryTypeStatResponse,
        dto::memory_entries::MemoryEntryStatsResponse,
        // Files
        dto::files::CreateFileRequest,
        dto::files::UpdateFileRequest,
        dto::files::SetVisibilityRequest,
        dto::files::FileResponse,
        dto::files::FileCategoryStatResponse,
        dto::files::FileStatsResponse,
        // Tasks
        dto::tasks::CreateTaskRequest,
        dto::tasks::UpdateTaskRequest,
        dto::tasks::TaskResponse,
        dto::tasks::TaskStatsResponse,
        // Usage and admin
        dto::usage::PlanLimitsResponse,
        dto::usage::UsageCountsResponse,
        dto::usage::UsageResponse,
        dto::admin::MaintenanceRunResponse,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::DatabaseStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "conversations", description = "Chat conversations and their message history"),
        (name = "design-projects", description = "Design generation projects, status and assets"),
        (name = "memory-entries", description = "Keyed assistant memory with importance and expiry"),
        (name = "files", description = "Uploaded file records"),
        (name = "tasks", description = "User tasks"),
        (name = "usage", description = "Plan limits and current usage"),
        (name = "admin", description = "Administrative operations (auth required)"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
