use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::v1_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let conversations = Router::new()
        .route(
            "/",
            get(handlers::conversations::list_conversations)
                .post(handlers::conversations::create_conversation),
        )
        .route(
            "/{id}",
            get(handlers::conversations::get_conversation)
                .patch(handlers::conversations::update_conversation)
                .delete(handlers::conversations::deactivate_conversation),
        )
        .route(
            "/{id}/messages",
            post(handlers::conversations::append_message),
        );

    let design_projects = Router::new()
        .route(
            "/",
            get(handlers::design_projects::list_design_projects)
                .post(handlers::design_projects::create_design_project),
        )
        .route(
            "/{id}",
            get(handlers::design_projects::get_design_project)
                .patch(handlers::design_projects::update_design_project)
                .delete(handlers::design_projects::delete_design_project),
        )
        .route(
            "/{id}/status",
            post(handlers::design_projects::transition_status),
        )
        .route("/{id}/assets", post(handlers::design_projects::add_asset));

    let memory_entries = Router::new()
        .route(
            "/",
            get(handlers::memory_entries::list_memory_entries)
                .post(handlers::memory_entries::create_memory_entry),
        )
        .route(
            "/{id}",
            get(handlers::memory_entries::get_memory_entry)
                .patch(handlers::memory_entries::update_memory_entry)
                .delete(handlers::memory_entries::delete_memory_entry),
        );

    let files = Router::new()
        .route(
            "/",
            get(handlers::files::list_files).post(handlers::files::create_file),
        )
        .route(
            "/{id}",
            get(handlers::files::get_file)
                .patch(handlers::files::update_file)
                .delete(handlers::files::delete_file),
        )
        .route("/{id}/visibility", post(handlers::files::set_visibility));

    let tasks = Router::new()
        .route(
            "/",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route(
            "/{id}",
            get(handlers::tasks::get_task)
                .patch(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        );

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let protected_routes = Router::new()
        .nest("/conversations", conversations)
        .route(
            "/conversations:stats",
            get(handlers::conversations::conversation_stats),
        )
        .nest("/design-projects", design_projects)
        .route(
            "/design-projects:stats",
            get(handlers::design_projects::design_project_stats),
        )
        .nest("/memory-entries", memory_entries)
        .route(
            "/memory-entries:upsert",
            put(handlers::memory_entries::upsert_memory_entry),
        )
        .route(
            "/memory-entries:by-key",
            get(handlers::memory_entries::get_memory_entry_by_key),
        )
        .route(
            "/memory-entries:stats",
            get(handlers::memory_entries::memory_entry_stats),
        )
        .nest("/files", files)
        .route("/files:stats", get(handlers::files::file_stats))
        .nest("/tasks", tasks)
        .route("/tasks:stats", get(handlers::tasks::task_stats))
        .route("/usage", get(handlers::usage::get_usage))
        .route(
            "/admin/maintenance:run",
            post(handlers::admin::run_maintenance),
        )
        .route_layer(middleware::from_fn_with_state(state, v1_auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
