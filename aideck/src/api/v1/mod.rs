pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod response;
pub mod router;

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::api::routes::create_router;
    use crate::api::test_support::test_state;

    const TOKEN: &str = "tok-alice";

    async fn app() -> (tempfile::TempDir, Router) {
        let (dir, state) = test_state(&["tok-alice:alice:pro", "tok-bob:bob"]).await;
        (dir, create_router(state))
    }

    async fn call(app: &Router, method: &str, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"));
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn protected_route_requires_auth() {
        let (_dir, app) = app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/tasks")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "unauthorized");
    }

    #[tokio::test]
    async fn health_is_public() {
        let (_dir, app) = app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_json_is_public_and_valid() {
        let (_dir, app) = app().await;
        let (status, json) = call(&app, "GET", "/api/v1/openapi.json", "", None).await;

        assert_eq!(status, StatusCode::OK);
        let version = json["openapi"]
            .as_str()
            .expect("openapi field should be a string");
        assert!(version.starts_with('3'), "got: {version}");
        assert!(json["paths"]["/api/v1/memory-entries:upsert"].is_object());
    }

    #[tokio::test]
    async fn design_status_moves_follow_the_state_machine() {
        let (_dir, app) = app().await;
        let (status, created) = call(
            &app,
            "POST",
            "/api/v1/design-projects",
            TOKEN,
            Some(json!({ "name": "Launch poster", "prompt": "A bold poster", "designType": "banner" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["status"], "generating");
        let id = created["data"]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/design-projects/{id}/status");

        let (status, failed) =
            call(&app, "POST", &uri, TOKEN, Some(json!({ "status": "failed" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(failed["data"]["errorMessage"], "Generation failed");

        let (status, body) =
            call(&app, "POST", &uri, TOKEN, Some(json!({ "status": "completed" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "conflict");

        let (status, retried) =
            call(&app, "POST", &uri, TOKEN, Some(json!({ "status": "generating" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(retried["data"].get("errorMessage").is_none());
    }

    #[tokio::test]
    async fn design_metadata_merges_and_null_removes() {
        let (_dir, app) = app().await;
        let (_, created) = call(
            &app,
            "POST",
            "/api/v1/design-projects",
            TOKEN,
            Some(json!({
                "name": "Logo", "prompt": "Minimal fox",
                "metadata": { "font": "Inter", "draft": true }
            })),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, updated) = call(
            &app,
            "PATCH",
            &format!("/api/v1/design-projects/{id}"),
            TOKEN,
            Some(json!({ "metadata": { "draft": null, "theme": "dark" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            updated["data"]["metadata"],
            json!({ "font": "Inter", "theme": "dark" })
        );
    }

    #[tokio::test]
    async fn memory_upsert_keeps_identity() {
        let (_dir, app) = app().await;
        let body = json!({ "key": "tone", "value": "formal", "memoryType": "preference" });
        let (status, first) =
            call(&app, "PUT", "/api/v1/memory-entries:upsert", TOKEN, Some(body)).await;
        assert_eq!(status, StatusCode::OK);

        let body = json!({ "key": "tone", "value": "casual", "memoryType": "preference", "importance": 8 });
        let (_, second) =
            call(&app, "PUT", "/api/v1/memory-entries:upsert", TOKEN, Some(body)).await;
        assert_eq!(second["data"]["id"], first["data"]["id"]);
        assert_eq!(second["data"]["value"], "casual");
        assert_eq!(second["data"]["importance"], 8);

        let (status, by_key) = call(
            &app,
            "GET",
            "/api/v1/memory-entries:by-key?key=tone&memoryType=preference",
            TOKEN,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_key["data"]["accessCount"], 1);
    }

    #[tokio::test]
    async fn task_done_then_reopened_clears_completion() {
        let (_dir, app) = app().await;
        let (_, created) = call(
            &app,
            "POST",
            "/api/v1/tasks",
            TOKEN,
            Some(json!({ "title": "Write changelog" })),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/tasks/{id}");

        let (_, done) = call(&app, "PATCH", &uri, TOKEN, Some(json!({ "status": "done" }))).await;
        assert!(done["data"]["completedAt"].is_string());

        let (_, reopened) =
            call(&app, "PATCH", &uri, TOKEN, Some(json!({ "status": "in_progress" }))).await;
        assert!(reopened["data"].get("completedAt").is_none());
    }

    #[tokio::test]
    async fn usage_reports_plan_and_counts() {
        let (_dir, app) = app().await;
        call(
            &app,
            "POST",
            "/api/v1/conversations",
            TOKEN,
            Some(json!({ "title": "Hello" })),
        )
        .await;

        let (status, usage) = call(&app, "GET", "/api/v1/usage", TOKEN, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(usage["data"]["plan"], "pro");
        assert_eq!(usage["data"]["usage"]["conversations"], 1);
    }
}
