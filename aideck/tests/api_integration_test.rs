mod common;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use common::spawn_app;

const ALICE: &str = "tok-alice";
const BOB: &str = "tok-bob";
const KEYS: &[&str] = &["tok-alice:alice", "tok-bob:bob"];

// ── Auth & envelope ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_and_unknown_tokens_are_rejected() {
    let app = spawn_app(KEYS, |_| {}).await;

    let (status, body) = app.call("GET", "/api/v1/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "unauthorized");

    let (status, body) = app.call("GET", "/api/v1/tasks", Some("nope"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid API key");
}

#[tokio::test]
async fn test_no_configured_keys_locks_every_protected_route() {
    let app = spawn_app(&[], |_| {}).await;

    let (status, body) = app
        .call("GET", "/api/v1/usage", Some("anything"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("AIDECK_API_KEYS"));

    let (status, _) = app.call("GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_success_envelope_shape() {
    let app = spawn_app(KEYS, |_| {}).await;

    let (status, body) = app
        .call(
            "POST",
            "/api/v1/conversations",
            Some(ALICE),
            Some(json!({ "title": "Trip planning" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["title"], "Trip planning");
    assert_eq!(body["data"]["isActive"], true);
    assert!(body.get("errors").is_none());
    assert!(body.get("code").is_none());
}

#[tokio::test]
async fn test_malformed_query_is_a_400_envelope() {
    let app = spawn_app(KEYS, |_| {}).await;

    let (status, body) = app
        .call("GET", "/api/v1/tasks?limit=lots", Some(ALICE), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}

// ── Conversations ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_blank_conversation_title_is_rejected() {
    let app = spawn_app(KEYS, |_| {}).await;

    let (status, body) = app
        .call(
            "POST",
            "/api/v1/conversations",
            Some(ALICE),
            Some(json!({ "title": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "title");

    let (_, listed) = app
        .call("GET", "/api/v1/conversations", Some(ALICE), None)
        .await;
    assert_eq!(listed["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_first_user_message_names_the_conversation() {
    let app = spawn_app(KEYS, |_| {}).await;
    let long = "Help me plan a two week trip through Portugal and Spain next spring";

    let (_, created) = app
        .call(
            "POST",
            "/api/v1/conversations",
            Some(ALICE),
            Some(json!({ "firstMessage": { "role": "user", "content": long, "tokenCount": 12 } })),
        )
        .await;

    let title = created["data"]["title"].as_str().unwrap();
    assert!(title.ends_with("..."));
    assert_eq!(title.chars().count(), 53);
    assert_eq!(created["data"]["messageCount"], 1);
    assert_eq!(created["data"]["totalTokens"], 12);
}

#[tokio::test]
async fn test_append_to_deactivated_conversation_is_404() {
    let app = spawn_app(KEYS, |_| {}).await;
    let (_, created) = app
        .call("POST", "/api/v1/conversations", Some(ALICE), Some(json!({})))
        .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, appended) = app
        .call(
            "POST",
            &format!("/api/v1/conversations/{id}/messages"),
            Some(ALICE),
            Some(json!({ "role": "assistant", "content": "Hello!", "tokenCount": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(appended["data"]["messages"][0]["content"], "Hello!");

    let (status, _) = app
        .call("DELETE", &format!("/api/v1/conversations/{id}"), Some(ALICE), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/v1/conversations/{id}/messages"),
            Some(ALICE),
            Some(json!({ "role": "user", "content": "Still there?" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    // History stays readable.
    let (status, body) = app
        .call("GET", &format!("/api/v1/conversations/{id}"), Some(ALICE), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);
}

// ── Memory entries ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_duplicate_memory_key_is_conflict() {
    let app = spawn_app(KEYS, |_| {}).await;
    let entry = json!({ "key": "favorite_color", "value": "teal", "memoryType": "preference" });

    let (status, _) = app
        .call("POST", "/api/v1/memory-entries", Some(ALICE), Some(entry.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .call("POST", "/api/v1/memory-entries", Some(ALICE), Some(entry.clone()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    // Same key under another type, or for another user, is fine.
    let other_type = json!({ "key": "favorite_color", "value": "teal", "memoryType": "fact" });
    let (status, _) = app
        .call("POST", "/api/v1/memory-entries", Some(ALICE), Some(other_type))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .call("POST", "/api/v1/memory-entries", Some(BOB), Some(entry))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_importance_out_of_range_is_field_error() {
    let app = spawn_app(KEYS, |_| {}).await;

    let (status, body) = app
        .call(
            "POST",
            "/api/v1/memory-entries",
            Some(ALICE),
            Some(json!({ "key": "k", "value": 1, "importance": 11 })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["errors"][0]["field"], "importance");
}

#[tokio::test]
async fn test_expired_entries_vanish_and_get_swept() {
    let app = spawn_app(KEYS, |_| {}).await;

    let (status, created) = app
        .call(
            "POST",
            "/api/v1/memory-entries",
            Some(ALICE),
            Some(json!({ "key": "old", "value": true, "expiresAt": "2020-01-01T00:00:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .call("GET", &format!("/api/v1/memory-entries/{id}"), Some(ALICE), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = app
        .call("GET", "/api/v1/memory-entries", Some(ALICE), None)
        .await;
    assert_eq!(listed["pagination"]["total"], 0);

    let (status, report) = app
        .call("POST", "/api/v1/admin/maintenance:run", Some(ALICE), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["data"]["expiredMemoryEntriesDeleted"], 1);
    assert_eq!(report["data"]["stuckDesignProjectsFailed"], 0);
}

// ── Tenant isolation ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_other_users_records_are_not_found() {
    let app = spawn_app(KEYS, |_| {}).await;
    let (_, created) = app
        .call(
            "POST",
            "/api/v1/tasks",
            Some(ALICE),
            Some(json!({ "title": "Renew passport", "priority": "high" })),
        )
        .await;
    let uri = format!("/api/v1/tasks/{}", created["data"]["id"].as_str().unwrap());

    let (status, _) = app.call("GET", &uri, Some(BOB), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .call("PATCH", &uri, Some(BOB), Some(json!({ "status": "done" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call("DELETE", &uri, Some(BOB), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, bob_tasks) = app.call("GET", "/api/v1/tasks", Some(BOB), None).await;
    assert_eq!(bob_tasks["pagination"]["total"], 0);

    let (status, body) = app.call("GET", &uri, Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "todo");
}

// ── Files ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_file_mime_and_category_are_derived() {
    let app = spawn_app(KEYS, |_| {}).await;

    let (status, body) = app
        .call(
            "POST",
            "/api/v1/files",
            Some(ALICE),
            Some(json!({ "filename": "holiday.png", "size": 2048, "storagePath": "u/alice/holiday.png" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["mimeType"], "image/png");
    assert_eq!(body["data"]["category"], "image");
    assert_eq!(body["data"]["isPublic"], false);
}

#[tokio::test]
async fn test_file_allow_list_and_size_limit() {
    let app = spawn_app(KEYS, |config| {
        config.uploads.allowed_mime_types = vec!["image/*".to_string()];
        config.uploads.max_file_size = 1024;
    })
    .await;

    let (status, body) = app
        .call(
            "POST",
            "/api/v1/files",
            Some(ALICE),
            Some(json!({ "filename": "report.pdf", "size": 10, "storagePath": "u/a/report.pdf" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "mimeType");

    let (status, body) = app
        .call(
            "POST",
            "/api/v1/files",
            Some(ALICE),
            Some(json!({ "filename": "big.png", "size": 4096, "storagePath": "u/a/big.png" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "size");
}

// ── Plan limits ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_conversation_limit_counts_only_active() {
    let app = spawn_app(KEYS, |config| {
        config.plans.free.max_conversations = 1;
    })
    .await;

    let (_, first) = app
        .call("POST", "/api/v1/conversations", Some(ALICE), Some(json!({})))
        .await;
    let (status, body) = app
        .call("POST", "/api/v1/conversations", Some(ALICE), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "limit_exceeded");

    let id = first["data"]["id"].as_str().unwrap();
    app.call("DELETE", &format!("/api/v1/conversations/{id}"), Some(ALICE), None)
        .await;
    let (status, _) = app
        .call("POST", "/api/v1/conversations", Some(ALICE), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

// ── Listing ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_task_listing_paginates_by_priority() {
    let app = spawn_app(KEYS, |_| {}).await;
    for (title, priority) in [("low one", "low"), ("urgent one", "urgent"), ("medium one", "medium")] {
        app.call(
            "POST",
            "/api/v1/tasks",
            Some(ALICE),
            Some(json!({ "title": title, "priority": priority })),
        )
        .await;
    }

    let (status, page) = app
        .call("GET", "/api/v1/tasks?limit=2", Some(ALICE), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["data"][0]["title"], "urgent one");
    assert_eq!(page["pagination"]["total"], 3);
    assert_eq!(page["pagination"]["totalPages"], 2);
    assert_eq!(page["pagination"]["hasNext"], true);

    let (_, stats) = app.call("GET", "/api/v1/tasks:stats", Some(ALICE), None).await;
    assert_eq!(stats["data"]["total"], 3);
}
