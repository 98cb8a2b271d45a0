//! Client tests against a mock server.
//!
//! Cover envelope decoding, bearer auth, session eviction on 401, error
//! mapping and the `:action` routes.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{ApiClient, ClientError, Session};
use crate::api::v1::dto::{CreateMemoryEntryRequest, ListConversationsQuery};
use crate::api::v1::response::ErrorCode;
use crate::models::MemoryType;

fn task_json(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "status": "todo",
        "priority": "medium",
        "tags": [],
        "createdAt": "2026-01-05T10:00:00Z",
        "updatedAt": "2026-01-05T10:00:00Z"
    })
}

fn client_for(server: &MockServer, token: &str) -> ApiClient {
    ApiClient::new(&server.uri(), Session::new(token)).unwrap()
}

#[tokio::test]
async fn test_sends_bearer_token_and_unwraps_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/t1"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "data": task_json("t1", "Ship") })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let task = client_for(&server, "tok-1").get_task("t1").await.unwrap();
    assert_eq!(task.id, "t1");
    assert_eq!(task.title, "Ship");
    assert!(task.due_date.is_none());
}

#[tokio::test]
async fn test_unauthorized_evicts_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/usage"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Invalid API key",
            "code": "unauthorized"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "stale");
    let err = client.usage().await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));
    assert_eq!(err.code(), Some(ErrorCode::Unauthorized));
    assert!(!client.session().is_active());

    // No token left, so nothing reaches the server.
    let err = client.usage().await.unwrap_err();
    assert!(matches!(err, ClientError::NotSignedIn));
}

#[tokio::test]
async fn test_validation_error_keeps_field_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/memory-entries"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "Validation failed",
            "errors": [{ "field": "importance", "message": "must be between 1 and 10" }],
            "code": "invalid_request"
        })))
        .mount(&server)
        .await;

    let req: CreateMemoryEntryRequest = serde_json::from_value(json!({
        "key": "tone", "value": "formal", "importance": 11
    }))
    .unwrap();
    let err = client_for(&server, "tok")
        .create_memory_entry(&req)
        .await
        .unwrap_err();

    match err {
        ClientError::Api {
            status,
            code,
            errors,
            ..
        } => {
            assert_eq!(status, 400);
            assert_eq!(code, Some(ErrorCode::InvalidRequest));
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "importance");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_listing_sends_query_and_reads_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/conversations"))
        .and(query_param("search", "roadmap"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{
                "id": "c1",
                "title": "Roadmap review",
                "messageCount": 2,
                "totalTokens": 40,
                "isActive": true,
                "createdAt": "2026-01-05T10:00:00Z",
                "updatedAt": "2026-01-05T10:00:00Z"
            }],
            "pagination": {
                "page": 1, "limit": 5, "total": 6, "totalPages": 2,
                "hasNext": true, "hasPrev": false
            }
        })))
        .mount(&server)
        .await;

    let query = ListConversationsQuery {
        search: Some("roadmap".into()),
        limit: Some(5),
        ..Default::default()
    };
    let page = client_for(&server, "tok")
        .list_conversations(&query)
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "Roadmap review");
    assert_eq!(page.pagination.total_pages, 2);
    assert!(page.pagination.has_next);
}

#[tokio::test]
async fn test_action_routes_and_path_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gateway/api/v1/memory-entries:by-key"))
        .and(query_param("key", "tone"))
        .and(query_param("memoryType", "preference"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "id": "m1",
                "memoryType": "preference",
                "key": "tone",
                "value": "formal",
                "importance": 5,
                "tags": [],
                "accessCount": 1,
                "createdAt": "2026-01-05T10:00:00Z",
                "updatedAt": "2026-01-05T10:00:00Z"
            }
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(&format!("{}/gateway", server.uri()), Session::new("tok")).unwrap();
    let entry = client
        .get_memory_entry_by_key("tone", MemoryType::Preference)
        .await
        .unwrap();
    assert_eq!(entry.id, "m1");
    assert_eq!(entry.access_count, 1);
}

#[tokio::test]
async fn test_non_envelope_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/files:stats"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client_for(&server, "tok").file_stats().await.unwrap_err();
    match err {
        ClientError::Api {
            status,
            code,
            message,
            ..
        } => {
            assert_eq!(status, 502);
            assert!(code.is_none());
            assert_eq!(message, "Bad Gateway");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
