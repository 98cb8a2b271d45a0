#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use aideck::api::{create_router, AppState};
use aideck::config::{ApiKey, Config, DatabaseConfig};
use aideck::db::{Database, DatabaseBackend, LibSqlBackend};

/// Router over a fresh on-disk database. Keep the value alive for the
/// duration of the test; dropping it removes the database directory.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _dir: TempDir,
}

/// `keys` are `token:user_id[:plan]` entries.
pub async fn spawn_app(keys: &[&str], configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut config = Config::default();
    config.server.api_keys = keys.iter().filter_map(|k| ApiKey::parse(k)).collect();
    config.database = DatabaseConfig {
        url: format!("file:{}", dir.path().join("integration.db").display()),
        ..Default::default()
    };
    configure(&mut config);

    let db = Database::new(&config.database)
        .await
        .expect("failed to open test database");
    let backend: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(db));
    let state = AppState::new(config, backend);

    TestApp {
        router: create_router(state.clone()),
        state,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("valid request"))
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        (status, json)
    }
}
