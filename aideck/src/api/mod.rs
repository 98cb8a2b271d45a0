mod extractors;
mod routes;
mod state;
pub mod v1;

pub use extractors::{AppJson, AppQuery, ValidatedJson};
pub use routes::create_router;
pub use state::AppState;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::AppState;
    use crate::config::{ApiKey, Config, DatabaseConfig};
    use crate::db::{Database, DatabaseBackend, LibSqlBackend};

    /// App state over a fresh on-disk database. `keys` are
    /// `token:user_id[:plan]` entries; the directory must outlive the state.
    pub(crate) async fn test_state(keys: &[&str]) -> (TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.api_keys = keys.iter().filter_map(|k| ApiKey::parse(k)).collect();
        config.database = DatabaseConfig {
            url: format!("file:{}", dir.path().join("api.db").display()),
            ..Default::default()
        };

        let db = Database::new(&config.database).await.unwrap();
        let backend: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(db));
        (dir, AppState::new(config, backend))
    }
}
