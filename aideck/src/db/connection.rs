use libsql::{Builder, Connection};
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::error::Result;

use super::schema;

/// Shared handle to the libsql database. Cloning is cheap; every operation
/// opens its own connection.
#[derive(Clone)]
pub struct Database {
    db: Arc<libsql::Database>,
    busy_timeout_ms: u64,
    journal_mode: &'static str,
    synchronous: &'static str,
    remote: bool,
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let remote = is_remote_url(&config.url);

        let db = if remote {
            let auth_token = config.auth_token.clone().unwrap_or_default();
            match config.local_path {
                Some(ref local_path) => {
                    tracing::info!(url = %config.url, local_path, "Opening embedded replica");
                    Builder::new_remote_replica(local_path, config.url.clone(), auth_token)
                        .build()
                        .await?
                }
                None => {
                    tracing::info!(url = %config.url, "Opening remote database");
                    Builder::new_remote(config.url.clone(), auth_token)
                        .build()
                        .await?
                }
            }
        } else {
            let path = config.url.strip_prefix("file:").unwrap_or(&config.url);
            tracing::info!(path, "Opening local database");
            Builder::new_local(path).build().await?
        };

        let database = Self {
            db: Arc::new(db),
            busy_timeout_ms: config.busy_timeout_ms,
            journal_mode: normalize_journal_mode(&config.journal_mode),
            synchronous: normalize_synchronous(&config.synchronous),
            remote,
        };
        database.configure_database().await?;
        database.init_schema().await?;

        Ok(database)
    }

    pub fn connect(&self) -> Result<Connection> {
        Ok(self.db.connect()?)
    }

    async fn configure_database(&self) -> Result<()> {
        // PRAGMAs are local-file concerns; a remote primary manages its own.
        if self.remote {
            return Ok(());
        }
        let conn = self.connect()?;

        let pragmas = [
            ("busy_timeout", self.busy_timeout_ms.to_string()),
            ("journal_mode", self.journal_mode.to_string()),
            ("synchronous", self.synchronous.to_string()),
        ];
        for (pragma, value) in pragmas {
            if let Err(error) = conn
                .execute_batch(&format!("PRAGMA {pragma} = {value}"))
                .await
            {
                tracing::warn!(pragma, value = %value, error = %error, "Failed to set SQLite pragma");
            }
        }

        Ok(())
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        schema::init_schema(&conn).await
    }

    /// Pull frames from the remote primary when running as an embedded
    /// replica. A no-op for local databases.
    pub async fn sync(&self) -> Result<()> {
        match self.db.sync().await {
            Ok(replicated) => tracing::debug!(?replicated, "Database synced"),
            Err(error) => tracing::trace!(error = %error, "Database sync skipped"),
        }
        Ok(())
    }
}

fn is_remote_url(url: &str) -> bool {
    url.starts_with("libsql://") || url.starts_with("https://") || url.starts_with("http://")
}

fn normalize_journal_mode(value: &str) -> &'static str {
    match value.trim().to_uppercase().as_str() {
        "DELETE" => "DELETE",
        "TRUNCATE" => "TRUNCATE",
        "PERSIST" => "PERSIST",
        "MEMORY" => "MEMORY",
        "OFF" => "OFF",
        _ => "WAL",
    }
}

fn normalize_synchronous(value: &str) -> &'static str {
    match value.trim().to_uppercase().as_str() {
        "OFF" => "OFF",
        "FULL" => "FULL",
        "EXTRA" => "EXTRA",
        _ => "NORMAL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pragma_normalization() {
        assert_eq!(normalize_journal_mode(" delete "), "DELETE");
        assert_eq!(normalize_journal_mode("bogus"), "WAL");
        assert_eq!(normalize_synchronous("full"), "FULL");
        assert_eq!(normalize_synchronous(""), "NORMAL");
    }

    #[test]
    fn test_remote_url_detection() {
        assert!(is_remote_url("libsql://aideck.turso.io"));
        assert!(is_remote_url("https://aideck.turso.io"));
        assert!(!is_remote_url("file:aideck.db"));
        assert!(!is_remote_url(":memory:"));
    }

    #[tokio::test]
    async fn test_open_local_file_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("file:{}", dir.path().join("aideck.db").display()),
            ..Default::default()
        };
        let db = Database::new(&config).await.unwrap();
        let conn = db.connect().unwrap();
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
                 ('conversations', 'design_projects', 'memory_entries', 'files', 'tasks')",
                (),
            )
            .await
            .unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 5);
    }
}
