use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tracing::{debug, info};

use crate::db::DatabaseBackend;
use crate::error::{AideckError, Result};
use crate::models::{stuck_generation_note, utc_now};

/// Outcome of one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub expired_memory_entries_deleted: u64,
    pub stuck_design_projects_failed: u64,
}

/// Runs the periodic cleanup sweeps: expired memory entries are deleted and
/// design projects stuck in `generating` are failed.
#[derive(Clone)]
pub struct MaintenanceManager {
    db: Arc<dyn DatabaseBackend>,
    interval_secs: u64,
    stuck_threshold_hours: i64,
}

impl MaintenanceManager {
    pub fn new(db: Arc<dyn DatabaseBackend>, interval_secs: u64, stuck_threshold_hours: i64) -> Self {
        Self {
            db,
            interval_secs,
            stuck_threshold_hours,
        }
    }

    /// Run both sweeps once.
    pub async fn run_once(&self) -> Result<MaintenanceReport> {
        info!("Starting maintenance pass");
        let now = utc_now();

        let expired_memory_entries_deleted = self.db.sweep_expired_memory_entries(now).await?;
        debug!(
            deleted = expired_memory_entries_deleted,
            "Expired memory entry sweep finished"
        );

        let cutoff = Duration::try_hours(self.stuck_threshold_hours)
            .filter(|threshold| *threshold > Duration::zero())
            .and_then(|threshold| now.checked_sub_signed(threshold))
            .ok_or_else(|| {
                AideckError::Internal(format!(
                    "Invalid stuck design threshold: {} hours",
                    self.stuck_threshold_hours
                ))
            })?;
        let note = stuck_generation_note(self.stuck_threshold_hours);
        let stuck_design_projects_failed = self
            .db
            .sweep_stuck_design_projects(cutoff, &note, now)
            .await?;
        debug!(
            failed = stuck_design_projects_failed,
            threshold_hours = self.stuck_threshold_hours,
            "Stuck design sweep finished"
        );

        let report = MaintenanceReport {
            expired_memory_entries_deleted,
            stuck_design_projects_failed,
        };
        info!(
            expired_memory_entries_deleted,
            stuck_design_projects_failed, "Maintenance pass complete"
        );

        Ok(report)
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::{Database, LibSqlBackend};
    use crate::models::{DesignProject, DesignStatus, MemoryEntry, MemoryType};
    use tempfile::TempDir;

    async fn setup_test_db() -> (TempDir, Arc<dyn DatabaseBackend>) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("file:{}", dir.path().join("maintenance.db").display()),
            ..Default::default()
        };
        let db = Database::new(&config).await.unwrap();
        let backend: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(db));
        (dir, backend)
    }

    fn project_aged(id: &str, hours: i64) -> DesignProject {
        let mut project =
            DesignProject::new(id.into(), "u1".into(), format!("Design {id}"), "prompt".into());
        project.created_at = utc_now() - Duration::hours(hours);
        project.updated_at = project.created_at;
        project
    }

    #[tokio::test]
    async fn test_run_once_fails_only_projects_past_threshold() {
        // Given one project older and one younger than the threshold
        let (_dir, db) = setup_test_db().await;
        db.create_design_project(&project_aged("old", 30)).await.unwrap();
        db.create_design_project(&project_aged("young", 2)).await.unwrap();

        let manager = MaintenanceManager::new(db.clone(), 3600, 24);

        // When a pass runs
        let report = manager.run_once().await.unwrap();

        // Then only the old one is failed, with the note recorded
        assert_eq!(report.stuck_design_projects_failed, 1);
        let old = db.get_design_project("u1", "old").await.unwrap().unwrap();
        assert_eq!(old.status, DesignStatus::Failed);
        assert_eq!(
            old.error_message.as_deref(),
            Some("Generation timed out after 24 hours")
        );
        assert!(old.metadata.contains_key("failedAt"));

        let young = db.get_design_project("u1", "young").await.unwrap().unwrap();
        assert_eq!(young.status, DesignStatus::Generating);
    }

    #[tokio::test]
    async fn test_out_of_range_threshold_errors_without_touching_projects() {
        let (_dir, db) = setup_test_db().await;
        db.create_design_project(&project_aged("fresh", 1)).await.unwrap();

        for hours in [10_000_000_000_000, -24, 0] {
            let manager = MaintenanceManager::new(db.clone(), 3600, hours);
            let err = manager.run_once().await.unwrap_err();
            assert!(matches!(err, AideckError::Internal(_)), "hours={hours}");
        }

        let fresh = db.get_design_project("u1", "fresh").await.unwrap().unwrap();
        assert_eq!(fresh.status, DesignStatus::Generating);
    }

    #[tokio::test]
    async fn test_run_once_deletes_expired_memory_entries() {
        let (_dir, db) = setup_test_db().await;
        let now = utc_now();
        let mut expired = MemoryEntry::new(
            "m1".into(),
            "u1".into(),
            MemoryType::Context,
            "draft".into(),
            serde_json::json!("x"),
        );
        expired.expires_at = Some(now - Duration::hours(1));
        let mut live = MemoryEntry::new(
            "m2".into(),
            "u1".into(),
            MemoryType::Context,
            "keep".into(),
            serde_json::json!("y"),
        );
        live.expires_at = Some(now + Duration::hours(1));
        db.create_memory_entry(&expired).await.unwrap();
        db.create_memory_entry(&live).await.unwrap();

        let manager = MaintenanceManager::new(db.clone(), 900, 24);
        assert_eq!(manager.interval_secs(), 900);
        let report = manager.run_once().await.unwrap();
        assert_eq!(report.expired_memory_entries_deleted, 1);

        let again = manager.run_once().await.unwrap();
        assert_eq!(again, MaintenanceReport::default());
        assert_eq!(db.count_live_memory_entries("u1", now).await.unwrap(), 1);
    }
}
