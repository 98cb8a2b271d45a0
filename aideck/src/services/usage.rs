use std::sync::Arc;

use chrono::Duration;

use crate::config::{PlanLimits, PlanLimitsTable};
use crate::db::DatabaseBackend;
use crate::error::{AideckError, Result};
use crate::models::{utc_now, within_limit, Plan, UsageCounts};

/// Design credits are counted over this many trailing days.
pub const DESIGN_CREDIT_WINDOW_DAYS: i64 = 30;

/// A plan-limited resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Conversations,
    MemoryEntries,
    DesignCredits,
    Tasks,
    StorageBytes,
}

impl Quota {
    fn limit(self, limits: &PlanLimits) -> u64 {
        match self {
            Self::Conversations => limits.max_conversations,
            Self::MemoryEntries => limits.max_memory_entries,
            Self::DesignCredits => limits.design_credits,
            Self::Tasks => limits.max_tasks,
            Self::StorageBytes => limits.storage_bytes,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Conversations => "active conversations",
            Self::MemoryEntries => "memory entries",
            Self::DesignCredits => "design generations per 30 days",
            Self::Tasks => "tasks",
            Self::StorageBytes => "bytes of file storage",
        }
    }
}

/// Plan, ceilings and current consumption for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub plan: Plan,
    pub limits: PlanLimits,
    pub usage: UsageCounts,
}

/// Checks creating operations against the caller's plan ceilings.
#[derive(Clone)]
pub struct UsageService {
    db: Arc<dyn DatabaseBackend>,
    plans: PlanLimitsTable,
}

impl UsageService {
    pub fn new(db: Arc<dyn DatabaseBackend>, plans: PlanLimitsTable) -> Self {
        Self { db, plans }
    }

    pub fn limits_for(&self, plan: Plan) -> PlanLimits {
        self.plans.for_plan(plan)
    }

    async fn current(&self, user_id: &str, quota: Quota) -> Result<u64> {
        let now = utc_now();
        match quota {
            Quota::Conversations => self.db.count_active_conversations(user_id).await,
            Quota::MemoryEntries => self.db.count_live_memory_entries(user_id, now).await,
            Quota::DesignCredits => {
                let since = now - Duration::days(DESIGN_CREDIT_WINDOW_DAYS);
                self.db.count_design_projects_since(user_id, since).await
            }
            Quota::Tasks => self.db.count_tasks(user_id).await,
            Quota::StorageBytes => self.db.total_file_bytes(user_id).await,
        }
    }

    /// Fail with `LimitExceeded` unless `additional` more units of `quota`
    /// fit within the plan.
    pub async fn ensure_within(
        &self,
        user_id: &str,
        plan: Plan,
        quota: Quota,
        additional: u64,
    ) -> Result<()> {
        let limit = quota.limit(&self.limits_for(plan));
        if limit == 0 {
            return Ok(());
        }

        let current = self.current(user_id, quota).await?;
        if within_limit(limit, current, additional) {
            return Ok(());
        }

        tracing::info!(
            user_id,
            %plan,
            ?quota,
            current,
            limit,
            "Plan limit reached"
        );
        Err(AideckError::LimitExceeded(format!(
            "The {plan} plan allows at most {limit} {}",
            quota.describe()
        )))
    }

    pub async fn snapshot(&self, user_id: &str, plan: Plan) -> Result<UsageSnapshot> {
        let usage = UsageCounts {
            conversations: self.current(user_id, Quota::Conversations).await?,
            memory_entries: self.current(user_id, Quota::MemoryEntries).await?,
            design_projects_recent: self.current(user_id, Quota::DesignCredits).await?,
            tasks: self.current(user_id, Quota::Tasks).await?,
            storage_bytes: self.current(user_id, Quota::StorageBytes).await?,
        };

        Ok(UsageSnapshot {
            plan,
            limits: self.limits_for(plan),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::{Database, LibSqlBackend};
    use crate::models::{Conversation, FileRecord, Task};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Arc<dyn DatabaseBackend>) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("file:{}", dir.path().join("usage.db").display()),
            ..Default::default()
        };
        let db = Database::new(&config).await.unwrap();
        let backend: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(db));
        (dir, backend)
    }

    fn tight_plans() -> PlanLimitsTable {
        let mut plans = PlanLimitsTable::default();
        plans.free.max_conversations = 2;
        plans.free.max_tasks = 1;
        plans.free.storage_bytes = 1_000;
        plans
    }

    #[tokio::test]
    async fn test_conversation_limit_counts_only_active() {
        let (_dir, db) = setup().await;
        let usage = UsageService::new(db.clone(), tight_plans());

        for id in ["c1", "c2"] {
            db.create_conversation(&Conversation::new(id.into(), "u1".into()))
                .await
                .unwrap();
        }
        let err = usage
            .ensure_within("u1", Plan::Free, Quota::Conversations, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AideckError::LimitExceeded(_)));

        db.deactivate_conversation("u1", "c1").await.unwrap();
        usage
            .ensure_within("u1", Plan::Free, Quota::Conversations, 1)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_zero_limit_is_unlimited() {
        let (_dir, db) = setup().await;
        let usage = UsageService::new(db.clone(), tight_plans());
        db.create_task(&Task::new("t1".into(), "u1".into(), "one".into()))
            .await
            .unwrap();

        assert!(usage
            .ensure_within("u1", Plan::Free, Quota::Tasks, 1)
            .await
            .is_err());
        usage
            .ensure_within("u1", Plan::Enterprise, Quota::Tasks, 1)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_storage_limit_uses_additional_bytes() {
        let (_dir, db) = setup().await;
        let usage = UsageService::new(db.clone(), tight_plans());
        let file = FileRecord::new(
            "f1".into(),
            "u1".into(),
            "a.bin".into(),
            "application/octet-stream".into(),
            600,
            "blobs/a.bin".into(),
        );
        db.create_file(&file).await.unwrap();

        usage
            .ensure_within("u1", Plan::Free, Quota::StorageBytes, 400)
            .await
            .unwrap();
        let err = usage
            .ensure_within("u1", Plan::Free, Quota::StorageBytes, 401)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Plan limit exceeded: The free plan allows at most 1000 bytes of file storage"
        );

        let snapshot = usage.snapshot("u1", Plan::Free).await.unwrap();
        assert_eq!(snapshot.usage.storage_bytes, 600);
        assert_eq!(snapshot.limits.storage_bytes, 1_000);
    }
}
