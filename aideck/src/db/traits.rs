use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    ChatMessage, Conversation, ConversationStats, DesignAsset, DesignProject, DesignProjectStats,
    DesignStatus, FileRecord, FileStats, ListConversationsFilter, ListDesignProjectsFilter,
    ListFilesFilter, ListMemoryEntriesFilter, ListTasksFilter, MemoryEntry, MemoryEntryStats,
    Metadata, MemoryType, Page, PageRequest, Task, TaskStats,
};

// ---------------------------------------------------------------------------
// Individual store traits
// ---------------------------------------------------------------------------
//
// Every user-facing lookup takes the owning `user_id`; a record owned by
// someone else behaves exactly like a missing one.

/// Chat conversations and their append-only message history.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(&self, conv: &Conversation) -> Result<()>;
    async fn get_conversation(&self, user_id: &str, id: &str) -> Result<Option<Conversation>>;
    async fn update_conversation(&self, conv: &Conversation) -> Result<bool>;
    async fn deactivate_conversation(&self, user_id: &str, id: &str) -> Result<bool>;
    async fn append_message(
        &self,
        user_id: &str,
        id: &str,
        message: &ChatMessage,
    ) -> Result<bool>;
    async fn list_conversations(
        &self,
        user_id: &str,
        filter: &ListConversationsFilter,
        page: PageRequest,
    ) -> Result<Page<Conversation>>;
    async fn count_active_conversations(&self, user_id: &str) -> Result<u64>;
    async fn conversation_stats(&self, user_id: &str) -> Result<ConversationStats>;
}

/// Design projects, their status lifecycle and generated assets.
#[async_trait]
pub trait DesignProjectStore: Send + Sync {
    async fn create_design_project(&self, project: &DesignProject) -> Result<()>;
    async fn get_design_project(&self, user_id: &str, id: &str) -> Result<Option<DesignProject>>;
    async fn update_design_project(
        &self,
        project: &DesignProject,
        metadata_patch: &Metadata,
    ) -> Result<bool>;
    async fn transition_design_status(
        &self,
        user_id: &str,
        id: &str,
        from: DesignStatus,
        to: DesignStatus,
        error_message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool>;
    async fn add_design_asset(&self, user_id: &str, id: &str, asset: &DesignAsset)
        -> Result<bool>;
    async fn delete_design_project(&self, user_id: &str, id: &str) -> Result<bool>;
    async fn list_design_projects(
        &self,
        user_id: &str,
        filter: &ListDesignProjectsFilter,
        page: PageRequest,
    ) -> Result<Page<DesignProject>>;
    async fn count_design_projects_since(&self, user_id: &str, since: DateTime<Utc>)
        -> Result<u64>;
    async fn design_project_stats(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DesignProjectStats>;

    /// Fail projects stuck in `generating` since before `cutoff`. Spans all users.
    async fn sweep_stuck_design_projects(
        &self,
        cutoff: DateTime<Utc>,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<u64>;
}

/// Key/value memory entries with expiry and access bookkeeping.
#[async_trait]
pub trait MemoryEntryStore: Send + Sync {
    async fn create_memory_entry(&self, entry: &MemoryEntry) -> Result<()>;
    async fn upsert_memory_entry(&self, entry: &MemoryEntry) -> Result<MemoryEntry>;
    /// Read without counting an access.
    async fn find_memory_entry(
        &self,
        user_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MemoryEntry>>;
    async fn get_memory_entry(
        &self,
        user_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MemoryEntry>>;
    async fn get_memory_entry_by_key(
        &self,
        user_id: &str,
        key: &str,
        memory_type: MemoryType,
        now: DateTime<Utc>,
    ) -> Result<Option<MemoryEntry>>;
    async fn memory_entry_exists(
        &self,
        user_id: &str,
        key: &str,
        memory_type: MemoryType,
        now: DateTime<Utc>,
    ) -> Result<bool>;
    async fn update_memory_entry(&self, entry: &MemoryEntry) -> Result<bool>;
    async fn delete_memory_entry(&self, user_id: &str, id: &str) -> Result<bool>;
    async fn list_memory_entries(
        &self,
        user_id: &str,
        filter: &ListMemoryEntriesFilter,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<Page<MemoryEntry>>;
    async fn count_live_memory_entries(&self, user_id: &str, now: DateTime<Utc>) -> Result<u64>;
    async fn memory_entry_stats(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MemoryEntryStats>;

    /// Delete entries whose expiry has passed. Spans all users.
    async fn sweep_expired_memory_entries(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Uploaded file records.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn create_file(&self, file: &FileRecord) -> Result<()>;
    async fn get_file(&self, user_id: &str, id: &str) -> Result<Option<FileRecord>>;
    async fn update_file(&self, file: &FileRecord) -> Result<bool>;
    async fn set_file_visibility(&self, user_id: &str, id: &str, is_public: bool) -> Result<bool>;
    async fn delete_file(&self, user_id: &str, id: &str) -> Result<bool>;
    async fn list_files(
        &self,
        user_id: &str,
        filter: &ListFilesFilter,
        page: PageRequest,
    ) -> Result<Page<FileRecord>>;
    async fn total_file_bytes(&self, user_id: &str) -> Result<u64>;
    async fn file_stats(&self, user_id: &str) -> Result<FileStats>;
}

/// User tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, task: &Task) -> Result<()>;
    async fn get_task(&self, user_id: &str, id: &str) -> Result<Option<Task>>;
    async fn update_task(&self, task: &Task) -> Result<bool>;
    async fn delete_task(&self, user_id: &str, id: &str) -> Result<bool>;
    async fn list_tasks(
        &self,
        user_id: &str,
        filter: &ListTasksFilter,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<Page<Task>>;
    async fn count_tasks(&self, user_id: &str) -> Result<u64>;
    async fn task_stats(&self, user_id: &str, now: DateTime<Utc>) -> Result<TaskStats>;
}

// ---------------------------------------------------------------------------
// Unified backend supertrait
// ---------------------------------------------------------------------------

/// A complete database backend that combines all store traits plus lifecycle
/// operations.
#[async_trait]
pub trait DatabaseBackend:
    ConversationStore + DesignProjectStore + MemoryEntryStore + FileStore + TaskStore
{
    /// Sync with remote (e.g. Turso replication). No-op for local-only backends.
    async fn sync(&self) -> Result<()>;

    /// Cheap round trip used by the health check.
    async fn ping(&self) -> Result<()>;
}
