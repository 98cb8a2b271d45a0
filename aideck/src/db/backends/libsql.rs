use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::connection::Database;
use crate::db::repository::{
    ConversationRepository, DesignProjectRepository, FileRepository, MemoryEntryRepository,
    TaskRepository,
};
use crate::db::traits::{
    ConversationStore, DatabaseBackend, DesignProjectStore, FileStore, MemoryEntryStore,
    TaskStore,
};
use crate::error::Result;
use crate::models::{
    ChatMessage, Conversation, ConversationStats, DesignAsset, DesignProject, DesignProjectStats,
    DesignStatus, FileRecord, FileStats, ListConversationsFilter, ListDesignProjectsFilter,
    ListFilesFilter, ListMemoryEntriesFilter, ListTasksFilter, MemoryEntry, MemoryEntryStats,
    Metadata, MemoryType, Page, PageRequest, Task, TaskStats,
};

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConversationStore for LibSqlBackend {
    async fn create_conversation(&self, conv: &Conversation) -> Result<()> {
        let conn = self.db.connect()?;
        ConversationRepository::create(&conn, conv).await
    }
    async fn get_conversation(&self, user_id: &str, id: &str) -> Result<Option<Conversation>> {
        let conn = self.db.connect()?;
        ConversationRepository::get(&conn, user_id, id).await
    }
    async fn update_conversation(&self, conv: &Conversation) -> Result<bool> {
        let conn = self.db.connect()?;
        ConversationRepository::update(&conn, conv).await
    }
    async fn deactivate_conversation(&self, user_id: &str, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        ConversationRepository::deactivate(&conn, user_id, id).await
    }
    async fn append_message(
        &self,
        user_id: &str,
        id: &str,
        message: &ChatMessage,
    ) -> Result<bool> {
        let conn = self.db.connect()?;
        ConversationRepository::append_message(&conn, user_id, id, message).await
    }
    async fn list_conversations(
        &self,
        user_id: &str,
        filter: &ListConversationsFilter,
        page: PageRequest,
    ) -> Result<Page<Conversation>> {
        let conn = self.db.connect()?;
        ConversationRepository::list(&conn, user_id, filter, page).await
    }
    async fn count_active_conversations(&self, user_id: &str) -> Result<u64> {
        let conn = self.db.connect()?;
        ConversationRepository::count_active(&conn, user_id).await
    }
    async fn conversation_stats(&self, user_id: &str) -> Result<ConversationStats> {
        let conn = self.db.connect()?;
        ConversationRepository::stats(&conn, user_id).await
    }
}

#[async_trait]
impl DesignProjectStore for LibSqlBackend {
    async fn create_design_project(&self, project: &DesignProject) -> Result<()> {
        let conn = self.db.connect()?;
        DesignProjectRepository::create(&conn, project).await
    }
    async fn get_design_project(&self, user_id: &str, id: &str) -> Result<Option<DesignProject>> {
        let conn = self.db.connect()?;
        DesignProjectRepository::get(&conn, user_id, id).await
    }
    async fn update_design_project(
        &self,
        project: &DesignProject,
        metadata_patch: &Metadata,
    ) -> Result<bool> {
        let conn = self.db.connect()?;
        DesignProjectRepository::update_details(&conn, project, metadata_patch).await
    }
    async fn transition_design_status(
        &self,
        user_id: &str,
        id: &str,
        from: DesignStatus,
        to: DesignStatus,
        error_message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.db.connect()?;
        DesignProjectRepository::transition_status(&conn, user_id, id, from, to, error_message, now)
            .await
    }
    async fn add_design_asset(
        &self,
        user_id: &str,
        id: &str,
        asset: &DesignAsset,
    ) -> Result<bool> {
        let conn = self.db.connect()?;
        DesignProjectRepository::add_asset(&conn, user_id, id, asset).await
    }
    async fn delete_design_project(&self, user_id: &str, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        DesignProjectRepository::delete(&conn, user_id, id).await
    }
    async fn list_design_projects(
        &self,
        user_id: &str,
        filter: &ListDesignProjectsFilter,
        page: PageRequest,
    ) -> Result<Page<DesignProject>> {
        let conn = self.db.connect()?;
        DesignProjectRepository::list(&conn, user_id, filter, page).await
    }
    async fn count_design_projects_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64> {
        let conn = self.db.connect()?;
        DesignProjectRepository::count_created_since(&conn, user_id, since).await
    }
    async fn design_project_stats(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DesignProjectStats> {
        let conn = self.db.connect()?;
        DesignProjectRepository::stats(&conn, user_id, now).await
    }
    async fn sweep_stuck_design_projects(
        &self,
        cutoff: DateTime<Utc>,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let conn = self.db.connect()?;
        DesignProjectRepository::sweep_stuck(&conn, cutoff, note, now).await
    }
}

#[async_trait]
impl MemoryEntryStore for LibSqlBackend {
    async fn create_memory_entry(&self, entry: &MemoryEntry) -> Result<()> {
        let conn = self.db.connect()?;
        MemoryEntryRepository::create(&conn, entry).await
    }
    async fn upsert_memory_entry(&self, entry: &MemoryEntry) -> Result<MemoryEntry> {
        let conn = self.db.connect()?;
        MemoryEntryRepository::upsert(&conn, entry).await
    }
    async fn find_memory_entry(
        &self,
        user_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MemoryEntry>> {
        let conn = self.db.connect()?;
        MemoryEntryRepository::find(&conn, user_id, id, now).await
    }
    async fn get_memory_entry(
        &self,
        user_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MemoryEntry>> {
        let conn = self.db.connect()?;
        MemoryEntryRepository::get(&conn, user_id, id, now).await
    }
    async fn get_memory_entry_by_key(
        &self,
        user_id: &str,
        key: &str,
        memory_type: MemoryType,
        now: DateTime<Utc>,
    ) -> Result<Option<MemoryEntry>> {
        let conn = self.db.connect()?;
        MemoryEntryRepository::get_by_key(&conn, user_id, key, memory_type, now).await
    }
    async fn memory_entry_exists(
        &self,
        user_id: &str,
        key: &str,
        memory_type: MemoryType,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.db.connect()?;
        MemoryEntryRepository::exists_by_key(&conn, user_id, key, memory_type, now).await
    }
    async fn update_memory_entry(&self, entry: &MemoryEntry) -> Result<bool> {
        let conn = self.db.connect()?;
        MemoryEntryRepository::update(&conn, entry).await
    }
    async fn delete_memory_entry(&self, user_id: &str, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        MemoryEntryRepository::delete(&conn, user_id, id).await
    }
    async fn list_memory_entries(
        &self,
        user_id: &str,
        filter: &ListMemoryEntriesFilter,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<Page<MemoryEntry>> {
        let conn = self.db.connect()?;
        MemoryEntryRepository::list(&conn, user_id, filter, page, now).await
    }
    async fn count_live_memory_entries(&self, user_id: &str, now: DateTime<Utc>) -> Result<u64> {
        let conn = self.db.connect()?;
        MemoryEntryRepository::count_live(&conn, user_id, now).await
    }
    async fn memory_entry_stats(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MemoryEntryStats> {
        let conn = self.db.connect()?;
        MemoryEntryRepository::stats(&conn, user_id, now).await
    }
    async fn sweep_expired_memory_entries(&self, now: DateTime<Utc>) -> Result<u64> {
        let conn = self.db.connect()?;
        MemoryEntryRepository::sweep_expired(&conn, now).await
    }
}

#[async_trait]
impl FileStore for LibSqlBackend {
    async fn create_file(&self, file: &FileRecord) -> Result<()> {
        let conn = self.db.connect()?;
        FileRepository::create(&conn, file).await
    }
    async fn get_file(&self, user_id: &str, id: &str) -> Result<Option<FileRecord>> {
        let conn = self.db.connect()?;
        FileRepository::get(&conn, user_id, id).await
    }
    async fn update_file(&self, file: &FileRecord) -> Result<bool> {
        let conn = self.db.connect()?;
        FileRepository::update(&conn, file).await
    }
    async fn set_file_visibility(&self, user_id: &str, id: &str, is_public: bool) -> Result<bool> {
        let conn = self.db.connect()?;
        FileRepository::set_visibility(&conn, user_id, id, is_public).await
    }
    async fn delete_file(&self, user_id: &str, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        FileRepository::delete(&conn, user_id, id).await
    }
    async fn list_files(
        &self,
        user_id: &str,
        filter: &ListFilesFilter,
        page: PageRequest,
    ) -> Result<Page<FileRecord>> {
        let conn = self.db.connect()?;
        FileRepository::list(&conn, user_id, filter, page).await
    }
    async fn total_file_bytes(&self, user_id: &str) -> Result<u64> {
        let conn = self.db.connect()?;
        FileRepository::total_bytes(&conn, user_id).await
    }
    async fn file_stats(&self, user_id: &str) -> Result<FileStats> {
        let conn = self.db.connect()?;
        FileRepository::stats(&conn, user_id).await
    }
}

#[async_trait]
impl TaskStore for LibSqlBackend {
    async fn create_task(&self, task: &Task) -> Result<()> {
        let conn = self.db.connect()?;
        TaskRepository::create(&conn, task).await
    }
    async fn get_task(&self, user_id: &str, id: &str) -> Result<Option<Task>> {
        let conn = self.db.connect()?;
        TaskRepository::get(&conn, user_id, id).await
    }
    async fn update_task(&self, task: &Task) -> Result<bool> {
        let conn = self.db.connect()?;
        TaskRepository::update(&conn, task).await
    }
    async fn delete_task(&self, user_id: &str, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        TaskRepository::delete(&conn, user_id, id).await
    }
    async fn list_tasks(
        &self,
        user_id: &str,
        filter: &ListTasksFilter,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<Page<Task>> {
        let conn = self.db.connect()?;
        TaskRepository::list(&conn, user_id, filter, page, now).await
    }
    async fn count_tasks(&self, user_id: &str) -> Result<u64> {
        let conn = self.db.connect()?;
        TaskRepository::count(&conn, user_id).await
    }
    async fn task_stats(&self, user_id: &str, now: DateTime<Utc>) -> Result<TaskStats> {
        let conn = self.db.connect()?;
        TaskRepository::stats(&conn, user_id, now).await
    }
}

#[async_trait]
impl DatabaseBackend for LibSqlBackend {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }

    async fn ping(&self) -> Result<()> {
        let conn = self.db.connect()?;
        let mut rows = conn.query("SELECT 1", ()).await?;
        rows.next().await?;
        Ok(())
    }
}
