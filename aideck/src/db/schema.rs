use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Chat conversations; messages are an embedded JSON array
        CREATE TABLE IF NOT EXISTS conversations (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT 'New Conversation',
            messages TEXT NOT NULL DEFAULT '[]',
            message_count INTEGER NOT NULL DEFAULT 0,
            total_tokens INTEGER NOT NULL DEFAULT 0,
            model TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            last_message_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_user_active_activity
            ON conversations(user_id, is_active, COALESCE(last_message_at, created_at) DESC);
        CREATE INDEX IF NOT EXISTS idx_conversations_user_created
            ON conversations(user_id, created_at DESC);

        -- Design projects
        CREATE TABLE IF NOT EXISTS design_projects (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            design_type TEXT NOT NULL DEFAULT 'other',
            prompt TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'generating',
            assets TEXT NOT NULL DEFAULT '[]',
            color_palette TEXT NOT NULL DEFAULT '[]',
            metadata TEXT NOT NULL DEFAULT '{}',
            error_message TEXT,
            completed_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_design_projects_user_status
            ON design_projects(user_id, status);
        CREATE INDEX IF NOT EXISTS idx_design_projects_user_created
            ON design_projects(user_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_design_projects_status_created
            ON design_projects(status, created_at);

        -- Memory entries
        CREATE TABLE IF NOT EXISTS memory_entries (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            memory_type TEXT NOT NULL DEFAULT 'fact',
            key TEXT NOT NULL,
            value TEXT NOT NULL DEFAULT 'null',
            importance INTEGER NOT NULL DEFAULT 5,
            tags TEXT NOT NULL DEFAULT '[]',
            expires_at TEXT,
            access_count INTEGER NOT NULL DEFAULT 0,
            last_accessed_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_memory_entries_user_key_type
            ON memory_entries(user_id, key, memory_type);
        CREATE INDEX IF NOT EXISTS idx_memory_entries_user_importance
            ON memory_entries(user_id, importance DESC, updated_at DESC);
        CREATE INDEX IF NOT EXISTS idx_memory_entries_expires_at
            ON memory_entries(expires_at) WHERE expires_at IS NOT NULL;

        -- Uploaded file records
        CREATE TABLE IF NOT EXISTS files (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            filename TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            size INTEGER NOT NULL DEFAULT 0,
            storage_path TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'other',
            is_public INTEGER NOT NULL DEFAULT 0,
            description TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_files_user_category
            ON files(user_id, category);
        CREATE INDEX IF NOT EXISTS idx_files_user_created
            ON files(user_id, created_at DESC);

        -- Tasks
        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'todo',
            priority TEXT NOT NULL DEFAULT 'medium',
            due_date TEXT,
            assignee_email TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            completed_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_user_status
            ON tasks(user_id, status);
        CREATE INDEX IF NOT EXISTS idx_tasks_user_due
            ON tasks(user_id, due_date);
        "#,
    )
    .await?;

    add_column_if_missing(
        conn,
        "conversations",
        "auto_title_pending",
        "INTEGER NOT NULL DEFAULT 1",
    )
    .await?;

    Ok(())
}

/// Add a column to an existing table unless it is already there.
async fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    definition: &str,
) -> Result<()> {
    let mut rows = conn
        .query(
            &format!("SELECT COUNT(*) FROM pragma_table_info('{table}') WHERE name = ?1"),
            libsql::params![column],
        )
        .await?;

    let exists = match rows.next().await? {
        Some(row) => row.get::<i64>(0)? > 0,
        None => false,
    };

    if !exists {
        tracing::info!(table, column, "Adding missing column");
        conn.execute(
            &format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"),
            (),
        )
        .await?;
    }

    Ok(())
}
