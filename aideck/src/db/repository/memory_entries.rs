use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::db::query::{group_counts, opt_ts, parse_opt_ts, parse_ts, scalar_u64, ts, WhereBuilder};
use crate::error::{map_unique_violation, Result};
use crate::models::{
    ListMemoryEntriesFilter, MemoryEntry, MemoryEntryStats, MemoryType, MemoryTypeStat, Page,
    PageRequest, Pagination,
};

const COLUMNS: &str = "id, user_id, memory_type, key, value, importance, tags, expires_at, \
    access_count, last_accessed_at, created_at, updated_at";

/// Predicate that hides entries past their expiry. Binds `now` once.
const NOT_EXPIRED: &str = "(expires_at IS NULL OR expires_at > ?)";

const TOP_TAGS_LIMIT: i64 = 10;

pub struct MemoryEntryRepository;

impl MemoryEntryRepository {
    /// Drop an expired row occupying `entry`'s `(user, key, type)` slot so
    /// the new entry starts fresh instead of inheriting it.
    async fn purge_expired_slot(conn: &Connection, entry: &MemoryEntry) -> Result<()> {
        conn.execute(
            r#"
            DELETE FROM memory_entries
            WHERE user_id = ?1 AND key = ?2 AND memory_type = ?3
              AND expires_at IS NOT NULL AND expires_at <= ?4
            "#,
            params![
                entry.user_id.clone(),
                entry.key.clone(),
                entry.memory_type.to_string(),
                ts(&entry.updated_at),
            ],
        )
        .await?;
        Ok(())
    }

    /// Insert a new entry. A second live entry with the same
    /// `(user, key, type)` is a conflict.
    pub async fn create(conn: &Connection, entry: &MemoryEntry) -> Result<()> {
        Self::purge_expired_slot(conn, entry).await?;
        conn.execute(
            r#"
            INSERT INTO memory_entries (
                id, user_id, memory_type, key, value, importance, tags, expires_at,
                access_count, last_accessed_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                entry.id.clone(),
                entry.user_id.clone(),
                entry.memory_type.to_string(),
                entry.key.clone(),
                serde_json::to_string(&entry.value)?,
                entry.importance,
                serde_json::to_string(&entry.tags)?,
                opt_ts(&entry.expires_at),
                entry.access_count,
                opt_ts(&entry.last_accessed_at),
                ts(&entry.created_at),
                ts(&entry.updated_at),
            ],
        )
        .await
        .map_err(|e| map_unique_violation(e, "Memory entry with this key and type"))?;

        Ok(())
    }

    /// Insert or, when `(user, key, type)` already exists, overwrite its
    /// value, importance, tags and expiry. Identity, creation time and access
    /// bookkeeping of the existing row are kept. Returns the stored entry.
    pub async fn upsert(conn: &Connection, entry: &MemoryEntry) -> Result<MemoryEntry> {
        Self::purge_expired_slot(conn, entry).await?;
        conn.execute(
            r#"
            INSERT INTO memory_entries (
                id, user_id, memory_type, key, value, importance, tags, expires_at,
                access_count, last_accessed_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, NULL, ?9, ?10)
            ON CONFLICT(user_id, key, memory_type) DO UPDATE SET
                value = excluded.value,
                importance = excluded.importance,
                tags = excluded.tags,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
            params![
                entry.id.clone(),
                entry.user_id.clone(),
                entry.memory_type.to_string(),
                entry.key.clone(),
                serde_json::to_string(&entry.value)?,
                entry.importance,
                serde_json::to_string(&entry.tags)?,
                opt_ts(&entry.expires_at),
                ts(&entry.created_at),
                ts(&entry.updated_at),
            ],
        )
        .await?;

        let mut rows = conn
            .query(
                &format!(
                    "SELECT {COLUMNS} FROM memory_entries \
                     WHERE user_id = ?1 AND key = ?2 AND memory_type = ?3"
                ),
                params![
                    entry.user_id.clone(),
                    entry.key.clone(),
                    entry.memory_type.to_string()
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_entry(&row),
            None => Err(crate::error::AideckError::Internal(
                "Upserted memory entry could not be read back".to_string(),
            )),
        }
    }

    /// Read without touching access bookkeeping. Expired entries are hidden.
    pub async fn find(
        conn: &Connection,
        user_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MemoryEntry>> {
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {COLUMNS} FROM memory_entries \
                     WHERE id = ? AND user_id = ? AND {NOT_EXPIRED}"
                ),
                params![id, user_id, ts(&now)],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_entry(&row)?)),
            None => Ok(None),
        }
    }

    /// Read by id, counting the access.
    pub async fn get(
        conn: &Connection,
        user_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MemoryEntry>> {
        let mut rows = conn
            .query(
                &format!(
                    "UPDATE memory_entries SET access_count = access_count + 1, \
                     last_accessed_at = ? \
                     WHERE id = ? AND user_id = ? AND {NOT_EXPIRED} \
                     RETURNING {COLUMNS}"
                ),
                params![ts(&now), id, user_id, ts(&now)],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_entry(&row)?)),
            None => Ok(None),
        }
    }

    /// Read by `(key, type)`, counting the access.
    pub async fn get_by_key(
        conn: &Connection,
        user_id: &str,
        key: &str,
        memory_type: MemoryType,
        now: DateTime<Utc>,
    ) -> Result<Option<MemoryEntry>> {
        let mut rows = conn
            .query(
                &format!(
                    "UPDATE memory_entries SET access_count = access_count + 1, \
                     last_accessed_at = ? \
                     WHERE user_id = ? AND key = ? AND memory_type = ? AND {NOT_EXPIRED} \
                     RETURNING {COLUMNS}"
                ),
                params![
                    ts(&now),
                    user_id,
                    key,
                    memory_type.to_string(),
                    ts(&now)
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_entry(&row)?)),
            None => Ok(None),
        }
    }

    /// Whether a live entry with this `(key, type)` exists. No bookkeeping.
    pub async fn exists_by_key(
        conn: &Connection,
        user_id: &str,
        key: &str,
        memory_type: MemoryType,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let count = scalar_u64(
            conn,
            &format!(
                "SELECT COUNT(*) FROM memory_entries \
                 WHERE user_id = ? AND key = ? AND memory_type = ? AND {NOT_EXPIRED}"
            ),
            vec![
                user_id.into(),
                key.into(),
                memory_type.to_string().into(),
                ts(&now).into(),
            ],
        )
        .await?;
        Ok(count > 0)
    }

    /// Persist the mutable fields of an entry.
    pub async fn update(conn: &Connection, entry: &MemoryEntry) -> Result<bool> {
        let affected = conn
            .execute(
                r#"
                UPDATE memory_entries SET
                    value = ?3,
                    importance = ?4,
                    tags = ?5,
                    expires_at = ?6,
                    updated_at = ?7
                WHERE id = ?1 AND user_id = ?2
                "#,
                params![
                    entry.id.clone(),
                    entry.user_id.clone(),
                    serde_json::to_string(&entry.value)?,
                    entry.importance,
                    serde_json::to_string(&entry.tags)?,
                    opt_ts(&entry.expires_at),
                    ts(&entry.updated_at),
                ],
            )
            .await?;

        Ok(affected > 0)
    }

    pub async fn delete(conn: &Connection, user_id: &str, id: &str) -> Result<bool> {
        let affected = conn
            .execute(
                "DELETE FROM memory_entries WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )
            .await?;

        Ok(affected > 0)
    }

    pub async fn list(
        conn: &Connection,
        user_id: &str,
        filter: &ListMemoryEntriesFilter,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<Page<MemoryEntry>> {
        let mut clause = WhereBuilder::for_user(user_id);
        if let Some(memory_type) = filter.memory_type {
            clause.push("memory_type = ?", memory_type.to_string());
        }
        if let Some(ref tag) = filter.tag {
            clause.push_tag("tags", tag);
        }
        if let Some(ref search) = filter.search {
            clause.push_search(&["key"], search);
        }
        if let Some(min) = filter.min_importance {
            clause.push("importance >= ?", min);
        }
        if !filter.include_expired {
            clause.push(NOT_EXPIRED, ts(&now));
        }

        let total = clause.count(conn, "memory_entries").await?;
        let mut rows = clause
            .query_page(
                conn,
                &format!("SELECT {COLUMNS} FROM memory_entries"),
                "importance DESC, updated_at DESC, id DESC",
                page,
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(Self::row_to_entry(&row)?);
        }

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    /// Live (unexpired) entries owned by `user_id`.
    pub async fn count_live(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<u64> {
        scalar_u64(
            conn,
            &format!("SELECT COUNT(*) FROM memory_entries WHERE user_id = ? AND {NOT_EXPIRED}"),
            vec![user_id.into(), ts(&now).into()],
        )
        .await
    }

    pub async fn stats(
        conn: &Connection,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MemoryEntryStats> {
        let now = ts(&now);

        let mut rows = conn
            .query(
                &format!(
                    "SELECT memory_type, COUNT(*), AVG(importance) FROM memory_entries \
                     WHERE user_id = ? AND {NOT_EXPIRED} \
                     GROUP BY memory_type ORDER BY 2 DESC, 1 ASC"
                ),
                params![user_id, now.clone()],
            )
            .await?;
        let mut by_type = Vec::new();
        while let Some(row) = rows.next().await? {
            let avg: f64 = row.get::<Option<f64>>(2)?.unwrap_or(0.0);
            by_type.push(MemoryTypeStat {
                memory_type: row.get(0)?,
                count: row.get::<i64>(1)?.max(0) as u64,
                avg_importance: (avg * 100.0).round() / 100.0,
            });
        }
        let total = by_type.iter().map(|t| t.count).sum();

        let top_tags = group_counts(
            conn,
            &format!(
                "SELECT json_each.value, COUNT(*) FROM memory_entries, json_each(memory_entries.tags) \
                 WHERE memory_entries.user_id = ? AND \
                 (memory_entries.expires_at IS NULL OR memory_entries.expires_at > ?) \
                 GROUP BY json_each.value ORDER BY 2 DESC, 1 ASC LIMIT {TOP_TAGS_LIMIT}"
            ),
            vec![user_id.into(), now.clone().into()],
        )
        .await?;

        let expired_pending_cleanup = scalar_u64(
            conn,
            "SELECT COUNT(*) FROM memory_entries WHERE user_id = ? AND expires_at <= ?",
            vec![user_id.into(), now.into()],
        )
        .await?;

        Ok(MemoryEntryStats {
            total,
            by_type,
            top_tags,
            expired_pending_cleanup,
        })
    }

    /// Delete every entry whose expiry has passed, across all users.
    pub async fn sweep_expired(conn: &Connection, now: DateTime<Utc>) -> Result<u64> {
        let deleted = conn
            .execute(
                "DELETE FROM memory_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![ts(&now)],
            )
            .await?;

        Ok(deleted)
    }

    fn row_to_entry(row: &libsql::Row) -> Result<MemoryEntry> {
        Ok(MemoryEntry {
            id: row.get(0)?,
            user_id: row.get(1)?,
            memory_type: row.get::<String>(2)?.parse().unwrap_or_default(),
            key: row.get(3)?,
            value: serde_json::from_str(&row.get::<String>(4)?)
                .unwrap_or(serde_json::Value::Null),
            importance: row.get(5)?,
            tags: serde_json::from_str(&row.get::<String>(6)?).unwrap_or_default(),
            expires_at: parse_opt_ts(row.get(7)?),
            access_count: row.get(8)?,
            last_accessed_at: parse_opt_ts(row.get(9)?),
            created_at: parse_ts(&row.get::<String>(10)?),
            updated_at: parse_ts(&row.get::<String>(11)?),
        })
    }
}
