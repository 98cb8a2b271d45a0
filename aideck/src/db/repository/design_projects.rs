use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::db::query::{group_counts, opt_ts, parse_opt_ts, parse_ts, scalar_u64, ts, WhereBuilder};
use crate::error::Result;
use crate::models::{
    DesignAsset, DesignProject, DesignProjectStats, DesignStatus, ListDesignProjectsFilter,
    Metadata, Page, PageRequest, Pagination,
};

const COLUMNS: &str = "id, user_id, name, design_type, prompt, status, assets, color_palette, \
    metadata, error_message, completed_at, created_at, updated_at";

pub struct DesignProjectRepository;

impl DesignProjectRepository {
    pub async fn create(conn: &Connection, project: &DesignProject) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO design_projects (
                id, user_id, name, design_type, prompt, status, assets, color_palette,
                metadata, error_message, completed_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                project.id.clone(),
                project.user_id.clone(),
                project.name.clone(),
                project.design_type.to_string(),
                project.prompt.clone(),
                project.status.to_string(),
                serde_json::to_string(&project.assets)?,
                serde_json::to_string(&project.color_palette)?,
                serde_json::to_string(&project.metadata)?,
                project.error_message.clone(),
                opt_ts(&project.completed_at),
                ts(&project.created_at),
                ts(&project.updated_at),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get(conn: &Connection, user_id: &str, id: &str) -> Result<Option<DesignProject>> {
        let mut rows = conn
            .query(
                &format!("SELECT {COLUMNS} FROM design_projects WHERE id = ?1 AND user_id = ?2"),
                params![id, user_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_project(&row)?)),
            None => Ok(None),
        }
    }

    /// Persist descriptive fields. Status and assets have dedicated
    /// conditional writers.
    /// Write the editable fields. `metadata_patch` is applied in SQL as a
    /// JSON merge patch, so keys written concurrently by the stuck sweeper
    /// survive.
    pub async fn update_details(
        conn: &Connection,
        project: &DesignProject,
        metadata_patch: &Metadata,
    ) -> Result<bool> {
        let affected = conn
            .execute(
                r#"
                UPDATE design_projects SET
                    name = ?3,
                    design_type = ?4,
                    prompt = ?5,
                    color_palette = ?6,
                    metadata = json_patch(COALESCE(metadata, '{}'), ?7),
                    updated_at = ?8
                WHERE id = ?1 AND user_id = ?2
                "#,
                params![
                    project.id.clone(),
                    project.user_id.clone(),
                    project.name.clone(),
                    project.design_type.to_string(),
                    project.prompt.clone(),
                    serde_json::to_string(&project.color_palette)?,
                    serde_json::to_string(metadata_patch)?,
                    ts(&project.updated_at),
                ],
            )
            .await?;

        Ok(affected > 0)
    }

    /// Move a project from `from` to `to`. The write only lands if the stored
    /// status still equals `from`, so a concurrent transition (or the stuck
    /// sweeper) wins cleanly instead of being overwritten.
    pub async fn transition_status(
        conn: &Connection,
        user_id: &str,
        id: &str,
        from: DesignStatus,
        to: DesignStatus,
        error_message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let completed_at = (to == DesignStatus::Completed).then(|| ts(&now));
        let error_message = match to {
            DesignStatus::Failed => error_message.map(str::to_string),
            _ => None,
        };

        let affected = conn
            .execute(
                r#"
                UPDATE design_projects SET
                    status = ?4,
                    error_message = ?5,
                    completed_at = ?6,
                    updated_at = ?7
                WHERE id = ?1 AND user_id = ?2 AND status = ?3
                "#,
                params![
                    id,
                    user_id,
                    from.to_string(),
                    to.to_string(),
                    error_message,
                    completed_at,
                    ts(&now),
                ],
            )
            .await?;

        Ok(affected > 0)
    }

    pub async fn add_asset(
        conn: &Connection,
        user_id: &str,
        id: &str,
        asset: &DesignAsset,
    ) -> Result<bool> {
        let affected = conn
            .execute(
                r#"
                UPDATE design_projects SET
                    assets = json_insert(assets, '$[#]', json(?3)),
                    updated_at = ?4
                WHERE id = ?1 AND user_id = ?2
                "#,
                params![id, user_id, serde_json::to_string(asset)?, ts(&asset.created_at)],
            )
            .await?;

        Ok(affected > 0)
    }

    pub async fn delete(conn: &Connection, user_id: &str, id: &str) -> Result<bool> {
        let affected = conn
            .execute(
                "DELETE FROM design_projects WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )
            .await?;

        Ok(affected > 0)
    }

    pub async fn list(
        conn: &Connection,
        user_id: &str,
        filter: &ListDesignProjectsFilter,
        page: PageRequest,
    ) -> Result<Page<DesignProject>> {
        let mut clause = WhereBuilder::for_user(user_id);
        if let Some(status) = filter.status {
            clause.push("status = ?", status.to_string());
        }
        if let Some(design_type) = filter.design_type {
            clause.push("design_type = ?", design_type.to_string());
        }
        if let Some(ref search) = filter.search {
            clause.push_search(&["name", "prompt"], search);
        }
        clause.push_range("created_at", &filter.created);

        let total = clause.count(conn, "design_projects").await?;
        let mut rows = clause
            .query_page(
                conn,
                &format!("SELECT {COLUMNS} FROM design_projects"),
                "created_at DESC, id DESC",
                page,
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(Self::row_to_project(&row)?);
        }

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    /// Projects created at or after `since`; the unit of design credits.
    pub async fn count_created_since(
        conn: &Connection,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64> {
        scalar_u64(
            conn,
            "SELECT COUNT(*) FROM design_projects WHERE user_id = ? AND created_at >= ?",
            vec![user_id.into(), ts(&since).into()],
        )
        .await
    }

    pub async fn stats(
        conn: &Connection,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DesignProjectStats> {
        let total = scalar_u64(
            conn,
            "SELECT COUNT(*) FROM design_projects WHERE user_id = ?",
            vec![user_id.into()],
        )
        .await?;
        let by_status = group_counts(
            conn,
            "SELECT status, COUNT(*) FROM design_projects WHERE user_id = ? \
             GROUP BY status ORDER BY 2 DESC, 1 ASC",
            vec![user_id.into()],
        )
        .await?;
        let by_type = group_counts(
            conn,
            "SELECT design_type, COUNT(*) FROM design_projects WHERE user_id = ? \
             GROUP BY design_type ORDER BY 2 DESC, 1 ASC",
            vec![user_id.into()],
        )
        .await?;
        let total_assets = scalar_u64(
            conn,
            "SELECT SUM(json_array_length(assets)) FROM design_projects WHERE user_id = ?",
            vec![user_id.into()],
        )
        .await?;
        let created_last_30_days =
            Self::count_created_since(conn, user_id, now - chrono::Duration::days(30)).await?;

        Ok(DesignProjectStats {
            total,
            by_status,
            by_type,
            total_assets,
            created_last_30_days,
        })
    }

    /// Fail every project still `generating` that was created before
    /// `cutoff`, recording `note` as the error and in metadata.
    pub async fn sweep_stuck(
        conn: &Connection,
        cutoff: DateTime<Utc>,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let now = ts(&now);
        let affected = conn
            .execute(
                r#"
                UPDATE design_projects SET
                    status = 'failed',
                    error_message = ?2,
                    metadata = json_set(COALESCE(metadata, '{}'), '$.error', ?2, '$.failedAt', ?3),
                    updated_at = ?3
                WHERE status = 'generating' AND created_at < ?1
                "#,
                params![ts(&cutoff), note, now],
            )
            .await?;

        Ok(affected)
    }

    fn row_to_project(row: &libsql::Row) -> Result<DesignProject> {
        Ok(DesignProject {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            design_type: row.get::<String>(3)?.parse().unwrap_or_default(),
            prompt: row.get(4)?,
            status: row.get::<String>(5)?.parse().unwrap_or_default(),
            assets: serde_json::from_str(&row.get::<String>(6)?).unwrap_or_default(),
            color_palette: serde_json::from_str(&row.get::<String>(7)?).unwrap_or_default(),
            metadata: serde_json::from_str(&row.get::<String>(8)?).unwrap_or_default(),
            error_message: row.get(9)?,
            completed_at: parse_opt_ts(row.get(10)?),
            created_at: parse_ts(&row.get::<String>(11)?),
            updated_at: parse_ts(&row.get::<String>(12)?),
        })
    }
}
