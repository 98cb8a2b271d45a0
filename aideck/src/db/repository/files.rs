use libsql::{params, Connection};

use crate::db::query::{parse_ts, scalar_u64, ts, WhereBuilder};
use crate::error::Result;
use crate::models::{
    FileCategoryStat, FileRecord, FileStats, ListFilesFilter, Page, PageRequest, Pagination,
};

const COLUMNS: &str = "id, user_id, filename, mime_type, size, storage_path, category, \
    is_public, description, tags, created_at, updated_at";

pub struct FileRepository;

impl FileRepository {
    pub async fn create(conn: &Connection, file: &FileRecord) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO files (
                id, user_id, filename, mime_type, size, storage_path, category,
                is_public, description, tags, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                file.id.clone(),
                file.user_id.clone(),
                file.filename.clone(),
                file.mime_type.clone(),
                file.size,
                file.storage_path.clone(),
                file.category.to_string(),
                file.is_public as i64,
                file.description.clone(),
                serde_json::to_string(&file.tags)?,
                ts(&file.created_at),
                ts(&file.updated_at),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get(conn: &Connection, user_id: &str, id: &str) -> Result<Option<FileRecord>> {
        let mut rows = conn
            .query(
                &format!("SELECT {COLUMNS} FROM files WHERE id = ?1 AND user_id = ?2"),
                params![id, user_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_file(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn update(conn: &Connection, file: &FileRecord) -> Result<bool> {
        let affected = conn
            .execute(
                r#"
                UPDATE files SET
                    filename = ?3,
                    category = ?4,
                    is_public = ?5,
                    description = ?6,
                    tags = ?7,
                    updated_at = ?8
                WHERE id = ?1 AND user_id = ?2
                "#,
                params![
                    file.id.clone(),
                    file.user_id.clone(),
                    file.filename.clone(),
                    file.category.to_string(),
                    file.is_public as i64,
                    file.description.clone(),
                    serde_json::to_string(&file.tags)?,
                    ts(&file.updated_at),
                ],
            )
            .await?;

        Ok(affected > 0)
    }

    pub async fn set_visibility(
        conn: &Connection,
        user_id: &str,
        id: &str,
        is_public: bool,
    ) -> Result<bool> {
        let affected = conn
            .execute(
                "UPDATE files SET is_public = ?3, updated_at = ?4 WHERE id = ?1 AND user_id = ?2",
                params![
                    id,
                    user_id,
                    is_public as i64,
                    ts(&crate::models::utc_now())
                ],
            )
            .await?;

        Ok(affected > 0)
    }

    pub async fn delete(conn: &Connection, user_id: &str, id: &str) -> Result<bool> {
        let affected = conn
            .execute(
                "DELETE FROM files WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )
            .await?;

        Ok(affected > 0)
    }

    pub async fn list(
        conn: &Connection,
        user_id: &str,
        filter: &ListFilesFilter,
        page: PageRequest,
    ) -> Result<Page<FileRecord>> {
        let mut clause = WhereBuilder::for_user(user_id);
        if let Some(category) = filter.category {
            clause.push("category = ?", category.to_string());
        }
        if let Some(ref prefix) = filter.mime_type_prefix {
            clause.push_prefix("lower(mime_type)", &prefix.to_ascii_lowercase());
        }
        if let Some(is_public) = filter.is_public {
            clause.push("is_public = ?", is_public as i64);
        }
        if let Some(ref search) = filter.search {
            clause.push_search(&["filename"], search);
        }
        if let Some(min) = filter.min_size {
            clause.push("size >= ?", min);
        }
        if let Some(max) = filter.max_size {
            clause.push("size <= ?", max);
        }
        clause.push_range("created_at", &filter.created);

        let total = clause.count(conn, "files").await?;
        let mut rows = clause
            .query_page(
                conn,
                &format!("SELECT {COLUMNS} FROM files"),
                "created_at DESC, id DESC",
                page,
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(Self::row_to_file(&row)?);
        }

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    /// Bytes currently registered to `user_id`.
    pub async fn total_bytes(conn: &Connection, user_id: &str) -> Result<u64> {
        scalar_u64(
            conn,
            "SELECT SUM(size) FROM files WHERE user_id = ?",
            vec![user_id.into()],
        )
        .await
    }

    pub async fn stats(conn: &Connection, user_id: &str) -> Result<FileStats> {
        let mut rows = conn
            .query(
                "SELECT category, COUNT(*), COALESCE(SUM(size), 0) FROM files \
                 WHERE user_id = ?1 GROUP BY category ORDER BY 2 DESC, 1 ASC",
                params![user_id],
            )
            .await?;

        let mut by_category = Vec::new();
        while let Some(row) = rows.next().await? {
            by_category.push(FileCategoryStat {
                category: row.get(0)?,
                count: row.get::<i64>(1)?.max(0) as u64,
                total_bytes: row.get::<i64>(2)?.max(0) as u64,
            });
        }

        let public_count = scalar_u64(
            conn,
            "SELECT COUNT(*) FROM files WHERE user_id = ? AND is_public = 1",
            vec![user_id.into()],
        )
        .await?;

        Ok(FileStats {
            total: by_category.iter().map(|c| c.count).sum(),
            total_bytes: by_category.iter().map(|c| c.total_bytes).sum(),
            public_count,
            by_category,
        })
    }

    fn row_to_file(row: &libsql::Row) -> Result<FileRecord> {
        Ok(FileRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            filename: row.get(2)?,
            mime_type: row.get(3)?,
            size: row.get(4)?,
            storage_path: row.get(5)?,
            category: row.get::<String>(6)?.parse().unwrap_or_default(),
            is_public: row.get::<i64>(7)? != 0,
            description: row.get(8)?,
            tags: serde_json::from_str(&row.get::<String>(9)?).unwrap_or_default(),
            created_at: parse_ts(&row.get::<String>(10)?),
            updated_at: parse_ts(&row.get::<String>(11)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_schema;
    use crate::models::{utc_now, FileCategory};
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    async fn setup_test_db() -> Connection {
        let conn = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap()
            .connect()
            .unwrap();
        init_schema(&conn).await.unwrap();
        conn
    }

    fn file(id: &str, filename: &str, mime: &str, size: i64) -> FileRecord {
        FileRecord::new(
            id.into(),
            "u1".into(),
            filename.into(),
            mime.into(),
            size,
            format!("uploads/u1/{filename}"),
        )
    }

    #[tokio::test]
    async fn test_create_get_and_visibility() {
        let conn = setup_test_db().await;
        FileRepository::create(&conn, &file("f1", "logo.png", "image/png", 2048))
            .await
            .unwrap();

        assert!(FileRepository::set_visibility(&conn, "u1", "f1", true)
            .await
            .unwrap());
        assert!(!FileRepository::set_visibility(&conn, "u2", "f1", false)
            .await
            .unwrap());

        let loaded = FileRepository::get(&conn, "u1", "f1").await.unwrap().unwrap();
        assert_eq!(loaded.category, FileCategory::Image);
        assert!(loaded.is_public);
        assert_eq!(loaded.storage_path, "uploads/u1/logo.png");
    }

    #[tokio::test]
    async fn test_list_filters() {
        let conn = setup_test_db().await;
        let now = utc_now();
        let fixtures = [
            ("f1", "a.png", "image/png", 100),
            ("f2", "b.jpg", "IMAGE/JPEG", 5_000),
            ("f3", "data.json", "application/json", 300),
            ("f4", "notes_2026.txt", "text/plain", 50),
        ];
        for (i, (id, name, mime, size)) in fixtures.into_iter().enumerate() {
            let mut f = file(id, name, mime, size);
            f.created_at = now - Duration::minutes(i as i64);
            FileRepository::create(&conn, &f).await.unwrap();
        }

        let filter = ListFilesFilter {
            mime_type_prefix: Some("image/".into()),
            ..Default::default()
        };
        let page = FileRepository::list(&conn, "u1", &filter, PageRequest::default())
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["f1", "f2"]);

        let filter = ListFilesFilter {
            min_size: Some(100),
            max_size: Some(1_000),
            ..Default::default()
        };
        let page = FileRepository::list(&conn, "u1", &filter, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 2);

        // `_` in the search term must match literally
        let filter = ListFilesFilter {
            search: Some("s_2".into()),
            ..Default::default()
        };
        let page = FileRepository::list(&conn, "u1", &filter, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "f4");

        let filter = ListFilesFilter {
            category: Some(FileCategory::Data),
            ..Default::default()
        };
        let page = FileRepository::list(&conn, "u1", &filter, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.items[0].id, "f3");
    }

    #[tokio::test]
    async fn test_stats_and_total_bytes() {
        let conn = setup_test_db().await;
        FileRepository::create(&conn, &file("f1", "a.png", "image/png", 100))
            .await
            .unwrap();
        FileRepository::create(&conn, &file("f2", "b.png", "image/png", 150))
            .await
            .unwrap();
        FileRepository::create(&conn, &file("f3", "c.zip", "application/zip", 1000))
            .await
            .unwrap();
        FileRepository::set_visibility(&conn, "u1", "f3", true)
            .await
            .unwrap();

        let stats = FileRepository::stats(&conn, "u1").await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.total_bytes, 1250);
        assert_eq!(stats.public_count, 1);
        assert_eq!(
            stats.by_category[0],
            FileCategoryStat {
                category: "image".into(),
                count: 2,
                total_bytes: 250
            }
        );

        assert_eq!(FileRepository::total_bytes(&conn, "u1").await.unwrap(), 1250);
        assert_eq!(FileRepository::total_bytes(&conn, "u2").await.unwrap(), 0);
    }
}
