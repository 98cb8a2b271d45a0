use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::db::query::{group_counts, opt_ts, parse_opt_ts, parse_ts, scalar_u64, ts, WhereBuilder};
use crate::error::Result;
use crate::models::{ListTasksFilter, Page, PageRequest, Pagination, Task, TaskStats};

const COLUMNS: &str = "id, user_id, title, description, status, priority, due_date, \
    assignee_email, tags, completed_at, created_at, updated_at";

const PRIORITY_WEIGHT: &str = "CASE priority WHEN 'urgent' THEN 4 WHEN 'high' THEN 3 \
    WHEN 'medium' THEN 2 ELSE 1 END";

/// Open task whose due date has passed. Binds `now` once.
const OVERDUE: &str = "(status IN ('todo', 'in_progress') AND due_date IS NOT NULL AND due_date < ?)";

pub struct TaskRepository;

impl TaskRepository {
    pub async fn create(conn: &Connection, task: &Task) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO tasks (
                id, user_id, title, description, status, priority, due_date,
                assignee_email, tags, completed_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                task.id.clone(),
                task.user_id.clone(),
                task.title.clone(),
                task.description.clone(),
                task.status.to_string(),
                task.priority.to_string(),
                opt_ts(&task.due_date),
                task.assignee_email.clone(),
                serde_json::to_string(&task.tags)?,
                opt_ts(&task.completed_at),
                ts(&task.created_at),
                ts(&task.updated_at),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Task>> {
        let mut rows = conn
            .query(
                &format!("SELECT {COLUMNS} FROM tasks WHERE id = ?1 AND user_id = ?2"),
                params![id, user_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_task(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn update(conn: &Connection, task: &Task) -> Result<bool> {
        let affected = conn
            .execute(
                r#"
                UPDATE tasks SET
                    title = ?3,
                    description = ?4,
                    status = ?5,
                    priority = ?6,
                    due_date = ?7,
                    assignee_email = ?8,
                    tags = ?9,
                    completed_at = ?10,
                    updated_at = ?11
                WHERE id = ?1 AND user_id = ?2
                "#,
                params![
                    task.id.clone(),
                    task.user_id.clone(),
                    task.title.clone(),
                    task.description.clone(),
                    task.status.to_string(),
                    task.priority.to_string(),
                    opt_ts(&task.due_date),
                    task.assignee_email.clone(),
                    serde_json::to_string(&task.tags)?,
                    opt_ts(&task.completed_at),
                    ts(&task.updated_at),
                ],
            )
            .await?;

        Ok(affected > 0)
    }

    pub async fn delete(conn: &Connection, user_id: &str, id: &str) -> Result<bool> {
        let affected = conn
            .execute(
                "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )
            .await?;

        Ok(affected > 0)
    }

    pub async fn list(
        conn: &Connection,
        user_id: &str,
        filter: &ListTasksFilter,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<Page<Task>> {
        let mut clause = WhereBuilder::for_user(user_id);
        if let Some(status) = filter.status {
            clause.push("status = ?", status.to_string());
        }
        if let Some(priority) = filter.priority {
            clause.push("priority = ?", priority.to_string());
        }
        if let Some(ref tag) = filter.tag {
            clause.push_tag("tags", tag);
        }
        if let Some(ref search) = filter.search {
            clause.push_search(&["title", "description"], search);
        }
        clause.push_range("due_date", &filter.due);
        match filter.overdue {
            Some(true) => {
                clause.push(OVERDUE, ts(&now));
            }
            Some(false) => {
                clause.push(format!("NOT {OVERDUE}"), ts(&now));
            }
            None => {}
        }

        let total = clause.count(conn, "tasks").await?;
        let order = format!(
            "due_date IS NULL, due_date ASC, {PRIORITY_WEIGHT} DESC, created_at DESC, id DESC"
        );
        let mut rows = clause
            .query_page(conn, &format!("SELECT {COLUMNS} FROM tasks"), &order, page)
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(Self::row_to_task(&row)?);
        }

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn count(conn: &Connection, user_id: &str) -> Result<u64> {
        scalar_u64(
            conn,
            "SELECT COUNT(*) FROM tasks WHERE user_id = ?",
            vec![user_id.into()],
        )
        .await
    }

    pub async fn stats(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<TaskStats> {
        let by_status = group_counts(
            conn,
            "SELECT status, COUNT(*) FROM tasks WHERE user_id = ? \
             GROUP BY status ORDER BY 2 DESC, 1 ASC",
            vec![user_id.into()],
        )
        .await?;
        let by_priority = group_counts(
            conn,
            &format!(
                "SELECT priority, COUNT(*) FROM tasks WHERE user_id = ? \
                 GROUP BY priority ORDER BY {PRIORITY_WEIGHT} DESC"
            ),
            vec![user_id.into()],
        )
        .await?;
        let overdue = scalar_u64(
            conn,
            &format!("SELECT COUNT(*) FROM tasks WHERE user_id = ? AND {OVERDUE}"),
            vec![user_id.into(), ts(&now).into()],
        )
        .await?;

        Ok(TaskStats {
            total: by_status.iter().map(|g| g.count).sum(),
            by_status,
            by_priority,
            overdue,
        })
    }

    fn row_to_task(row: &libsql::Row) -> Result<Task> {
        Ok(Task {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            status: row.get::<String>(4)?.parse().unwrap_or_default(),
            priority: row.get::<String>(5)?.parse().unwrap_or_default(),
            due_date: parse_opt_ts(row.get(6)?),
            assignee_email: row.get(7)?,
            tags: serde_json::from_str(&row.get::<String>(8)?).unwrap_or_default(),
            completed_at: parse_opt_ts(row.get(9)?),
            created_at: parse_ts(&row.get::<String>(10)?),
            updated_at: parse_ts(&row.get::<String>(11)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_schema;
    use crate::models::{utc_now, TaskPriority, TaskStatus};
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

    fn task(id: &str) -> Task {
        Task::new(id.into(), "u1".into(), format!("Task {id}"))
    }

    #[tokio::test]
    async fn test_update_persists_status_and_completion() {
        let conn = setup_test_db().await;
        let mut t = task("t1");
        TaskRepository::create(&conn, &t).await.unwrap();

        let now = utc_now();
        t.set_status(TaskStatus::Done, now);
        t.updated_at = now;
        assert!(TaskRepository::update(&conn, &t).await.unwrap());

        let loaded = TaskRepository::get(&conn, "u1", "t1").await.unwrap().unwrap();
        assert_eq!(loaded.status, TaskStatus::Done);
        assert_eq!(loaded.completed_at, Some(now));
        assert!(TaskRepository::get(&conn, "u2", "t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_orders_by_due_date_then_priority() {
        let conn = setup_test_db().await;
        let now = utc_now();

        let mut soon_low = task("soon_low");
        soon_low.due_date = Some(now + Duration::days(1));
        soon_low.priority = TaskPriority::Low;
        let mut soon_urgent = task("soon_urgent");
        soon_urgent.due_date = Some(now + Duration::days(1));
        soon_urgent.priority = TaskPriority::Urgent;
        let mut later = task("later");
        later.due_date = Some(now + Duration::days(7));
        let undated = task("undated");
        for t in [&undated, &later, &soon_low, &soon_urgent] {
            TaskRepository::create(&conn, t).await.unwrap();
        }

        let page = TaskRepository::list(
            &conn,
            "u1",
            &ListTasksFilter::default(),
            PageRequest::default(),
            now,
        )
        .await
        .unwrap();
        let ids: Vec<_> = page.items.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["soon_urgent", "soon_low", "later", "undated"]);
    }

    #[tokio::test]
    async fn test_overdue_filter_and_stats() {
        let conn = setup_test_db().await;
        let now = utc_now();

        let mut late = task("late");
        late.due_date = Some(now - Duration::days(2));
        let mut late_but_done = task("late_done");
        late_but_done.due_date = Some(now - Duration::days(2));
        late_but_done.set_status(TaskStatus::Done, now);
        let mut upcoming = task("upcoming");
        upcoming.due_date = Some(now + Duration::days(2));
        upcoming.tags = vec!["home".into()];
        upcoming.priority = TaskPriority::High;
        for t in [&late, &late_but_done, &upcoming] {
            TaskRepository::create(&conn, t).await.unwrap();
        }

        let filter = ListTasksFilter {
            overdue: Some(true),
            ..Default::default()
        };
        let page = TaskRepository::list(&conn, "u1", &filter, PageRequest::default(), now)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "late");

        let filter = ListTasksFilter {
            overdue: Some(false),
            ..Default::default()
        };
        let page = TaskRepository::list(&conn, "u1", &filter, PageRequest::default(), now)
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 2);

        let filter = ListTasksFilter {
            tag: Some("home".into()),
            ..Default::default()
        };
        let page = TaskRepository::list(&conn, "u1", &filter, PageRequest::default(), now)
            .await
            .unwrap();
        assert_eq!(page.items[0].id, "upcoming");

        let stats = TaskRepository::stats(&conn, "u1", now).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.by_priority[0].key, "high");
        assert_eq!(TaskRepository::count(&conn, "u1").await.unwrap(), 3);
    }
}
