use libsql::{params, Connection};

use crate::db::query::{group_counts, opt_ts, parse_opt_ts, parse_ts, scalar_u64, ts, WhereBuilder};
use crate::error::Result;
use crate::models::{
    derive_title, ChatMessage, Conversation, ConversationStats, ListConversationsFilter,
    MessageRole, Page, PageRequest, Pagination,
};

const COLUMNS: &str = "id, user_id, title, auto_title_pending, messages, message_count, \
    total_tokens, model, is_active, last_message_at, created_at, updated_at";

/// Listing skips the message array; summaries never show it.
const SUMMARY_COLUMNS: &str = "id, user_id, title, auto_title_pending, '[]', message_count, \
    total_tokens, model, is_active, last_message_at, created_at, updated_at";

const ACTIVITY_ORDER: &str = "COALESCE(last_message_at, created_at) DESC, id DESC";

pub struct ConversationRepository;

impl ConversationRepository {
    pub async fn create(conn: &Connection, conv: &Conversation) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO conversations (
                id, user_id, title, auto_title_pending, messages, message_count,
                total_tokens, model, is_active, last_message_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                conv.id.clone(),
                conv.user_id.clone(),
                conv.title.clone(),
                conv.auto_title_pending as i64,
                serde_json::to_string(&conv.messages)?,
                conv.message_count,
                conv.total_tokens,
                conv.model.clone(),
                conv.is_active as i64,
                opt_ts(&conv.last_message_at),
                ts(&conv.created_at),
                ts(&conv.updated_at),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Conversation>> {
        let mut rows = conn
            .query(
                &format!("SELECT {COLUMNS} FROM conversations WHERE id = ?1 AND user_id = ?2"),
                params![id, user_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_conversation(&row)?)),
            None => Ok(None),
        }
    }

    /// Persist the scalar fields of a conversation. Messages are only ever
    /// changed through [`Self::append_message`].
    pub async fn update(conn: &Connection, conv: &Conversation) -> Result<bool> {
        let affected = conn
            .execute(
                r#"
                UPDATE conversations SET
                    title = ?3,
                    auto_title_pending = ?4,
                    model = ?5,
                    is_active = ?6,
                    updated_at = ?7
                WHERE id = ?1 AND user_id = ?2
                "#,
                params![
                    conv.id.clone(),
                    conv.user_id.clone(),
                    conv.title.clone(),
                    conv.auto_title_pending as i64,
                    conv.model.clone(),
                    conv.is_active as i64,
                    ts(&conv.updated_at),
                ],
            )
            .await?;

        Ok(affected > 0)
    }

    /// Soft delete. Returns false when the conversation is missing or already
    /// inactive.
    pub async fn deactivate(conn: &Connection, user_id: &str, id: &str) -> Result<bool> {
        let affected = conn
            .execute(
                "UPDATE conversations SET is_active = 0, updated_at = ?3 \
                 WHERE id = ?1 AND user_id = ?2 AND is_active = 1",
                params![id, user_id, ts(&crate::models::utc_now())],
            )
            .await?;

        Ok(affected > 0)
    }

    /// Append one message in a single statement so concurrent appends never
    /// lose each other. The first user message names a conversation still
    /// carrying its default title. Returns false when the conversation is
    /// missing or inactive.
    pub async fn append_message(
        conn: &Connection,
        user_id: &str,
        id: &str,
        message: &ChatMessage,
    ) -> Result<bool> {
        let is_user = message.role == MessageRole::User;
        let derived_title = derive_title(&message.content);

        let affected = conn
            .execute(
                r#"
                UPDATE conversations SET
                    messages = json_insert(messages, '$[#]', json(?3)),
                    message_count = message_count + 1,
                    total_tokens = total_tokens + ?4,
                    last_message_at = ?5,
                    updated_at = ?5,
                    title = CASE WHEN auto_title_pending = 1 AND ?6 = 1 THEN ?7 ELSE title END,
                    auto_title_pending = CASE WHEN ?6 = 1 THEN 0 ELSE auto_title_pending END
                WHERE id = ?1 AND user_id = ?2 AND is_active = 1
                "#,
                params![
                    id,
                    user_id,
                    serde_json::to_string(message)?,
                    message.token_count,
                    ts(&message.timestamp),
                    is_user as i64,
                    derived_title,
                ],
            )
            .await?;

        Ok(affected > 0)
    }

    pub async fn list(
        conn: &Connection,
        user_id: &str,
        filter: &ListConversationsFilter,
        page: PageRequest,
    ) -> Result<Page<Conversation>> {
        let mut clause = WhereBuilder::for_user(user_id);
        if let Some(active) = filter.is_active {
            clause.push("is_active = ?", active as i64);
        }
        if let Some(ref model) = filter.model {
            clause.push("model = ?", model.clone());
        }
        if let Some(ref search) = filter.search {
            clause.push_search(&["title"], search);
        }
        clause.push_range("created_at", &filter.created);

        let total = clause.count(conn, "conversations").await?;
        let mut rows = clause
            .query_page(
                conn,
                &format!("SELECT {SUMMARY_COLUMNS} FROM conversations"),
                ACTIVITY_ORDER,
                page,
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(Self::row_to_conversation(&row)?);
        }

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn count_active(conn: &Connection, user_id: &str) -> Result<u64> {
        scalar_u64(
            conn,
            "SELECT COUNT(*) FROM conversations WHERE user_id = ? AND is_active = 1",
            vec![user_id.into()],
        )
        .await
    }

    pub async fn stats(conn: &Connection, user_id: &str) -> Result<ConversationStats> {
        let mut rows = conn
            .query(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN is_active = 1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(message_count), 0),
                    COALESCE(SUM(total_tokens), 0),
                    COALESCE(SUM(CASE WHEN is_active = 1 THEN message_count ELSE 0 END), 0)
                FROM conversations
                WHERE user_id = ?1
                "#,
                params![user_id],
            )
            .await?;

        let (total, active, total_messages, total_tokens, active_messages) =
            match rows.next().await? {
                Some(row) => (
                    row.get::<i64>(0)?.max(0) as u64,
                    row.get::<i64>(1)?.max(0) as u64,
                    row.get::<i64>(2)?.max(0) as u64,
                    row.get::<i64>(3)?.max(0) as u64,
                    row.get::<i64>(4)?.max(0) as u64,
                ),
                None => (0, 0, 0, 0, 0),
            };

        let by_model = group_counts(
            conn,
            "SELECT COALESCE(model, 'unspecified'), COUNT(*) FROM conversations \
             WHERE user_id = ? GROUP BY 1 ORDER BY 2 DESC, 1 ASC",
            vec![user_id.into()],
        )
        .await?;

        let avg_messages_per_active = if active == 0 {
            0.0
        } else {
            active_messages as f64 / active as f64
        };

        Ok(ConversationStats {
            total,
            active,
            inactive: total - active,
            total_messages,
            total_tokens,
            avg_messages_per_active,
            by_model,
        })
    }

    fn row_to_conversation(row: &libsql::Row) -> Result<Conversation> {
        Ok(Conversation {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            auto_title_pending: row.get::<i64>(3)? != 0,
            messages: serde_json::from_str(&row.get::<String>(4)?).unwrap_or_default(),
            message_count: row.get(5)?,
            total_tokens: row.get(6)?,
            model: row.get(7)?,
            is_active: row.get::<i64>(8)? != 0,
            last_message_at: parse_opt_ts(row.get(9)?),
            created_at: parse_ts(&row.get::<String>(10)?),
            updated_at: parse_ts(&row.get::<String>(11)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_schema;
    use crate::models::{DateRange, DEFAULT_CONVERSATION_TITLE};
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

    fn user_message(content: &str) -> ChatMessage {
        ChatMessage::new(MessageRole::User, content.to_string())
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let conn = setup_test_db().await;
        let mut conv = Conversation::new("c1".into(), "u1".into());
        conv.model = Some("gpt-4o".into());
        ConversationRepository::create(&conn, &conv).await.unwrap();

        let loaded = ConversationRepository::get(&conn, "u1", "c1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.title, DEFAULT_CONVERSATION_TITLE);
        assert_eq!(loaded.model.as_deref(), Some("gpt-4o"));
        assert_eq!(loaded.created_at, conv.created_at);
        assert!(loaded.auto_title_pending);
    }

    #[tokio::test]
    async fn test_get_is_scoped_to_owner() {
        let conn = setup_test_db().await;
        let conv = Conversation::new("c1".into(), "u1".into());
        ConversationRepository::create(&conn, &conv).await.unwrap();

        assert!(ConversationRepository::get(&conn, "u2", "c1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_append_message_derives_title_and_counters() {
        let conn = setup_test_db().await;
        let conv = Conversation::new("c1".into(), "u1".into());
        ConversationRepository::create(&conn, &conv).await.unwrap();

        let long = "z".repeat(80);
        let mut first = user_message(&long);
        first.token_count = 7;
        assert!(ConversationRepository::append_message(&conn, "u1", "c1", &first)
            .await
            .unwrap());
        let mut reply = ChatMessage::new(MessageRole::Assistant, "ok".into());
        reply.token_count = 3;
        ConversationRepository::append_message(&conn, "u1", "c1", &reply)
            .await
            .unwrap();
        ConversationRepository::append_message(&conn, "u1", "c1", &user_message("second"))
            .await
            .unwrap();

        let loaded = ConversationRepository::get(&conn, "u1", "c1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.title, format!("{}...", "z".repeat(50)));
        assert_eq!(loaded.message_count, 3);
        assert_eq!(loaded.total_tokens, 10);
        assert_eq!(loaded.messages.len(), 3);
        assert_eq!(loaded.messages[1].content, "ok");
        assert_eq!(loaded.last_message_at, Some(loaded.messages[2].timestamp));
    }

    #[tokio::test]
    async fn test_explicit_title_survives_first_message() {
        let conn = setup_test_db().await;
        let mut conv = Conversation::new("c1".into(), "u1".into());
        conv.set_title("Recipes".into());
        ConversationRepository::create(&conn, &conv).await.unwrap();

        ConversationRepository::append_message(&conn, "u1", "c1", &user_message("Bread?"))
            .await
            .unwrap();
        let loaded = ConversationRepository::get(&conn, "u1", "c1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.title, "Recipes");
    }

    #[tokio::test]
    async fn test_inactive_conversation_rejects_messages() {
        let conn = setup_test_db().await;
        let conv = Conversation::new("c1".into(), "u1".into());
        ConversationRepository::create(&conn, &conv).await.unwrap();

        assert!(ConversationRepository::deactivate(&conn, "u1", "c1").await.unwrap());
        assert!(!ConversationRepository::deactivate(&conn, "u1", "c1").await.unwrap());
        assert!(!ConversationRepository::append_message(&conn, "u1", "c1", &user_message("hi"))
            .await
            .unwrap());

        let loaded = ConversationRepository::get(&conn, "u1", "c1")
            .await
            .unwrap()
            .unwrap();
        assert!(!loaded.is_active);
        assert_eq!(loaded.message_count, 0);
    }

    #[tokio::test]
    async fn test_list_orders_by_activity_and_filters() {
        let conn = setup_test_db().await;
        let base = crate::models::utc_now() - Duration::hours(10);
        for i in 0..5 {
            let mut conv = Conversation::new(format!("c{i}"), "u1".into());
            conv.created_at = base + Duration::minutes(i);
            conv.updated_at = conv.created_at;
            if i == 4 {
                conv.is_active = false;
            }
            ConversationRepository::create(&conn, &conv).await.unwrap();
        }
        // c0 becomes the most recently active
        ConversationRepository::append_message(&conn, "u1", "c0", &user_message("bump"))
            .await
            .unwrap();

        let filter = ListConversationsFilter {
            is_active: Some(true),
            ..Default::default()
        };
        let page = ConversationRepository::list(&conn, "u1", &filter, PageRequest::default())
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c3", "c2", "c1"]);
        assert_eq!(page.pagination.total, 4);
        assert!(page.items.iter().all(|c| c.messages.is_empty()));

        let filter = ListConversationsFilter {
            search: Some("bump".into()),
            ..Default::default()
        };
        let page = ConversationRepository::list(&conn, "u1", &filter, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);

        let filter = ListConversationsFilter {
            created: DateRange {
                from: Some(base + Duration::minutes(3)),
                to: None,
            },
            ..Default::default()
        };
        let page = ConversationRepository::list(&conn, "u1", &filter, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 2);
    }

    #[tokio::test]
    async fn test_pages_reconstruct_filtered_set() {
        let conn = setup_test_db().await;
        let created = crate::models::utc_now();
        for i in 0..23 {
            // identical timestamps force the id tie-breaker to decide order
            let mut conv = Conversation::new(format!("c{i:02}"), "u1".into());
            conv.created_at = created;
            conv.updated_at = created;
            ConversationRepository::create(&conn, &conv).await.unwrap();
        }

        let mut seen = Vec::new();
        let mut page_no = 1;
        loop {
            let page = ConversationRepository::list(
                &conn,
                "u1",
                &ListConversationsFilter::default(),
                PageRequest::new(Some(page_no), Some(5)),
            )
            .await
            .unwrap();
            assert!(page.items.len() <= 5);
            seen.extend(page.items.into_iter().map(|c| c.id));
            if !page.pagination.has_next {
                break;
            }
            page_no += 1;
        }

        let mut expected: Vec<String> = (0..23).map(|i| format!("c{i:02}")).collect();
        expected.reverse();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_stats() {
        let conn = setup_test_db().await;
        for (id, model) in [("c1", Some("gpt-4o")), ("c2", Some("gpt-4o")), ("c3", None)] {
            let mut conv = Conversation::new(id.into(), "u1".into());
            conv.model = model.map(String::from);
            ConversationRepository::create(&conn, &conv).await.unwrap();
        }
        for _ in 0..4 {
            ConversationRepository::append_message(&conn, "u1", "c1", &user_message("hi"))
                .await
                .unwrap();
        }
        ConversationRepository::append_message(&conn, "u1", "c3", &user_message("hi"))
            .await
            .unwrap();
        ConversationRepository::deactivate(&conn, "u1", "c3").await.unwrap();

        let stats = ConversationRepository::stats(&conn, "u1").await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.total_messages, 5);
        assert_eq!(stats.avg_messages_per_active, 2.0);
        assert_eq!(stats.by_model[0].key, "gpt-4o");
        assert_eq!(stats.by_model[0].count, 2);

        assert_eq!(ConversationRepository::count_active(&conn, "u1").await.unwrap(), 2);
        let empty = ConversationRepository::stats(&conn, "nobody").await.unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.avg_messages_per_active, 0.0);
    }
}
