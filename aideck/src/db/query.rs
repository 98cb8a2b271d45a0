//! Helpers shared by the repositories: timestamp encoding and a small
//! parameterized `WHERE` clause builder.

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Value};

use crate::error::Result;
use crate::models::{DateRange, PageRequest};

/// Encode a timestamp the way every table stores it: RFC 3339, millisecond
/// precision, `Z` suffix. Lexical order equals chronological order.
pub fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn opt_ts(dt: &Option<DateTime<Utc>>) -> Option<String> {
    dt.as_ref().map(ts)
}

pub fn parse_ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub fn parse_opt_ts(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Escape `%`, `_` and `\` so user input matches literally under
/// `LIKE ... ESCAPE '\'`.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Substring pattern for `LIKE`.
pub fn like_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

/// Accumulates `AND`-joined predicates with positional `?` parameters.
#[derive(Debug, Clone, Default)]
pub struct WhereBuilder {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl WhereBuilder {
    /// Every user-facing query starts scoped to its owner.
    pub fn for_user(user_id: &str) -> Self {
        let mut builder = Self::default();
        builder.push("user_id = ?", user_id.to_string());
        builder
    }

    /// Add a predicate containing exactly one `?`.
    pub fn push(&mut self, clause: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.clauses.push(clause.into());
        self.params.push(value.into());
        self
    }

    /// Add a predicate without parameters.
    pub fn push_raw(&mut self, clause: impl Into<String>) -> &mut Self {
        self.clauses.push(clause.into());
        self
    }

    /// Case-insensitive substring match across any of `columns`.
    pub fn push_search(&mut self, columns: &[&str], term: &str) -> &mut Self {
        let term = term.trim();
        if term.is_empty() || columns.is_empty() {
            return self;
        }
        let pattern = like_pattern(term);
        let ors: Vec<String> = columns
            .iter()
            .map(|column| format!("{column} LIKE ? ESCAPE '\\'"))
            .collect();
        self.clauses.push(format!("({})", ors.join(" OR ")));
        for _ in columns {
            self.params.push(Value::from(pattern.clone()));
        }
        self
    }

    /// `column` starts with `prefix`.
    pub fn push_prefix(&mut self, column: &str, prefix: &str) -> &mut Self {
        self.push(
            format!("{column} LIKE ? ESCAPE '\\'"),
            format!("{}%", escape_like(prefix)),
        )
    }

    /// `column` holds a JSON array of strings that contains `tag`.
    pub fn push_tag(&mut self, column: &str, tag: &str) -> &mut Self {
        self.push(
            format!("EXISTS (SELECT 1 FROM json_each({column}) WHERE json_each.value = ?)"),
            tag.to_string(),
        )
    }

    /// Inclusive lower bound, exclusive upper bound.
    pub fn push_range(&mut self, column: &str, range: &DateRange) -> &mut Self {
        if let Some(from) = range.from {
            self.push(format!("{column} >= ?"), ts(&from));
        }
        if let Some(to) = range.to {
            self.push(format!("{column} < ?"), ts(&to));
        }
        self
    }

    pub fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> Vec<Value> {
        self.params.clone()
    }

    /// `SELECT COUNT(*)` over `table` with this clause.
    pub async fn count(&self, conn: &Connection, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {table} {}", self.sql());
        scalar_u64(conn, &sql, self.params()).await
    }

    /// Run `select` (which must not carry its own `WHERE`) with this clause,
    /// `order` and the page window appended.
    pub async fn query_page(
        &self,
        conn: &Connection,
        select: &str,
        order: &str,
        page: PageRequest,
    ) -> Result<libsql::Rows> {
        let sql = format!("{select} {} ORDER BY {order} LIMIT ? OFFSET ?", self.sql());
        let mut params = self.params();
        params.push(Value::from(page.limit as i64));
        params.push(Value::from(page.offset() as i64));
        Ok(conn.query(&sql, libsql::params_from_iter(params)).await?)
    }
}

/// First column of the first row as a non-negative count; NULL reads as 0.
pub async fn scalar_u64(conn: &Connection, sql: &str, params: Vec<Value>) -> Result<u64> {
    let mut rows = conn.query(sql, libsql::params_from_iter(params)).await?;
    let value = match rows.next().await? {
        Some(row) => row.get::<Option<i64>>(0)?.unwrap_or(0),
        None => 0,
    };
    Ok(value.max(0) as u64)
}

/// Rows of `(key, count)` pairs as produced by a `GROUP BY` query.
pub async fn group_counts(
    conn: &Connection,
    sql: &str,
    params: Vec<Value>,
) -> Result<Vec<crate::models::GroupCount>> {
    let mut rows = conn.query(sql, libsql::params_from_iter(params)).await?;
    let mut groups = Vec::new();
    while let Some(row) = rows.next().await? {
        groups.push(crate::models::GroupCount {
            key: row.get::<Option<String>>(0)?.unwrap_or_default(),
            count: row.get::<i64>(1)?.max(0) as u64,
        });
    }
    Ok(groups)
}
