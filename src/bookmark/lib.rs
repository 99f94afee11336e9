use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

const BOOKMARK_COLUMNS: &str = "id, user_id, do_id, created_at, updated_at, created_by, updated_by";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub do_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub user_id: Uuid,
    pub do_id: String,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookmarkChanges {
    pub do_id: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookmarkFilter {
    pub user_id: Option<Uuid>,
    pub do_id: Option<String>,
}

/// The natural key of a bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRef {
    pub user_id: Uuid,
    pub do_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Bookmark),
    Existing(Bookmark),
}

impl CreateOutcome {
    pub fn bookmark(&self) -> &Bookmark {
        match self {
            CreateOutcome::Created(b) | CreateOutcome::Existing(b) => b,
        }
    }
}

/// Data access for bookmarks. Handlers get one through `AppState`.
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Inserts unless the `(user_id, do_id)` pair is already stored, in which
    /// case the stored row is returned untouched.
    async fn insert_if_absent(&self, input: NewBookmark) -> StoreResult<CreateOutcome>;
    async fn update(&self, id: Uuid, changes: BookmarkChanges) -> StoreResult<Option<Bookmark>>;
    async fn delete(&self, id: Uuid) -> StoreResult<Option<Bookmark>>;
    async fn delete_by_user_and_content(&self, key: &ContentRef) -> StoreResult<Option<Bookmark>>;
    async fn get(&self, id: Uuid) -> StoreResult<Option<Bookmark>>;
    async fn search(&self, filter: &BookmarkFilter) -> StoreResult<Vec<Bookmark>>;
    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Bookmark>>;
    async fn exists(&self, key: &ContentRef) -> StoreResult<bool>;
}

pub struct LibsqlBookmarks {
    db: Arc<Database>,
}

impl LibsqlBookmarks {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn find_by_user_and_content(&self, key: &ContentRef) -> StoreResult<Option<Bookmark>> {
        let query = format!("SELECT {BOOKMARK_COLUMNS} FROM bookmarks WHERE user_id = ? AND do_id = ?");

        let mut rows = self
            .db
            .connection()
            .query(&query, libsql::params![key.user_id.to_string(), key.do_id.as_str()])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_bookmark(&row)?)),
            None => Ok(None),
        }
    }

    async fn query_many(&self, query: &str, params: Vec<libsql::Value>) -> StoreResult<Vec<Bookmark>> {
        let mut bookmarks = Vec::new();
        let mut rows = self.db.connection().query(query, params).await?;

        while let Some(row) = rows.next().await? {
            bookmarks.push(row_to_bookmark(&row)?);
        }

        Ok(bookmarks)
    }
}

#[async_trait]
impl BookmarkRepository for LibsqlBookmarks {
    async fn insert_if_absent(&self, input: NewBookmark) -> StoreResult<CreateOutcome> {
        let query = format!(
            r#"
            INSERT INTO bookmarks (id, user_id, do_id, created_at, updated_at, created_by)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, do_id) DO NOTHING
            RETURNING {BOOKMARK_COLUMNS}
        "#
        );

        let now = timestamp(Utc::now());
        let mut rows = self
            .db
            .connection()
            .query(
                &query,
                libsql::params![
                    Uuid::new_v4().to_string(),
                    input.user_id.to_string(),
                    input.do_id.as_str(),
                    now.as_str(),
                    now.as_str(),
                    input.created_by.clone()
                ],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            return Ok(CreateOutcome::Created(row_to_bookmark(&row)?));
        }
        drop(rows);

        let key = ContentRef {
            user_id: input.user_id,
            do_id: input.do_id,
        };
        match self.find_by_user_and_content(&key).await? {
            Some(existing) => Ok(CreateOutcome::Existing(existing)),
            // Lost a race with a concurrent delete of the same pair.
            None => Err(StoreError::Conflict(format!("{}/{}", key.user_id, key.do_id))),
        }
    }

    async fn update(&self, id: Uuid, changes: BookmarkChanges) -> StoreResult<Option<Bookmark>> {
        let mut updates = vec!["updated_at = ?", "updated_by = ?"];
        let mut params: Vec<libsql::Value> = vec![
            timestamp(Utc::now()).into(),
            changes.updated_by.clone().into(),
        ];

        if let Some(do_id) = &changes.do_id {
            updates.push("do_id = ?");
            params.push(do_id.clone().into());
        }
        params.push(id.to_string().into());

        let query = format!(
            "UPDATE bookmarks SET {} WHERE id = ? RETURNING {BOOKMARK_COLUMNS}",
            updates.join(", ")
        );

        let conflict = |e: libsql::Error| {
            if e.to_string().contains("UNIQUE constraint failed") {
                StoreError::Conflict(format!("{}/{}", id, changes.do_id.as_deref().unwrap_or_default()))
            } else {
                StoreError::Database(e)
            }
        };

        let mut rows = self.db.connection().query(&query, params).await.map_err(conflict)?;
        match rows.next().await.map_err(conflict)? {
            Some(row) => Ok(Some(row_to_bookmark(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<Bookmark>> {
        let query = format!("DELETE FROM bookmarks WHERE id = ? RETURNING {BOOKMARK_COLUMNS}");

        let mut rows = self
            .db
            .connection()
            .query(&query, libsql::params![id.to_string()])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_bookmark(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete_by_user_and_content(&self, key: &ContentRef) -> StoreResult<Option<Bookmark>> {
        let query = format!("DELETE FROM bookmarks WHERE user_id = ? AND do_id = ? RETURNING {BOOKMARK_COLUMNS}");

        let mut rows = self
            .db
            .connection()
            .query(&query, libsql::params![key.user_id.to_string(), key.do_id.as_str()])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_bookmark(&row)?)),
            None => Ok(None),
        }
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Bookmark>> {
        let query = format!("SELECT {BOOKMARK_COLUMNS} FROM bookmarks WHERE id = ?");

        let mut rows = self
            .db
            .connection()
            .query(&query, libsql::params![id.to_string()])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_bookmark(&row)?)),
            None => Ok(None),
        }
    }

    async fn search(&self, filter: &BookmarkFilter) -> StoreResult<Vec<Bookmark>> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(user_id) = &filter.user_id {
            conditions.push("user_id = ?");
            params.push(user_id.to_string().into());
        }
        if let Some(do_id) = &filter.do_id {
            conditions.push("do_id = ?");
            params.push(do_id.clone().into());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {BOOKMARK_COLUMNS} FROM bookmarks {where_clause} ORDER BY created_at DESC, rowid DESC"
        );

        self.query_many(&query, params).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Bookmark>> {
        let query = format!(
            r#"
            SELECT {BOOKMARK_COLUMNS}
            FROM bookmarks
            WHERE user_id = ?
            ORDER BY created_at DESC, rowid DESC
        "#
        );

        self.query_many(&query, vec![user_id.to_string().into()]).await
    }

    async fn exists(&self, key: &ContentRef) -> StoreResult<bool> {
        let mut rows = self
            .db
            .connection()
            .query(
                "SELECT 1 FROM bookmarks WHERE user_id = ? AND do_id = ? LIMIT 1",
                libsql::params![key.user_id.to_string(), key.do_id.as_str()],
            )
            .await?;

        Ok(rows.next().await?.is_some())
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidData(format!("bad timestamp {raw}: {e}")))
}

fn parse_uuid(raw: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| StoreError::InvalidData(format!("bad uuid {raw}: {e}")))
}

fn row_to_bookmark(row: &libsql::Row) -> StoreResult<Bookmark> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;

    Ok(Bookmark {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        do_id: row.get(2)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        created_by: row.get(5)?,
        updated_by: row.get(6)?,
    })
}
