use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use uuid::Uuid;

use super::{Bookmark, BookmarkChanges, BookmarkFilter, BookmarkRepository, ContentRef, CreateOutcome, NewBookmark};
use crate::api::{APIResponse, ApiId, Reply, error_codes, messages, not_found, server_error};
use crate::error::StoreError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkList {
    pub bookmarks: Vec<Bookmark>,
    pub total_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedBookmark {
    pub deleted_bookmark_id: Uuid,
    pub user_id: Uuid,
    pub do_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkStatus {
    pub is_bookmarked: bool,
}

/// Turns validated commands into repository calls and shapes the envelope.
pub struct BookmarkAdapter {
    repo: Arc<dyn BookmarkRepository>,
}

impl BookmarkAdapter {
    pub fn new(repo: Arc<dyn BookmarkRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_bookmark(&self, input: NewBookmark) -> Reply {
        match self.repo.insert_if_absent(input).await {
            Ok(CreateOutcome::Created(bookmark)) => {
                tracing::info!(bookmark_id = %bookmark.id, user_id = %bookmark.user_id, "bookmark created");
                APIResponse::success(
                    ApiId::BookmarkCreate,
                    bookmark,
                    StatusCode::CREATED,
                    messages::BOOKMARK_CREATED_SUCCESSFULLY,
                )
            }
            Ok(CreateOutcome::Existing(bookmark)) => APIResponse::success(
                ApiId::BookmarkCreate,
                bookmark,
                StatusCode::OK,
                messages::BOOKMARK_ALREADY_EXISTS,
            ),
            Err(e) => store_failure(ApiId::BookmarkCreate, "Error creating bookmark", e),
        }
    }

    pub async fn update_bookmark(&self, id: Uuid, changes: BookmarkChanges) -> Reply {
        match self.repo.update(id, changes).await {
            Ok(Some(bookmark)) => APIResponse::success(
                ApiId::BookmarkUpdate,
                bookmark,
                StatusCode::OK,
                messages::BOOKMARK_UPDATED_SUCCESSFULLY,
            ),
            Ok(None) => not_found(ApiId::BookmarkUpdate, messages::BOOKMARK_NOT_FOUND),
            Err(e) => store_failure(ApiId::BookmarkUpdate, "Error updating bookmark", e),
        }
    }

    pub async fn delete_bookmark(&self, id: Uuid) -> Reply {
        match self.repo.delete(id).await {
            Ok(Some(_)) => APIResponse::success(
                ApiId::BookmarkDelete,
                serde_json::json!({}),
                StatusCode::OK,
                messages::BOOKMARK_DELETED_SUCCESSFULLY,
            ),
            Ok(None) => not_found(ApiId::BookmarkDelete, messages::BOOKMARK_NOT_FOUND),
            Err(e) => store_failure(ApiId::BookmarkDelete, "Error deleting bookmark", e),
        }
    }

    pub async fn delete_bookmark_by_user_and_content(&self, key: ContentRef) -> Reply {
        match self.repo.delete_by_user_and_content(&key).await {
            Ok(Some(bookmark)) => APIResponse::success(
                ApiId::BookmarkDelete,
                RemovedBookmark {
                    deleted_bookmark_id: bookmark.id,
                    user_id: key.user_id,
                    do_id: key.do_id,
                },
                StatusCode::OK,
                messages::BOOKMARK_REMOVED_SUCCESSFULLY,
            ),
            Ok(None) => not_found(ApiId::BookmarkDelete, messages::BOOKMARK_PAIR_NOT_FOUND),
            Err(e) => store_failure(
                ApiId::BookmarkDelete,
                "Error deleting bookmark by user and content",
                e,
            ),
        }
    }

    pub async fn get_bookmark_by_id(&self, id: Uuid) -> Reply {
        match self.repo.get(id).await {
            Ok(Some(bookmark)) => APIResponse::success(
                ApiId::BookmarkGet,
                bookmark,
                StatusCode::OK,
                messages::BOOKMARK_GET_SUCCESSFULLY,
            ),
            Ok(None) => not_found(ApiId::BookmarkGet, messages::BOOKMARK_NOT_FOUND),
            Err(e) => store_failure(ApiId::BookmarkGet, "Error getting bookmark", e),
        }
    }

    pub async fn search_bookmarks(&self, filter: BookmarkFilter) -> Reply {
        match self.repo.search(&filter).await {
            Ok(bookmarks) => APIResponse::success(
                ApiId::BookmarkSearch,
                bookmarks,
                StatusCode::OK,
                messages::BOOKMARK_SEARCH_SUCCESSFULLY,
            ),
            Err(e) => store_failure(ApiId::BookmarkSearch, "Error searching bookmarks", e),
        }
    }

    pub async fn get_all_bookmarks(&self, user_id: Uuid) -> Reply {
        match self.repo.list_for_user(user_id).await {
            Ok(bookmarks) => {
                let total_count = bookmarks.len();
                APIResponse::success(
                    ApiId::BookmarkGet,
                    BookmarkList { bookmarks, total_count },
                    StatusCode::OK,
                    messages::BOOKMARK_LIST_SUCCESSFULLY,
                )
            }
            Err(e) => store_failure(ApiId::BookmarkGet, "Error getting all bookmarks", e),
        }
    }

    pub async fn check_bookmark(&self, key: ContentRef) -> Reply {
        match self.repo.exists(&key).await {
            Ok(is_bookmarked) => APIResponse::success(
                ApiId::BookmarkGet,
                BookmarkStatus { is_bookmarked },
                StatusCode::OK,
                messages::BOOKMARK_CHECKED_SUCCESSFULLY,
            ),
            Err(e) => store_failure(ApiId::BookmarkGet, "Error checking bookmark", e),
        }
    }
}

fn store_failure(api_id: ApiId, context: &str, err: StoreError) -> Reply {
    match err {
        StoreError::Conflict(detail) => {
            tracing::warn!(api = api_id.as_str(), detail = %detail, "{}: duplicate bookmark", context);
            APIResponse::error(
                api_id,
                messages::BOOKMARK_CONFLICT,
                error_codes::CONFLICT,
                StatusCode::CONFLICT,
            )
        }
        other => {
            tracing::error!(api = api_id.as_str(), error = %crate::unpack_error(&other), "{}", context);
            server_error(api_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    use crate::error::StoreResult;

    /// Repository stub: every call fails, or answers from `stored`.
    struct MockRepository {
        fail: bool,
        stored: Option<Bookmark>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl MockRepository {
        fn failing() -> Self {
            Self {
                fail: true,
                stored: None,
                calls: Mutex::new(vec![]),
            }
        }

        fn with(stored: Option<Bookmark>) -> Self {
            Self {
                fail: false,
                stored,
                calls: Mutex::new(vec![]),
            }
        }

        fn answer<T>(&self, call: &'static str, value: T) -> StoreResult<T> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                Err(StoreError::InvalidData("boom".to_string()))
            } else {
                Ok(value)
            }
        }
    }

    #[async_trait]
    impl BookmarkRepository for MockRepository {
        async fn insert_if_absent(&self, input: NewBookmark) -> StoreResult<CreateOutcome> {
            let outcome = match self.stored.clone() {
                Some(b) => CreateOutcome::Existing(b),
                None => CreateOutcome::Created(bookmark(input.user_id, &input.do_id)),
            };
            self.answer("insert_if_absent", outcome)
        }

        async fn update(&self, _id: Uuid, _changes: BookmarkChanges) -> StoreResult<Option<Bookmark>> {
            self.answer("update", self.stored.clone())
        }

        async fn delete(&self, _id: Uuid) -> StoreResult<Option<Bookmark>> {
            self.answer("delete", self.stored.clone())
        }

        async fn delete_by_user_and_content(&self, _key: &ContentRef) -> StoreResult<Option<Bookmark>> {
            self.answer("delete_by_user_and_content", self.stored.clone())
        }

        async fn get(&self, _id: Uuid) -> StoreResult<Option<Bookmark>> {
            self.answer("get", self.stored.clone())
        }

        async fn search(&self, _filter: &BookmarkFilter) -> StoreResult<Vec<Bookmark>> {
            self.answer("search", self.stored.clone().into_iter().collect())
        }

        async fn list_for_user(&self, _user_id: Uuid) -> StoreResult<Vec<Bookmark>> {
            self.answer("list_for_user", self.stored.clone().into_iter().collect())
        }

        async fn exists(&self, _key: &ContentRef) -> StoreResult<bool> {
            self.answer("exists", self.stored.is_some())
        }
    }

    fn bookmark(user_id: Uuid, do_id: &str) -> Bookmark {
        let now = Utc::now();
        Bookmark {
            id: Uuid::new_v4(),
            user_id,
            do_id: do_id.to_string(),
            created_at: now,
            updated_at: now,
            created_by: None,
            updated_by: None,
        }
    }

    fn key() -> ContentRef {
        ContentRef {
            user_id: Uuid::new_v4(),
            do_id: "do_1".to_string(),
        }
    }

    #[tokio::test]
    async fn storage_failures_collapse_to_internal_error() {
        let adapter = BookmarkAdapter::new(Arc::new(MockRepository::failing()));

        let replies = vec![
            adapter.get_bookmark_by_id(Uuid::new_v4()).await,
            adapter.delete_bookmark(Uuid::new_v4()).await,
            adapter.delete_bookmark_by_user_and_content(key()).await,
            adapter.search_bookmarks(BookmarkFilter::default()).await,
            adapter.get_all_bookmarks(Uuid::new_v4()).await,
            adapter.check_bookmark(key()).await,
            adapter.update_bookmark(Uuid::new_v4(), BookmarkChanges::default()).await,
        ];

        for reply in replies {
            assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(reply.body.params.err.as_deref(), Some(error_codes::INTERNAL));
            assert_eq!(reply.body.params.errmsg.as_deref(), Some(messages::INTERNAL_SERVER_ERROR));
        }
    }

    #[tokio::test]
    async fn create_distinguishes_new_from_existing() {
        let user_id = Uuid::new_v4();
        let input = NewBookmark {
            user_id,
            do_id: "do_5".to_string(),
            created_by: None,
        };

        let fresh = BookmarkAdapter::new(Arc::new(MockRepository::with(None)));
        let reply = fresh.create_bookmark(input.clone()).await;
        assert_eq!(reply.status, StatusCode::CREATED);
        assert_eq!(reply.body.result["doId"], "do_5");

        let existing = bookmark(user_id, "do_5");
        let dup = BookmarkAdapter::new(Arc::new(MockRepository::with(Some(existing.clone()))));
        let reply = dup.create_bookmark(input).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(
            reply.body.params.successmessage.as_deref(),
            Some(messages::BOOKMARK_ALREADY_EXISTS)
        );
        assert_eq!(reply.body.result["id"], existing.id.to_string());
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let repo = Arc::new(MockRepository::with(None));
        let adapter = BookmarkAdapter::new(repo.clone());

        let reply = adapter.update_bookmark(Uuid::new_v4(), BookmarkChanges::default()).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);

        let reply = adapter.delete_bookmark_by_user_and_content(key()).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body.params.errmsg.as_deref(), Some(messages::BOOKMARK_PAIR_NOT_FOUND));

        let reply = adapter.check_bookmark(key()).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body.result["isBookmarked"], false);

        assert_eq!(
            *repo.calls.lock().unwrap(),
            vec!["update", "delete_by_user_and_content", "exists"]
        );
    }

    #[tokio::test]
    async fn listing_reports_total_count() {
        let stored = bookmark(Uuid::new_v4(), "do_9");
        let adapter = BookmarkAdapter::new(Arc::new(MockRepository::with(Some(stored))));

        let reply = adapter.get_all_bookmarks(Uuid::new_v4()).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body.result["totalCount"], 1);
        assert_eq!(reply.body.result["bookmarks"][0]["doId"], "do_9");
    }
}
