//! HTTP handlers for the bookmark API

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode, header},
};
use serde_json::json;
use uuid::Uuid;

use super::adapter::BookmarkAdapter;
use super::dto::{
    BookmarkPairRequest, CreateBookmarkRequest, SearchBookmarksRequest, UpdateBookmarkRequest,
    parse_uuid,
};
use crate::api::{APIResponse, ApiId, Reply, bad_request, error_codes, messages};
use crate::auth::{self, IdentityError};
use crate::error::ValidationErrors;
use crate::handler::AppState;

fn adapter(state: &AppState) -> BookmarkAdapter {
    BookmarkAdapter::new(state.bookmarks.clone())
}

fn invalid(api_id: ApiId, errors: ValidationErrors) -> Reply {
    tracing::debug!(api = api_id.as_str(), errors = %errors, "rejected bookmark request");
    APIResponse::error_with_result(
        api_id,
        &errors.message(),
        error_codes::BAD_REQUEST,
        StatusCode::BAD_REQUEST,
        json!({ "errors": errors.fields() }),
    )
}

fn malformed(api_id: ApiId, rejection: impl std::fmt::Display) -> Reply {
    tracing::debug!(api = api_id.as_str(), error = %rejection, "malformed bookmark request");
    bad_request(api_id, &rejection.to_string())
}

fn bookmark_id(api_id: ApiId, raw: &str) -> Result<Uuid, Reply> {
    parse_uuid(raw).ok_or_else(|| bad_request(api_id, messages::INVALID_UUID_PARAM))
}

fn has_no_body(headers: &HeaderMap) -> bool {
    let declared_empty = match headers.get(header::CONTENT_LENGTH) {
        None => true,
        Some(len) => len.as_bytes() == b"0",
    };
    declared_empty
        && !headers.contains_key(header::TRANSFER_ENCODING)
        && !headers.contains_key(header::CONTENT_TYPE)
}

fn caller(state: &AppState, headers: &HeaderMap, api_id: ApiId) -> Result<Uuid, Reply> {
    match auth::authenticated_user(headers, &state.auth.user_id_header) {
        Ok(user_id) => Ok(user_id),
        Err(IdentityError::Missing) => Err(APIResponse::error(
            api_id,
            messages::UNAUTHORIZED,
            error_codes::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED,
        )),
        Err(IdentityError::Invalid) => Err(bad_request(api_id, messages::INVALID_UUID_PARAM)),
    }
}

pub async fn get_all_bookmarks(
    State(state): State<AppState>,
    query: Result<Query<SearchBookmarksRequest>, QueryRejection>,
) -> Reply {
    let Query(params) = match query {
        Ok(q) => q,
        Err(e) => return malformed(ApiId::BookmarkGet, e),
    };

    match params.validate_owner() {
        Ok(user_id) => adapter(&state).get_all_bookmarks(user_id).await,
        Err(errors) => invalid(ApiId::BookmarkGet, errors),
    }
}

pub async fn get_bookmark(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    match bookmark_id(ApiId::BookmarkGet, &id) {
        Ok(id) => adapter(&state).get_bookmark_by_id(id).await,
        Err(reply) => reply,
    }
}

pub async fn search_bookmarks(
    State(state): State<AppState>,
    query: Result<Query<SearchBookmarksRequest>, QueryRejection>,
) -> Reply {
    let Query(params) = match query {
        Ok(q) => q,
        Err(e) => return malformed(ApiId::BookmarkSearch, e),
    };

    match params.validate() {
        Ok(filter) => adapter(&state).search_bookmarks(filter).await,
        Err(errors) => invalid(ApiId::BookmarkSearch, errors),
    }
}

pub async fn check_bookmark(
    State(state): State<AppState>,
    query: Result<Query<SearchBookmarksRequest>, QueryRejection>,
) -> Reply {
    let Query(params) = match query {
        Ok(q) => q,
        Err(e) => return malformed(ApiId::BookmarkGet, e),
    };

    match params.validate_pair() {
        Ok(key) => adapter(&state).check_bookmark(key).await,
        Err(errors) => invalid(ApiId::BookmarkGet, errors),
    }
}

pub async fn create_bookmark(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateBookmarkRequest>, JsonRejection>,
) -> Reply {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(e) => return malformed(ApiId::BookmarkCreate, e),
    };

    let mut input = match payload.validate() {
        Ok(input) => input,
        Err(errors) => return invalid(ApiId::BookmarkCreate, errors),
    };

    // Attribution falls back to the caller, then to the owner.
    if input.created_by.is_none() {
        let by = auth::authenticated_user(&headers, &state.auth.user_id_header)
            .unwrap_or(input.user_id);
        input.created_by = Some(by.to_string());
    }

    adapter(&state).create_bookmark(input).await
}

pub async fn update_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<UpdateBookmarkRequest>, JsonRejection>,
) -> Reply {
    let api_id = ApiId::BookmarkUpdate;

    let id = match bookmark_id(api_id, &id) {
        Ok(id) => id,
        Err(reply) => return reply,
    };
    let login_user_id = match caller(&state, &headers, api_id) {
        Ok(user_id) => user_id,
        Err(reply) => return reply,
    };

    if auth::tenant_id(&headers).is_none() {
        tracing::warn!(bookmark_id = %id, "missing tenantId in request headers for bookmark update");
        return bad_request(api_id, messages::MISSING_TENANT_ID);
    }

    // Every body field is optional, so no body at all means no changes.
    let payload = match payload {
        Ok(Json(p)) => p,
        Err(JsonRejection::MissingJsonContentType(_)) if has_no_body(&headers) => {
            UpdateBookmarkRequest::default()
        }
        Err(e) => return malformed(api_id, e),
    };

    match payload.validate(login_user_id) {
        Ok(changes) => adapter(&state).update_bookmark(id, changes).await,
        Err(errors) => invalid(api_id, errors),
    }
}

pub async fn delete_bookmark(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    match bookmark_id(ApiId::BookmarkDelete, &id) {
        Ok(id) => adapter(&state).delete_bookmark(id).await,
        Err(reply) => reply,
    }
}

pub async fn delete_bookmark_by_user_and_content(
    State(state): State<AppState>,
    payload: Result<Json<BookmarkPairRequest>, JsonRejection>,
) -> Reply {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(e) => return malformed(ApiId::BookmarkDelete, e),
    };

    match payload.validate() {
        Ok(key) => adapter(&state).delete_bookmark_by_user_and_content(key).await,
        Err(errors) => invalid(ApiId::BookmarkDelete, errors),
    }
}
