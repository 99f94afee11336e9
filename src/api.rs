use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const API_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiId {
    BookmarkCreate,
    BookmarkUpdate,
    BookmarkDelete,
    BookmarkGet,
    BookmarkSearch,
    Health,
}

impl ApiId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiId::BookmarkCreate => "api.bookmark.create",
            ApiId::BookmarkUpdate => "api.bookmark.update",
            ApiId::BookmarkDelete => "api.bookmark.delete",
            ApiId::BookmarkGet => "api.bookmark.get",
            ApiId::BookmarkSearch => "api.bookmark.search",
            ApiId::Health => "api.health",
        }
    }
}

pub mod messages {
    pub const INTERNAL_SERVER_ERROR: &str = "Internal server error occurred";
    pub const UNAUTHORIZED: &str = "Unauthorized";
    pub const BOOKMARK_CREATED_SUCCESSFULLY: &str = "Bookmark created successfully";
    pub const BOOKMARK_ALREADY_EXISTS: &str = "Bookmark already exists";
    pub const BOOKMARK_UPDATED_SUCCESSFULLY: &str = "Bookmark updated successfully";
    pub const BOOKMARK_DELETED_SUCCESSFULLY: &str = "Bookmark deleted successfully";
    pub const BOOKMARK_REMOVED_SUCCESSFULLY: &str = "Bookmark removed successfully";
    pub const BOOKMARK_GET_SUCCESSFULLY: &str = "Bookmark fetched successfully";
    pub const BOOKMARK_LIST_SUCCESSFULLY: &str = "User's bookmarked content retrieved successfully";
    pub const BOOKMARK_SEARCH_SUCCESSFULLY: &str = "Bookmarks fetched successfully";
    pub const BOOKMARK_CHECKED_SUCCESSFULLY: &str = "Bookmark status checked successfully";
    pub const BOOKMARK_NOT_FOUND: &str = "Bookmark not found";
    pub const BOOKMARK_PAIR_NOT_FOUND: &str = "Bookmark not found for the specified user and content";
    pub const BOOKMARK_CONFLICT: &str = "Bookmark already exists for the specified user and content";
    pub const MISSING_TENANT_ID: &str = "Missing tenantId in request headers";
    pub const INVALID_UUID_PARAM: &str = "Validation failed (uuid is expected)";
    pub const OK: &str = "ok";
}

pub mod error_codes {
    pub const BAD_REQUEST: &str = "BadRequestException";
    pub const UNAUTHORIZED: &str = "UnauthorizedException";
    pub const NOT_FOUND: &str = "NotFoundException";
    pub const CONFLICT: &str = "ConflictException";
    pub const INTERNAL: &str = "InternalServerError";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseParams {
    pub resmsgid: String,
    pub status: String,
    pub err: Option<String>,
    pub errmsg: Option<String>,
    pub successmessage: Option<String>,
}

/// The envelope every endpoint answers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct APIResponse {
    pub id: String,
    pub ver: String,
    pub ts: String,
    pub params: ResponseParams,
    pub response_code: u16,
    pub result: Value,
}

impl APIResponse {
    fn new(api_id: ApiId, status: StatusCode, params: ResponseParams, result: Value) -> Self {
        APIResponse {
            id: api_id.as_str().to_owned(),
            ver: API_VERSION.to_owned(),
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            params,
            response_code: status.as_u16(),
            result,
        }
    }

    pub fn success<T: Serialize>(api_id: ApiId, result: T, status: StatusCode, message: &str) -> Reply {
        let result = match serde_json::to_value(result) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, api = api_id.as_str(), "failed to serialize response payload");
                return Self::error(
                    api_id,
                    messages::INTERNAL_SERVER_ERROR,
                    error_codes::INTERNAL,
                    StatusCode::INTERNAL_SERVER_ERROR,
                );
            }
        };

        let params = ResponseParams {
            resmsgid: Uuid::new_v4().to_string(),
            status: "successful".to_owned(),
            err: None,
            errmsg: None,
            successmessage: Some(message.to_owned()),
        };

        Reply::new(status, Self::new(api_id, status, params, result))
    }

    pub fn error(api_id: ApiId, errmsg: &str, err: &str, status: StatusCode) -> Reply {
        Self::error_with_result(api_id, errmsg, err, status, Value::Object(Default::default()))
    }

    pub fn error_with_result(
        api_id: ApiId,
        errmsg: &str,
        err: &str,
        status: StatusCode,
        result: Value,
    ) -> Reply {
        let params = ResponseParams {
            resmsgid: Uuid::new_v4().to_string(),
            status: "failed".to_owned(),
            err: Some(err.to_owned()),
            errmsg: Some(errmsg.to_owned()),
            successmessage: None,
        };

        Reply::new(status, Self::new(api_id, status, params, result))
    }

    pub fn is_success(&self) -> bool {
        self.params.status == "successful"
    }
}

/// An envelope paired with the HTTP status it is sent with.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: APIResponse,
}

impl Reply {
    pub fn new(status: StatusCode, body: APIResponse) -> Self {
        Reply { status, body }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn bad_request(api_id: ApiId, msg: &str) -> Reply {
    APIResponse::error(api_id, msg, error_codes::BAD_REQUEST, StatusCode::BAD_REQUEST)
}

pub fn not_found(api_id: ApiId, msg: &str) -> Reply {
    APIResponse::error(api_id, msg, error_codes::NOT_FOUND, StatusCode::NOT_FOUND)
}

pub fn server_error(api_id: ApiId) -> Reply {
    APIResponse::error(
        api_id,
        messages::INTERNAL_SERVER_ERROR,
        error_codes::INTERNAL,
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}
