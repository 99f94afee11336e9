use std::sync::Arc;

use axum::{extract::State, http::StatusCode};

use tracing::info;

use crate::api::{APIResponse, ApiId, Reply, messages, server_error};
use crate::bookmark::{BookmarkRepository, LibsqlBookmarks};
use crate::config::Auth;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub bookmarks: Arc<dyn BookmarkRepository>,
    pub auth: Arc<Auth>,
}

impl AppState {
    pub fn new(db: Arc<Database>, auth: Auth) -> Self {
        let bookmarks = Arc::new(LibsqlBookmarks::new(db.clone()));
        AppState {
            db,
            bookmarks,
            auth: Arc::new(auth),
        }
    }
}

pub async fn healthcheck(State(state): State<AppState>) -> Reply {
    info!("got healthcheck request");

    if let Err(e) = state.db.ping().await {
        tracing::error!(error = %e, "healthcheck failed to reach database");
        return server_error(ApiId::Health);
    }

    APIResponse::success(ApiId::Health, serde_json::json!({}), StatusCode::OK, messages::OK)
}
