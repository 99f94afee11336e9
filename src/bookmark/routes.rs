use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/read", get(handler::get_all_bookmarks))
        .route("/read/:bookmark_id", get(handler::get_bookmark))
        .route("/search", get(handler::search_bookmarks))
        .route("/check", get(handler::check_bookmark))
        .route("/create", post(handler::create_bookmark))
        .route("/update/:bookmark_id", patch(handler::update_bookmark))
        .route("/delete", delete(handler::delete_bookmark_by_user_and_content))
        .route("/delete/:bookmark_id", delete(handler::delete_bookmark))
}
