//! Bookmark Module
//!
//! A bookmark links a user (UUID) to a piece of content (`do_<digits>`),
//! meaning "this user has favorited this content". At most one bookmark
//! exists per user/content pair; the unique index in the schema enforces it.
//!
//! # Layers
//!
//! - `dto`: request shapes and their validation into typed commands
//! - `adapter`: runs one repository call per operation and shapes the envelope
//! - `lib`: the `BookmarkRepository` trait and its libsql implementation
//!
//! # Usage
//!
//! ```rust,ignore
//! use bookmarks::bookmark;
//!
//! let app = Router::new()
//!     .nest("/bookmark", bookmark::routes())
//!     .with_state(app_state);
//! ```

mod adapter;
mod dto;
mod handler;
mod lib;
mod routes;

pub use adapter::{BookmarkAdapter, BookmarkList, BookmarkStatus, RemovedBookmark};
pub use dto::{
    BookmarkPairRequest, CreateBookmarkRequest, SearchBookmarksRequest, UpdateBookmarkRequest,
    parse_uuid,
};
pub use lib::*;
pub use routes::routes;

/// Schema migrations for the bookmark tables, applied at startup.
pub fn migrations() -> &'static [(&'static str, &'static str)] {
    &[("bookmark_001_schema.sql", include_str!("migrations/001_schema.sql"))]
}
