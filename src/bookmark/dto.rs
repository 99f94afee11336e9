//! Request bodies and query strings, and the checks that turn them into
//! typed commands. Every field is optional at the serde level so that a
//! missing field is reported as a field error rather than a decode failure.
//! JSON bodies keep their fields as raw values for the same reason: a
//! number where a string belongs is a field error, not a rejected body.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{BookmarkChanges, BookmarkFilter, ContentRef, NewBookmark};
use crate::error::ValidationErrors;

pub const USER_ID_REQUIRED: &str = "User ID is required";
pub const USER_ID_INVALID: &str = "User ID must be a valid UUID";
pub const DO_ID_REQUIRED: &str = "Content ID (doId) is required";
pub const DO_ID_INVALID: &str = "Content ID must start with 'do_' followed by numbers";
pub const SAME_USER_AND_CONTENT: &str = "User ID and Content ID cannot be the same";
pub const CREATED_BY_INVALID: &str = "Created by must be a string";

static DO_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^do_[0-9]+$").expect("static pattern"));

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmarkRequest {
    pub user_id: Option<Value>,
    pub do_id: Option<Value>,
    pub created_by: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookmarkRequest {
    pub do_id: Option<Value>,
}

/// Body of the pair delete.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkPairRequest {
    pub user_id: Option<Value>,
    pub do_id: Option<Value>,
}

/// Query string of the search, listing and existence check endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBookmarksRequest {
    pub user_id: Option<String>,
    #[serde(alias = "doid")]
    pub do_id: Option<String>,
}

fn is_valid_do_id(raw: &str) -> bool {
    DO_ID_PATTERN.is_match(raw)
}

/// Only the hyphenated 8-4-4-4-12 form is accepted.
pub fn parse_uuid(raw: &str) -> Option<Uuid> {
    if raw.len() != 36 {
        return None;
    }
    Uuid::parse_str(raw).ok()
}

/// One incoming field before its format is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field<'a> {
    Absent,
    Text(&'a str),
    /// Present but not a string.
    Other,
}

impl<'a> Field<'a> {
    fn query(value: &'a Option<String>) -> Self {
        match value.as_deref() {
            None => Field::Absent,
            Some(s) => Field::Text(s),
        }
    }

    fn body(value: &'a Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => Field::Absent,
            Some(Value::String(s)) => Field::Text(s),
            Some(_) => Field::Other,
        }
    }

    /// An empty string counts as absent.
    fn filled(self) -> Self {
        match self {
            Field::Text("") => Field::Absent,
            other => other,
        }
    }

    fn text(self) -> Option<&'a str> {
        match self {
            Field::Text(s) => Some(s),
            _ => None,
        }
    }
}

fn required_user_id(field: Field<'_>, errors: &mut ValidationErrors) -> Option<Uuid> {
    match field.filled() {
        Field::Absent => {
            errors.push("userId", USER_ID_REQUIRED);
            None
        }
        other => optional_user_id(other, errors),
    }
}

fn optional_user_id(field: Field<'_>, errors: &mut ValidationErrors) -> Option<Uuid> {
    if field == Field::Absent {
        return None;
    }
    let parsed = field.text().and_then(parse_uuid);
    if parsed.is_none() {
        errors.push("userId", USER_ID_INVALID);
    }
    parsed
}

fn required_do_id(field: Field<'_>, errors: &mut ValidationErrors) -> Option<String> {
    match field.filled() {
        Field::Absent => {
            errors.push("doId", DO_ID_REQUIRED);
            None
        }
        other => optional_do_id(other, errors),
    }
}

fn optional_do_id(field: Field<'_>, errors: &mut ValidationErrors) -> Option<String> {
    match field {
        Field::Absent => None,
        Field::Text(s) if is_valid_do_id(s) => Some(s.to_string()),
        _ => {
            errors.push("doId", DO_ID_INVALID);
            None
        }
    }
}

fn pair(user_id: Field<'_>, do_id: Field<'_>) -> Result<ContentRef, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let user_id = required_user_id(user_id, &mut errors);
    let do_id = required_do_id(do_id, &mut errors);

    match (user_id, do_id) {
        (Some(user_id), Some(do_id)) if errors.is_empty() => Ok(ContentRef { user_id, do_id }),
        _ => Err(errors),
    }
}

impl CreateBookmarkRequest {
    pub fn validate(&self) -> Result<NewBookmark, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let user_field = Field::body(&self.user_id).filled();
        let do_field = Field::body(&self.do_id).filled();

        if let (Some(user_id), Some(do_id)) = (user_field.text(), do_field.text()) {
            if user_id == do_id {
                errors.push("doId", SAME_USER_AND_CONTENT);
                return Err(errors);
            }
        }

        let user_id = required_user_id(user_field, &mut errors);
        let do_id = required_do_id(do_field, &mut errors);
        let created_by = match Field::body(&self.created_by).filled() {
            Field::Absent => None,
            Field::Text(s) => Some(s.to_string()),
            Field::Other => {
                errors.push("createdBy", CREATED_BY_INVALID);
                None
            }
        };

        match (user_id, do_id) {
            (Some(user_id), Some(do_id)) if errors.is_empty() => Ok(NewBookmark {
                user_id,
                do_id,
                created_by,
            }),
            _ => Err(errors),
        }
    }
}

impl UpdateBookmarkRequest {
    /// `updated_by` always comes from the caller, never from the body.
    pub fn validate(&self, updated_by: Uuid) -> Result<BookmarkChanges, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let do_id = optional_do_id(Field::body(&self.do_id), &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(BookmarkChanges {
            do_id,
            updated_by: Some(updated_by.to_string()),
        })
    }
}

impl BookmarkPairRequest {
    pub fn validate(&self) -> Result<ContentRef, ValidationErrors> {
        pair(Field::body(&self.user_id), Field::body(&self.do_id))
    }
}

impl SearchBookmarksRequest {
    pub fn validate(&self) -> Result<BookmarkFilter, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let user_id = optional_user_id(Field::query(&self.user_id).filled(), &mut errors);
        let do_id = optional_do_id(Field::query(&self.do_id).filled(), &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(BookmarkFilter { user_id, do_id })
    }

    /// The listing endpoint shares this query shape but needs a user.
    /// A content filter, when given, must still be well formed.
    pub fn validate_owner(&self) -> Result<Uuid, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let user_id = required_user_id(Field::query(&self.user_id), &mut errors);
        optional_do_id(Field::query(&self.do_id).filled(), &mut errors);

        match user_id {
            Some(user_id) if errors.is_empty() => Ok(user_id),
            _ => Err(errors),
        }
    }

    /// The existence check needs both halves of the pair.
    pub fn validate_pair(&self) -> Result<ContentRef, ValidationErrors> {
        pair(Field::query(&self.user_id), Field::query(&self.do_id))
    }
}
