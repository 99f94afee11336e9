//! Caller identity as forwarded by the gateway's auth guard.
//!
//! Credentials are never checked here: by the time a request reaches the
//! service the guard has already authenticated it and put the user id in a
//! header (see `auth.user_id_header` in the config).

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::bookmark::parse_uuid;

pub const TENANT_HEADER: &str = "tenantid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    Missing,
    Invalid,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn authenticated_user(headers: &HeaderMap, header_name: &str) -> Result<Uuid, IdentityError> {
    let raw = header_str(headers, header_name).ok_or(IdentityError::Missing)?;
    parse_uuid(raw).ok_or(IdentityError::Invalid)
}

pub fn tenant_id<'a>(headers: &'a HeaderMap) -> Option<&'a str> {
    header_str(headers, TENANT_HEADER)
}
