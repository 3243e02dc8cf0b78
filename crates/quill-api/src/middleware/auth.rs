//! Owner-token checks for admin endpoints.
//!
//! The control plane mints one bearer token per site from the server secret;
//! handlers for owner-only operations call `require_owner` before touching
//! the store.

use axum::http::{header, HeaderMap, HeaderValue};
use quill_core::auth;

use crate::{error::ApiError, state::AppState};

pub fn require_owner(state: &AppState, site_id: i64, headers: &HeaderMap) -> Result<(), ApiError> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?;

    let token = parse_bearer(header_value)?;

    if !auth::verify_site_owner_token(&state.settings.server_secret, site_id, token) {
        return Err(ApiError::Unauthorized("invalid owner token".to_string()));
    }
    Ok(())
}

fn parse_bearer(value: &HeaderValue) -> Result<&str, ApiError> {
    let raw = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("malformed authorization header".to_string()))?;
    raw.strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("expected bearer token".to_string()))
}
