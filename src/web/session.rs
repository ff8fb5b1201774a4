use axum::{
    Json,
    http::{HeaderMap, StatusCode, header},
};
use axum_extra::extract::cookie::CookieJar;

use crate::web::{ApiError, json_error};

pub const SESSION_COOKIE: &str = "auth_token";

/// Opaque caller identity taken from the session cookie or a bearer token.
///
/// Credential validation happens upstream of this service; the value only
/// scopes per-caller resources such as the staging directory.
pub fn caller_session(
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<String, (StatusCode, Json<ApiError>)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Ok(value.to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| json_error(StatusCode::UNAUTHORIZED, "Authentication required"))
}
