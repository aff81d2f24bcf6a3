use axum::http::HeaderMap;

/// Header carrying the gateway-authenticated facility user id.
///
/// Authentication itself happens upstream; write handlers read this header
/// and pass the acting user into services as an explicit argument.
pub const ACTING_USER_HEADER: &str = "x-facility-user";

pub fn acting_user(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ACTING_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
