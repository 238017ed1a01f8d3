//! Refresh-token cookie helpers.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue},
};

use crate::session::SessionConfig;

pub const REFRESH_COOKIE_NAME: &str = "REFRESH_TOKEN";

/// Build the `Set-Cookie` value carrying a freshly issued refresh token.
///
/// # Errors
/// Returns an error if `token` contains bytes not allowed in a header value.
pub fn refresh_cookie(
    config: &SessionConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = config.refresh_token_ttl_seconds();
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    );
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build a `Set-Cookie` value that expires the refresh cookie immediately.
///
/// # Errors
/// Returns an error if the header value cannot be built.
pub fn clear_refresh_cookie(config: &SessionConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{REFRESH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Read the refresh token from any `Cookie` header.
pub fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            if key.trim() == REFRESH_COOKIE_NAME {
                Some(val.trim().to_string())
            } else {
                None
            }
        })
        .filter(|token| !token.is_empty())
}
