//! Session cookie construction and extraction.
//!
//! Both session tokens travel in `HttpOnly` cookies; logout overwrites them
//! with an empty value and `Max-Age=0`.

use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Build an `HttpOnly` session cookie with the given lifetime.
pub fn session_cookie(name: &str, value: &str, max_age_seconds: u64) -> HeaderValue {
    let cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}");
    // Cookie names are fixed and token values are base64url, so this cannot
    // contain invalid header characters.
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Build a cookie that clears any previously set value.
pub fn expired_cookie(name: &str) -> HeaderValue {
    session_cookie(name, "", 0)
}

/// Extract a cookie value by name from a request's headers.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let Some((key, val)) = pair.trim().split_once('=') else {
            continue;
        };
        if key.trim() == name && !val.trim().is_empty() {
            return Some(val.trim().to_string());
        }
    }
    None
}
