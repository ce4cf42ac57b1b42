//! Request session resolution
//!
//! The session token is read from `Authorization: Bearer …` first, then from
//! the `token` cookie set at login.

use axum::http::{header, HeaderMap};
use fleet_core::access::Principal;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "token";

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}

/// The principal behind the request, if it carries a valid session
pub fn session_from_headers(state: &AppState, headers: &HeaderMap) -> Option<Principal> {
    let token = bearer_token(headers).or_else(|| cookie_token(headers))?;
    state.tokens().verify(token)
}

pub fn require_auth(state: &AppState, headers: &HeaderMap) -> Result<Principal, ApiError> {
    session_from_headers(state, headers).ok_or(ApiError::Unauthorized)
}

pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<Principal, ApiError> {
    let principal = require_auth(state, headers)?;
    if !principal.is_admin() {
        return Err(ApiError::forbidden("Forbidden"));
    }
    Ok(principal)
}

pub fn session_cookie(config: &AppConfig, token: &str, max_age_seconds: i64) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age_seconds
    );
    if config.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(config: &AppConfig) -> String {
    session_cookie(config, "", 0)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("token=def"));
        assert_eq!(bearer_token(&headers), Some("abc"));
        assert_eq!(cookie_token(&headers), Some("def"));
    }

    #[test]
    fn cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; token=xyz ; lang=en"),
        );
        assert_eq!(cookie_token(&headers), Some("xyz"));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("token="));
        assert_eq!(cookie_token(&empty), None);
    }

    #[test]
    fn cookie_flags_follow_config() {
        let mut config = AppConfig::for_tests(".".into());
        assert!(!session_cookie(&config, "t", 60).contains("Secure"));
        config.secure_cookies = true;
        let cookie = session_cookie(&config, "t", 60);
        assert!(cookie.starts_with("token=t; HttpOnly"));
        assert!(cookie.ends_with("; Secure"));
        assert!(clear_session_cookie(&config).contains("Max-Age=0"));
    }
}
