use crate::config::parameter;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName};
use chrono::Duration;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Builds and reads the session cookies. Both cookies are HttpOnly and
/// SameSite=Strict; the Secure flag follows `COOKIE_SECURE`.
#[derive(Clone, Copy, Debug)]
pub struct CookieService {
    secure: bool,
}

impl CookieService {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    pub fn from_parameters() -> Self {
        Self::new(parameter::get_bool("COOKIE_SECURE"))
    }

    fn build(&self, name: &str, value: &str, max_age_seconds: i64) -> String {
        format!(
            "{}={}; HttpOnly;{} SameSite=Strict; Path=/; Max-Age={}",
            name,
            value,
            if self.secure { " Secure;" } else { "" },
            max_age_seconds.max(0)
        )
    }

    /// `Set-Cookie` headers carrying both tokens
    pub fn session_cookies(
        &self,
        access_token: &str,
        access_ttl: Duration,
        refresh_token: &str,
        refresh_ttl: Duration,
    ) -> [(HeaderName, String); 2] {
        [
            (SET_COOKIE, self.build(ACCESS_TOKEN_COOKIE, access_token, access_ttl.num_seconds())),
            (SET_COOKIE, self.build(REFRESH_TOKEN_COOKIE, refresh_token, refresh_ttl.num_seconds())),
        ]
    }

    /// `Set-Cookie` headers that expire both tokens in the browser
    pub fn cleared_cookies(&self) -> [(HeaderName, String); 2] {
        [
            (SET_COOKIE, self.build(ACCESS_TOKEN_COOKIE, "", 0)),
            (SET_COOKIE, self.build(REFRESH_TOKEN_COOKIE, "", 0)),
        ]
    }
}

/// Value of the named cookie across all `Cookie` headers, if non-empty
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
