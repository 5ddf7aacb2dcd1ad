//! Session cookie helper.
//!
//! Builds `Set-Cookie` values for the signed session token and reads the
//! token back from the `Cookie` header.

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use chrono::{DateTime, Utc};

use crate::config::SecurityConfig;

const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Cookie helper for the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    secure: bool,
    same_site: &'static str,
}

impl SessionCookie {
    /// Cookie attributes follow the deployment environment: development gets
    /// `SameSite=Lax` without `Secure`, everything else `Strict` and `Secure`.
    pub fn from_config(config: &SecurityConfig) -> Self {
        let development = config.environment.is_development();
        Self {
            name: config.cookie_name.clone(),
            secure: !development,
            same_site: if development { "Lax" } else { "Strict" },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build a Set-Cookie value carrying `token` until `expires_at`.
    pub fn build(&self, token: &str, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let max_age = (expires_at - now).num_seconds().max(0);
        self.with_attributes(format!(
            "{}={}; Path=/; Expires={}; Max-Age={}",
            self.name,
            token,
            expires_at.format(EXPIRES_FORMAT),
            max_age
        ))
    }

    /// Build a Set-Cookie value that removes the cookie.
    pub fn build_clear(&self) -> String {
        self.with_attributes(format!(
            "{}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0",
            self.name
        ))
    }

    fn with_attributes(&self, mut cookie: String) -> String {
        cookie.push_str("; HttpOnly");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site));
        cookie
    }

    /// Append the session cookie to response headers.
    pub fn set(
        &self,
        headers: &mut HeaderMap,
        token: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) {
        if let Ok(value) = HeaderValue::from_str(&self.build(token, expires_at, now)) {
            headers.append(SET_COOKIE, value);
        }
    }

    /// Append a clearing cookie to response headers.
    pub fn clear(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&self.build_clear()) {
            headers.append(SET_COOKIE, value);
        }
    }

    /// Extract the session token from request headers.
    pub fn extract<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        extract_cookie(headers, &self.name)
    }
}

/// Extract a cookie value from request headers by name.
///
/// Every `Cookie` header is searched; empty values count as absent.
pub fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|cookie_header| cookie_header.split(';'))
        .map(str::trim)
        .find_map(|cookie| {
            let (cookie_name, cookie_value) = cookie.split_once('=')?;
            (cookie_name == name && !cookie_value.is_empty()).then_some(cookie_value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::{Duration, TimeZone};

    fn helper(environment: &str) -> SessionCookie {
        let config = Config::from_overrides(&[("security.environment", environment)]).unwrap();
        SessionCookie::from_config(&config.security)
    }

    #[test]
    fn test_production_cookie() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let cookie = helper("production").build("tok", now + Duration::days(30), now);

        assert!(cookie.starts_with("rsvp_session=tok; Path=/"));
        assert!(cookie.contains("Expires=Tue, 01 Jul 2025 12:00:00 GMT"));
        assert!(cookie.contains("Max-Age=2592000"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("; Secure"));
        assert!(cookie.contains("SameSite=Strict"));
    }

    #[test]
    fn test_development_cookie() {
        let now = Utc::now();
        let cookie = helper("development").build("tok", now + Duration::days(1), now);

        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
    }

    #[test]
    fn test_clear_cookie() {
        let cookie = helper("production").build_clear();

        assert!(cookie.starts_with("rsvp_session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
    }

    #[test]
    fn test_set_and_clear_append_headers() {
        let helper = helper("production");
        let mut headers = HeaderMap::new();
        let now = Utc::now();
        helper.set(&mut headers, "tok", now + Duration::hours(1), now);
        helper.clear(&mut headers);
        assert_eq!(headers.get_all(SET_COOKIE).iter().count(), 2);
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; rsvp_session=abc123; other=value"),
        );

        assert_eq!(helper("production").extract(&headers), Some("abc123"));
        assert_eq!(extract_cookie(&headers, "theme"), Some("dark"));
    }

    #[test]
    fn test_extract_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("rsvp_session=abc123"));

        assert_eq!(helper("production").extract(&headers), Some("abc123"));
    }

    #[test]
    fn test_extract_cookie_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(helper("production").extract(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("rsvp_session="));
        assert_eq!(helper("production").extract(&headers), None);
    }
}
