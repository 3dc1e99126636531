// Session and CSRF cookie construction
//
// Cookie contract: the session token travels in an HTTP-only cookie scoped
// to the whole app; the CSRF cookie is script-readable by design so the
// frontend can echo it in a header. `SameSite` is Lax for same-site
// deployments and None (which forces Secure) when a cross-site frontend
// origin is configured.

use axum::http::HeaderMap;

/// Session cookie name
pub const AUTH_COOKIE: &str = "token";

/// CSRF double-submit cookie name
pub const CSRF_COOKIE: &str = "XSRF-TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie attributes decided once at startup
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    same_site: SameSite,
    secure: bool,
}

impl CookiePolicy {
    /// `cross_site` switches to `SameSite=None`, which requires `Secure`
    /// regardless of environment
    pub fn new(cross_site: bool, secure: bool) -> Self {
        let same_site = if cross_site {
            SameSite::None
        } else {
            SameSite::Lax
        };
        Self {
            same_site,
            secure: secure || same_site == SameSite::None,
        }
    }

    fn attributes(&self) -> String {
        let secure = if self.secure { "; Secure" } else { "" };
        format!("Path=/; SameSite={}{}", self.same_site.as_str(), secure)
    }

    /// Session cookie: HTTP-only, max-age matching the token TTL
    pub fn auth_cookie(&self, token: &str, max_age_seconds: i64) -> String {
        format!(
            "{AUTH_COOKIE}={token}; HttpOnly; {}; Max-Age={max_age_seconds}",
            self.attributes()
        )
    }

    /// Expire the session cookie immediately
    pub fn clear_auth_cookie(&self) -> String {
        format!("{AUTH_COOKIE}=; HttpOnly; {}; Max-Age=0", self.attributes())
    }

    /// CSRF cookie: not HTTP-only, same lifetime as the session
    pub fn csrf_cookie(&self, token: &str, max_age_seconds: i64) -> String {
        format!(
            "{CSRF_COOKIE}={token}; {}; Max-Age={max_age_seconds}",
            self.attributes()
        )
    }

    /// Expire the CSRF cookie immediately
    pub fn clear_csrf_cookie(&self) -> String {
        format!("{CSRF_COOKIE}=; {}; Max-Age=0", self.attributes())
    }
}

/// Read a named cookie out of the request's `Cookie` header
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for part in cookie_str.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix(name) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, HeaderValue};

    #[test]
    fn same_site_lax_cookie_without_secure() {
        let policy = CookiePolicy::new(false, false);
        let cookie = policy.auth_cookie("abc", 3600);
        assert!(cookie.starts_with("token=abc; HttpOnly;"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.contains("Path=/"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn cross_site_forces_secure() {
        let policy = CookiePolicy::new(true, false);
        let cookie = policy.auth_cookie("abc", 3600);
        assert!(cookie.contains("SameSite=None"));
        assert!(cookie.contains("Secure"));
    }

    #[test]
    fn production_sets_secure_even_same_site() {
        let policy = CookiePolicy::new(false, true);
        assert!(policy.auth_cookie("abc", 3600).contains("Secure"));
    }

    #[test]
    fn csrf_cookie_is_not_http_only() {
        let policy = CookiePolicy::new(false, false);
        let cookie = policy.csrf_cookie("xyz", 3600);
        assert!(cookie.starts_with("XSRF-TOKEN=xyz;"));
        assert!(!cookie.contains("HttpOnly"));
    }

    #[test]
    fn clear_cookies_expire_immediately() {
        let policy = CookiePolicy::new(false, false);
        assert!(policy.clear_auth_cookie().contains("Max-Age=0"));
        assert!(policy.clear_csrf_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn extract_cookie_finds_value_among_many() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("a=1; token=jwt-value; XSRF-TOKEN=csrf-value"),
        );
        assert_eq!(
            extract_cookie(&headers, AUTH_COOKIE),
            Some("jwt-value".to_string())
        );
        assert_eq!(
            extract_cookie(&headers, CSRF_COOKIE),
            Some("csrf-value".to_string())
        );
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn extract_cookie_requires_exact_name() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("tokenish=nope"));
        assert_eq!(extract_cookie(&headers, AUTH_COOKIE), None);
    }

    #[test]
    fn extract_cookie_without_header_is_none() {
        let headers = HeaderMap::new();
        assert_eq!(extract_cookie(&headers, AUTH_COOKIE), None);
    }
}
