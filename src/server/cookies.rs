//! Cookie read/write helpers for the credential cookies.

use std::time::Duration;

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};

use crate::error::{AppError, AppResult};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const LOGGED_IN_COOKIE: &str = "logged_in";

#[derive(Debug, Clone, Default)]
pub struct CookieSettings {
    pub domain: Option<String>,
    pub secure: bool,
}

pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for cookie in headers.get_all("cookie") {
        let Ok(s) = cookie.to_str() else { continue };
        for part in s.split(';') {
            let p = part.trim();
            if let Some((k, v)) = p.split_once('=') {
                if k == name && !v.is_empty() {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

/// `Authorization: Bearer <token>` wins over the `access_token` cookie.
pub fn extract_access_credential(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    match bearer {
        Some(token) => Some(token.to_string()),
        None => parse_cookie(headers, ACCESS_COOKIE),
    }
}

impl CookieSettings {
    fn attrs(&self, http_only: bool) -> String {
        let mut s = String::from("; Path=/; SameSite=Lax");
        if let Some(d) = &self.domain {
            s.push_str("; Domain=");
            s.push_str(d);
        }
        if http_only { s.push_str("; HttpOnly"); }
        if self.secure { s.push_str("; Secure"); }
        s
    }

    pub fn set(&self, headers: &mut HeaderMap, name: &str, value: &str, max_age: Duration, http_only: bool) -> AppResult<()> {
        let raw = format!("{}={}; Max-Age={}{}", name, value, max_age.as_secs(), self.attrs(http_only));
        headers.append(SET_COOKIE, header_value(&raw)?);
        Ok(())
    }

    /// Cookie without `Max-Age`; the browser drops it when the session ends.
    pub fn set_session(&self, headers: &mut HeaderMap, name: &str, value: &str, http_only: bool) -> AppResult<()> {
        let raw = format!("{}={}{}", name, value, self.attrs(http_only));
        headers.append(SET_COOKIE, header_value(&raw)?);
        Ok(())
    }

    /// Overwrite a cookie with `value` and an already-past expiry.
    pub fn expire(&self, headers: &mut HeaderMap, name: &str, value: &str, http_only: bool) -> AppResult<()> {
        let raw = format!(
            "{}={}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT{}",
            name,
            value,
            self.attrs(http_only)
        );
        headers.append(SET_COOKIE, header_value(&raw)?);
        Ok(())
    }
}

fn header_value(raw: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(raw).map_err(|e| AppError::internal("cookie".to_string(), format!("invalid cookie value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.append(axum::http::HeaderName::from_bytes(k.as_bytes()).unwrap(), HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn parses_named_cookie() {
        let h = headers(&[("cookie", "a=1; access_token=abc.def; logged_in=true")]);
        assert_eq!(parse_cookie(&h, "access_token").as_deref(), Some("abc.def"));
        assert_eq!(parse_cookie(&h, "missing"), None);
        let empty = headers(&[("cookie", "access_token=")]);
        assert_eq!(parse_cookie(&empty, "access_token"), None);
    }

    #[test]
    fn bearer_header_takes_precedence() {
        let h = headers(&[("authorization", "Bearer from-header"), ("cookie", "access_token=from-cookie")]);
        assert_eq!(extract_access_credential(&h).as_deref(), Some("from-header"));

        let h = headers(&[("authorization", "Basic xyz"), ("cookie", "access_token=from-cookie")]);
        assert_eq!(extract_access_credential(&h).as_deref(), Some("from-cookie"));

        let h = headers(&[("authorization", "Bearer ")]);
        assert_eq!(extract_access_credential(&h), None);
    }

    #[test]
    fn set_and_expire_render_attributes() {
        let settings = CookieSettings { domain: Some("example.com".into()), secure: true };
        let mut h = HeaderMap::new();
        settings.set(&mut h, ACCESS_COOKIE, "tok", Duration::from_secs(900), true).unwrap();
        settings.expire(&mut h, REFRESH_COOKIE, "", true).unwrap();
        let all: Vec<&str> = h.get_all(SET_COOKIE).iter().map(|v| v.to_str().unwrap()).collect();
        assert_eq!(all.len(), 2);
        assert!(all[0].starts_with("access_token=tok; Max-Age=900"));
        assert!(all[0].contains("Domain=example.com"));
        assert!(all[0].contains("HttpOnly"));
        assert!(all[0].contains("Secure"));
        assert!(all[1].starts_with("refresh_token=; Max-Age=0"));
    }
}
