//! Cookie helpers shared by the auth proxy, the auth client and the route guard.
//!
//! The backend runs on a different origin than this frontend. Cookies it
//! issues carry its own `Domain` and `SameSite=None`, which browsers either
//! bind to the wrong host or reject as third-party cookies. Before a backend
//! `Set-Cookie` is relayed to the browser it is rewritten so the cookie binds
//! to the frontend host and survives top-level navigation.

use axum::http::{HeaderMap, header::COOKIE};
use tower_sessions::cookie::Cookie;

/// Rewrite a backend `Set-Cookie` value for relaying to the browser.
///
/// - the `Domain` attribute is removed
/// - `SameSite=None` becomes `SameSite=Lax`
///
/// The name/value pair and every other attribute are kept verbatim and in order.
///
/// ```
/// use medistore_web::services::cookies::rewrite_set_cookie;
///
/// assert_eq!(
///     rewrite_set_cookie("token=abc; Domain=backend.example.com; SameSite=None"),
///     "token=abc; SameSite=Lax",
/// );
/// ```
#[must_use]
pub fn rewrite_set_cookie(value: &str) -> String {
    let mut parts = value.split(';');
    let mut rewritten = vec![parts.next().unwrap_or_default().trim().to_string()];

    for attribute in parts.map(str::trim).filter(|a| !a.is_empty()) {
        let (name, attr_value) = attribute
            .split_once('=')
            .map_or((attribute, None), |(n, v)| (n.trim(), Some(v.trim())));

        if name.eq_ignore_ascii_case("domain") {
            continue;
        }
        if name.eq_ignore_ascii_case("samesite")
            && attr_value.is_some_and(|v| v.eq_ignore_ascii_case("none"))
        {
            rewritten.push("SameSite=Lax".to_string());
            continue;
        }
        rewritten.push(attribute.to_string());
    }

    rewritten.join("; ")
}

/// Whether the request carries a cookie named `name` with a non-empty value.
///
/// The `__Secure-` prefixed variant that auth services issue over HTTPS counts
/// as the same cookie. Only presence is checked, never validity.
#[must_use]
pub fn has_cookie(headers: &HeaderMap, name: &str) -> bool {
    let secure_name = format!("__Secure-{name}");
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .any(|cookie| {
            (cookie.name() == name || cookie.name() == secure_name) && !cookie.value().is_empty()
        })
}

/// Value of the request cookie named `name`, if present and non-empty.
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

/// Join every `Cookie` request header into a single header value.
///
/// HTTP/2 clients may split cookies across several headers; the backend
/// expects one.
#[must_use]
pub fn joined_cookie_header(headers: &HeaderMap) -> Option<String> {
    let joined = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join("; ");
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_rewrite_strips_domain_and_downgrades_same_site() {
        assert_eq!(
            rewrite_set_cookie("token=abc; Domain=backend.example.com; SameSite=None"),
            "token=abc; SameSite=Lax"
        );
    }

    #[test]
    fn test_rewrite_keeps_other_attributes_in_order() {
        assert_eq!(
            rewrite_set_cookie(
                "better-auth.session_token=s%3Axyz; Max-Age=604800; domain=.api.io; Path=/; HttpOnly; Secure; samesite=none"
            ),
            "better-auth.session_token=s%3Axyz; Max-Age=604800; Path=/; HttpOnly; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn test_rewrite_leaves_strict_and_lax_alone() {
        assert_eq!(
            rewrite_set_cookie("a=1; SameSite=Strict"),
            "a=1; SameSite=Strict"
        );
        assert_eq!(rewrite_set_cookie("a=1; SameSite=Lax"), "a=1; SameSite=Lax");
        assert_eq!(rewrite_set_cookie("a=1"), "a=1");
    }

    #[test]
    fn test_rewrite_keeps_equals_inside_value() {
        assert_eq!(
            rewrite_set_cookie("data=a=b=c; Domain=x.io"),
            "data=a=b=c"
        );
    }

    #[test]
    fn test_has_cookie_presence() {
        let mut headers = HeaderMap::new();
        assert!(!has_cookie(&headers, "session"));

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=abc"));
        assert!(has_cookie(&headers, "session"));
        assert!(!has_cookie(&headers, "sess"));
    }

    #[test]
    fn test_has_cookie_accepts_secure_prefix_and_rejects_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("__Secure-session=abc"));
        assert!(has_cookie(&headers, "session"));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session="));
        assert!(!has_cookie(&headers, "session"));
    }

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1; medistore_session="));
        headers.append(COOKIE, HeaderValue::from_static("medistore_session=abc"));
        assert_eq!(cookie_value(&headers, "medistore_session").as_deref(), Some("abc"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_joined_cookie_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(joined_cookie_header(&headers), None);

        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("b=2"));
        assert_eq!(joined_cookie_header(&headers).as_deref(), Some("a=1; b=2"));
    }
}
