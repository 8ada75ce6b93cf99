//! Auth proxy.
//!
//! Forwards `/api/auth/*` to the auth service on the backend so the browser
//! talks to a single origin. The method, path suffix, query string, body and
//! the relevant request headers go through unchanged. On the way back the
//! status, body and content type are relayed as-is, redirects are passed
//! through rather than followed, and every `Set-Cookie` is rewritten with
//! [`rewrite_set_cookie`].

use axum::{
    Json,
    body::Bytes,
    extract::{OriginalUri, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::middleware::RequestId;
use crate::middleware::request_id::REQUEST_ID_HEADER;
use crate::services::cookies::{joined_cookie_header, rewrite_set_cookie};
use crate::state::AppState;

/// Largest request body accepted for forwarding.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Request headers copied onto the backend request.
/// `Cookie` is forwarded separately, joined into one header.
static FORWARDED_REQUEST_HEADERS: [header::HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::ACCEPT,
    header::ORIGIN,
    header::USER_AGENT,
];

/// Response headers copied back to the browser, besides `Set-Cookie`.
static RELAYED_RESPONSE_HEADERS: [header::HeaderName; 3] = [
    header::CONTENT_TYPE,
    header::LOCATION,
    header::CACHE_CONTROL,
];

/// Error body for proxy failures, in the backend's envelope shape.
fn proxy_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

/// Build the backend URL for an incoming `/api/auth/...` URI.
fn backend_url(base: &Url, uri: &axum::http::Uri) -> Result<Url, url::ParseError> {
    let mut url = base.join(uri.path().trim_start_matches('/'))?;
    url.set_query(uri.query());
    Ok(url)
}

/// Copy the forwarded subset of request headers.
fn forwarded_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in &FORWARDED_REQUEST_HEADERS {
        for value in incoming.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    if let Some(cookie) = joined_cookie_header(incoming)
        .and_then(|joined| HeaderValue::from_str(&joined).ok())
    {
        headers.insert(header::COOKIE, cookie);
    }
    headers
}

/// Relay the backend response, rewriting its cookies.
async fn relay(response: reqwest::Response) -> Response {
    let status = response.status();
    let mut headers = HeaderMap::new();

    for name in &RELAYED_RESPONSE_HEADERS {
        if let Some(value) = response.headers().get(name) {
            headers.insert(name.clone(), value.clone());
        }
    }

    for value in response.headers().get_all(header::SET_COOKIE) {
        let Ok(raw) = value.to_str() else {
            warn!("Dropping non-UTF-8 Set-Cookie from auth service");
            continue;
        };
        match HeaderValue::from_str(&rewrite_set_cookie(raw)) {
            Ok(rewritten) => {
                headers.append(header::SET_COOKIE, rewritten);
            }
            Err(e) => warn!(error = %e, "Dropping unrepresentable rewritten cookie"),
        }
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Failed to read auth service response body");
            return proxy_error(StatusCode::BAD_GATEWAY, "Auth service response was interrupted");
        }
    };

    (status, headers, body).into_response()
}

/// Forward any method on `/api/auth/{*path}` to the auth service.
#[instrument(skip_all, fields(method = %request.method(), path = %uri.path()))]
pub async fn proxy(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    request: Request,
) -> Response {
    let url = match backend_url(&state.config().backend.server_url, &uri) {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, "Could not build auth service URL");
            return proxy_error(StatusCode::BAD_REQUEST, "Invalid auth path");
        }
    };

    let (parts, body) = request.into_parts();
    let method = parts.method.clone();

    let body = if matches!(method, Method::GET | Method::HEAD) {
        Bytes::new()
    } else {
        match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(error = %e, "Rejecting unreadable proxy body");
                return proxy_error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
            }
        }
    };

    let mut outgoing = state
        .http()
        .request(method, url)
        .headers(forwarded_headers(&parts.headers));
    if let Some(RequestId(id)) = parts.extensions.get::<RequestId>() {
        outgoing = outgoing.header(REQUEST_ID_HEADER, id.as_str());
    }
    if !body.is_empty() {
        outgoing = outgoing.body(body);
    }

    match outgoing.send().await {
        Ok(response) => {
            debug!(status = %response.status(), "Auth service responded");
            relay(response).await
        }
        Err(e) => {
            warn!(error = %e, "Auth service unreachable");
            proxy_error(StatusCode::BAD_GATEWAY, "Auth service unavailable")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_url_keeps_suffix_and_query() {
        let base = Url::parse("https://api.medistore.io/").unwrap();
        let uri: axum::http::Uri = "/api/auth/callback/google?code=x%2By&state=1".parse().unwrap();
        assert_eq!(
            backend_url(&base, &uri).unwrap().as_str(),
            "https://api.medistore.io/api/auth/callback/google?code=x%2By&state=1"
        );
    }

    #[test]
    fn test_backend_url_under_base_path() {
        let base = Url::parse("https://example.com/backend/").unwrap();
        let uri: axum::http::Uri = "/api/auth/get-session".parse().unwrap();
        assert_eq!(
            backend_url(&base, &uri).unwrap().as_str(),
            "https://example.com/backend/api/auth/get-session"
        );
    }

    #[test]
    fn test_forwarded_headers_subset() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::COOKIE, HeaderValue::from_static("a=1"));
        incoming.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        incoming.insert(header::HOST, HeaderValue::from_static("localhost:3000"));
        incoming.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer x"));

        let forwarded = forwarded_headers(&incoming);
        assert_eq!(forwarded.get(header::COOKIE).unwrap(), "a=1");
        assert!(forwarded.get(header::CONTENT_TYPE).is_some());
        assert!(forwarded.get(header::HOST).is_none());
        assert!(forwarded.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_forwarded_headers_joins_split_cookies() {
        let mut incoming = HeaderMap::new();
        incoming.append(header::COOKIE, HeaderValue::from_static("a=1"));
        incoming.append(header::COOKIE, HeaderValue::from_static("better-auth.session_token=t"));

        let forwarded = forwarded_headers(&incoming);
        assert_eq!(forwarded.get_all(header::COOKIE).iter().count(), 1);
        assert_eq!(
            forwarded.get(header::COOKIE).unwrap(),
            "a=1; better-auth.session_token=t"
        );
    }
}
