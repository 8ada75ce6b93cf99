//! `/api/auth/*` forwarding and cookie rewriting.

#![allow(clippy::unwrap_used)]

use medistore_integration_tests::{TestContext, session_cookie, spawn_frontend};
use reqwest::{StatusCode, header};
use serde_json::Value;
use tokio::net::TcpListener;
use url::Url;

#[tokio::test]
async fn test_proxy_forwards_method_path_query_and_body() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .post(ctx.url("/api/auth/sign-in/social?callbackURL=%2Fdashboard"))
        .header(header::COOKIE, session_cookie("customer-1"))
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::CONTENT_TYPE, "application/json")
        .body(r#"{"provider":"google"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let echoed: Value = response.json().await.unwrap();
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["path"], "/api/auth/sign-in/social");
    assert_eq!(echoed["query"], "callbackURL=%2Fdashboard");
    assert_eq!(echoed["body"], r#"{"provider":"google"}"#);
    assert_eq!(echoed["origin"], "http://localhost:3000");
    assert_eq!(echoed["content_type"], "application/json");
    assert_eq!(echoed["cookie"], "better-auth.session_token=customer-1");
}

#[tokio::test]
async fn test_proxy_rewrites_every_set_cookie() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .get(ctx.url("/api/auth/callback/google?code=abc"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();

    assert_eq!(cookies.len(), 2);
    for cookie in &cookies {
        assert!(!cookie.to_ascii_lowercase().contains("domain="), "{cookie}");
        assert!(!cookie.contains("SameSite=None"), "{cookie}");
        assert!(cookie.contains("SameSite=Lax"), "{cookie}");
    }
    assert!(cookies[0].starts_with("better-auth.session_token=customer-1"));
    assert!(cookies[0].contains("HttpOnly"));
    assert!(cookies[1].contains("Secure"));
}

#[tokio::test]
async fn test_proxied_session_cookie_is_kept_for_the_frontend_origin() {
    let ctx = TestContext::new().await;

    ctx.client
        .get(ctx.url("/api/auth/callback/google"))
        .send()
        .await
        .unwrap();

    // The rewritten cookie is host-only, so the cookie jar sends it back
    // and the guard lets the dashboard through.
    let response = ctx.client.get(ctx.url("/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_proxy_reports_unreachable_backend_as_bad_gateway() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let base = spawn_frontend(Url::parse(&format!("http://{addr}/")).unwrap()).await;
    let response = medistore_integration_tests::client()
        .get(format!("{base}/api/auth/get-session"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}
