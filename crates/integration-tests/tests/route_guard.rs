//! Dashboard guard and role gating.

#![allow(clippy::unwrap_used)]

use medistore_integration_tests::{TestContext, session_cookie};
use reqwest::{StatusCode, header};

fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_protected_paths_without_cookie_redirect_to_login() {
    let ctx = TestContext::new().await;

    for path in [
        "/dashboard",
        "/dashboard/orders/o-1",
        "/admin-dashboard",
        "/admin-dashboard/users",
    ] {
        let response = ctx.client.get(ctx.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/login", "{path}");
    }
}

#[tokio::test]
async fn test_public_paths_are_not_guarded() {
    let ctx = TestContext::new().await;

    for path in ["/", "/shop", "/login", "/register", "/verify-email"] {
        let response = ctx.client.get(ctx.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn test_stale_cookie_passes_guard_then_fails_session_check() {
    let ctx = TestContext::new().await;

    for (path, expected) in [
        ("/dashboard", "/login?redirect=%2Fdashboard"),
        ("/dashboard/orders", "/login?redirect=%2Fdashboard%2Forders"),
        (
            "/admin-dashboard/users?page=2",
            "/login?redirect=%2Fadmin-dashboard%2Fusers%3Fpage%3D2",
        ),
    ] {
        let response = ctx
            .client
            .get(ctx.url(path))
            .header(header::COOKIE, session_cookie("expired"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), expected, "{path}");
    }
}

#[tokio::test]
async fn test_dashboards_are_role_gated() {
    let ctx = TestContext::new().await;
    let get = |path: &'static str, token: &'static str| {
        ctx.client
            .get(ctx.url(path))
            .header(header::COOKIE, session_cookie(token))
            .send()
    };

    let response = get("/dashboard", "customer-1").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = get("/dashboard", "admin-1").await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin-dashboard");

    let response = get("/admin-dashboard/users", "customer-1").await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get("/dashboard/orders", "seller-1").await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
