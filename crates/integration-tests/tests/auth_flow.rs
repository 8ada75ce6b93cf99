//! Sign-in, sign-up and sign-out through the frontend forms.

#![allow(clippy::unwrap_used)]

use medistore_integration_tests::{PASSWORD, TestContext};
use reqwest::{StatusCode, header};

fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_login_relays_rewritten_cookie_and_lands_by_role() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .post(ctx.url("/login"))
        .form(&[("email", "admin@medistore.test"), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin-dashboard");
    let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("better-auth.session_token=admin-1"));
    assert!(!cookie.contains("Domain="));
    assert!(cookie.contains("SameSite=Lax"));

    let response = ctx.client.get(ctx.url("/admin-dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejection_keeps_redirect() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .post(ctx.url("/login"))
        .form(&[
            ("email", "customer@medistore.test"),
            ("password", "wrong"),
            ("redirect", "/checkout"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = location(&response);
    assert!(location.starts_with("/login?redirect=%2Fcheckout&error="), "{location}");
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_ignores_offsite_redirect() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .post(ctx.url("/login"))
        .form(&[
            ("email", "seller@medistore.test"),
            ("password", PASSWORD),
            ("redirect", "//evil.example"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_register_without_session_asks_for_verification() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .post(ctx.url("/register"))
        .form(&[
            ("name", "Nadia"),
            ("email", "nadia@medistore.test"),
            ("password", "long-enough-password"),
            ("password_confirm", "long-enough-password"),
            ("role", "SELLER"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/verify-email?email=nadia%40medistore.test"));
}

#[tokio::test]
async fn test_register_refuses_admin_role() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .post(ctx.url("/register"))
        .form(&[
            ("name", "Mallory"),
            ("email", "mallory@medistore.test"),
            ("password", "long-enough-password"),
            ("password_confirm", "long-enough-password"),
            ("role", "ADMIN"),
        ])
        .send()
        .await
        .unwrap();

    assert!(location(&response).starts_with("/register?error="));
}

#[tokio::test]
async fn test_logout_expires_session_cookie() {
    let ctx = TestContext::new().await;

    ctx.client
        .post(ctx.url("/login"))
        .form(&[("email", "customer@medistore.test"), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();

    let response = ctx.client.post(ctx.url("/logout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .any(|v| v.to_str().unwrap().contains("Max-Age=0"))
    );

    let response = ctx.client.get(ctx.url("/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}
