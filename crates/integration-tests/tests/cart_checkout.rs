//! Session cart and checkout.

#![allow(clippy::unwrap_used)]

use medistore_integration_tests::{PASSWORD, TestContext};
use reqwest::{StatusCode, header};

async fn add_medicine(ctx: &TestContext, id: &str, quantity: u32) -> reqwest::Response {
    let quantity = quantity.to_string();
    ctx.client
        .post(ctx.url("/cart/add"))
        .header("HX-Request", "true")
        .form(&[("id", id), ("quantity", quantity.as_str())])
        .send()
        .await
        .unwrap()
}

/// Paracetamol has 3 in stock on the mock backend.
async fn add_to_cart(ctx: &TestContext, quantity: u32) -> reqwest::Response {
    add_medicine(ctx, "m-para", quantity).await
}

async fn cart_count(ctx: &TestContext) -> String {
    ctx.client
        .get(ctx.url("/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_cart_quantities_are_clamped_to_stock() {
    let ctx = TestContext::new().await;

    let response = add_to_cart(&ctx, 10).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("HX-Trigger").unwrap(), "cart-updated");
    assert!(response.text().await.unwrap().contains(">3<"));

    let response = ctx
        .client
        .post(ctx.url("/cart/update"))
        .form(&[("id", "m-para"), ("quantity", "0")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains(r#"name="quantity" value="1""#));

    assert!(cart_count(&ctx).await.contains(">1<"));
}

#[tokio::test]
async fn test_cart_uses_backend_price_and_stock() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .post(ctx.url("/cart/add"))
        .form(&[
            ("id", "m-para"),
            ("name", "Free pills"),
            ("price", "0.01"),
            ("stock", "999"),
            ("quantity", "50"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = ctx.client.get(ctx.url("/cart")).send().await.unwrap().text().await.unwrap();
    assert!(html.contains("Paracetamol 500mg"));
    assert!(!html.contains("Free pills"));
    assert!(html.contains("$7.50"));
    assert!(cart_count(&ctx).await.contains(">3<"));
}

#[tokio::test]
async fn test_unknown_medicine_is_not_added() {
    let ctx = TestContext::new().await;

    let response = add_medicine(&ctx, "m-missing", 1).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!cart_count(&ctx).await.contains("badge"));
}

#[tokio::test]
async fn test_concurrent_adds_on_one_session_are_all_kept() {
    let ctx = TestContext::new().await;

    // establish the session cookie first
    add_medicine(&ctx, "m-vitc", 1).await;

    let adds = (0..20).map(|_| add_medicine(&ctx, "m-vitc", 1));
    for response in futures::future::join_all(adds).await {
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert!(cart_count(&ctx).await.contains(">21<"));
}

#[tokio::test]
async fn test_cart_survives_across_requests_and_clears() {
    let ctx = TestContext::new().await;

    add_to_cart(&ctx, 2).await;
    let page = ctx.client.get(ctx.url("/cart")).send().await.unwrap();
    let html = page.text().await.unwrap();
    assert!(html.contains("Paracetamol 500mg"));

    let response = ctx.client.post(ctx.url("/cart/clear")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(!cart_count(&ctx).await.contains("badge"));
}

#[tokio::test]
async fn test_checkout_requires_sign_in() {
    let ctx = TestContext::new().await;

    let response = ctx.client.get(ctx.url("/checkout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers().get(header::LOCATION).unwrap();
    assert!(location.to_str().unwrap().starts_with("/login"));
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .post(ctx.url("/login"))
        .form(&[
            ("email", "customer@medistore.test"),
            ("password", PASSWORD),
            ("redirect", "/checkout"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/checkout");

    add_to_cart(&ctx, 2).await;

    let response = ctx.client.get(ctx.url("/checkout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .client
        .post(ctx.url("/checkout"))
        .form(&[("shipping_address", "House 12, Road 5, Dhanmondi, Dhaka")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert!(location.starts_with("/dashboard/orders/o-1?success="), "{location}");

    let orders = ctx.backend.recorded().orders;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["items"][0]["medicineId"], "m-para");
    assert_eq!(orders[0]["items"][0]["quantity"], 2);
    assert_eq!(orders[0]["shippingAddress"], "House 12, Road 5, Dhanmondi, Dhaka");

    assert!(!cart_count(&ctx).await.contains("badge"));

    let response = ctx.client.get(ctx.url("/dashboard/orders/o-1")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_short_address_keeps_cart() {
    let ctx = TestContext::new().await;

    ctx.client
        .post(ctx.url("/login"))
        .form(&[("email", "customer@medistore.test"), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    add_to_cart(&ctx, 1).await;

    let response = ctx
        .client
        .post(ctx.url("/checkout"))
        .form(&[("shipping_address", "Dhaka")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert!(location.starts_with("/checkout?error="), "{location}");

    assert!(ctx.backend.recorded().orders.is_empty());
    assert!(cart_count(&ctx).await.contains(">1<"));
}
