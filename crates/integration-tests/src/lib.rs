//! End-to-end test harness for the MediStore web frontend.
//!
//! Each test spawns a [`MockBackend`] (the REST API plus the auth service)
//! and the real frontend router on ephemeral ports, then drives the
//! frontend with a `reqwest` client that keeps cookies and does not follow
//! redirects.
//!
//! # Mock users
//!
//! The mock auth service knows one session token per role:
//!
//! | token         | role       |
//! |---------------|------------|
//! | `customer-1`  | `CUSTOMER` |
//! | `seller-1`    | `SELLER`   |
//! | `admin-1`     | `ADMIN`    |
//!
//! Signing in with `<role>@medistore.test` and password `correct-horse`
//! issues the matching token.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{any, get, patch, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

use medistore_web::config::WebConfig;
use medistore_web::state::AppState;

/// Session cookie the frontend's route guard looks for.
pub const SESSION_COOKIE: &str = "better-auth.session_token";

/// Password the mock auth service accepts.
pub const PASSWORD: &str = "correct-horse";

/// Requests the mock backend has seen, for assertions.
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub orders: Vec<Value>,
    pub cancelled: Vec<String>,
}

/// Shared state of the mock backend.
#[derive(Clone, Default)]
pub struct MockBackend {
    recorded: Arc<Mutex<Recorded>>,
}

impl MockBackend {
    #[must_use]
    pub fn recorded(&self) -> Recorded {
        self.recorded.lock().unwrap().clone()
    }

    fn router(self) -> Router {
        Router::new()
            // Auth service
            .route("/api/auth/get-session", get(get_session))
            .route("/api/auth/sign-in/email", post(sign_in))
            .route("/api/auth/sign-up/email", post(sign_up))
            .route("/api/auth/sign-out", post(sign_out))
            .route("/api/auth/{*rest}", any(echo))
            // REST API
            .route("/api/medicines/categories", get(categories))
            .route("/api/medicines", get(medicines))
            .route("/api/medicines/{id}", get(medicine))
            .route("/api/orders", get(my_orders).post(create_order))
            .route("/api/orders/{id}", get(order))
            .route("/api/orders/{id}/cancel", patch(cancel_order))
            .route("/api/admin/users", get(admin_users))
            .route("/api/admin/orders", get(my_orders))
            .route("/api/admin/medicines", get(medicines))
            .with_state(self)
    }

    /// Serve the mock on an ephemeral port and return its base URL.
    pub async fn spawn(self) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }
}

// =============================================================================
// Harness
// =============================================================================

/// A running frontend wired to a running mock backend.
pub struct TestContext {
    pub base_url: String,
    pub client: reqwest::Client,
    pub backend: MockBackend,
}

impl TestContext {
    /// Spawn a mock backend and a frontend pointed at it.
    pub async fn new() -> Self {
        let backend = MockBackend::default();
        let backend_url = backend.clone().spawn().await;
        let base_url = spawn_frontend(backend_url).await;
        Self {
            base_url,
            client: client(),
            backend,
        }
    }

    /// Absolute frontend URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Serve the frontend router on an ephemeral port and return its base URL
/// (without a trailing slash).
pub async fn spawn_frontend(backend_url: Url) -> String {
    let state = AppState::new(WebConfig::for_backend(backend_url)).unwrap();
    let app = medistore_web::app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    format!("http://{addr}")
}

/// A browser-like client: keeps cookies, never follows redirects.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// `Cookie` header value carrying a mock session token.
#[must_use]
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}")
}

// =============================================================================
// Auth service handlers
// =============================================================================

fn user_for_token(token: &str) -> Option<Value> {
    let (id, name, role) = match token {
        "customer-1" => ("u-customer", "Casey Customer", "CUSTOMER"),
        "seller-1" => ("u-seller", "Sam Seller", "SELLER"),
        "admin-1" => ("u-admin", "Ada Admin", "ADMIN"),
        _ => return None,
    };
    Some(json!({
        "id": id,
        "name": name,
        "email": format!("{}@medistore.test", role.to_ascii_lowercase()),
        "role": role,
        "status": "ACTIVE",
        "emailVerified": true,
    }))
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Set-Cookie as the real service issues it for a cross-site deployment.
fn issued_cookie(token: &str) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Domain=backend.medistore.test; Path=/; HttpOnly; SameSite=None"
    )
}

async fn get_session(headers: HeaderMap) -> Json<Value> {
    let user = session_token(&headers).and_then(|t| user_for_token(&t));
    Json(user.map_or(Value::Null, |user| json!({ "user": user })))
}

async fn sign_in(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let token = email.split('@').next().map(|role| format!("{role}-1"));

    match token.as_deref().and_then(|t| user_for_token(t).map(|u| (t, u))) {
        Some((token, user)) if password == PASSWORD => (
            [(header::SET_COOKIE, issued_cookie(token))],
            Json(json!({ "user": user })),
        )
            .into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid email or password" })),
        )
            .into_response(),
    }
}

async fn sign_up(Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@medistore.test" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "User already exists" })),
        )
            .into_response();
    }
    // Verification required: no session cookie yet.
    Json(json!({ "user": null })).into_response()
}

async fn sign_out() -> Response {
    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}=; Domain=backend.medistore.test; Path=/; Max-Age=0; SameSite=None"),
        )],
        Json(json!({ "success": true })),
    )
        .into_response()
}

/// Reflect the request back, with two cookies on the response.
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    let echoed = json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "cookie": header_value(header::COOKIE),
        "origin": header_value(header::ORIGIN),
        "content_type": header_value(header::CONTENT_TYPE),
        "body": String::from_utf8_lossy(&body),
    });

    let mut response = Json(echoed).into_response();
    for cookie in [
        issued_cookie("customer-1"),
        "better-auth.state=xyz; Path=/; Domain=.medistore.test; Secure; SameSite=None".to_string(),
    ] {
        response
            .headers_mut()
            .append(header::SET_COOKIE, cookie.parse().unwrap());
    }
    response
}

// =============================================================================
// REST handlers
// =============================================================================

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

fn catalog() -> Vec<Value> {
    vec![
        json!({
            "id": "m-para", "name": "Paracetamol 500mg", "description": "Pain relief",
            "price": 2.5, "stock": 3, "manufacturer": "Beximco",
            "category": { "id": "c-pain", "name": "Pain relief" },
            "reviews": [{ "id": "r1", "rating": 4, "comment": "Works", "user": { "name": "Rahim" } }]
        }),
        json!({
            "id": "m-vitc", "name": "Vitamin C 1000mg", "description": "Immune support",
            "price": "7.99", "stock": 40, "manufacturer": "Square",
            "category": { "id": "c-vit", "name": "Vitamins" }
        }),
    ]
}

async fn categories() -> Json<Value> {
    ok(json!([
        { "id": "c-pain", "name": "Pain relief" },
        { "id": "c-vit", "name": "Vitamins" }
    ]))
}

async fn medicines() -> Json<Value> {
    ok(Value::Array(catalog()))
}

async fn medicine(Path(id): Path<String>) -> Response {
    catalog()
        .into_iter()
        .find(|m| m["id"] == id.as_str())
        .map_or_else(
            || {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "success": false, "error": "Medicine not found" })),
                )
                    .into_response()
            },
            |m| ok(m).into_response(),
        )
}

fn placed_order(id: &str, body: &Value) -> Value {
    json!({
        "id": id,
        "status": "PLACED",
        "totalAmount": 5.0,
        "shippingAddress": body["shippingAddress"],
        "createdAt": "2026-10-01T09:30:00Z",
        "items": body["items"].as_array().map(|items| items.iter().map(|item| json!({
            "medicineId": item["medicineId"],
            "quantity": item["quantity"],
            "price": 2.5,
            "medicine": { "name": "Paracetamol 500mg" }
        })).collect::<Vec<_>>()),
    })
}

async fn create_order(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if session_token(&headers).is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "Unauthorized" })),
        )
            .into_response();
    }
    backend.recorded.lock().unwrap().orders.push(body.clone());
    ok(placed_order("o-1", &body)).into_response()
}

async fn my_orders(State(backend): State<MockBackend>) -> Json<Value> {
    let orders = backend.recorded();
    ok(Value::Array(
        orders
            .orders
            .iter()
            .enumerate()
            .map(|(i, body)| placed_order(&format!("o-{}", i + 1), body))
            .collect(),
    ))
}

async fn order(State(backend): State<MockBackend>, Path(id): Path<String>) -> Response {
    let recorded = backend.recorded();
    match recorded.orders.first() {
        Some(body) if id == "o-1" => ok(placed_order(&id, body)).into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "Order not found" })),
        )
            .into_response(),
    }
}

async fn admin_users() -> Json<Value> {
    ok(Value::Array(
        ["customer-1", "seller-1", "admin-1"]
            .into_iter()
            .filter_map(user_for_token)
            .collect(),
    ))
}

async fn cancel_order(State(backend): State<MockBackend>, Path(id): Path<String>) -> Json<Value> {
    backend.recorded.lock().unwrap().cancelled.push(id);
    Json(json!({ "success": true, "message": "Order cancelled" }))
}
