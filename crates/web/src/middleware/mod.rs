//! HTTP middleware stack for the web frontend.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame options, etc.)
//! 5. Route guard (session cookie presence on dashboards)
//! 6. Cart lock (one cart request per session at a time)
//! 7. Session layer (tower-sessions `MemoryStore`, holds the cart)
//! 8. Rate limiting on login/register posts (governor)

pub mod auth;
pub mod cart_lock;
pub mod guard;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, OptionalUser, RequireAdmin, RequireCustomer, RequireMember, RequireSeller,
    RequireUser, login_redirect,
};
pub use cart_lock::{CartLocks, cart_lock};
pub use guard::{is_protected, route_guard};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
