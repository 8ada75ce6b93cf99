//! Per-session serialization of cart requests.
//!
//! A cart request reads the whole cart from the session and the session
//! layer writes the whole record back once the handler has returned. Two
//! requests from the same session must therefore not overlap, or the later
//! write drops the earlier one's changes. Cart and checkout requests that
//! carry a session cookie wait on a lock keyed by that cookie, held until
//! the session layer has saved.
//!
//! Requests without a session cookie are let through: each of them gets a
//! fresh session, so there is nothing to race on.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use moka::future::Cache;
use tokio::sync::Mutex;

use crate::middleware::session::SESSION_COOKIE_NAME;
use crate::services::cookies::cookie_value;
use crate::state::AppState;

/// Path prefixes whose handlers touch the session cart.
const CART_PREFIXES: [&str; 2] = ["/cart", "/checkout"];

/// Locks unused for this long are dropped.
const LOCK_IDLE: Duration = Duration::from_secs(10 * 60);

/// Upper bound on tracked sessions.
const MAX_LOCKS: u64 = 100_000;

/// Async locks keyed by session id. Cheap to clone.
#[derive(Clone)]
pub struct CartLocks(Cache<String, Arc<Mutex<()>>>);

impl Default for CartLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl CartLocks {
    #[must_use]
    pub fn new() -> Self {
        Self(
            Cache::builder()
                .max_capacity(MAX_LOCKS)
                .time_to_idle(LOCK_IDLE)
                .build(),
        )
    }

    /// The lock for `session_id`, created on first use.
    pub async fn lock_for(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.0
            .get_with(session_id.to_string(), async { Arc::new(Mutex::new(())) })
            .await
    }
}

/// Whether `path` is served by a cart-touching handler.
#[must_use]
pub fn touches_cart(path: &str) -> bool {
    CART_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Run cart requests of one session one at a time.
///
/// Must be layered outside the session layer so the lock covers the
/// session save.
pub async fn cart_lock(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !touches_cart(request.uri().path()) {
        return next.run(request).await;
    }
    let Some(session_id) = cookie_value(request.headers(), SESSION_COOKIE_NAME) else {
        return next.run(request).await;
    };

    let lock = state.cart_locks().lock_for(&session_id).await;
    let _guard = lock.lock().await;
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touches_cart() {
        assert!(touches_cart("/cart"));
        assert!(touches_cart("/cart/add"));
        assert!(touches_cart("/checkout"));

        assert!(!touches_cart("/"));
        assert!(!touches_cart("/cartography"));
        assert!(!touches_cart("/dashboard/orders"));
    }

    #[tokio::test]
    async fn test_same_session_shares_a_lock() {
        let locks = CartLocks::new();
        let a = locks.lock_for("session-a").await;
        let again = locks.lock_for("session-a").await;
        let b = locks.lock_for("session-b").await;

        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));

        let _held = a.lock().await;
        assert!(again.try_lock().is_err());
        assert!(b.try_lock().is_ok());
    }
}
