//! Request-scoped cart store.
//!
//! A [`CartStore`] is built per request from a [`CartStorage`] handle,
//! hydrated once, and written back after every mutation. Storage failures
//! are logged and never surfaced to the visitor; a cart that cannot be read
//! back is treated as empty.
//!
//! In production the storage is the visitor's `tower-sessions` slot under
//! the [`CART`](crate::models::session_keys::CART) key.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};
use thiserror::Error;
use tower_sessions::Session;
use tracing::{error, warn};

use medistore_core::{Cart, CartItem, MedicineId, Price, ProductSummary};

use crate::models::session_keys;

/// Failure reading or writing the stored cart.
#[derive(Debug, Error)]
#[error("cart storage error: {0}")]
pub struct StorageError(String);

/// Key/value storage holding the serialized cart.
pub trait CartStorage: Send + Sync {
    /// Read the stored value for `key`, if any.
    fn load(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Replace the stored value for `key`.
    fn save(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), StorageError>> + Send;
}

// =============================================================================
// Storage backends
// =============================================================================

/// Cart storage backed by the visitor's session.
#[derive(Clone)]
pub struct SessionCartStorage(Session);

impl SessionCartStorage {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self(session)
    }
}

impl CartStorage for SessionCartStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0
            .get::<String>(key)
            .await
            .map_err(|e| StorageError(e.to_string()))
    }

    async fn save(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.0
            .insert(key, value)
            .await
            .map_err(|e| StorageError(e.to_string()))
    }
}

/// Process-local storage, shared between clones.
#[derive(Clone, Default)]
pub struct MemoryCartStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing the store.
    pub fn put(&self, key: &str, value: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.into());
        }
    }

    /// Raw stored value for `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

impl CartStorage for MemoryCartStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn save(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError(e.to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// The visitor's cart for the duration of one request.
pub struct CartStore<S> {
    storage: S,
    cart: Cart,
}

/// The cart store used by route handlers.
pub type SessionCart = CartStore<SessionCartStorage>;

impl<S: CartStorage> CartStore<S> {
    /// Hydrate the cart from storage.
    ///
    /// Missing data yields an empty cart. Unreadable data is logged and also
    /// yields an empty cart; it is overwritten on the next mutation.
    pub async fn load(storage: S) -> Self {
        let cart = match storage.load(session_keys::CART).await {
            Ok(Some(raw)) => Cart::from_json(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Stored cart is corrupt, starting empty");
                Cart::new()
            }),
            Ok(None) => Cart::new(),
            Err(e) => {
                error!(error = %e, "Failed to load cart");
                Cart::new()
            }
        };

        Self { storage, cart }
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Add `quantity` units of a product, capped at its stock.
    pub async fn add_to_cart(&mut self, product: &ProductSummary, quantity: u32) {
        self.cart.add(product, quantity);
        self.persist().await;
    }

    /// Remove a line. No-op if absent.
    pub async fn remove_from_cart(&mut self, id: &MedicineId) {
        self.cart.remove(id);
        self.persist().await;
    }

    /// Set a line's quantity, clamped to `[1, stock]`. No-op if absent.
    pub async fn update_quantity(&mut self, id: &MedicineId, quantity: u32) {
        self.cart.update_quantity(id, quantity);
        self.persist().await;
    }

    pub async fn clear_cart(&mut self) {
        self.cart.clear();
        self.persist().await;
    }

    #[must_use]
    pub fn total_price(&self) -> Price {
        self.cart.total_price()
    }

    #[must_use]
    pub fn cart_count(&self) -> u32 {
        self.cart.count()
    }

    /// Write the full cart back. Failures are logged only.
    async fn persist(&self) {
        let json = match self.cart.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to serialize cart");
                return;
            }
        };

        if let Err(e) = self.storage.save(session_keys::CART, json).await {
            error!(error = %e, "Failed to persist cart");
        }
    }
}

impl<S> FromRequestParts<S> for SessionCart
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                error!("Cart used without a session layer installed");
                rejection
            })?;

        Ok(Self::load(SessionCartStorage::new(session)).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, cents: i64, stock: u32) -> ProductSummary {
        ProductSummary {
            id: MedicineId::new(id),
            name: format!("Medicine {id}"),
            price: Price::from_cents(cents),
            image: None,
            stock,
        }
    }

    /// Storage that accepts nothing.
    struct BrokenStorage;

    impl CartStorage for BrokenStorage {
        async fn load(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError("disk on fire".to_string()))
        }

        async fn save(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError("disk on fire".to_string()))
        }
    }

    #[tokio::test]
    async fn test_every_mutation_is_persisted() {
        let storage = MemoryCartStorage::new();
        let mut store = CartStore::load(storage.clone()).await;

        store.add_to_cart(&product("a", 1000, 5), 2).await;
        let reloaded = CartStore::load(storage.clone()).await;
        assert_eq!(reloaded.cart_count(), 2);

        store.update_quantity(&MedicineId::new("a"), 10).await;
        let reloaded = CartStore::load(storage.clone()).await;
        assert_eq!(reloaded.cart_count(), 5);
        assert_eq!(reloaded.total_price(), Price::from_cents(5000));

        store.remove_from_cart(&MedicineId::new("a")).await;
        assert_eq!(storage.raw(session_keys::CART).as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_clear_cart_persists_empty_array() {
        let storage = MemoryCartStorage::new();
        let mut store = CartStore::load(storage.clone()).await;
        store.add_to_cart(&product("a", 100, 3), 1).await;
        store.add_to_cart(&product("b", 250, 3), 3).await;
        assert_eq!(store.cart_count(), 4);

        store.clear_cart().await;
        assert!(store.is_empty());
        assert!(CartStore::load(storage).await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_storage_hydrates_empty() {
        let storage = MemoryCartStorage::new();
        storage.put(session_keys::CART, "{not json");

        let mut store = CartStore::load(storage.clone()).await;
        assert!(store.is_empty());

        // the next mutation overwrites the corrupt value
        store.add_to_cart(&product("a", 100, 1), 1).await;
        let raw = storage.raw(session_keys::CART).unwrap();
        assert!(Cart::from_json(&raw).is_ok());
    }

    #[tokio::test]
    async fn test_hydration_repairs_invariants() {
        let storage = MemoryCartStorage::new();
        storage.put(
            session_keys::CART,
            r#"[
                {"id":"a","name":"A","price":100,"quantity":9,"stock":5},
                {"id":"a","name":"A","price":100,"quantity":1,"stock":5},
                {"id":"b","name":"B","price":2.5,"quantity":0,"stock":3},
                {"id":"c","name":"C","price":1,"quantity":2,"stock":0}
            ]"#,
        );

        let store = CartStore::load(storage).await;
        let items = store.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(items[1].quantity, 1);
    }

    #[tokio::test]
    async fn test_storage_failures_are_not_surfaced() {
        let mut store = CartStore::load(BrokenStorage).await;
        assert!(store.is_empty());

        store.add_to_cart(&product("a", 100, 2), 1).await;
        assert_eq!(store.cart_count(), 1);
    }

    #[tokio::test]
    async fn test_session_storage_round_trip() {
        use tower_sessions::MemoryStore;

        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut store = CartStore::load(SessionCartStorage::new(session.clone())).await;
        store.add_to_cart(&product("a", 1999, 4), 3).await;

        let reloaded = CartStore::load(SessionCartStorage::new(session)).await;
        assert_eq!(reloaded.cart_count(), 3);
        assert_eq!(reloaded.total_price(), Price::from_cents(5997));
    }
}
