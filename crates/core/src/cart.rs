//! Shopping cart model.
//!
//! The cart is an ordered list of [`CartItem`]s with unique IDs. Every
//! mutation keeps `1 <= quantity <= stock` for every item; out-of-range
//! requests are clamped silently instead of failing.
//!
//! Persistence is not handled here. The web crate wraps a [`Cart`] in a
//! request-scoped store that writes it back after each mutation.

use serde::{Deserialize, Serialize};

use crate::types::{MedicineId, Price};

/// The product data required to put something in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: MedicineId,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
    pub stock: u32,
}

/// A single line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: MedicineId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: u32,
    pub stock: u32,
}

impl CartItem {
    /// `price * quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Clamp a requested quantity into `[1, stock]`.
///
/// Callers must check `stock > 0` first; with no stock there is no valid quantity.
const fn clamp_quantity(quantity: u32, stock: u32) -> u32 {
    if quantity < 1 {
        1
    } else if quantity > stock {
        stock
    } else {
        quantity
    }
}

/// The shopping cart.
///
/// Serializes as a plain JSON array of items. Deserialization goes through
/// [`Cart::from_items`], so stored data that violates the invariants (duplicate
/// IDs, zero quantities, quantities above stock) is repaired on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from raw items, restoring the invariants.
    ///
    /// Duplicate IDs are merged into the first occurrence (quantities summed),
    /// quantities are clamped to `[1, stock]`, and items without stock are dropped.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut normalized: Vec<CartItem> = Vec::with_capacity(items.len());
        for item in items {
            if let Some(existing) = normalized.iter_mut().find(|i| i.id == item.id) {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            } else {
                normalized.push(item);
            }
        }
        normalized.retain(|item| item.stock > 0);
        for item in &mut normalized {
            item.quantity = clamp_quantity(item.quantity, item.stock);
        }
        Self { items: normalized }
    }

    /// Parse a cart from its stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the input is not a JSON array of items.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the cart to its stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up an item by ID.
    #[must_use]
    pub fn get(&self, id: &MedicineId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line is topped up (capped at stock) and refreshed with the
    /// product's current name, price, image and stock. A new line is appended
    /// with the quantity clamped to `[1, stock]`. Products without stock are
    /// ignored; an existing line whose product ran out of stock is removed.
    pub fn add(&mut self, product: &ProductSummary, quantity: u32) {
        if product.stock == 0 {
            self.remove(&product.id);
            return;
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.id == product.id) {
            item.name.clone_from(&product.name);
            item.price = product.price;
            item.image.clone_from(&product.image);
            item.stock = product.stock;
            item.quantity = clamp_quantity(item.quantity.saturating_add(quantity), product.stock);
            return;
        }

        self.items.push(CartItem {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity: clamp_quantity(quantity, product.stock),
            stock: product.stock,
        });
    }

    /// Remove the line with `id`. No-op if absent.
    pub fn remove(&mut self, id: &MedicineId) {
        self.items.retain(|item| &item.id != id);
    }

    /// Set the quantity for `id`, clamped to `[1, stock]`. No-op if absent.
    pub fn update_quantity(&mut self, id: &MedicineId, quantity: u32) {
        if let Some(item) = self.items.iter_mut().find(|i| &i.id == id) {
            item.quantity = clamp_quantity(quantity, item.stock);
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, item| acc.saturating_add(item.quantity))
    }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: &str, price: i64, stock: u32) -> ProductSummary {
        ProductSummary {
            id: MedicineId::new(id),
            name: format!("Medicine {id}"),
            price: Price::new(Decimal::from(price)),
            image: None,
            stock,
        }
    }

    fn assert_invariants(cart: &Cart) {
        for item in cart.items() {
            assert!(item.quantity >= 1, "{item:?} below 1");
            assert!(item.quantity <= item.stock, "{item:?} above stock");
        }
        let mut ids: Vec<_> = cart.items().iter().map(|i| i.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), cart.items().len(), "duplicate ids");
    }

    #[test]
    fn test_update_quantity_clamps_to_stock() {
        let mut cart = Cart::new();
        cart.add(&product("a", 100, 5), 2);

        cart.update_quantity(&MedicineId::new("a"), 10);

        assert_eq!(cart.get(&MedicineId::new("a")).unwrap().quantity, 5);
        assert_eq!(cart.total_price(), Price::new(Decimal::from(500)));
    }

    #[test]
    fn test_update_quantity_clamps_to_one() {
        let mut cart = Cart::new();
        cart.add(&product("a", 100, 5), 3);
        cart.update_quantity(&MedicineId::new("a"), 0);
        assert_eq!(cart.get(&MedicineId::new("a")).unwrap().quantity, 1);
    }

    #[test]
    fn test_update_quantity_unknown_id_is_noop() {
        let mut cart = Cart::new();
        cart.add(&product("a", 100, 5), 1);
        let before = cart.clone();
        cart.update_quantity(&MedicineId::new("missing"), 3);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_existing_accumulates_and_caps() {
        let mut cart = Cart::new();
        let a = product("a", 10, 4);
        cart.add(&a, 3);
        cart.add(&a, 3);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 4);
    }

    #[test]
    fn test_add_zero_quantity_becomes_one() {
        let mut cart = Cart::new();
        cart.add(&product("a", 10, 4), 0);
        assert_eq!(cart.items()[0].quantity, 1);
    }

    #[test]
    fn test_add_out_of_stock_is_ignored() {
        let mut cart = Cart::new();
        cart.add(&product("a", 10, 0), 1);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_refreshes_product_details() {
        let mut cart = Cart::new();
        cart.add(&product("a", 10, 10), 8);
        cart.add(&product("a", 12, 3), 1);
        let item = &cart.items()[0];
        assert_eq!(item.price, Price::new(Decimal::from(12)));
        assert_eq!(item.stock, 3);
        assert_eq!(item.quantity, 3);
    }

    #[test]
    fn test_remove_then_add_yields_single_fresh_entry() {
        let mut cart = Cart::new();
        let a = product("a", 10, 9);
        cart.add(&a, 4);
        cart.add(&product("b", 5, 9), 1);

        cart.remove(&a.id);
        cart.add(&a, 2);

        let entries: Vec<_> = cart.items().iter().filter(|i| i.id == a.id).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].quantity, 2);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add(&product("a", 10, 9), 1);
        cart.remove(&MedicineId::new("zzz"));
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(&product("a", 10, 9), 1);
        cart.add(&product("b", 10, 9), 1);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.count(), 0);
        assert_eq!(cart.total_price(), Price::ZERO);
    }

    #[test]
    fn test_quantities_stay_in_bounds_for_mixed_sequences() {
        let products = [product("a", 3, 1), product("b", 7, 4), product("c", 11, 25)];
        let mut cart = Cart::new();
        // Deterministic pseudo-random walk over add/update calls.
        let mut seed: u32 = 17;
        for step in 0..500_u32 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let target = &products[(seed as usize >> 4) % products.len()];
            let quantity = (seed >> 8) % 40;
            if step % 3 == 0 {
                cart.update_quantity(&target.id, quantity);
            } else {
                cart.add(target, quantity);
            }
            assert_invariants(&cart);
        }
    }

    #[test]
    fn test_totals_match_lines() {
        let mut cart = Cart::new();
        cart.add(&product("a", 3, 10), 2);
        cart.add(&product("b", 7, 10), 5);
        cart.add(&product("c", 11, 10), 1);

        let expected: Decimal = cart
            .items()
            .iter()
            .map(|i| i.price.amount() * Decimal::from(i.quantity))
            .sum();
        assert_eq!(cart.total_price().amount(), expected);
        assert_eq!(cart.count(), 8);
    }

    #[test]
    fn test_json_round_trip_preserves_entries() {
        let mut cart = Cart::new();
        cart.add(&product("a", 3, 10), 2);
        cart.add(&product("b", 7, 10), 5);

        let json = cart.to_json().unwrap();
        let restored = Cart::from_json(&json).unwrap();

        assert_eq!(restored, cart);
    }

    #[test]
    fn test_from_json_repairs_invalid_state() {
        let json = r#"[
            {"id":"a","name":"A","price":"10","image":null,"quantity":3,"stock":4},
            {"id":"a","name":"A","price":"10","image":null,"quantity":3,"stock":4},
            {"id":"b","name":"B","price":"5","quantity":0,"stock":2},
            {"id":"c","name":"C","price":"5","quantity":1,"stock":0}
        ]"#;
        let cart = Cart::from_json(json).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.get(&MedicineId::new("a")).unwrap().quantity, 4);
        assert_eq!(cart.get(&MedicineId::new("b")).unwrap().quantity, 1);
        assert_invariants(&cart);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(Cart::from_json("{not json").is_err());
        assert!(Cart::from_json(r#"{"id":"a"}"#).is_err());
    }
}
