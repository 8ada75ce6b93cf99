//! Wire types for the MediStore REST backend.
//!
//! All payloads are camelCase JSON. Optional fields default so that list
//! endpoints returning trimmed-down objects still deserialize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medistore_core::{
    CategoryId, MedicineId, OrderId, OrderStatus, Price, ProductSummary, ReviewId, Role, UserId,
    UserStatus,
};

// =============================================================================
// Catalog
// =============================================================================

/// A medicine category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Category reference embedded in a medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

/// A medicine listed for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: MedicineId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub stock: u32,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub seller_id: Option<UserId>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Medicine {
    /// The cart-facing summary of this medicine.
    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            image: self.image.clone(),
            stock: self.stock,
        }
    }

    /// Mean review rating, if there are reviews.
    #[must_use]
    pub fn average_rating(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let total: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
        #[allow(clippy::cast_precision_loss)] // review counts never approach f64 precision
        Some(f64::from(total) / self.reviews.len() as f64)
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Query parameters accepted by `GET /api/medicines`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl MedicineFilter {
    /// Drop blank strings so empty form fields do not become filters.
    #[must_use]
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Self {
            search: clean(self.search),
            category: clean(self.category),
            manufacturer: clean(self.manufacturer),
            min_price: clean(self.min_price),
            max_price: clean(self.max_price),
            sort: clean(self.sort),
            page: self.page.filter(|p| *p > 0),
            limit: self.limit.filter(|l| *l > 0),
        }
    }
}

/// Body for creating or updating a medicine in a seller's inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
    pub manufacturer: String,
    pub category_id: CategoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Body for creating or renaming a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// =============================================================================
// Reviews
// =============================================================================

/// Reviewer shown next to a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub name: String,
}

/// A customer review of a medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub user: Option<Reviewer>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    #[must_use]
    pub fn author(&self) -> &str {
        self.user.as_ref().map_or("Anonymous", |u| u.name.as_str())
    }

    /// Filled and empty stars, e.g. `★★★☆☆`.
    #[must_use]
    pub fn stars(&self) -> String {
        let filled = usize::from(self.rating.min(5));
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }

    #[must_use]
    pub fn posted_on(&self) -> String {
        format_date(self.created_at)
    }
}

/// Body for `POST /api/reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub medicine_id: MedicineId,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

// =============================================================================
// Orders
// =============================================================================

/// Medicine details embedded in an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMedicine {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A line in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub medicine_id: MedicineId,
    pub quantity: u32,
    pub price: Price,
    #[serde(default)]
    pub medicine: Option<OrderMedicine>,
}

/// Customer contact shown to sellers and admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    pub name: String,
    pub email: String,
}

/// An order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total_amount: Price,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub customer: Option<OrderCustomer>,
}

impl Order {
    /// Placement date for listings, e.g. `Mar 4, 2026`.
    #[must_use]
    pub fn placed_on(&self) -> String {
        format_date(self.created_at)
    }

    /// Total units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        self.status.is_cancellable()
    }
}

impl OrderItem {
    /// Display name, falling back to the medicine ID when the backend
    /// omitted the embedded medicine.
    #[must_use]
    pub fn name(&self) -> String {
        self.medicine
            .as_ref()
            .map_or_else(|| self.medicine_id.to_string(), |m| m.name.clone())
    }

    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// A line in `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub medicine_id: MedicineId,
    pub quantity: u32,
}

/// Body for `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    pub items: Vec<OrderLineInput>,
    pub shipping_address: String,
}

/// Body for order status updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusInput {
    pub status: OrderStatus,
}

// =============================================================================
// Users
// =============================================================================

/// A platform user as listed in the admin registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    #[must_use]
    pub fn joined_on(&self) -> String {
        format_date(self.created_at)
    }

    #[must_use]
    pub fn is_banned(&self) -> bool {
        self.status == UserStatus::Banned
    }
}

/// Body for admin user status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatusInput {
    pub status: UserStatus,
}

// =============================================================================
// Uploads
// =============================================================================

/// Result of `POST /api/upload/image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
}

/// Short human date, or a dash when unknown.
#[must_use]
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%b %-d, %Y").to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_medicine_list_item_deserializes_with_defaults() {
        let json = r#"{"id":"m1","name":"Paracetamol 500mg","price":2.5,"stock":40}"#;
        let medicine: Medicine = serde_json::from_str(json).unwrap();
        assert_eq!(medicine.price, Price::from_cents(250));
        assert!(medicine.reviews.is_empty());
        assert!(medicine.in_stock());
        assert_eq!(medicine.average_rating(), None);
    }

    #[test]
    fn test_average_rating() {
        let json = r#"{"id":"m1","name":"Ibuprofen","price":4,"stock":0,
            "reviews":[{"id":"r1","rating":5},{"id":"r2","rating":2}]}"#;
        let medicine: Medicine = serde_json::from_str(json).unwrap();
        assert_eq!(medicine.average_rating(), Some(3.5));
        assert!(!medicine.in_stock());
    }

    #[test]
    fn test_order_deserializes_backend_shape() {
        let json = r#"{
            "id":"o1","status":"SHIPPED","totalAmount":12.5,
            "shippingAddress":"221B Baker Street",
            "createdAt":"2026-03-01T10:00:00Z",
            "items":[{"medicineId":"m1","quantity":5,"price":2.5,"medicine":{"name":"Paracetamol"}}]
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.placed_on(), "Mar 1, 2026");
        assert_eq!(order.unit_count(), 5);
        assert!(!order.can_cancel());
        assert_eq!(order.items[0].name(), "Paracetamol");
        assert_eq!(order.items[0].line_total(), Price::from_cents(1250));
    }

    #[test]
    fn test_review_display_helpers() {
        let review: Review =
            serde_json::from_str(r#"{"id":"r1","rating":3,"user":{"name":"Rahim"}}"#).unwrap();
        assert_eq!(review.author(), "Rahim");
        assert_eq!(review.stars(), "★★★☆☆");
        assert_eq!(review.posted_on(), "-");
    }

    #[test]
    fn test_filter_normalization_drops_blank_fields() {
        let filter = MedicineFilter {
            search: Some("  ".to_string()),
            category: Some(" vitamins ".to_string()),
            page: Some(0),
            ..MedicineFilter::default()
        }
        .normalized();
        assert_eq!(filter.search, None);
        assert_eq!(filter.category.as_deref(), Some("vitamins"));
        assert_eq!(filter.page, None);
    }

    #[test]
    fn test_create_order_serializes_camel_case() {
        let input = CreateOrderInput {
            items: vec![OrderLineInput {
                medicine_id: MedicineId::new("m1"),
                quantity: 2,
            }],
            shipping_address: "Dhaka".to_string(),
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["items"][0]["medicineId"], "m1");
        assert_eq!(json["shippingAddress"], "Dhaka");
    }
}
