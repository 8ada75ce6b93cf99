//! Customer order endpoints.

use reqwest::Method;
use tracing::instrument;

use medistore_core::OrderId;

use super::types::{CreateOrderInput, Order};
use super::{BackendClient, BackendError, Credentials};

impl BackendClient {
    /// Place an order for the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects the order
    /// (for example when stock ran out since the item was added to the cart).
    #[instrument(skip(self, credentials, input), fields(lines = input.items.len()))]
    pub async fn create_order(
        &self,
        credentials: &Credentials,
        input: &CreateOrderInput,
    ) -> Result<Order, BackendError> {
        self.send_json(Method::POST, "/api/orders", credentials, input)
            .await
    }

    /// Orders placed by the signed-in customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, credentials))]
    pub async fn my_orders(&self, credentials: &Credentials) -> Result<Vec<Order>, BackendError> {
        self.get("/api/orders", credentials).await
    }

    /// A single order belonging to the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with status 404 if the order does not exist.
    #[instrument(skip(self, credentials), fields(order_id = %id))]
    pub async fn get_order(
        &self,
        credentials: &Credentials,
        id: &OrderId,
    ) -> Result<Order, BackendError> {
        self.get(&format!("/api/orders/{id}"), credentials).await
    }

    /// Cancel an order that has not been processed yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the cancellation.
    #[instrument(skip(self, credentials), fields(order_id = %id))]
    pub async fn cancel_order(
        &self,
        credentials: &Credentials,
        id: &OrderId,
    ) -> Result<(), BackendError> {
        self.send_json_unit(
            Method::PATCH,
            &format!("/api/orders/{id}/cancel"),
            credentials,
            &serde_json::json!({}),
        )
        .await
    }
}
