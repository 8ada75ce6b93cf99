//! Admin endpoints: user registry, categories, all orders and all medicines.

use reqwest::Method;
use tracing::instrument;

use medistore_core::{CategoryId, MedicineId, OrderId, OrderStatus, UserId, UserStatus};

use super::types::{Category, CategoryInput, Medicine, Order, OrderStatusInput, User, UserStatusInput};
use super::{BackendClient, BackendError, Credentials};

impl BackendClient {
    /// Every registered user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the visitor is not an admin.
    #[instrument(skip(self, credentials))]
    pub async fn admin_users(&self, credentials: &Credentials) -> Result<Vec<User>, BackendError> {
        self.get("/api/admin/users", credentials).await
    }

    /// Ban or reactivate a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the change.
    #[instrument(skip(self, credentials), fields(user_id = %id, status = %status))]
    pub async fn set_user_status(
        &self,
        credentials: &Credentials,
        id: &UserId,
        status: UserStatus,
    ) -> Result<(), BackendError> {
        self.send_json_unit(
            Method::PATCH,
            &format!("/api/admin/users/{id}"),
            credentials,
            &UserStatusInput { status },
        )
        .await
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or invalid.
    #[instrument(skip(self, credentials, input), fields(name = %input.name))]
    pub async fn create_category(
        &self,
        credentials: &Credentials,
        input: &CategoryInput,
    ) -> Result<Category, BackendError> {
        let category = self
            .send_json(Method::POST, "/api/admin/categories", credentials, input)
            .await?;
        self.invalidate_categories().await;
        Ok(category)
    }

    /// Rename or re-describe a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the category does not exist or the name is taken.
    #[instrument(skip(self, credentials, input), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        credentials: &Credentials,
        id: &CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, BackendError> {
        let category = self
            .send_json(
                Method::PUT,
                &format!("/api/admin/categories/{id}"),
                credentials,
                input,
            )
            .await?;
        self.invalidate_categories().await;
        Ok(category)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns an error if medicines still reference the category.
    #[instrument(skip(self, credentials), fields(category_id = %id))]
    pub async fn delete_category(
        &self,
        credentials: &Credentials,
        id: &CategoryId,
    ) -> Result<(), BackendError> {
        self.delete(&format!("/api/admin/categories/{id}"), credentials)
            .await?;
        self.invalidate_categories().await;
        Ok(())
    }

    /// Every order on the platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the visitor is not an admin.
    #[instrument(skip(self, credentials))]
    pub async fn admin_orders(&self, credentials: &Credentials) -> Result<Vec<Order>, BackendError> {
        self.get("/api/admin/orders", credentials).await
    }

    /// Move any order to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the transition.
    #[instrument(skip(self, credentials), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        credentials: &Credentials,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), BackendError> {
        self.send_json_unit(
            Method::PATCH,
            &format!("/api/admin/orders/{id}"),
            credentials,
            &OrderStatusInput { status },
        )
        .await
    }

    /// Every medicine on the platform, across sellers.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the visitor is not an admin.
    #[instrument(skip(self, credentials))]
    pub async fn admin_medicines(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<Medicine>, BackendError> {
        self.get("/api/admin/medicines", credentials).await
    }

    /// Take down any medicine listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the medicine does not exist.
    #[instrument(skip(self, credentials), fields(medicine_id = %id))]
    pub async fn admin_delete_medicine(
        &self,
        credentials: &Credentials,
        id: &MedicineId,
    ) -> Result<(), BackendError> {
        self.delete(&format!("/api/admin/medicines/{id}"), credentials)
            .await
    }
}
