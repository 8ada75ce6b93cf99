//! Seller endpoints: inventory, incoming orders and image uploads.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::instrument;

use medistore_core::{MedicineId, OrderId, OrderStatus};

use super::types::{Medicine, MedicineInput, Order, OrderStatusInput, UploadedImage};
use super::{BackendClient, BackendError, Credentials};

impl BackendClient {
    /// The signed-in seller's inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the visitor is not a seller.
    #[instrument(skip(self, credentials))]
    pub async fn seller_medicines(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<Medicine>, BackendError> {
        self.get("/api/seller/medicines", credentials).await
    }

    /// Add a medicine to the seller's inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails on the backend.
    #[instrument(skip(self, credentials, input), fields(name = %input.name))]
    pub async fn create_medicine(
        &self,
        credentials: &Credentials,
        input: &MedicineInput,
    ) -> Result<Medicine, BackendError> {
        self.send_json(Method::POST, "/api/seller/medicines", credentials, input)
            .await
    }

    /// Replace a medicine's details.
    ///
    /// # Errors
    ///
    /// Returns an error if the medicine does not belong to the seller or validation fails.
    #[instrument(skip(self, credentials, input), fields(medicine_id = %id))]
    pub async fn update_medicine(
        &self,
        credentials: &Credentials,
        id: &MedicineId,
        input: &MedicineInput,
    ) -> Result<Medicine, BackendError> {
        self.send_json(
            Method::PUT,
            &format!("/api/seller/medicines/{id}"),
            credentials,
            input,
        )
        .await
    }

    /// Remove a medicine from the seller's inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if the medicine does not belong to the seller.
    #[instrument(skip(self, credentials), fields(medicine_id = %id))]
    pub async fn delete_medicine(
        &self,
        credentials: &Credentials,
        id: &MedicineId,
    ) -> Result<(), BackendError> {
        self.delete(&format!("/api/seller/medicines/{id}"), credentials)
            .await
    }

    /// Orders containing the seller's medicines.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the visitor is not a seller.
    #[instrument(skip(self, credentials))]
    pub async fn seller_orders(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<Order>, BackendError> {
        self.get("/api/seller/orders", credentials).await
    }

    /// Move one of the seller's orders to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the transition.
    #[instrument(skip(self, credentials), fields(order_id = %id, status = %status))]
    pub async fn update_seller_order_status(
        &self,
        credentials: &Credentials,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), BackendError> {
        self.send_json_unit(
            Method::PATCH,
            &format!("/api/seller/orders/{id}"),
            credentials,
            &OrderStatusInput { status },
        )
        .await
    }

    /// Upload a product image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload service rejects the file.
    #[instrument(skip(self, credentials, bytes), fields(file_name = %file_name, size = bytes.len()))]
    pub async fn upload_image(
        &self,
        credentials: &Credentials,
        file_name: String,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, BackendError> {
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(content_type)?;
        let form = Form::new().part("file", part);

        let request = self
            .request(Method::POST, "/api/upload/image", credentials)?
            .multipart(form);
        self.send::<UploadedImage>(request)
            .await?
            .into_result()
            .map_err(super::envelope_error)
    }
}
