//! Catalog endpoints: medicines, categories and reviews.

use reqwest::Method;
use tracing::{debug, instrument};

use medistore_core::MedicineId;

use super::cache::{CATEGORIES_KEY, CacheValue};
use super::types::{Category, Medicine, MedicineFilter, Review, ReviewInput};
use super::{BackendClient, BackendError, Credentials};

impl BackendClient {
    /// List medicines matching a filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, credentials))]
    pub async fn list_medicines(
        &self,
        credentials: &Credentials,
        filter: &MedicineFilter,
    ) -> Result<Vec<Medicine>, BackendError> {
        let request = self
            .request(Method::GET, "/api/medicines", credentials)?
            .query(filter);
        self.send::<Vec<Medicine>>(request)
            .await?
            .into_result()
            .map_err(super::envelope_error)
    }

    /// Get a single medicine with its reviews.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with status 404 if the medicine does not exist.
    #[instrument(skip(self, credentials), fields(medicine_id = %id))]
    pub async fn get_medicine(
        &self,
        credentials: &Credentials,
        id: &MedicineId,
    ) -> Result<Medicine, BackendError> {
        self.get(&format!("/api/medicines/{id}"), credentials).await
    }

    /// List all categories. Cached for five minutes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails on a cache miss.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(CATEGORIES_KEY).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self
            .get("/api/medicines/categories", &Credentials::anonymous())
            .await?;

        self.inner
            .cache
            .insert(
                CATEGORIES_KEY.to_string(),
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// Drop the cached category list after a category mutation.
    pub async fn invalidate_categories(&self) {
        self.inner.cache.invalidate(CATEGORIES_KEY).await;
    }

    /// Post a review for a medicine.
    ///
    /// # Errors
    ///
    /// Returns an error if the visitor is not signed in or the backend rejects the review.
    #[instrument(skip(self, credentials, input), fields(medicine_id = %input.medicine_id))]
    pub async fn create_review(
        &self,
        credentials: &Credentials,
        input: &ReviewInput,
    ) -> Result<Review, BackendError> {
        self.send_json(Method::POST, "/api/reviews", credentials, input)
            .await
    }
}
