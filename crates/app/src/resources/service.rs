//! Resource service.

use async_trait::async_trait;
use battant::changes::{BatchChange, Payload, ResourceId, batch::BatchResponse};
use mockall::automock;

use crate::resources::errors::ResourceServiceError;

/// A remote row, as returned by the API.
pub type Record = Payload;

#[automock]
#[async_trait]
pub trait ResourceService: Send + Sync {
    /// List every row.
    async fn get_all(&self) -> Result<Vec<Record>, ResourceServiceError>;

    /// Fetch one row.
    async fn get_by_id(&self, id: &ResourceId) -> Result<Record, ResourceServiceError>;

    /// Create a row, returning it as stored.
    async fn create(&self, payload: Payload) -> Result<Record, ResourceServiceError>;

    /// Update a row, returning it as stored.
    async fn update(
        &self,
        id: &ResourceId,
        payload: Payload,
    ) -> Result<Record, ResourceServiceError>;

    /// Delete a row.
    async fn delete(&self, id: &ResourceId) -> Result<(), ResourceServiceError>;

    /// Submit a batch of changes. Results are positionally aligned with
    /// `changes`.
    async fn apply_batch(
        &self,
        changes: Vec<BatchChange>,
    ) -> Result<BatchResponse, ResourceServiceError>;
}
