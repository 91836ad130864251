//! Remote model-training service trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::{Callback, PredictionRow, RemoteModel, RemoteView};
use crate::domain::template::{FinetunePayload, PredictPayload, TrainingPayload};
use crate::domain::DomainError;

/// Remote service that trains, stores and serves models.
///
/// Payloads are forwarded verbatim; every failure surfaces as
/// [`DomainError::RemoteService`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ModelTrainingService: Send + Sync {
    /// Establish a session with the service
    async fn connect(&self) -> Result<(), DomainError>;

    /// Fetch a model, optionally pinned to a version
    async fn get_model(
        &self,
        name: &str,
        project: &str,
        version: Option<u32>,
    ) -> Result<Option<RemoteModel>, DomainError>;

    /// List all models in a project
    async fn list_models(&self, project: &str) -> Result<Vec<RemoteModel>, DomainError>;

    /// Submit a first training run
    async fn train_model(
        &self,
        name: &str,
        target_column: &str,
        project: &str,
        payload: &TrainingPayload,
    ) -> Result<(), DomainError>;

    /// Submit a retraining run for an existing model
    async fn retrain_model(
        &self,
        name: &str,
        target_column: &str,
        project: &str,
        payload: &TrainingPayload,
    ) -> Result<(), DomainError>;

    /// Adjust an existing model with new data
    async fn finetune_model(
        &self,
        name: &str,
        project: &str,
        payload: &FinetunePayload,
    ) -> Result<(), DomainError>;

    /// Predict from the model alone
    async fn query(
        &self,
        name: &str,
        project: &str,
        version: Option<u32>,
        payload: &PredictPayload,
    ) -> Result<Vec<PredictionRow>, DomainError>;

    /// Predict by joining the model against a table
    async fn batch_query(
        &self,
        name: &str,
        project: &str,
        version: Option<u32>,
        payload: &PredictPayload,
    ) -> Result<Vec<PredictionRow>, DomainError>;

    /// Drop a model
    async fn delete_model(&self, name: &str, project: &str) -> Result<(), DomainError>;

    /// List views in a project
    async fn list_views(&self, project: &str) -> Result<Vec<RemoteView>, DomainError>;

    /// Create a view from a select statement
    async fn create_view(&self, name: &str, project: &str, select: &str)
        -> Result<(), DomainError>;

    /// List registered status callbacks
    async fn list_callbacks(&self) -> Result<Vec<Callback>, DomainError>;

    /// Register a status callback for `url`
    async fn create_callback(&self, url: &str) -> Result<Callback, DomainError>;

    /// Remove a status callback
    async fn delete_callback(&self, id: u64) -> Result<(), DomainError>;
}
