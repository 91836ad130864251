//! In-memory model training service

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::template::TAG_KEY;
use crate::domain::{
    Callback, DomainError, FinetunePayload, ModelStatus, ModelTrainingService, PredictPayload,
    PredictionRow, RemoteModel, RemoteView, TrainingPayload,
};

/// A call recorded by [`InMemoryTrainingService`]
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Train {
        name: String,
        target_column: String,
        payload: TrainingPayload,
    },
    Retrain {
        name: String,
        target_column: String,
        payload: TrainingPayload,
    },
    Finetune {
        name: String,
        payload: FinetunePayload,
    },
    Query {
        name: String,
        version: Option<u32>,
        payload: PredictPayload,
    },
    BatchQuery {
        name: String,
        version: Option<u32>,
        payload: PredictPayload,
    },
    Delete {
        name: String,
    },
    CreateView {
        name: String,
        select: String,
    },
    CreateCallback {
        url: String,
    },
    DeleteCallback {
        id: u64,
    },
}

/// In-memory stand-in for the remote service, for development and tests.
///
/// Training completes immediately: the model becomes `complete` with the tag
/// carried in the payload's `USING` options.
#[derive(Debug, Default)]
pub struct InMemoryTrainingService {
    models: RwLock<HashMap<(String, String), RemoteModel>>,
    views: RwLock<HashMap<String, Vec<String>>>,
    calls: RwLock<Vec<RemoteCall>>,
    predictions: RwLock<Vec<PredictionRow>>,
    failing: RwLock<HashSet<String>>,
    callbacks: RwLock<Vec<Callback>>,
}

fn lock_error() -> DomainError {
    DomainError::remote("Failed to acquire lock")
}

fn payload_tag(payload: &TrainingPayload) -> Option<String> {
    payload
        .using
        .get(TAG_KEY)
        .and_then(|value| value.as_str())
        .map(str::to_string)
}

impl InMemoryTrainingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a remote model
    pub fn with_model(self, model: RemoteModel) -> Self {
        if let Ok(mut models) = self.models.write() {
            models.insert((model.project.clone(), model.name.clone()), model);
        }
        self
    }

    /// Seed an existing view
    pub fn with_view(self, project: &str, name: &str) -> Self {
        if let Ok(mut views) = self.views.write() {
            views
                .entry(project.to_string())
                .or_default()
                .push(name.to_string());
        }
        self
    }

    /// Rows returned by every prediction
    pub fn with_predictions(self, rows: Vec<PredictionRow>) -> Self {
        if let Ok(mut predictions) = self.predictions.write() {
            *predictions = rows;
        }
        self
    }

    /// Make train, retrain and finetune calls for `name` fail
    pub fn fail_training_for(self, name: &str) -> Self {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(name.to_string());
        }
        self
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls
            .read()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: RemoteCall) -> Result<(), DomainError> {
        self.calls.write().map_err(|_| lock_error())?.push(call);
        Ok(())
    }

    fn check_failing(&self, name: &str) -> Result<(), DomainError> {
        if self.failing.read().map_err(|_| lock_error())?.contains(name) {
            return Err(DomainError::remote(format!("Training of '{}' rejected", name)));
        }
        Ok(())
    }

    fn store_trained(
        &self,
        name: &str,
        project: &str,
        tag: Option<String>,
    ) -> Result<(), DomainError> {
        let mut models = self.models.write().map_err(|_| lock_error())?;
        let key = (project.to_string(), name.to_string());
        let version = models
            .get(&key)
            .and_then(|model| model.version)
            .map_or(1, |version| version + 1);

        let mut model = RemoteModel::new(name, project, ModelStatus::Complete)
            .with_version(version)
            .with_trained_at(Utc::now());
        model.tag = tag;

        models.insert(key, model);
        Ok(())
    }

    fn predictions(&self) -> Result<Vec<PredictionRow>, DomainError> {
        Ok(self.predictions.read().map_err(|_| lock_error())?.clone())
    }
}

#[async_trait]
impl ModelTrainingService for InMemoryTrainingService {
    async fn connect(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn get_model(
        &self,
        name: &str,
        project: &str,
        version: Option<u32>,
    ) -> Result<Option<RemoteModel>, DomainError> {
        let models = self.models.read().map_err(|_| lock_error())?;
        let model = models.get(&(project.to_string(), name.to_string()));

        Ok(model
            .filter(|model| version.is_none() || model.version == version)
            .cloned())
    }

    async fn list_models(&self, project: &str) -> Result<Vec<RemoteModel>, DomainError> {
        let models = self.models.read().map_err(|_| lock_error())?;
        let mut listed: Vec<RemoteModel> = models
            .values()
            .filter(|model| model.project == project)
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }

    async fn train_model(
        &self,
        name: &str,
        target_column: &str,
        project: &str,
        payload: &TrainingPayload,
    ) -> Result<(), DomainError> {
        self.record(RemoteCall::Train {
            name: name.to_string(),
            target_column: target_column.to_string(),
            payload: payload.clone(),
        })?;
        self.check_failing(name)?;
        self.store_trained(name, project, payload_tag(payload))
    }

    async fn retrain_model(
        &self,
        name: &str,
        target_column: &str,
        project: &str,
        payload: &TrainingPayload,
    ) -> Result<(), DomainError> {
        self.record(RemoteCall::Retrain {
            name: name.to_string(),
            target_column: target_column.to_string(),
            payload: payload.clone(),
        })?;
        self.check_failing(name)?;
        self.store_trained(name, project, payload_tag(payload))
    }

    async fn finetune_model(
        &self,
        name: &str,
        project: &str,
        payload: &FinetunePayload,
    ) -> Result<(), DomainError> {
        self.record(RemoteCall::Finetune {
            name: name.to_string(),
            payload: payload.clone(),
        })?;
        self.check_failing(name)?;

        let tag = payload
            .using
            .as_ref()
            .and_then(|using| using.get(TAG_KEY))
            .and_then(|value| value.as_str())
            .map(str::to_string);
        self.store_trained(name, project, tag)
    }

    async fn query(
        &self,
        name: &str,
        _project: &str,
        version: Option<u32>,
        payload: &PredictPayload,
    ) -> Result<Vec<PredictionRow>, DomainError> {
        self.record(RemoteCall::Query {
            name: name.to_string(),
            version,
            payload: payload.clone(),
        })?;
        self.predictions()
    }

    async fn batch_query(
        &self,
        name: &str,
        _project: &str,
        version: Option<u32>,
        payload: &PredictPayload,
    ) -> Result<Vec<PredictionRow>, DomainError> {
        self.record(RemoteCall::BatchQuery {
            name: name.to_string(),
            version,
            payload: payload.clone(),
        })?;
        self.predictions()
    }

    async fn delete_model(&self, name: &str, project: &str) -> Result<(), DomainError> {
        self.record(RemoteCall::Delete {
            name: name.to_string(),
        })?;

        let mut models = self.models.write().map_err(|_| lock_error())?;
        models
            .remove(&(project.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| DomainError::remote(format!("Model '{}' not found", name)))
    }

    async fn list_views(&self, project: &str) -> Result<Vec<RemoteView>, DomainError> {
        let views = self.views.read().map_err(|_| lock_error())?;
        Ok(views
            .get(project)
            .map(|names| names.iter().map(RemoteView::new).collect())
            .unwrap_or_default())
    }

    async fn create_view(
        &self,
        name: &str,
        project: &str,
        select: &str,
    ) -> Result<(), DomainError> {
        self.record(RemoteCall::CreateView {
            name: name.to_string(),
            select: select.to_string(),
        })?;

        let mut views = self.views.write().map_err(|_| lock_error())?;
        let names = views.entry(project.to_string()).or_default();

        if names.iter().any(|existing| existing == name) {
            return Err(DomainError::remote(format!("View '{}' already exists", name)));
        }

        names.push(name.to_string());
        Ok(())
    }

    async fn list_callbacks(&self) -> Result<Vec<Callback>, DomainError> {
        Ok(self.callbacks.read().map_err(|_| lock_error())?.clone())
    }

    async fn create_callback(&self, url: &str) -> Result<Callback, DomainError> {
        self.record(RemoteCall::CreateCallback {
            url: url.to_string(),
        })?;

        let mut callbacks = self.callbacks.write().map_err(|_| lock_error())?;
        let id = callbacks.iter().map(|callback| callback.id).max().unwrap_or(0) + 1;
        let callback = Callback::new(id, url);
        callbacks.push(callback.clone());

        Ok(callback)
    }

    async fn delete_callback(&self, id: u64) -> Result<(), DomainError> {
        self.record(RemoteCall::DeleteCallback { id })?;

        let mut callbacks = self.callbacks.write().map_err(|_| lock_error())?;
        let before = callbacks.len();
        callbacks.retain(|callback| callback.id != id);

        if callbacks.len() == before {
            return Err(DomainError::remote(format!("Callback {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(tag: &str) -> TrainingPayload {
        TrainingPayload {
            select: "select 1".into(),
            integration: "db".into(),
            group_by: None,
            order_by: None,
            horizon: None,
            window: None,
            using: json!({ "tag": tag }).as_object().unwrap().clone(),
        }
    }

    #[tokio::test]
    async fn test_train_then_retrain_bumps_version() {
        let service = InMemoryTrainingService::new();

        service.train_model("m", "y", "p", &payload("v1")).await.unwrap();
        service.retrain_model("m", "y", "p", &payload("v2")).await.unwrap();

        let model = service.get_model("m", "p", None).await.unwrap().unwrap();
        assert_eq!(model.version, Some(2));
        assert_eq!(model.tag.as_deref(), Some("v2"));
        assert_eq!(model.status, ModelStatus::Complete);
        assert_eq!(service.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_view_is_remote_error() {
        let service = InMemoryTrainingService::new().with_view("p", "v");
        let result = service.create_view("v", "p", "select 1").await;

        assert!(matches!(result, Err(DomainError::RemoteService { .. })));
    }

    #[tokio::test]
    async fn test_failing_training() {
        let service = InMemoryTrainingService::new().fail_training_for("m");
        let result = service.train_model("m", "y", "p", &payload("v1")).await;

        assert!(matches!(result, Err(DomainError::RemoteService { .. })));
        assert!(service.get_model("m", "p", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_callbacks_get_increasing_ids() {
        let service = InMemoryTrainingService::new();

        let first = service.create_callback("http://a/hook").await.unwrap();
        let second = service.create_callback("http://b/hook").await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        service.delete_callback(first.id).await.unwrap();
        assert_eq!(service.list_callbacks().await.unwrap(), vec![second]);

        let missing = service.delete_callback(first.id).await;
        assert!(matches!(missing, Err(DomainError::RemoteService { .. })));
        assert_eq!(
            service.calls().last(),
            Some(&RemoteCall::DeleteCallback { id: 1 })
        );
    }
}
