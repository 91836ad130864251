//! Lifecycle service - Reconciles model definitions against the remote service

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{info, warn};

use super::retrain_scheduler::{RetrainTrigger, ScheduledModel};
use crate::domain::{
    render_finetune_options, render_predict_options, render_training_options, Callback,
    DomainError, FinetuneOverrides, ModelDefinition, ModelRegistry, ModelStatus,
    ModelTrainingService, PredictOverrides, PredictionRow, RemoteModel, TrainingOverrides,
};
use crate::infrastructure::observability::record_model_action;

/// Remote action taken by a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// First training run submitted
    Trained,
    /// Existing model retrained
    Retrained,
}

/// Outcome of reconciling every definition
#[derive(Debug, Default)]
pub struct SyncReport {
    pub trained: Vec<String>,
    pub retrained: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, DomainError)>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Lifecycle service owning the create, retrain, finetune and predict paths
#[derive(Debug)]
pub struct ModelLifecycleService<S: ModelTrainingService> {
    service: Arc<S>,
    registry: Arc<ModelRegistry>,
    project: String,
    integration_prefix: String,
}

impl<S: ModelTrainingService> ModelLifecycleService<S> {
    pub fn new(
        service: Arc<S>,
        registry: Arc<ModelRegistry>,
        project: impl Into<String>,
        integration_prefix: impl Into<String>,
    ) -> Self {
        Self {
            service,
            registry,
            project: project.into(),
            integration_prefix: integration_prefix.into(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Bring one model to its desired state: train, retrain, or refuse
    pub async fn create(&self, name: &str) -> Result<ReconcileAction, DomainError> {
        let model = self.registry.get_required(name)?;
        let remote = self.service.get_model(name, &self.project, None).await?;

        match remote {
            None => {
                self.ensure_view(model).await?;
                self.train(model).await?;
                Ok(ReconcileAction::Trained)
            }
            Some(remote) => {
                self.check_reconcilable(model, &remote)?;
                self.retrain(name, None).await?;
                Ok(ReconcileAction::Retrained)
            }
        }
    }

    /// Decide whether an existing remote model may be retrained
    fn check_reconcilable(
        &self,
        model: &ModelDefinition,
        remote: &RemoteModel,
    ) -> Result<(), DomainError> {
        match &remote.status {
            ModelStatus::Error => {
                warn!(model = %model.name, error = ?remote.error, "Remote model in error state, retraining");
                Ok(())
            }
            ModelStatus::Complete if remote.has_tag(&model.tag) => {
                Err(DomainError::already_exists(&model.name, &model.tag))
            }
            ModelStatus::Complete => {
                info!(
                    model = %model.name,
                    remote_tag = ?remote.tag,
                    desired_tag = %model.tag,
                    "Tag drift detected, retraining"
                );
                Ok(())
            }
            status => Err(DomainError::already_in_progress(&model.name, status.as_str())),
        }
    }

    /// Create the model's view unless a view with that name already exists
    async fn ensure_view(&self, model: &ModelDefinition) -> Result<(), DomainError> {
        let (Some(view), Some(view_name)) = (&model.view, model.view_name()) else {
            return Ok(());
        };

        let views = self.service.list_views(&self.project).await?;
        if views.iter().any(|existing| existing.name == view_name) {
            return Ok(());
        }

        info!(model = %model.name, view = %view_name, "Creating view");
        self.service
            .create_view(view_name, &self.project, &view.select)
            .await?;
        record_model_action("create_view");

        Ok(())
    }

    async fn train(&self, model: &ModelDefinition) -> Result<(), DomainError> {
        let payload = render_training_options(model, &self.integration_prefix, None)?;

        info!(model = %model.name, tag = %model.tag, "Training model");
        self.service
            .train_model(&model.name, &model.target_column, &self.project, &payload)
            .await?;
        record_model_action("train");

        Ok(())
    }

    /// Retrain a defined model with freshly rendered training options
    pub async fn retrain(
        &self,
        name: &str,
        overrides: Option<&TrainingOverrides>,
    ) -> Result<(), DomainError> {
        let model = self.registry.get_required(name)?;
        let payload = render_training_options(model, &self.integration_prefix, overrides)?;

        info!(model = %name, tag = %model.tag, "Retraining model");
        self.service
            .retrain_model(name, &model.target_column, &self.project, &payload)
            .await?;
        record_model_action("retrain");

        Ok(())
    }

    /// Retrain path fired by the scheduler.
    ///
    /// Trains models that do not exist yet and refuses models still training.
    pub async fn retrain_due(&self, name: &str) -> Result<ReconcileAction, DomainError> {
        let model = self.registry.get_required(name)?;

        match self.service.get_model(name, &self.project, None).await? {
            None => {
                self.ensure_view(model).await?;
                self.train(model).await?;
                Ok(ReconcileAction::Trained)
            }
            Some(remote) if !remote.status.is_terminal() => Err(DomainError::already_in_progress(
                name,
                remote.status.as_str(),
            )),
            Some(_) => {
                self.retrain(name, None).await?;
                Ok(ReconcileAction::Retrained)
            }
        }
    }

    /// Adjust an existing model with new data
    pub async fn finetune(
        &self,
        name: &str,
        overrides: Option<&FinetuneOverrides>,
    ) -> Result<(), DomainError> {
        let model = self.registry.get_required(name)?;

        if self.service.get_model(name, &self.project, None).await?.is_none() {
            return Err(DomainError::model_not_found(name, &self.project));
        }

        let payload = render_finetune_options(model, &self.integration_prefix, overrides)?;

        info!(model = %name, "Finetuning model");
        self.service
            .finetune_model(name, &self.project, &payload)
            .await?;
        record_model_action("finetune");

        Ok(())
    }

    /// Run a prediction, joining against a table when a join clause is configured
    pub async fn predict(
        &self,
        name: &str,
        overrides: PredictOverrides,
    ) -> Result<Vec<PredictionRow>, DomainError> {
        let model = self.registry.get_required(name)?;
        let overrides = overrides.normalized();

        if self
            .service
            .get_model(name, &self.project, overrides.version)
            .await?
            .is_none()
        {
            return Err(DomainError::model_not_found(name, &self.project));
        }

        let integration = format!("{}{}", self.integration_prefix, model.integration);
        let payload = render_predict_options(model, &integration, Some(&overrides));
        record_model_action("predict");

        if payload.is_batch() {
            self.service
                .batch_query(name, &self.project, overrides.version, &payload)
                .await
        } else {
            self.service
                .query(name, &self.project, overrides.version, &payload)
                .await
        }
    }

    pub async fn list(&self) -> Result<Vec<RemoteModel>, DomainError> {
        self.service.list_models(&self.project).await
    }

    pub async fn get(&self, name: &str, version: Option<u32>) -> Result<RemoteModel, DomainError> {
        self.service
            .get_model(name, &self.project, version)
            .await?
            .ok_or_else(|| DomainError::model_not_found(name, &self.project))
    }

    pub async fn delete(&self, name: &str) -> Result<(), DomainError> {
        info!(model = %name, "Deleting model");
        self.service.delete_model(name, &self.project).await?;
        record_model_action("delete");
        Ok(())
    }

    pub async fn callbacks(&self) -> Result<Vec<Callback>, DomainError> {
        self.service.list_callbacks().await
    }

    /// Register a status callback; only http(s) URLs are accepted
    pub async fn create_callback(&self, url: &str) -> Result<Callback, DomainError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DomainError::validation(format!(
                "Callback URL must be http or https, got '{}'",
                url
            )));
        }

        let callback = self.service.create_callback(url).await?;
        info!(id = callback.id, url = %callback.url, "Created callback");
        record_model_action("create_callback");
        Ok(callback)
    }

    pub async fn delete_callback(&self, id: u64) -> Result<(), DomainError> {
        info!(id, "Deleting callback");
        self.service.delete_callback(id).await?;
        record_model_action("delete_callback");
        Ok(())
    }

    /// Reconcile every definition in declaration order
    pub async fn sync_all(&self) -> SyncReport {
        let mut report = SyncReport::default();

        for model in self.registry.iter() {
            match self.create(&model.name).await {
                Ok(ReconcileAction::Trained) => report.trained.push(model.name.clone()),
                Ok(ReconcileAction::Retrained) => report.retrained.push(model.name.clone()),
                Err(e) if e.is_skip() => {
                    info!(model = %model.name, reason = %e, "Model up to date, skipping");
                    report.skipped.push(model.name.clone());
                }
                Err(e) => {
                    warn!(model = %model.name, error = %e, "Failed to reconcile model");
                    report.failed.push((model.name.clone(), e));
                }
            }
        }

        report
    }

    /// Definitions with no remote history; periodic jobs only, no catch-up
    pub fn scheduled_models(&self) -> Vec<ScheduledModel> {
        self.registry
            .iter()
            .map(|model| ScheduledModel {
                name: model.name.clone(),
                cadence: model.retrain_schedule,
                last_run: None,
            })
            .collect()
    }

    /// Pair every definition with its last successful remote training time
    pub async fn last_runs(&self) -> Result<Vec<ScheduledModel>, DomainError> {
        let remote = self.service.list_models(&self.project).await?;

        Ok(self
            .registry
            .iter()
            .map(|model| {
                let last_run = remote
                    .iter()
                    .filter(|r| r.name == model.name)
                    .filter_map(RemoteModel::last_successful_run)
                    .max();

                ScheduledModel {
                    name: model.name.clone(),
                    cadence: model.retrain_schedule,
                    last_run,
                }
            })
            .collect())
    }
}

impl<S: ModelTrainingService + 'static> ModelLifecycleService<S> {
    /// Scheduler callback that fires [`Self::retrain_due`]
    pub fn retrain_trigger(self: &Arc<Self>) -> RetrainTrigger {
        let lifecycle = Arc::clone(self);

        Arc::new(move |name: String| -> BoxFuture<'static, Result<(), DomainError>> {
            let lifecycle = Arc::clone(&lifecycle);
            async move { lifecycle.retrain_due(&name).await.map(|_| ()) }.boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        MockModelTrainingService, PredictOptions, QueryParams, RemoteView, TrainingOptions,
        ViewDefinition, WhereClause,
    };
    use crate::infrastructure::mindsdb::{InMemoryTrainingService, RemoteCall};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn balance() -> ModelDefinition {
        ModelDefinition::new("balance", "sum", "v2", "banking")
            .with_training_options(TrainingOptions {
                select: Some("select * from enriched_balance".into()),
                ..Default::default()
            })
            .with_predict_options(PredictOptions {
                where_clause: WhereClause::Single("t.customerId = $ID$".into()),
                join: Some("$INTEGRATION$.balance".into()),
                limit: Some(10),
            })
    }

    fn with_view(model: ModelDefinition) -> ModelDefinition {
        model.with_view(ViewDefinition {
            select: "select * from production.banking.enriched_balance".into(),
            name: Some("balance_view".into()),
        })
    }

    fn registry(models: Vec<ModelDefinition>) -> Arc<ModelRegistry> {
        Arc::new(ModelRegistry::new(models).unwrap())
    }

    fn mocked(mock: MockModelTrainingService) -> ModelLifecycleService<MockModelTrainingService> {
        ModelLifecycleService::new(Arc::new(mock), registry(vec![balance()]), "mindsdb", "")
    }

    fn in_memory(
        service: InMemoryTrainingService,
        models: Vec<ModelDefinition>,
    ) -> (
        Arc<InMemoryTrainingService>,
        ModelLifecycleService<InMemoryTrainingService>,
    ) {
        let service = Arc::new(service);
        let lifecycle =
            ModelLifecycleService::new(Arc::clone(&service), registry(models), "mindsdb", "prod_");
        (service, lifecycle)
    }

    fn remote(status: ModelStatus, tag: &str) -> RemoteModel {
        RemoteModel::new("balance", "mindsdb", status).with_tag(tag)
    }

    #[tokio::test]
    async fn test_create_matching_tag_is_already_exists() {
        let mut mock = MockModelTrainingService::new();
        mock.expect_get_model()
            .times(1)
            .returning(|_, _, _| Ok(Some(remote(ModelStatus::Complete, "v2"))));
        mock.expect_train_model().never();
        mock.expect_retrain_model().never();

        let result = mocked(mock).create("balance").await;

        assert!(matches!(result, Err(DomainError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_create_error_state_retrains() {
        let mut mock = MockModelTrainingService::new();
        mock.expect_get_model()
            .returning(|_, _, _| Ok(Some(remote(ModelStatus::Error, "v2"))));
        mock.expect_train_model().never();
        mock.expect_retrain_model()
            .times(1)
            .returning(|name, target, project, payload| {
                assert_eq!(name, "balance");
                assert_eq!(target, "sum");
                assert_eq!(project, "mindsdb");
                assert_eq!(payload.select, "select * from enriched_balance");
                assert_eq!(payload.using["tag"], json!("v2"));
                Ok(())
            });

        let result = mocked(mock).create("balance").await;

        assert_eq!(result.unwrap(), ReconcileAction::Retrained);
    }

    #[tokio::test]
    async fn test_create_tag_drift_retrains() {
        let mut mock = MockModelTrainingService::new();
        mock.expect_get_model()
            .returning(|_, _, _| Ok(Some(remote(ModelStatus::Complete, "v1"))));
        mock.expect_retrain_model().times(1).returning(|_, _, _, _| Ok(()));

        let result = mocked(mock).create("balance").await;

        assert_eq!(result.unwrap(), ReconcileAction::Retrained);
    }

    #[tokio::test]
    async fn test_create_while_training_is_in_progress() {
        let mut mock = MockModelTrainingService::new();
        mock.expect_get_model()
            .returning(|_, _, _| Ok(Some(remote(ModelStatus::Training, "v1"))));
        mock.expect_retrain_model().never();
        mock.expect_train_model().never();

        let result = mocked(mock).create("balance").await;

        assert!(matches!(
            result,
            Err(DomainError::AlreadyInProgress { status, .. }) if status == "training"
        ));
    }

    #[tokio::test]
    async fn test_create_absent_model_trains() {
        let mut mock = MockModelTrainingService::new();
        mock.expect_get_model().returning(|_, _, _| Ok(None));
        mock.expect_list_views().never();
        mock.expect_train_model()
            .times(1)
            .returning(|name, _, _, payload| {
                assert_eq!(name, "balance");
                assert_eq!(payload.integration, "banking");
                Ok(())
            });

        let result = mocked(mock).create("balance").await;

        assert_eq!(result.unwrap(), ReconcileAction::Trained);
    }

    #[tokio::test]
    async fn test_create_unknown_model() {
        let mut mock = MockModelTrainingService::new();
        mock.expect_get_model().never();

        let result = mocked(mock).create("missing").await;

        assert!(matches!(result, Err(DomainError::UnknownModel { .. })));
    }

    #[tokio::test]
    async fn test_remote_failure_propagates() {
        let mut mock = MockModelTrainingService::new();
        mock.expect_get_model()
            .returning(|_, _, _| Err(DomainError::remote("connection refused")));

        let result = mocked(mock).create("balance").await;

        assert!(matches!(result, Err(DomainError::RemoteService { .. })));
    }

    #[tokio::test]
    async fn test_create_builds_missing_view_first() {
        let (service, lifecycle) =
            in_memory(InMemoryTrainingService::new(), vec![with_view(balance())]);

        lifecycle.create("balance").await.unwrap();

        let calls = service.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            RemoteCall::CreateView {
                name: "balance_view".into(),
                select: "select * from production.banking.enriched_balance".into(),
            }
        );
        assert!(matches!(&calls[1], RemoteCall::Train { payload, .. } if payload.integration == "prod_banking"));
    }

    #[tokio::test]
    async fn test_create_skips_existing_view() {
        let (service, lifecycle) = in_memory(
            InMemoryTrainingService::new().with_view("mindsdb", "balance_view"),
            vec![with_view(balance())],
        );

        lifecycle.create("balance").await.unwrap();

        let calls = service.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], RemoteCall::Train { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_view_race_propagates() {
        let mut mock = MockModelTrainingService::new();
        mock.expect_get_model().returning(|_, _, _| Ok(None));
        mock.expect_list_views().returning(|_| Ok(vec![RemoteView::new("other")]));
        mock.expect_create_view()
            .returning(|_, _, _| Err(DomainError::remote("View 'balance_view' already exists")));
        mock.expect_train_model().never();

        let lifecycle = ModelLifecycleService::new(
            Arc::new(mock),
            registry(vec![with_view(balance())]),
            "mindsdb",
            "",
        );

        let result = lifecycle.create("balance").await;
        assert!(matches!(result, Err(DomainError::RemoteService { .. })));
    }

    #[tokio::test]
    async fn test_retrain_with_overrides() {
        let (service, lifecycle) = in_memory(InMemoryTrainingService::new(), vec![balance()]);
        let overrides = TrainingOverrides {
            select: Some("select * from recent_balance".into()),
            using: Some(json!({"engine": "lightwood"}).as_object().unwrap().clone()),
        };

        lifecycle.retrain("balance", Some(&overrides)).await.unwrap();

        match &service.calls()[0] {
            RemoteCall::Retrain { payload, .. } => {
                assert_eq!(payload.select, "select * from recent_balance");
                assert_eq!(payload.using["engine"], json!("lightwood"));
                assert_eq!(payload.using["tag"], json!("v2"));
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retrain_unknown_model() {
        let (_, lifecycle) = in_memory(InMemoryTrainingService::new(), vec![balance()]);
        let result = lifecycle.retrain("missing", None).await;

        assert!(matches!(result, Err(DomainError::UnknownModel { .. })));
    }

    #[tokio::test]
    async fn test_predict_batch_when_join_configured() {
        let row = json!({"sum": 10.5}).as_object().unwrap().clone();
        let (service, lifecycle) = in_memory(
            InMemoryTrainingService::new()
                .with_model(remote(ModelStatus::Complete, "v2"))
                .with_predictions(vec![row.clone()]),
            vec![balance()],
        );

        let rows = lifecycle
            .predict(
                "balance",
                PredictOverrides {
                    params: Some(QueryParams::new().with("$ID$", 42i64)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(rows, vec![row]);
        match &service.calls()[0] {
            RemoteCall::BatchQuery { payload, version, .. } => {
                assert_eq!(payload.join.as_deref(), Some("prod_banking.balance"));
                assert_eq!(payload.where_clause, WhereClause::Single("t.customerId = 42".into()));
                assert_eq!(payload.limit, Some(10));
                assert_eq!(*version, None);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_predict_single_query_without_join() {
        let mut model = balance();
        model.predict_options.join = None;
        let (service, lifecycle) = in_memory(
            InMemoryTrainingService::new().with_model(remote(ModelStatus::Complete, "v2")),
            vec![model],
        );

        lifecycle
            .predict("balance", PredictOverrides { join: Some(" ".into()), ..Default::default() })
            .await
            .unwrap();

        assert!(matches!(service.calls()[0], RemoteCall::Query { .. }));
    }

    #[tokio::test]
    async fn test_predict_missing_remote_model() {
        let (_, lifecycle) = in_memory(InMemoryTrainingService::new(), vec![balance()]);
        let result = lifecycle.predict("balance", PredictOverrides::default()).await;

        assert!(matches!(result, Err(DomainError::ModelNotFound { .. })));
    }

    #[tokio::test]
    async fn test_finetune_requires_remote_model() {
        let (service, lifecycle) = in_memory(InMemoryTrainingService::new(), vec![balance()]);
        let result = lifecycle.finetune("balance", None).await;

        assert!(matches!(result, Err(DomainError::ModelNotFound { .. })));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_finetune_renders_params() {
        let mut model = balance();
        model.finetune_options.select = Some("select * from t where id = $ID$".into());
        let (service, lifecycle) = in_memory(
            InMemoryTrainingService::new().with_model(remote(ModelStatus::Complete, "v2")),
            vec![model],
        );
        let overrides = FinetuneOverrides {
            params: Some(QueryParams::new().with("$ID$", "abc")),
            ..Default::default()
        };

        lifecycle.finetune("balance", Some(&overrides)).await.unwrap();

        match &service.calls()[0] {
            RemoteCall::Finetune { payload, .. } => {
                assert_eq!(payload.select, "select * from t where id = 'abc'");
                assert_eq!(payload.integration, "prod_banking");
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sync_all_reports_each_model() {
        let mut stale = balance();
        stale.name = "stale".into();
        let mut current = balance();
        current.name = "current".into();
        let mut broken = balance();
        broken.name = "broken".into();
        broken.training_options.select = None;

        let (_, lifecycle) = in_memory(
            InMemoryTrainingService::new()
                .with_model(RemoteModel::new("stale", "mindsdb", ModelStatus::Complete).with_tag("v1"))
                .with_model(RemoteModel::new("current", "mindsdb", ModelStatus::Complete).with_tag("v2")),
            vec![balance(), stale, current, broken],
        );

        let report = lifecycle.sync_all().await;

        assert_eq!(report.trained, vec!["balance"]);
        assert_eq!(report.retrained, vec!["stale"]);
        assert_eq!(report.skipped, vec!["current"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_retrain_due_paths() {
        let (service, lifecycle) = in_memory(
            InMemoryTrainingService::new().with_model(remote(ModelStatus::Complete, "v2")),
            vec![balance()],
        );

        // complete with matching tag is still retrained on schedule
        assert_eq!(
            lifecycle.retrain_due("balance").await.unwrap(),
            ReconcileAction::Retrained
        );
        assert!(matches!(service.calls()[0], RemoteCall::Retrain { .. }));

        let (_, lifecycle) = in_memory(InMemoryTrainingService::new(), vec![balance()]);
        assert_eq!(
            lifecycle.retrain_due("balance").await.unwrap(),
            ReconcileAction::Trained
        );

        let (_, lifecycle) = in_memory(
            InMemoryTrainingService::new().with_model(remote(ModelStatus::Generating, "v2")),
            vec![balance()],
        );
        assert!(matches!(
            lifecycle.retrain_due("balance").await,
            Err(DomainError::AlreadyInProgress { .. })
        ));
    }

    #[tokio::test]
    async fn test_last_runs_uses_complete_models_only() {
        let trained_at = Utc.with_ymd_and_hms(2024, 3, 1, 4, 10, 0).unwrap();
        let mut scheduled = balance().with_retrain_schedule(crate::domain::RetrainCadence::Daily);
        scheduled.name = "scheduled".into();

        let (_, lifecycle) = in_memory(
            InMemoryTrainingService::new()
                .with_model(remote(ModelStatus::Error, "v2").with_trained_at(trained_at))
                .with_model(
                    RemoteModel::new("scheduled", "mindsdb", ModelStatus::Complete)
                        .with_trained_at(trained_at),
                ),
            vec![balance(), scheduled],
        );

        let runs = lifecycle.last_runs().await.unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].name, "balance");
        assert_eq!(runs[0].last_run, None);
        assert_eq!(runs[1].cadence, Some(crate::domain::RetrainCadence::Daily));
        assert_eq!(runs[1].last_run, Some(trained_at));
    }

    #[tokio::test]
    async fn test_create_callback_rejects_non_http_url() {
        let service = Arc::new(InMemoryTrainingService::new());
        let lifecycle =
            ModelLifecycleService::new(Arc::clone(&service), registry(vec![balance()]), "mindsdb", "");

        let result = lifecycle.create_callback("ftp://example.com/hook").await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert!(service.calls().is_empty());

        let created = lifecycle
            .create_callback(" https://example.com/hook ")
            .await
            .unwrap();
        assert_eq!(created.url, "https://example.com/hook");
        assert_eq!(lifecycle.callbacks().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_scheduled_models_without_remote() {
        let mut mock = MockModelTrainingService::new();
        mock.expect_list_models()
            .returning(|_| Err(DomainError::remote("connection refused")));
        let lifecycle = ModelLifecycleService::new(
            Arc::new(mock),
            registry(vec![balance().with_retrain_schedule(crate::domain::RetrainCadence::Weekly)]),
            "mindsdb",
            "",
        );

        assert!(lifecycle.last_runs().await.is_err());
        assert_eq!(
            lifecycle.scheduled_models(),
            vec![ScheduledModel {
                name: "balance".into(),
                cadence: Some(crate::domain::RetrainCadence::Weekly),
                last_run: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_retrain_trigger_invokes_retrain_due() {
        let service = Arc::new(InMemoryTrainingService::new());
        let lifecycle = Arc::new(ModelLifecycleService::new(
            Arc::clone(&service),
            registry(vec![balance()]),
            "mindsdb",
            "",
        ));

        let trigger = lifecycle.retrain_trigger();
        trigger("balance".to_string()).await.unwrap();

        assert!(matches!(service.calls()[0], RemoteCall::Train { .. }));
        assert!(trigger("missing".to_string()).await.is_err());
    }
}
