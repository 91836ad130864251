//! Model definition entity and its option templates

use serde::{Deserialize, Serialize};

use crate::domain::schedule::RetrainCadence;
use crate::domain::template::WhereClause;

/// Free-form `USING` parameters passed to the training engine
pub type UsingOptions = serde_json::Map<String, serde_json::Value>;

/// Derived data view that must exist before the model is trained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    /// SELECT statement backing the view
    pub select: String,

    /// View name; defaults to the model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Template for training and retraining requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,

    /// Number of rows to forecast (time-series models)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon: Option<u32>,

    /// Number of past rows considered per prediction (time-series models)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub using: Option<UsingOptions>,

    /// Data source overriding the model's integration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<String>,
}

/// Template for finetune requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinetuneOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub using: Option<UsingOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<String>,
}

/// Template for prediction queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictOptions {
    #[serde(rename = "where", default)]
    pub where_clause: WhereClause,

    /// Table joined against the model; may contain `$INTEGRATION$`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Desired state for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub name: String,

    pub target_column: String,

    /// Version of the training recipe; drift against the remote tag triggers a retrain
    pub tag: String,

    /// Data source the training data is read from
    pub integration: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrain_schedule: Option<RetrainCadence>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewDefinition>,

    #[serde(default)]
    pub training_options: TrainingOptions,

    #[serde(default)]
    pub finetune_options: FinetuneOptions,

    #[serde(default)]
    pub predict_options: PredictOptions,
}

impl ModelDefinition {
    pub fn new(
        name: impl Into<String>,
        target_column: impl Into<String>,
        tag: impl Into<String>,
        integration: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target_column: target_column.into(),
            tag: tag.into(),
            integration: integration.into(),
            retrain_schedule: None,
            view: None,
            training_options: TrainingOptions::default(),
            finetune_options: FinetuneOptions::default(),
            predict_options: PredictOptions::default(),
        }
    }

    pub fn with_retrain_schedule(mut self, cadence: RetrainCadence) -> Self {
        self.retrain_schedule = Some(cadence);
        self
    }

    pub fn with_view(mut self, view: ViewDefinition) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_training_options(mut self, options: TrainingOptions) -> Self {
        self.training_options = options;
        self
    }

    pub fn with_finetune_options(mut self, options: FinetuneOptions) -> Self {
        self.finetune_options = options;
        self
    }

    pub fn with_predict_options(mut self, options: PredictOptions) -> Self {
        self.predict_options = options;
        self
    }

    /// Name of the dependent view, if the model declares one
    pub fn view_name(&self) -> Option<&str> {
        self.view
            .as_ref()
            .map(|view| view.name.as_deref().unwrap_or(&self.name))
    }
}
