//! Rendering of training, finetune and predict payloads from a model definition
//!
//! All functions are pure: the definition and the caller overrides are only read.

use serde::Serialize;

use super::params::{substitute_params, substitute_str, QueryParams, WhereClause};
use crate::domain::definition::{ModelDefinition, UsingOptions};
use crate::domain::DomainError;

/// Placeholder in join clauses replaced by the fully-qualified integration
pub const INTEGRATION_PLACEHOLDER: &str = "$INTEGRATION$";

/// Synthetic `USING` key carrying the definition tag
pub const TAG_KEY: &str = "tag";

/// Caller overrides for training and retraining
#[derive(Debug, Clone, Default)]
pub struct TrainingOverrides {
    pub select: Option<String>,
    pub using: Option<UsingOptions>,
}

/// Caller overrides for finetuning
#[derive(Debug, Clone, Default)]
pub struct FinetuneOverrides {
    pub select: Option<String>,
    pub using: Option<UsingOptions>,
    pub params: Option<QueryParams>,
}

/// Caller overrides for predictions
#[derive(Debug, Clone, Default)]
pub struct PredictOverrides {
    pub join: Option<String>,
    pub where_clause: Option<WhereClause>,
    pub limit: Option<u32>,
    pub params: Option<QueryParams>,
    /// Pin the prediction to a specific model version
    pub version: Option<u32>,
}

impl PredictOverrides {
    /// Drop fields that carry no value (blank strings, empty conditions)
    pub fn normalized(mut self) -> Self {
        if self.join.as_deref().is_some_and(|join| join.trim().is_empty()) {
            self.join = None;
        }

        if self.where_clause.as_ref().is_some_and(WhereClause::is_empty) {
            self.where_clause = None;
        }

        self
    }
}

/// Rendered training request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingPayload {
    pub select: String,
    pub integration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizon: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<u32>,
    pub using: UsingOptions,
}

/// Rendered finetune request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinetunePayload {
    pub select: String,
    pub integration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub using: Option<UsingOptions>,
}

/// Rendered prediction query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join: Option<String>,
    #[serde(rename = "where")]
    pub where_clause: WhereClause,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl PredictPayload {
    /// Whether the prediction joins the model against a table
    pub fn is_batch(&self) -> bool {
        self.join.is_some()
    }
}

/// Left-to-right merge: `tag`, then the definition's options, then the caller's
fn merge_using(
    tag: &str,
    defaults: Option<&UsingOptions>,
    overrides: Option<&UsingOptions>,
) -> UsingOptions {
    let mut merged = UsingOptions::new();

    if !tag.is_empty() {
        merged.insert(TAG_KEY.to_string(), serde_json::Value::String(tag.to_string()));
    }

    for layer in [defaults, overrides].into_iter().flatten() {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }

    merged
}

pub fn render_training_options(
    model: &ModelDefinition,
    integration_prefix: &str,
    overrides: Option<&TrainingOverrides>,
) -> Result<TrainingPayload, DomainError> {
    let options = &model.training_options;

    let select = overrides
        .and_then(|o| o.select.clone())
        .or_else(|| options.select.clone())
        .ok_or_else(|| {
            DomainError::configuration(format!(
                "Model '{}' has no training select statement",
                model.name
            ))
        })?;

    let defaults = options
        .using
        .as_ref()
        .or(model.finetune_options.using.as_ref());
    let using = merge_using(&model.tag, defaults, overrides.and_then(|o| o.using.as_ref()));

    let integration = options.integration.as_deref().unwrap_or(&model.integration);

    Ok(TrainingPayload {
        select,
        integration: format!("{}{}", integration_prefix, integration),
        group_by: options.group_by.clone(),
        order_by: options.order_by.clone(),
        horizon: options.horizon,
        window: options.window,
        using,
    })
}

pub fn render_finetune_options(
    model: &ModelDefinition,
    integration_prefix: &str,
    overrides: Option<&FinetuneOverrides>,
) -> Result<FinetunePayload, DomainError> {
    let options = &model.finetune_options;

    let select = overrides
        .and_then(|o| o.select.clone())
        .or_else(|| options.select.clone())
        .ok_or_else(|| {
            DomainError::configuration(format!(
                "Model '{}' has no finetune select statement",
                model.name
            ))
        })?;

    let select = match overrides.and_then(|o| o.params.as_ref()) {
        Some(params) => substitute_str(&select, params),
        None => select,
    };

    let defaults = options
        .using
        .as_ref()
        .or(model.training_options.using.as_ref());
    let using = merge_using(&model.tag, defaults, overrides.and_then(|o| o.using.as_ref()));

    let integration = options.integration.as_deref().unwrap_or(&model.integration);

    Ok(FinetunePayload {
        select,
        integration: format!("{}{}", integration_prefix, integration),
        using: (!using.is_empty()).then_some(using),
    })
}

pub fn render_predict_options(
    model: &ModelDefinition,
    integration: &str,
    overrides: Option<&PredictOverrides>,
) -> PredictPayload {
    let options = &model.predict_options;

    let join = overrides
        .and_then(|o| o.join.as_deref())
        .or(options.join.as_deref())
        .filter(|join| !join.trim().is_empty())
        .map(|join| join.replace(INTEGRATION_PLACEHOLDER, integration));

    let where_clause = overrides
        .and_then(|o| o.where_clause.as_ref())
        .unwrap_or(&options.where_clause);
    let where_clause = match overrides.and_then(|o| o.params.as_ref()) {
        Some(params) => substitute_params(where_clause, params),
        None => where_clause.clone(),
    };

    PredictPayload {
        join,
        where_clause,
        limit: overrides.and_then(|o| o.limit).or(options.limit),
    }
}
