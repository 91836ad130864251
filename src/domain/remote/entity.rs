//! Observed remote model state

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row returned by a prediction query
pub type PredictionRow = serde_json::Map<String, serde_json::Value>;

/// Training status reported by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelStatus {
    Generating,
    Training,
    Complete,
    Error,
    Other(String),
}

impl ModelStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Generating => "generating",
            Self::Training => "training",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Other(status) => status,
        }
    }

    /// Terminal states are `complete` and `error`; anything else is in progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

impl From<String> for ModelStatus {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "generating" => Self::Generating,
            "training" => Self::Training,
            "complete" => Self::Complete,
            "error" => Self::Error,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ModelStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ModelStatus> for String {
    fn from(status: ModelStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A model as seen by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteModel {
    pub name: String,
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub status: ModelStatus,
    /// When the last training run finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RemoteModel {
    pub fn new(name: impl Into<String>, project: impl Into<String>, status: ModelStatus) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            version: None,
            tag: None,
            status,
            trained_at: None,
            error: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_trained_at(mut self, trained_at: DateTime<Utc>) -> Self {
        self.trained_at = Some(trained_at);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }

    /// Last successful training time; only complete models have one
    pub fn last_successful_run(&self) -> Option<DateTime<Utc>> {
        match self.status {
            ModelStatus::Complete => self.trained_at,
            _ => None,
        }
    }
}

/// A view as seen by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteView {
    pub name: String,
}

impl RemoteView {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Webhook the remote service calls when a model changes status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
    pub id: u64,
    pub url: String,
}

impl Callback {
    pub fn new(id: u64, url: impl Into<String>) -> Self {
        Self { id, url: url.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_parsing() {
        assert_eq!(ModelStatus::from("COMPLETE"), ModelStatus::Complete);
        assert_eq!(ModelStatus::from("error"), ModelStatus::Error);
        assert_eq!(
            ModelStatus::from("creating"),
            ModelStatus::Other("creating".to_string())
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(ModelStatus::Complete.is_terminal());
        assert!(ModelStatus::Error.is_terminal());
        assert!(!ModelStatus::Training.is_terminal());
        assert!(!ModelStatus::Other("creating".into()).is_terminal());
    }

    #[test]
    fn test_last_successful_run_only_when_complete() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 4, 0, 0).unwrap();

        let model = RemoteModel::new("m", "p", ModelStatus::Complete).with_trained_at(at);
        assert_eq!(model.last_successful_run(), Some(at));

        let model = RemoteModel::new("m", "p", ModelStatus::Error).with_trained_at(at);
        assert_eq!(model.last_successful_run(), None);
    }
}
