use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Unknown model: no definition named '{name}'")]
    UnknownModel { name: String },

    #[error("Model not found: '{name}' does not exist in project '{project}'")]
    ModelNotFound { name: String, project: String },

    #[error("Model '{name}' already exists with tag '{tag}'")]
    AlreadyExists { name: String, tag: String },

    #[error("Model '{name}' is already in progress (status: {status})")]
    AlreadyInProgress { name: String, status: String },

    #[error("Invalid cadence: '{cadence}' has no schedule expression")]
    InvalidCadence { cadence: String },

    #[error("Invalid cron expression '{expression}': {message}")]
    InvalidCronExpression { expression: String, message: String },

    #[error("Remote service error: {message}")]
    RemoteService { message: String },
}

impl DomainError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unknown_model(name: impl Into<String>) -> Self {
        Self::UnknownModel { name: name.into() }
    }

    pub fn model_not_found(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self::ModelNotFound {
            name: name.into(),
            project: project.into(),
        }
    }

    pub fn already_exists(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::AlreadyExists {
            name: name.into(),
            tag: tag.into(),
        }
    }

    pub fn already_in_progress(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self::AlreadyInProgress {
            name: name.into(),
            status: status.into(),
        }
    }

    pub fn invalid_cadence(cadence: impl Into<String>) -> Self {
        Self::InvalidCadence {
            cadence: cadence.into(),
        }
    }

    pub fn invalid_cron(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCronExpression {
            expression: expression.into(),
            message: message.into(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteService {
            message: message.into(),
        }
    }

    /// Whether the error signals that the remote model needs no action right now
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::AlreadyExists { .. } | Self::AlreadyInProgress { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_error() {
        let error = DomainError::unknown_model("balance_auto");
        assert_eq!(
            error.to_string(),
            "Unknown model: no definition named 'balance_auto'"
        );
    }

    #[test]
    fn test_already_exists_error() {
        let error = DomainError::already_exists("balance_auto", "v1.0.0");
        assert_eq!(
            error.to_string(),
            "Model 'balance_auto' already exists with tag 'v1.0.0'"
        );
        assert!(error.is_skip());
    }

    #[test]
    fn test_remote_error_is_not_skip() {
        let error = DomainError::remote("connection refused");
        assert_eq!(error.to_string(), "Remote service error: connection refused");
        assert!(!error.is_skip());
    }
}
