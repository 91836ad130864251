//! Model definition validation utilities

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ModelDefinition;

/// Maximum length for model and view names
pub const MAX_NAME_LENGTH: usize = 64;

/// SQL identifier: letter or underscore, then letters, digits or underscores
static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Definition validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionValidationError {
    /// Model name is empty
    EmptyName,
    /// Name exceeds maximum length
    NameTooLong { name: String, max: usize },
    /// Name is not a valid identifier
    InvalidName { name: String },
    /// Target column is empty
    EmptyTargetColumn { model: String },
    /// View select statement is empty
    EmptyViewSelect { model: String },
    /// Two definitions share a name
    DuplicateName { name: String },
}

impl fmt::Display for DefinitionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Model name cannot be empty"),
            Self::NameTooLong { name, max } => {
                write!(f, "Name '{}' too long (max {} characters)", name, max)
            }
            Self::InvalidName { name } => write!(
                f,
                "Invalid name '{}': must start with a letter or underscore and contain only letters, digits and underscores",
                name
            ),
            Self::EmptyTargetColumn { model } => {
                write!(f, "Model '{}' has an empty target column", model)
            }
            Self::EmptyViewSelect { model } => {
                write!(f, "View of model '{}' has an empty select statement", model)
            }
            Self::DuplicateName { name } => write!(f, "Model '{}' is defined more than once", name),
        }
    }
}

impl std::error::Error for DefinitionValidationError {}

/// Validate an identifier used as a model or view name
pub fn validate_name(name: &str) -> Result<(), DefinitionValidationError> {
    if name.is_empty() {
        return Err(DefinitionValidationError::EmptyName);
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(DefinitionValidationError::NameTooLong {
            name: name.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    if !IDENTIFIER_PATTERN.is_match(name) {
        return Err(DefinitionValidationError::InvalidName {
            name: name.to_string(),
        });
    }

    Ok(())
}

/// Validate a single model definition
pub fn validate_definition(model: &ModelDefinition) -> Result<(), DefinitionValidationError> {
    validate_name(&model.name)?;

    if model.target_column.trim().is_empty() {
        return Err(DefinitionValidationError::EmptyTargetColumn {
            model: model.name.clone(),
        });
    }

    if let Some(view) = &model.view {
        if view.select.trim().is_empty() {
            return Err(DefinitionValidationError::EmptyViewSelect {
                model: model.name.clone(),
            });
        }

        if let Some(name) = &view.name {
            validate_name(name)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::definition::ViewDefinition;

    #[test]
    fn test_valid_names() {
        assert!(validate_name("balance_auto").is_ok());
        assert!(validate_name("_private").is_ok());
        assert!(validate_name("m1").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(validate_name(""), Err(DefinitionValidationError::EmptyName));
        assert!(matches!(
            validate_name("balance-auto"),
            Err(DefinitionValidationError::InvalidName { .. })
        ));
        assert!(matches!(
            validate_name("1model"),
            Err(DefinitionValidationError::InvalidName { .. })
        ));
        assert!(matches!(
            validate_name(&"a".repeat(65)),
            Err(DefinitionValidationError::NameTooLong { .. })
        ));
    }

    #[test]
    fn test_empty_target_column() {
        let model = ModelDefinition::new("balance", " ", "v1", "banking");
        assert!(matches!(
            validate_definition(&model),
            Err(DefinitionValidationError::EmptyTargetColumn { .. })
        ));
    }

    #[test]
    fn test_empty_view_select() {
        let model = ModelDefinition::new("balance", "sum", "v1", "banking").with_view(
            ViewDefinition {
                select: String::new(),
                name: None,
            },
        );
        assert!(matches!(
            validate_definition(&model),
            Err(DefinitionValidationError::EmptyViewSelect { .. })
        ));
    }
}
