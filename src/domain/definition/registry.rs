//! Immutable registry of model definitions, keyed by name

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::validation::{validate_definition, DefinitionValidationError};
use super::ModelDefinition;
use crate::domain::DomainError;

/// On-disk layout of a definitions file
#[derive(Debug, Deserialize)]
struct DefinitionsFile {
    #[serde(default)]
    models: Vec<ModelDefinition>,
}

/// Model definitions in declaration order
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelDefinition>,
    index: HashMap<String, usize>,
}

impl ModelRegistry {
    /// Build a registry, validating every definition and rejecting duplicates
    pub fn new(models: Vec<ModelDefinition>) -> Result<Self, DomainError> {
        let mut index = HashMap::with_capacity(models.len());

        for (position, model) in models.iter().enumerate() {
            validate_definition(model).map_err(to_domain)?;

            if index.insert(model.name.clone(), position).is_some() {
                return Err(to_domain(DefinitionValidationError::DuplicateName {
                    name: model.name.clone(),
                }));
            }
        }

        Ok(Self { models, index })
    }

    /// Parse definitions from TOML (`[[models]]` array of tables)
    pub fn from_toml(source: &str) -> Result<Self, DomainError> {
        let file: DefinitionsFile = toml::from_str(source).map_err(|e| {
            DomainError::configuration(format!("Failed to parse model definitions: {}", e))
        })?;

        Self::new(file.models)
    }

    /// Load definitions from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read model definitions from {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml(&source)
    }

    pub fn get(&self, name: &str) -> Option<&ModelDefinition> {
        self.index.get(name).map(|position| &self.models[*position])
    }

    /// Get a definition, failing with `UnknownModel` if absent
    pub fn get_required(&self, name: &str) -> Result<&ModelDefinition, DomainError> {
        self.get(name)
            .ok_or_else(|| DomainError::unknown_model(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

fn to_domain(error: DefinitionValidationError) -> DomainError {
    DomainError::validation(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schedule::RetrainCadence;

    const DEFINITIONS: &str = r#"
        [[models]]
        name = "balance_auto"
        tag = "v1.0.0"
        target_column = "sum"
        integration = "banking"
        retrain_schedule = "monthly"

        [models.training_options]
        select = "select * from enriched_balance"

        [[models]]
        name = "balance_gluon"
        tag = "v1.0.0"
        target_column = "sum"
        integration = "banking"
    "#;

    #[test]
    fn test_from_toml_keeps_order() {
        let registry = ModelRegistry::from_toml(DEFINITIONS).unwrap();

        let names: Vec<_> = registry.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["balance_auto", "balance_gluon"]);
        assert_eq!(
            registry.get("balance_auto").unwrap().retrain_schedule,
            Some(RetrainCadence::Monthly)
        );
    }

    #[test]
    fn test_get_required_unknown() {
        let registry = ModelRegistry::from_toml(DEFINITIONS).unwrap();
        assert!(matches!(
            registry.get_required("missing"),
            Err(DomainError::UnknownModel { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let model = ModelDefinition::new("balance", "sum", "v1", "banking");
        let result = ModelRegistry::new(vec![model.clone(), model]);

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[test]
    fn test_invalid_toml() {
        let result = ModelRegistry::from_toml("[[models]]\nname = 3");
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_invalid_cadence_rejected_at_parse() {
        let source = r#"
            [[models]]
            name = "m"
            tag = "v1"
            target_column = "y"
            integration = "db"
            retrain_schedule = "yearly"
        "#;
        assert!(ModelRegistry::from_toml(source).is_err());
    }
}
