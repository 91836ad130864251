//! Definition domain - Declarative desired state of predictive models

mod entity;
mod registry;
mod validation;

pub use entity::{
    FinetuneOptions, ModelDefinition, PredictOptions, TrainingOptions, UsingOptions,
    ViewDefinition,
};
pub use registry::ModelRegistry;
pub use validation::{validate_definition, validate_name, DefinitionValidationError};
