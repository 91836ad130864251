//! Domain layer - Core business logic and entities

pub mod definition;
pub mod error;
pub mod remote;
pub mod schedule;
pub mod template;

pub use definition::{
    validate_definition, validate_name, DefinitionValidationError, FinetuneOptions,
    ModelDefinition, ModelRegistry, PredictOptions, TrainingOptions, UsingOptions,
    ViewDefinition,
};
pub use error::DomainError;
#[cfg(test)]
pub use remote::MockModelTrainingService;
pub use remote::{Callback, ModelStatus, ModelTrainingService, PredictionRow, RemoteModel, RemoteView};
pub use schedule::{is_due_at, is_due_now, RetrainCadence, ScheduleTable};
pub use template::{
    render_finetune_options, render_predict_options, render_training_options, substitute_params,
    FinetuneOverrides, FinetunePayload, PredictOverrides, PredictPayload, QueryParam, QueryParams,
    TrainingOverrides, TrainingPayload, WhereClause,
};
