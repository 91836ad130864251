//! Template domain - Option payload rendering and SQL-safe parameter substitution

mod params;
mod render;

pub use params::{
    escape_sql_string, substitute_params, substitute_str, QueryParam, QueryParams, WhereClause,
    LATEST,
};
pub use render::{
    render_finetune_options, render_predict_options, render_training_options, FinetuneOverrides,
    FinetunePayload, PredictOverrides, PredictPayload, TrainingOverrides, TrainingPayload,
    INTEGRATION_PLACEHOLDER, TAG_KEY,
};
