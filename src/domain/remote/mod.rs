//! Remote domain - Observed model state and the training service contract

mod entity;
mod service;

pub use entity::{Callback, ModelStatus, PredictionRow, RemoteModel, RemoteView};
#[cfg(test)]
pub use service::MockModelTrainingService;
pub use service::ModelTrainingService;
