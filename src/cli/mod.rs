//! CLI module for the MindsDB model manager
//!
//! - `run`: sync every model, schedule retrains and keep running
//! - `sync`, `retrain`, `finetune`, `predict`, `list`, `delete`, `due`: one-shot commands
//! - `callbacks`: manage status webhooks

pub mod model;
pub mod run;

use clap::{Parser, Subcommand};

/// MindsDB model manager - Declarative model lifecycle and retrain scheduling
#[derive(Parser)]
#[command(name = "mindsdb-models")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sync all models, then keep retraining them on schedule
    Run,

    /// Reconcile every model definition once
    Sync,

    /// Retrain a model now
    Retrain(model::RetrainArgs),

    /// Finetune a model with new data
    Finetune(model::FinetuneArgs),

    /// Run a prediction
    Predict(model::PredictArgs),

    /// List remote models in the project
    List,

    /// Delete a remote model
    Delete(model::DeleteArgs),

    /// Show which scheduled models are behind schedule
    Due,

    /// Manage model status callbacks
    #[command(subcommand)]
    Callbacks(model::CallbackCommand),
}
