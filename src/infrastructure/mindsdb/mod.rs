//! MindsDB implementations of the model training service

mod client;
mod in_memory;
pub mod sql;

pub use client::{MindsDbClient, MindsDbConnection};
pub use in_memory::{InMemoryTrainingService, RemoteCall};
