//! Infrastructure layer - External service implementations

pub mod logging;
pub mod mindsdb;
pub mod observability;
pub mod services;
