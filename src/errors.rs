//! Error types for the datastore crate
//!
//! This module contains all error types that can be returned by factory,
//! teardown and schema maintenance operations.

use std::fmt;
use std::sync::Arc;

use config::ConfigError;
use thiserror::Error;

/// Why the one initialization attempt of a factory failed.
/// Shared through `Arc` so every caller observes the same failure.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("invalid connection options: {0}")]
    Configuration(#[from] ConfigError),

    #[error("failed to create connection pool for {options}: {source}")]
    PoolCreation {
        /// Options in effect, password redacted
        options: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("initialization was cancelled before the connection pool was created")]
    Abandoned,
}

/// Which schema maintenance operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaPhase {
    Migrate,
    Clean,
}

impl fmt::Display for SchemaPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaPhase::Migrate => f.write_str("migrate"),
            SchemaPhase::Clean => f.write_str("clean"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("failed to get store factory: {0}")]
    Initialization(Arc<InitError>),

    #[error("failed to close connection pool: {0}")]
    Teardown(#[source] sqlx::Error),

    #[error("schema {phase} failed on table {table}: {source}")]
    Schema {
        phase: SchemaPhase,
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),
}

impl FactoryError {
    /// The shared initialization failure, if this is one
    pub fn init_error(&self) -> Option<&Arc<InitError>> {
        match self {
            FactoryError::Initialization(err) => Some(err),
            _ => None,
        }
    }
}
