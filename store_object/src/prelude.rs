//! Convenience re-exports for common store-object usage

// Core traits
pub use crate::traits::{StoreObject, TableMetadata, TableSchema};

// Error types
pub use crate::errors::StoreError;

// Models and repository handles
pub use crate::models::{Post, User};
pub use crate::stores::{PostStore, UserStore};

// Pagination
pub use crate::pagination::{ListOptions, ListPage};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use sqlx::{FromRow, PgPool, Row};
