//! Traits for database operations
//!
//! This module contains the traits implemented by every repository handle
//! and every persisted entity.

pub mod core;
pub mod table_metadata;

// Re-export all public items for convenience
pub use self::core::StoreObject;
pub use table_metadata::{Column, Index, TableMetadata, TableSchema};
