//! Convenience re-exports for common datastore usage
//!
//! # Example
//!
//! ```rust
//! use datastore::prelude::*;
//!
//! let options = ConnectionOptions::new("localhost", "app");
//! assert!(options.validate().is_ok());
//! ```

// Core datastore components
pub use crate::cell::{FactoryCell, InitPolicy};
pub use crate::core::StoreFactory;
pub use crate::errors::{FactoryError, InitError};
pub use crate::migration;

// Re-export centralized config
pub use config::{ConnectionOptions, LogLevel, Settings};

// Repository handles, models and traits
pub use store_object::prelude::*;

// Short ids
pub use short_id::{ShortIdGenerator, generate_short_id};

// Common external dependencies
pub use async_trait;
pub use sqlx;
pub use tokio;
