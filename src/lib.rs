//! # datastore
//!
//! A shared PostgreSQL connection pool behind a one-time initializer, with
//! lightweight repository handles for users and posts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use datastore::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // One cell per process, created at startup and passed to consumers
//!     let cell = FactoryCell::new();
//!     let settings = Settings::load()?;
//!
//!     let factory = cell.get_or_init(&settings).await?;
//!
//!     let user = factory
//!         .users()
//!         .create(User::new("colin", "Colin", "s3cret", "colin@example.com"))
//!         .await?;
//!     println!("Created user: {} ({})", user.name, user.instance_id);
//!
//!     factory.close().await?;
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod cell;
pub mod connector;
pub mod core;
pub mod errors;
pub mod migration;
pub mod prelude;

// Re-export the main public types for convenience
pub use cell::{FactoryCell, InitPolicy};
pub use connector::{PgConnector, PoolConnector};
pub use crate::core::StoreFactory;
pub use errors::{FactoryError, InitError, SchemaPhase};

// Re-export centralized config
pub use config::{ConfigError, ConnectionOptions, LogLevel, Settings};

// Re-export internal crates used by the public API
pub use short_id::generate_short_id;
pub use store_object;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
