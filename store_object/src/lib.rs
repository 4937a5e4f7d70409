//! Store Object - repository layer for the datastore
//!
//! This crate provides the entity models, their table metadata, and the
//! repository handles (`UserStore`, `PostStore`) that run CRUD queries against
//! a borrowed connection pool.

/// Debug logging, compiled in only with the `debug-logging` feature
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

pub mod errors;
pub mod models;
pub mod pagination;
pub mod prelude;
pub mod stores;
pub mod traits;

pub use errors::StoreError;
pub use models::{Post, User, DECLARED_TABLES};
pub use pagination::{ListOptions, ListPage};
pub use stores::{PostStore, UserStore};
pub use traits::{Column, Index, StoreObject, TableMetadata, TableSchema};
