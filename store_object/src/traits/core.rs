//! Trait definitions
//!
//! This module defines the capability set shared by repository handles.

use crate::pagination::{ListOptions, ListPage};
use crate::StoreError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// Create, get, update, delete and list for one entity type
#[async_trait]
pub trait StoreObject: Send + Sync {
    /// The model type that this store persists
    type Model: Clone + Send + Sync + Debug + Serialize + DeserializeOwned;

    /// The lookup key used by `get` and `delete`
    type Key: ?Sized + Send + Sync + Debug;

    /// Insert a new record and return it as stored
    async fn create(&self, data: Self::Model) -> Result<Self::Model, StoreError>;

    /// Get a record by its key
    async fn get(&self, key: &Self::Key) -> Result<Option<Self::Model>, StoreError>;

    /// Update a record by primary key, failing with `NotFound` if it is gone
    async fn update(&self, data: Self::Model) -> Result<Self::Model, StoreError>;

    /// Delete a record by its key, returning whether a row was removed
    async fn delete(&self, key: &Self::Key) -> Result<bool, StoreError>;

    /// List records, newest first
    async fn list(&self, options: ListOptions) -> Result<ListPage<Self::Model>, StoreError>;
}
