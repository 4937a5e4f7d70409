//! Core datastore functionality
//!
//! This module contains the [`StoreFactory`], the owner of the shared
//! connection pool. Repository handles borrow the pool from it, so the
//! borrow checker keeps every handle inside the factory's lifetime.

use std::fmt;
use std::sync::Arc;

use config::ConnectionOptions;
use sqlx::PgPool;
use store_object::{PostStore, UserStore};
use tracing::info;

use crate::connector::{PgConnector, PoolConnector, connect_options, pool_options};
use crate::errors::{FactoryError, InitError};

/// Owns the connection pool and hands out repository handles
pub struct StoreFactory {
    pool: PgPool,
    options: ConnectionOptions,
    connector: Arc<dyn PoolConnector>,
}

impl fmt::Debug for StoreFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreFactory")
            .field("options", &self.options)
            .field("pool_size", &self.pool.size())
            .field("closed", &self.pool.is_closed())
            .finish()
    }
}

impl StoreFactory {
    /// Create a factory with a connected PostgreSQL pool
    pub async fn connect(options: ConnectionOptions) -> Result<Self, InitError> {
        Self::connect_with(options, Arc::new(PgConnector)).await
    }

    /// Create a factory through a specific connector
    pub async fn connect_with(
        options: ConnectionOptions,
        connector: Arc<dyn PoolConnector>,
    ) -> Result<Self, InitError> {
        options.validate()?;
        info!(options = %options, "creating database connection pool");

        let pool = connector
            .connect(&options)
            .await
            .map_err(|source| InitError::PoolCreation {
                options: options.to_string(),
                source,
            })?;

        Ok(Self {
            pool,
            options,
            connector,
        })
    }

    /// Create a factory whose pool opens connections on first use.
    /// Must be called inside a Tokio runtime.
    pub fn connect_lazy(options: ConnectionOptions) -> Result<Self, InitError> {
        options.validate()?;
        let pool = pool_options(&options).connect_lazy_with(connect_options(&options));

        Ok(Self {
            pool,
            options,
            connector: Arc::new(PgConnector),
        })
    }

    /// Repository handle for users
    pub fn users(&self) -> UserStore<'_> {
        UserStore::new(&self.pool)
    }

    /// Repository handle for posts
    pub fn posts(&self) -> PostStore<'_> {
        PostStore::new(&self.pool)
    }

    /// Get database pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Options the pool was created with
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Close every pooled connection. Closing an already closed pool is a
    /// no-op. Callers must finish in-flight work first; nothing is drained here.
    pub async fn close(&self) -> Result<(), FactoryError> {
        if self.pool.is_closed() {
            return Ok(());
        }

        info!(options = %self.options, "closing database connection pool");
        self.connector
            .disconnect(&self.pool)
            .await
            .map_err(FactoryError::Teardown)
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), FactoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
