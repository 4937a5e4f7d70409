//! Driver seam
//!
//! The factory never talks to `sqlx` pool construction directly; it goes
//! through a [`PoolConnector`], so pool creation and teardown can be observed
//! or replaced.

use std::time::Duration;

use async_trait::async_trait;
use config::{ConnectionOptions, LogLevel};
use log::LevelFilter;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};

/// Statements slower than this are logged at `Warn` and above
const SLOW_STATEMENT_THRESHOLD: Duration = Duration::from_millis(200);

/// Builds and tears down connection pools
#[async_trait]
pub trait PoolConnector: Send + Sync + 'static {
    /// Establish a pool for the given options
    async fn connect(&self, options: &ConnectionOptions) -> Result<PgPool, sqlx::Error>;

    /// Close every pooled connection
    async fn disconnect(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        pool.close().await;
        Ok(())
    }
}

/// The PostgreSQL connector used in production
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

#[async_trait]
impl PoolConnector for PgConnector {
    async fn connect(&self, options: &ConnectionOptions) -> Result<PgPool, sqlx::Error> {
        pool_options(options)
            .connect_with(connect_options(options))
            .await
    }
}

/// Per-connection settings: address, credentials and statement logging
pub fn connect_options(options: &ConnectionOptions) -> PgConnectOptions {
    let connect = PgConnectOptions::new()
        .host(&options.host)
        .port(options.port)
        .username(&options.username)
        .password(&options.password)
        .database(&options.database);

    match options.log_level {
        LogLevel::Silent => connect.disable_statement_logging(),
        LogLevel::Error => connect
            .log_statements(LevelFilter::Off)
            .log_slow_statements(LevelFilter::Error, SLOW_STATEMENT_THRESHOLD),
        LogLevel::Warn => connect
            .log_statements(LevelFilter::Off)
            .log_slow_statements(LevelFilter::Warn, SLOW_STATEMENT_THRESHOLD),
        LogLevel::Info => connect
            .log_statements(LevelFilter::Info)
            .log_slow_statements(LevelFilter::Warn, SLOW_STATEMENT_THRESHOLD),
    }
}

/// Pool limits: idle connections are kept warm as the pool minimum
pub fn pool_options(options: &ConnectionOptions) -> PgPoolOptions {
    let life_time = if options.max_connection_life_time.is_zero() {
        None
    } else {
        Some(options.max_connection_life_time)
    };

    PgPoolOptions::new()
        .max_connections(options.max_open_connections)
        .min_connections(options.max_idle_connections)
        .max_lifetime(life_time)
        .acquire_timeout(options.connect_timeout)
}
