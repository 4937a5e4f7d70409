//! One-time factory initialization
//!
//! A [`FactoryCell`] is created once at startup and shared by reference (or
//! `Arc`) with every consumer. The first `get_or_init` builds the pool; every
//! other caller, concurrent or later, gets the same `Arc<StoreFactory>`.
//!
//! What happens after a failed attempt is an explicit [`InitPolicy`].

use std::fmt;
use std::sync::Arc;

use config::{ConfigError, ConnectionOptions, Settings};
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

use crate::connector::{PgConnector, PoolConnector};
use crate::core::StoreFactory;
use crate::errors::{FactoryError, InitError};
use crate::{debug_log, trace_log};

/// Behavior after the initialization attempt fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitPolicy {
    /// The failure is latched: every later call returns it, even with
    /// corrected options, until [`FactoryCell::reset_failure`] is called.
    /// An attempt whose future is dropped before it finishes counts as
    /// failed with [`InitError::Abandoned`].
    #[default]
    NoRetry,
    /// Nothing is latched; the next caller makes a fresh attempt.
    RetryOnFailure,
}

/// Lazily initialized, shared [`StoreFactory`]
pub struct FactoryCell {
    connector: Arc<dyn PoolConnector>,
    policy: InitPolicy,
    factory: OnceCell<Arc<StoreFactory>>,
    // Held across the whole attempt so only one runs at a time.
    attempt: Mutex<Option<Arc<InitError>>>,
}

impl fmt::Debug for FactoryCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryCell")
            .field("policy", &self.policy)
            .field("initialized", &self.factory.initialized())
            .finish()
    }
}

impl Default for FactoryCell {
    fn default() -> Self {
        Self::new()
    }
}

impl FactoryCell {
    /// PostgreSQL connector, failures latched
    pub fn new() -> Self {
        Self::with_connector(Arc::new(PgConnector), InitPolicy::default())
    }

    pub fn with_policy(policy: InitPolicy) -> Self {
        Self::with_connector(Arc::new(PgConnector), policy)
    }

    pub fn with_connector(connector: Arc<dyn PoolConnector>, policy: InitPolicy) -> Self {
        Self {
            connector,
            policy,
            factory: OnceCell::new(),
            attempt: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> InitPolicy {
        self.policy
    }

    /// The factory, if initialization already succeeded
    pub fn get(&self) -> Option<Arc<StoreFactory>> {
        self.factory.get().cloned()
    }

    /// Get the factory, reading connection options from `settings` on the
    /// first call
    pub async fn get_or_init(
        &self,
        settings: &Settings,
    ) -> Result<Arc<StoreFactory>, FactoryError> {
        self.init_with(|| ConnectionOptions::from_settings(settings))
            .await
    }

    /// Get the factory, creating it from `options` on the first call.
    /// Options passed after initialization are ignored.
    pub async fn get_or_init_with(
        &self,
        options: ConnectionOptions,
    ) -> Result<Arc<StoreFactory>, FactoryError> {
        self.init_with(move || Ok(options)).await
    }

    /// Clear a latched failure so the next call tries again.
    /// Returns whether there was one.
    pub async fn reset_failure(&self) -> bool {
        let cleared = self.attempt.lock().await.take().is_some();
        if cleared {
            info!("cleared latched store factory failure");
        }
        cleared
    }

    async fn init_with<F>(&self, options: F) -> Result<Arc<StoreFactory>, FactoryError>
    where
        F: FnOnce() -> Result<ConnectionOptions, ConfigError>,
    {
        if let Some(factory) = self.factory.get() {
            trace_log!("store factory already initialized");
            return Ok(Arc::clone(factory));
        }

        let mut latched = self.attempt.lock().await;

        // Another caller may have finished while we waited for the lock.
        if let Some(factory) = self.factory.get() {
            debug_log!("store factory initialized by a concurrent caller");
            return Ok(Arc::clone(factory));
        }
        if let Some(err) = latched.as_ref() {
            return Err(FactoryError::Initialization(Arc::clone(err)));
        }

        let options = match options() {
            Ok(options) => options,
            Err(err) => return Err(self.fail(&mut latched, err.into())),
        };

        // Stays latched if this future is dropped while the connector runs.
        if self.policy == InitPolicy::NoRetry {
            *latched = Some(Arc::new(InitError::Abandoned));
        }

        match StoreFactory::connect_with(options, Arc::clone(&self.connector)).await {
            Ok(factory) => {
                *latched = None;
                info!("store factory ready");
                let factory = self
                    .factory
                    .get_or_init(|| async move { Arc::new(factory) })
                    .await;
                Ok(Arc::clone(factory))
            }
            Err(err) => Err(self.fail(&mut latched, err)),
        }
    }

    fn fail(&self, latched: &mut Option<Arc<InitError>>, err: InitError) -> FactoryError {
        let err = Arc::new(err);
        warn!(error = %err, policy = ?self.policy, "store factory initialization failed");
        *latched = match self.policy {
            InitPolicy::NoRetry => Some(Arc::clone(&err)),
            InitPolicy::RetryOnFailure => None,
        };
        FactoryError::Initialization(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sqlx::PgPool;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::connector::{connect_options, pool_options};

    /// Counts pool creations; hands out lazy pools that never dial out
    struct CountingConnector {
        calls: AtomicUsize,
        failing: AtomicBool,
        delay: Duration,
    }

    impl CountingConnector {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
                delay,
            })
        }

        fn failing() -> Arc<Self> {
            let connector = Self::new(Duration::ZERO);
            connector.failing.store(true, Ordering::SeqCst);
            connector
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PoolConnector for CountingConnector {
        async fn connect(&self, options: &ConnectionOptions) -> Result<PgPool, sqlx::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.failing.load(Ordering::SeqCst) {
                return Err(sqlx::Error::PoolTimedOut);
            }
            Ok(pool_options(options).connect_lazy_with(connect_options(options)))
        }
    }

    fn options() -> ConnectionOptions {
        ConnectionOptions::new("localhost", "app")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_callers_share_one_pool() {
        let connector = CountingConnector::new(Duration::from_millis(50));
        let cell = Arc::new(FactoryCell::with_connector(
            connector.clone(),
            InitPolicy::NoRetry,
        ));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let cell = Arc::clone(&cell);
                tokio::spawn(async move { cell.get_or_init_with(options()).await })
            })
            .collect();

        let mut factories = Vec::new();
        for handle in handles {
            factories.push(handle.await.expect("task panicked").expect("init failed"));
        }

        assert_eq!(connector.calls(), 1);
        assert!(factories.iter().all(|f| Arc::ptr_eq(f, &factories[0])));
    }

    #[tokio::test]
    async fn sequential_calls_reuse_the_factory() {
        let connector = CountingConnector::new(Duration::ZERO);
        let cell = FactoryCell::with_connector(connector.clone(), InitPolicy::NoRetry);
        assert!(cell.get().is_none());

        let first = cell.get_or_init_with(options()).await.unwrap();
        let second = cell
            .get_or_init_with(ConnectionOptions::new("elsewhere", "other"))
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.options().host, "localhost");
        assert!(Arc::ptr_eq(&cell.get().unwrap(), &first));
        assert_eq!(connector.calls(), 1);
    }

    #[tokio::test]
    async fn failure_is_latched_without_retry() {
        let connector = CountingConnector::failing();
        let cell = FactoryCell::with_connector(connector.clone(), InitPolicy::NoRetry);

        let first = cell.get_or_init_with(options()).await.unwrap_err();
        assert!(matches!(
            first.init_error().map(|e| e.as_ref()),
            Some(InitError::PoolCreation { .. })
        ));

        // The driver would now succeed, but the latched failure wins.
        connector.failing.store(false, Ordering::SeqCst);
        let second = cell.get_or_init_with(options()).await.unwrap_err();

        assert!(Arc::ptr_eq(
            first.init_error().unwrap(),
            second.init_error().unwrap()
        ));
        assert_eq!(connector.calls(), 1);
        assert!(cell.get().is_none());
    }

    #[tokio::test]
    async fn configuration_failure_is_latched_too() {
        let connector = CountingConnector::new(Duration::ZERO);
        let cell = FactoryCell::with_connector(connector.clone(), InitPolicy::NoRetry);

        let err = cell
            .get_or_init_with(ConnectionOptions::new("localhost", ""))
            .await
            .unwrap_err();
        assert!(matches!(
            err.init_error().map(|e| e.as_ref()),
            Some(InitError::Configuration(_))
        ));

        assert!(cell.get_or_init_with(options()).await.is_err());
        assert_eq!(connector.calls(), 0);
    }

    #[tokio::test]
    async fn settings_are_read_on_first_call() {
        let connector = CountingConnector::new(Duration::ZERO);
        let cell = FactoryCell::with_connector(connector.clone(), InitPolicy::NoRetry);
        let settings = Settings::from_toml_str(
            r#"
            [db]
            host = "localhost"
            database = "app"
            max-open-connections = 4
            "#,
        )
        .unwrap();

        let factory = cell.get_or_init(&settings).await.unwrap();
        assert_eq!(factory.options().max_open_connections, 4);
        assert_eq!(connector.calls(), 1);
    }

    #[tokio::test]
    async fn reset_failure_allows_another_attempt() {
        let connector = CountingConnector::failing();
        let cell = FactoryCell::with_connector(connector.clone(), InitPolicy::NoRetry);

        assert!(cell.get_or_init_with(options()).await.is_err());
        connector.failing.store(false, Ordering::SeqCst);

        assert!(cell.reset_failure().await);
        assert!(!cell.reset_failure().await);

        let factory = cell.get_or_init_with(options()).await.unwrap();
        assert!(!factory.is_closed());
        assert_eq!(connector.calls(), 2);
    }

    #[tokio::test]
    async fn retry_policy_tries_again() {
        let connector = CountingConnector::failing();
        let cell = FactoryCell::with_connector(connector.clone(), InitPolicy::RetryOnFailure);

        assert!(cell.get_or_init_with(options()).await.is_err());
        assert!(cell.get_or_init_with(options()).await.is_err());
        assert_eq!(connector.calls(), 2);

        connector.failing.store(false, Ordering::SeqCst);
        let first = cell.get_or_init_with(options()).await.unwrap();
        let second = cell.get_or_init_with(options()).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(connector.calls(), 3);
    }

    #[tokio::test]
    async fn cancelled_attempt_is_latched_without_retry() {
        let connector = CountingConnector::new(Duration::from_millis(100));
        let cell = FactoryCell::with_connector(connector.clone(), InitPolicy::NoRetry);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), cell.get_or_init_with(options())).await;
        assert!(cancelled.is_err());

        let err = cell.get_or_init_with(options()).await.unwrap_err();
        assert!(matches!(
            err.init_error().map(|e| e.as_ref()),
            Some(InitError::Abandoned)
        ));
        assert_eq!(connector.calls(), 1);
        assert!(cell.get().is_none());
    }

    #[tokio::test]
    async fn cancelled_attempt_can_be_retried() {
        let connector = CountingConnector::new(Duration::from_millis(100));
        let cell = FactoryCell::with_connector(connector.clone(), InitPolicy::RetryOnFailure);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), cell.get_or_init_with(options())).await;
        assert!(cancelled.is_err());

        cell.get_or_init_with(options()).await.unwrap();
        assert_eq!(connector.calls(), 2);
    }

    #[test]
    fn default_policy_is_no_retry() {
        assert_eq!(InitPolicy::default(), InitPolicy::NoRetry);
        assert_eq!(
            FactoryCell::with_policy(InitPolicy::RetryOnFailure).policy(),
            InitPolicy::RetryOnFailure
        );
    }
}
