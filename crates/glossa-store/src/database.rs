//! The database store: the single facade the rest of the application
//! talks to.
//!
//! Owns the one active [`DatabaseAdapter`] for the process lifetime.
//! Backend selection happens here and nowhere else: the configured
//! backend kind is tried once, and when it cannot be constructed the
//! store substitutes the in-memory adapter so the application always
//! boots — albeit without cross-restart durability.

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::adapters::DatabaseAdapter;
use crate::adapters::memory::InMemoryAdapter;
use crate::adapters::postgres::PostgresAdapter;
use crate::adapters::sqlite::SqliteAdapter;
use crate::cache::CacheStore;
use crate::config::{BackendKind, DatabaseConfig};
use crate::conventions::DocumentConventions;
use crate::error::StoreResult;
use crate::model::Collection;
use crate::session::Session;

/// Facade over the active backend adapter and the process-wide cache.
pub struct DatabaseStore {
    adapter: Arc<dyn DatabaseAdapter>,
    cache: Arc<CacheStore>,
}

impl DatabaseStore {
    /// Select and construct the backend adapter. Never fails: missing
    /// or incomplete configuration falls back to the in-memory adapter
    /// with a logged warning.
    pub fn create(config: &DatabaseConfig, cache: Arc<CacheStore>) -> Self {
        let adapter: Option<Arc<dyn DatabaseAdapter>> = match config.backend {
            Some(BackendKind::Sqlite) => SqliteAdapter::try_create(config)
                .map(|adapter| Arc::new(adapter) as Arc<dyn DatabaseAdapter>),
            Some(BackendKind::Postgres) => PostgresAdapter::try_create(config)
                .map(|adapter| Arc::new(adapter) as Arc<dyn DatabaseAdapter>),
            None => {
                error!(
                    "`DATABASE_BACKEND` was not provided; if this was intentional, \
                     explicitly set `DATABASE_BACKEND` to `none`"
                );
                None
            }
        };

        let adapter = adapter.unwrap_or_else(|| {
            info!("running in memory; data will not persist between restarts");
            Arc::new(InMemoryAdapter::new())
        });

        Self { adapter, cache }
    }

    /// The identifier of the active backend.
    pub fn backend(&self) -> &'static str {
        self.adapter.identifier()
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Establish the backend connection. A failure here is fatal and
    /// propagates to the process supervisor: an operator who explicitly
    /// selected a backend must not be silently downgraded.
    #[instrument(skip(self), fields(backend = self.backend()))]
    pub async fn setup(&self) -> StoreResult<()> {
        info!("setting up database store");
        self.adapter.setup().await?;
        info!("database store set up");
        Ok(())
    }

    pub async fn teardown(&self) -> StoreResult<()> {
        self.adapter.teardown().await
    }

    /// Thin delegate to the active adapter, so models can build
    /// backend-correct identifiers without knowing which backend is
    /// active.
    pub fn conventions_for(&self, collection: Collection) -> DocumentConventions {
        self.adapter.conventions_for(collection)
    }

    /// Run one unit of work against a fresh session.
    ///
    /// The session is disposed on every exit path — whether the
    /// callback resolves or fails — and the callback's result is
    /// returned or propagated unchanged. This is the sole sanctioned
    /// way to touch the persistence layer; sessions must not outlive
    /// the callback.
    pub async fn with_session<T, F, Fut>(&self, callback: F) -> StoreResult<T>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let session = self.adapter.open_session();
        let result = callback(session.clone()).await;

        if let Err(err) = session.dispose().await {
            warn!(%err, "failed to dispose session");
        }

        result
    }
}
