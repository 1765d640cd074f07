//! Backend adapters.
//!
//! One [`DatabaseAdapter`] implementation per supported backend
//! technology. Adapters are constructed through `try_create`, which
//! returns `None` (not an error) when required connection parameters
//! are missing so the store can fall back to the in-memory adapter;
//! `setup` failures, by contrast, propagate — a backend the operator
//! explicitly configured must be reachable.

pub mod memory;
pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;

use crate::conventions::DocumentConventions;
use crate::error::StoreResult;
use crate::model::Collection;
use crate::session::Session;

/// One concrete backend technology, able to produce sessions against
/// its live connection. Exactly one adapter is active per process.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Human-readable backend name, used in logs.
    fn identifier(&self) -> &'static str;

    /// The separator this backend places between the collection prefix
    /// and the id parts in its native identifiers.
    fn collection_separator(&self) -> &'static str;

    /// Establish the connection. Failure is fatal to store setup.
    async fn setup(&self) -> StoreResult<()>;

    /// Release the connection. Safe to call even if `setup` failed.
    async fn teardown(&self) -> StoreResult<()>;

    /// The identifier strategy this backend uses for a collection.
    fn conventions_for(&self, collection: Collection) -> DocumentConventions {
        DocumentConventions::new(collection, self.collection_separator())
    }

    /// Allocate one session bound to this backend's connection.
    fn open_session(&self) -> Session;
}
