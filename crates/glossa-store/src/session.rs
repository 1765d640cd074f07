//! Document sessions: one scoped unit-of-work per logical operation.
//!
//! A [`Session`] is a thin, typed façade over an object-safe
//! [`SessionBackend`] supplied by the active adapter. Sessions hold no
//! cross-session state; for backends whose connection is a shared
//! client, disposal is a bookkeeping step rather than a socket close.
//!
//! Sessions are acquired exclusively through
//! [`DatabaseStore::with_session`], which guarantees disposal on every
//! exit path.
//!
//! [`DatabaseStore::with_session`]: crate::database::DatabaseStore::with_session

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::conventions::{DocumentConventions, RawDocument};
use crate::error::StoreResult;
use crate::model::{Collection, DocumentId, Model};

// ═══════════════════════════════════════════════════════════════════════
//  SessionBackend
// ═══════════════════════════════════════════════════════════════════════

/// Raw, backend-specific document operations. One implementation per
/// adapter; the typed [`Session`] wrapper drives it.
#[async_trait]
pub(crate) trait SessionBackend: Send + Sync {
    /// Fetch one document by its backend-native identifier.
    /// Absent is `Ok(None)`, never an error.
    async fn load_raw(&self, native_id: &str) -> StoreResult<Option<RawDocument>>;

    /// Fetch many documents, preserving the length and order of the
    /// input: position `i` of the output corresponds to `native_ids[i]`.
    async fn load_many_raw(&self, native_ids: Vec<String>) -> StoreResult<Vec<Option<RawDocument>>>;

    /// Upsert one document. Fully committed when this returns.
    async fn store_raw(&self, raw: RawDocument) -> StoreResult<()>;

    /// Fetch all documents of a collection matching every equality
    /// filter (`field` is a top-level JSON field of the body).
    async fn query_raw(
        &self,
        collection: Collection,
        filters: Vec<(String, serde_json::Value)>,
    ) -> StoreResult<Vec<RawDocument>>;

    /// Release per-session resources. Safe to call once.
    async fn dispose(&self) -> StoreResult<()>;
}

// ═══════════════════════════════════════════════════════════════════════
//  Session
// ═══════════════════════════════════════════════════════════════════════

struct SessionInner {
    backend_name: &'static str,
    backend: Box<dyn SessionBackend>,
    collection_separator: &'static str,
    disposed: AtomicBool,
}

/// A unit-of-work handle against exactly one backend.
///
/// Cloning produces another handle to the same logical session; the
/// disposal guard ensures the underlying backend is released exactly
/// once regardless of how many handles exist.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub(crate) fn new(
        backend_name: &'static str,
        backend: Box<dyn SessionBackend>,
        collection_separator: &'static str,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                backend_name,
                backend,
                collection_separator,
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// The identifier strategy this session's backend uses for a collection.
    pub fn conventions_for(&self, collection: Collection) -> DocumentConventions {
        DocumentConventions::new(collection, self.inner.collection_separator)
    }

    fn backend(&self) -> &dyn SessionBackend {
        assert!(
            !self.inner.disposed.load(Ordering::SeqCst),
            "session used after dispose",
        );
        self.inner.backend.as_ref()
    }

    /// Load one document by identifier. Returns `Ok(None)` when absent.
    ///
    /// # Panics
    /// Panics if `id` belongs to a collection other than `M`'s — asking
    /// for a document through the wrong type is a programmer error.
    pub async fn load<M: Model>(&self, id: &DocumentId) -> StoreResult<Option<M>> {
        assert_eq!(
            id.collection(),
            M::COLLECTION,
            "loading {id} as {}",
            M::COLLECTION,
        );

        let conventions = self.conventions_for(M::COLLECTION);
        let native_id = conventions.native_id(id);

        match self.backend().load_raw(&native_id).await? {
            Some(raw) => Ok(Some(conventions.rehydrate_as::<M>(&raw)?)),
            None => Ok(None),
        }
    }

    /// Load many documents, preserving positional correspondence with
    /// the input: ids that resolve map to `Some`, the rest to `None`.
    pub async fn load_many<M: Model>(&self, ids: &[DocumentId]) -> StoreResult<Vec<Option<M>>> {
        let conventions = self.conventions_for(M::COLLECTION);
        let native_ids: Vec<String> = ids.iter().map(|id| conventions.native_id(id)).collect();

        let raws = self.backend().load_many_raw(native_ids).await?;
        debug_assert_eq!(raws.len(), ids.len());

        raws.into_iter()
            .map(|raw| match raw {
                Some(raw) => Ok(Some(conventions.rehydrate_as::<M>(&raw)?)),
                None => Ok(None),
            })
            .collect()
    }

    /// Upsert one entity. The write is fully committed when this returns.
    pub async fn store<M: Model>(&self, entity: &M) -> StoreResult<()> {
        let conventions = self.conventions_for(M::COLLECTION);
        let native_id = conventions.native_id_of(entity);

        debug!(
            backend = self.inner.backend_name,
            id = %native_id,
            "storing document"
        );

        let raw = RawDocument::from_entity(native_id, entity)?;
        self.backend().store_raw(raw).await
    }

    /// Start a collection-scoped query.
    pub fn query<M: Model>(&self) -> DocumentQuery<M> {
        DocumentQuery {
            session: self.clone(),
            filters: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Release the session. Idempotent: only the first call reaches the
    /// backend, so disposal happens exactly once per acquisition.
    pub async fn dispose(&self) -> StoreResult<()> {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        debug!(backend = self.inner.backend_name, "disposing session");
        self.inner.backend.dispose().await
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  DocumentQuery
// ═══════════════════════════════════════════════════════════════════════

/// A collection-scoped equality-filter builder.
///
/// The result of [`DocumentQuery::run`] is finite and not restartable;
/// re-issue the query to read it again.
pub struct DocumentQuery<M: Model> {
    session: Session,
    filters: Vec<(String, serde_json::Value)>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Model> DocumentQuery<M> {
    /// Require a top-level field of the document body to equal `value`.
    ///
    /// # Panics
    /// Panics on a malformed field name, or on a null `value` — null
    /// has no portable equality semantics across the SQL backends.
    pub fn where_eq(mut self, field: &str, value: impl Into<serde_json::Value>) -> Self {
        assert!(
            !field.is_empty()
                && field
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_'),
            "invalid query field name: {field:?}",
        );

        let value = value.into();
        assert!(!value.is_null(), "null query filter value for {field:?}");

        self.filters.push((field.to_string(), value));
        self
    }

    /// Execute the query and collect the matching entities.
    pub async fn run(self) -> StoreResult<Vec<M>> {
        let conventions = self.session.conventions_for(M::COLLECTION);
        let raws = self
            .session
            .backend()
            .query_raw(M::COLLECTION, self.filters)
            .await?;

        raws.iter()
            .map(|raw| conventions.rehydrate_as::<M>(raw))
            .collect()
    }
}
