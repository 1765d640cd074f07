//! In-memory fallback adapter.
//!
//! Always constructible: this is what the store substitutes when no
//! backend is configured, so the application boots regardless. Data
//! lives in a process-wide concurrent map and does not survive restart.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::adapters::DatabaseAdapter;
use crate::conventions::RawDocument;
use crate::error::StoreResult;
use crate::model::{Collection, ID_SEPARATOR};
use crate::session::{Session, SessionBackend};

/// The non-durable fallback backend.
#[derive(Default)]
pub struct InMemoryAdapter {
    documents: Arc<DashMap<String, RawDocument>>,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of documents currently held.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}

#[async_trait]
impl DatabaseAdapter for InMemoryAdapter {
    fn identifier(&self) -> &'static str {
        "in-memory"
    }

    fn collection_separator(&self) -> &'static str {
        ID_SEPARATOR
    }

    async fn setup(&self) -> StoreResult<()> {
        debug!("in-memory adapter ready");
        Ok(())
    }

    async fn teardown(&self) -> StoreResult<()> {
        self.documents.clear();
        Ok(())
    }

    fn open_session(&self) -> Session {
        Session::new(
            self.identifier(),
            Box::new(InMemorySession {
                documents: Arc::clone(&self.documents),
            }),
            self.collection_separator(),
        )
    }
}

struct InMemorySession {
    documents: Arc<DashMap<String, RawDocument>>,
}

#[async_trait]
impl SessionBackend for InMemorySession {
    async fn load_raw(&self, native_id: &str) -> StoreResult<Option<RawDocument>> {
        Ok(self.documents.get(native_id).map(|entry| entry.clone()))
    }

    async fn load_many_raw(&self, native_ids: Vec<String>) -> StoreResult<Vec<Option<RawDocument>>> {
        Ok(native_ids
            .iter()
            .map(|id| self.documents.get(id).map(|entry| entry.clone()))
            .collect())
    }

    async fn store_raw(&self, raw: RawDocument) -> StoreResult<()> {
        self.documents.insert(raw.id.clone(), raw);
        Ok(())
    }

    async fn query_raw(
        &self,
        collection: Collection,
        filters: Vec<(String, serde_json::Value)>,
    ) -> StoreResult<Vec<RawDocument>> {
        Ok(self
            .documents
            .iter()
            .filter(|entry| entry.collection == collection)
            .filter(|entry| {
                filters
                    .iter()
                    .all(|(field, value)| entry.data.get(field) == Some(value))
            })
            .map(|entry| entry.clone())
            .collect())
    }

    async fn dispose(&self) -> StoreResult<()> {
        Ok(())
    }
}
