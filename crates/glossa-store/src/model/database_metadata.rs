//! Internal database metadata document.
//!
//! A singleton record tracking which migrations have been applied.
//! Deliberately never cached: it is read once at startup and has no
//! partial-id lookups.

use serde::{Deserialize, Serialize};

use crate::conventions::AnyDocument;
use crate::database::DatabaseStore;
use crate::error::StoreResult;
use crate::model::{Collection, DocumentId, Model};

/// The fixed id part of the singleton metadata document.
const METADATA_ID: &str = "metadata";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    id: String,
    /// Identifiers of the migrations already applied, in order.
    pub migrations: Vec<String>,
}

impl DatabaseMetadata {
    pub fn new() -> Self {
        Self {
            id: METADATA_ID.to_string(),
            migrations: Vec::new(),
        }
    }

    pub async fn get(store: &DatabaseStore) -> StoreResult<Option<DatabaseMetadata>> {
        let id = DocumentId::new(Collection::DatabaseMetadata, vec![METADATA_ID.to_string()]);
        store
            .with_session(move |session| async move {
                session.load::<DatabaseMetadata>(&id).await
            })
            .await
    }

    pub async fn get_or_create(store: &DatabaseStore) -> StoreResult<DatabaseMetadata> {
        if let Some(metadata) = DatabaseMetadata::get(store).await? {
            return Ok(metadata);
        }

        let metadata = DatabaseMetadata::new();
        let stored = metadata.clone();
        store
            .with_session(move |session| async move { session.store(&stored).await })
            .await?;

        Ok(metadata)
    }

    /// Whether a migration has already been applied.
    pub fn has_migration(&self, identifier: &str) -> bool {
        self.migrations.iter().any(|applied| applied == identifier)
    }
}

impl Default for DatabaseMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for DatabaseMetadata {
    const COLLECTION: Collection = Collection::DatabaseMetadata;

    fn id_parts(&self) -> Vec<String> {
        vec![self.id.clone()]
    }

    fn wrap(self) -> AnyDocument {
        AnyDocument::DatabaseMetadata(self)
    }

    fn unwrap_from(document: AnyDocument) -> Option<Self> {
        match document {
            AnyDocument::DatabaseMetadata(metadata) => Some(metadata),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_identity() {
        let metadata = DatabaseMetadata::new();
        assert_eq!(metadata.id(), "DatabaseMetadata/metadata");
    }

    #[test]
    fn tracks_applied_migrations() {
        let mut metadata = DatabaseMetadata::new();
        assert!(!metadata.has_migration("2025-01-add-features"));

        metadata.migrations.push("2025-01-add-features".to_string());
        assert!(metadata.has_migration("2025-01-add-features"));
    }
}
