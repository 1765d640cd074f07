//! Document conventions: per-backend identifier construction and
//! backend-independent rehydration.
//!
//! Each adapter hands out a [`DocumentConventions`] describing how a
//! document's native identifier is built for that backend. Rehydration
//! goes through [`AnyDocument`], the exhaustive registry over the closed
//! collection set: given the same collection and the same raw data it
//! always reconstructs an equivalent entity.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StoreError, StoreResult};
use crate::model::database_metadata::DatabaseMetadata;
use crate::model::guild::Guild;
use crate::model::guild_statistics::GuildStatistics;
use crate::model::user::User;
use crate::model::{Collection, DocumentId, ID_SEPARATOR, Model};

// ═══════════════════════════════════════════════════════════════════════
//  RawDocument
// ═══════════════════════════════════════════════════════════════════════

/// The backend-neutral wire form of one stored document.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// The identifier the backend keyed this document on.
    pub id: String,
    pub collection: Collection,
    /// The serialized entity body.
    pub data: serde_json::Value,
}

impl RawDocument {
    /// Serialize an entity into its wire form under the given native id.
    pub fn from_entity<M: Model>(native_id: String, entity: &M) -> StoreResult<Self> {
        Ok(Self {
            id: native_id,
            collection: M::COLLECTION,
            data: serde_json::to_value(entity)?,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  AnyDocument — the collection registry
// ═══════════════════════════════════════════════════════════════════════

/// One rehydrated document of any registered collection.
///
/// The `rehydrate` match is the fixed collection-to-entity table the
/// whole subsystem resolves through; it is exhaustive by construction,
/// so registering a new collection without a rehydration arm fails to
/// compile.
#[derive(Debug, Clone)]
pub enum AnyDocument {
    DatabaseMetadata(DatabaseMetadata),
    GuildStatistics(GuildStatistics),
    Guild(Guild),
    User(User),
}

impl AnyDocument {
    /// Rehydrate a raw document into its registered entity type.
    pub fn rehydrate(raw: &RawDocument) -> StoreResult<Self> {
        fn body<T: DeserializeOwned>(raw: &RawDocument) -> StoreResult<T> {
            Ok(serde_json::from_value(raw.data.clone())?)
        }

        Ok(match raw.collection {
            Collection::DatabaseMetadata => Self::DatabaseMetadata(body(raw)?),
            Collection::GuildStatistics => Self::GuildStatistics(body(raw)?),
            Collection::Guilds => Self::Guild(body(raw)?),
            Collection::Users => Self::User(body(raw)?),
        })
    }

    pub fn collection(&self) -> Collection {
        match self {
            Self::DatabaseMetadata(_) => Collection::DatabaseMetadata,
            Self::GuildStatistics(_) => Collection::GuildStatistics,
            Self::Guild(_) => Collection::Guilds,
            Self::User(_) => Collection::Users,
        }
    }

    pub fn partial_id(&self) -> String {
        match self {
            Self::DatabaseMetadata(document) => document.partial_id(),
            Self::GuildStatistics(document) => document.partial_id(),
            Self::Guild(document) => document.partial_id(),
            Self::User(document) => document.partial_id(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  DocumentConventions
// ═══════════════════════════════════════════════════════════════════════

/// Identifier strategy for one collection on one backend.
///
/// The partial-id portion is backend-independent; only the separator
/// between the collection prefix and the parts varies per backend.
#[derive(Debug, Clone, Copy)]
pub struct DocumentConventions {
    collection: Collection,
    collection_separator: &'static str,
}

impl DocumentConventions {
    pub fn new(collection: Collection, collection_separator: &'static str) -> Self {
        Self {
            collection,
            collection_separator,
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Build the backend-native identifier for a parsed [`DocumentId`].
    ///
    /// # Panics
    /// Panics if the identifier belongs to a different collection.
    pub fn native_id(&self, id: &DocumentId) -> String {
        assert_eq!(
            id.collection(),
            self.collection,
            "conventions for {} asked to build an id for {}",
            self.collection,
            id.collection(),
        );

        format!(
            "{}{}{}",
            self.collection.as_str(),
            self.collection_separator,
            id.parts().join(ID_SEPARATOR),
        )
    }

    /// Build the backend-native identifier for an entity instance.
    pub fn native_id_of<M: Model + Serialize>(&self, entity: &M) -> String {
        self.native_id(&entity.document_id())
    }

    /// Rehydrate a raw document through the collection registry.
    pub fn rehydrate(&self, raw: &RawDocument) -> StoreResult<AnyDocument> {
        AnyDocument::rehydrate(raw)
    }

    /// Rehydrate and narrow to a concrete entity type. A collection
    /// mismatch between the row and the requested type is reported as an
    /// invalid identifier.
    pub fn rehydrate_as<M: Model>(&self, raw: &RawDocument) -> StoreResult<M> {
        let document = self.rehydrate(raw)?;
        M::unwrap_from(document).ok_or_else(|| {
            StoreError::InvalidIdentifier(format!(
                "document {} does not belong to {}",
                raw.id,
                M::COLLECTION,
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_id_uses_backend_separator() {
        let id = DocumentId::new(Collection::Guilds, vec!["123".to_string()]);

        let slash = DocumentConventions::new(Collection::Guilds, "/");
        assert_eq!(slash.native_id(&id), "Guilds/123");

        let colon = DocumentConventions::new(Collection::Guilds, ":");
        assert_eq!(colon.native_id(&id), "Guilds:123");
    }

    #[test]
    fn rehydration_is_idempotent() {
        let guild = Guild::new("123");
        let raw = RawDocument::from_entity("Guilds/123".to_string(), &guild).unwrap();

        let conventions = DocumentConventions::new(Collection::Guilds, "/");
        let first: Guild = conventions.rehydrate_as(&raw).unwrap();
        let second: Guild = conventions.rehydrate_as(&raw).unwrap();

        assert_eq!(first.guild_id(), "123");
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap(),
        );
    }

    #[test]
    fn rehydrate_as_rejects_collection_mismatch() {
        let guild = Guild::new("123");
        let raw = RawDocument::from_entity("Guilds/123".to_string(), &guild).unwrap();

        let conventions = DocumentConventions::new(Collection::Guilds, "/");
        let result: StoreResult<User> = conventions.rehydrate_as(&raw);
        assert!(matches!(result, Err(StoreError::InvalidIdentifier(_))));
    }
}
