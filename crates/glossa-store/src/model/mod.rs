//! Base document model: collections and identity.
//!
//! Every persisted document belongs to exactly one [`Collection`] out of a
//! closed set, and derives its identity from an ordered sequence of id
//! parts. The full identifier (`<collection>/<parts...>`) is what backends
//! key on; the partial identifier (parts only) is backend-independent and
//! is what the cache indexes on.

pub mod database_metadata;
pub mod guild;
pub mod guild_statistics;
pub mod user;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::conventions::AnyDocument;
use crate::error::{StoreError, StoreResult};

/// Separator between id parts, and between the collection prefix and the
/// parts in the canonical full identifier.
pub const ID_SEPARATOR: &str = "/";

// ═══════════════════════════════════════════════════════════════════════
//  Collection
// ═══════════════════════════════════════════════════════════════════════

/// The closed set of document kinds.
///
/// This enumeration is the only place persisted entity types are
/// registered; the rehydration match in [`AnyDocument`] is exhaustive
/// over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    DatabaseMetadata,
    GuildStatistics,
    Guilds,
    Users,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DatabaseMetadata => "DatabaseMetadata",
            Self::GuildStatistics => "GuildStatistics",
            Self::Guilds => "Guilds",
            Self::Users => "Users",
        }
    }

    /// Parse a stored collection name. An unknown name is a fatal
    /// configuration error, never a runtime condition.
    pub fn parse(value: &str) -> StoreResult<Self> {
        match value {
            "DatabaseMetadata" => Ok(Self::DatabaseMetadata),
            "GuildStatistics" => Ok(Self::GuildStatistics),
            "Guilds" => Ok(Self::Guilds),
            "Users" => Ok(Self::Users),
            other => Err(StoreError::UnknownCollection(other.to_string())),
        }
    }

    /// All collections, in registration order.
    pub fn all() -> &'static [Collection] {
        &[
            Self::DatabaseMetadata,
            Self::GuildStatistics,
            Self::Guilds,
            Self::Users,
        ]
    }

    /// The fixed number of id parts a document of this kind carries.
    pub fn id_part_arity(self) -> usize {
        match self {
            Self::DatabaseMetadata => 1,
            Self::GuildStatistics => 1,
            Self::Guilds => 1,
            Self::Users => 1,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  DocumentId
// ═══════════════════════════════════════════════════════════════════════

/// A parsed document identifier: collection plus ordered id parts.
///
/// Identity is immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId {
    collection: Collection,
    parts: Vec<String>,
}

impl DocumentId {
    /// Build an identifier from its parts.
    ///
    /// # Panics
    /// Panics if the number of parts does not match the collection's
    /// fixed arity — a malformed identifier is a programmer error.
    pub fn new(collection: Collection, parts: Vec<String>) -> Self {
        assert_eq!(
            parts.len(),
            collection.id_part_arity(),
            "{collection} takes {} id part(s), got {}",
            collection.id_part_arity(),
            parts.len(),
        );

        Self { collection, parts }
    }

    /// Parse a canonical full identifier (`<collection>/<parts...>`).
    pub fn parse(id: &str) -> StoreResult<Self> {
        let mut segments = id.split(ID_SEPARATOR);
        let collection = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StoreError::InvalidIdentifier(id.to_string()))?;
        let collection = Collection::parse(collection)?;

        let parts: Vec<String> = segments.map(str::to_string).collect();
        if parts.len() != collection.id_part_arity() || parts.iter().any(String::is_empty) {
            return Err(StoreError::InvalidIdentifier(id.to_string()));
        }

        Ok(Self { collection, parts })
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// The backend-independent portion of the identifier: the joined id
    /// parts, without the collection prefix. Cache maps key on this.
    pub fn partial_id(&self) -> String {
        self.parts.join(ID_SEPARATOR)
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.collection.as_str(),
            ID_SEPARATOR,
            self.partial_id()
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Model
// ═══════════════════════════════════════════════════════════════════════

/// A persisted document of a fixed collection kind.
///
/// Implementors store their own id parts as ordinary fields, so
/// rehydrating the serialized body recovers the full identity: for the
/// same collection and id parts, [`Model::id`] is identical across
/// repeated construction.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// The ordered id parts that compose this document's identity.
    fn id_parts(&self) -> Vec<String>;

    /// Wrap this entity in the [`AnyDocument`] registry enum.
    fn wrap(self) -> AnyDocument;

    /// Extract this entity type back out of the registry enum.
    /// Returns `None` when the document belongs to another collection.
    fn unwrap_from(document: AnyDocument) -> Option<Self>;

    /// The parsed identifier of this document.
    fn document_id(&self) -> DocumentId {
        DocumentId::new(Self::COLLECTION, self.id_parts())
    }

    /// The canonical full identifier (`<collection>/<parts...>`).
    fn id(&self) -> String {
        self.document_id().to_string()
    }

    /// The backend-independent cache key (joined id parts only).
    fn partial_id(&self) -> String {
        self.id_parts().join(ID_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_round_trips() {
        for collection in Collection::all() {
            assert_eq!(Collection::parse(collection.as_str()).unwrap(), *collection);
        }
    }

    #[test]
    fn unknown_collection_is_an_error() {
        assert!(matches!(
            Collection::parse("Settings"),
            Err(StoreError::UnknownCollection(_))
        ));
    }

    #[test]
    fn document_id_formats_canonically() {
        let id = DocumentId::new(Collection::Guilds, vec!["123".to_string()]);
        assert_eq!(id.to_string(), "Guilds/123");
        assert_eq!(id.partial_id(), "123");
    }

    #[test]
    fn document_id_parse_round_trips() {
        let id = DocumentId::parse("Users/456").unwrap();
        assert_eq!(id.collection(), Collection::Users);
        assert_eq!(id.parts(), ["456"]);
    }

    #[test]
    fn parse_rejects_wrong_arity() {
        assert!(DocumentId::parse("Guilds").is_err());
        assert!(DocumentId::parse("Guilds/1/2").is_err());
        assert!(DocumentId::parse("Guilds/").is_err());
    }

    #[test]
    #[should_panic(expected = "id part")]
    fn new_rejects_wrong_arity() {
        let _ = DocumentId::new(Collection::Guilds, vec![]);
    }
}
