//! Process-wide cache store.
//!
//! Two independent regions:
//!
//! - **entities** — ephemeral platform objects (guilds, members,
//!   channels, roles, messages) as raw payloads keyed by snowflake.
//!   Bounded `moka` caches; populated and evicted by the platform
//!   gateway layer, not by this subsystem.
//! - **documents** — persisted documents keyed by `partial_id` in
//!   per-collection maps. Entries only ever hold values previously
//!   returned by, or successfully stored into, the active backend: the
//!   cache is a mirror, never the source of truth. Removal is explicit
//!   (`unload_document`) or by process restart.

use dashmap::DashMap;
use moka::sync::Cache;
use tracing::debug;

use crate::conventions::AnyDocument;
use crate::model::Model;
use crate::model::guild::Guild;
use crate::model::guild_statistics::GuildStatistics;
use crate::model::user::User;

/// Upper bound on each platform-entity cache region.
const ENTITY_CACHE_CAPACITY: u64 = 100_000;

/// Cached platform entities, keyed by snowflake. Values are the raw
/// gateway payloads; typed views belong to the gateway layer.
pub struct EntityCache {
    guilds: Cache<u64, serde_json::Value>,
    members: Cache<(u64, u64), serde_json::Value>,
    channels: Cache<u64, serde_json::Value>,
    roles: Cache<u64, serde_json::Value>,
    messages: Cache<u64, serde_json::Value>,
}

impl EntityCache {
    fn new() -> Self {
        fn region<K>() -> Cache<K, serde_json::Value>
        where
            K: std::hash::Hash + Eq + Send + Sync + 'static,
        {
            Cache::builder().max_capacity(ENTITY_CACHE_CAPACITY).build()
        }

        Self {
            guilds: region(),
            members: region(),
            channels: region(),
            roles: region(),
            messages: region(),
        }
    }

    pub fn cache_guild(&self, guild_id: u64, payload: serde_json::Value) {
        self.guilds.insert(guild_id, payload);
    }

    pub fn guild(&self, guild_id: u64) -> Option<serde_json::Value> {
        self.guilds.get(&guild_id)
    }

    pub fn evict_guild(&self, guild_id: u64) {
        self.guilds.invalidate(&guild_id);
    }

    pub fn cache_member(&self, guild_id: u64, user_id: u64, payload: serde_json::Value) {
        self.members.insert((guild_id, user_id), payload);
    }

    pub fn member(&self, guild_id: u64, user_id: u64) -> Option<serde_json::Value> {
        self.members.get(&(guild_id, user_id))
    }

    pub fn cache_channel(&self, channel_id: u64, payload: serde_json::Value) {
        self.channels.insert(channel_id, payload);
    }

    pub fn channel(&self, channel_id: u64) -> Option<serde_json::Value> {
        self.channels.get(&channel_id)
    }

    pub fn cache_role(&self, role_id: u64, payload: serde_json::Value) {
        self.roles.insert(role_id, payload);
    }

    pub fn role(&self, role_id: u64) -> Option<serde_json::Value> {
        self.roles.get(&role_id)
    }

    pub fn cache_message(&self, message_id: u64, payload: serde_json::Value) {
        self.messages.insert(message_id, payload);
    }

    pub fn message(&self, message_id: u64) -> Option<serde_json::Value> {
        self.messages.get(&message_id)
    }
}

struct DocumentCache {
    guilds: DashMap<String, Guild>,
    users: DashMap<String, User>,
    guild_statistics: DashMap<String, GuildStatistics>,
}

/// The write-through cache consulted before any session is opened.
pub struct CacheStore {
    entities: EntityCache,
    documents: DocumentCache,
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            entities: EntityCache::new(),
            documents: DocumentCache {
                guilds: DashMap::new(),
                users: DashMap::new(),
                guild_statistics: DashMap::new(),
            },
        }
    }

    /// The ephemeral platform-entity region.
    pub fn entities(&self) -> &EntityCache {
        &self.entities
    }

    /// Route a document into its per-collection map, keyed by partial
    /// id. `DatabaseMetadata` is deliberately uncached.
    pub fn cache_document(&self, document: &AnyDocument) {
        match document {
            AnyDocument::DatabaseMetadata(_) => {
                // Uncached.
            }
            AnyDocument::GuildStatistics(statistics) => {
                self.documents
                    .guild_statistics
                    .insert(statistics.partial_id(), statistics.clone());
            }
            AnyDocument::Guild(guild) => {
                self.documents
                    .guilds
                    .insert(guild.partial_id(), guild.clone());
            }
            AnyDocument::User(user) => {
                self.documents
                    .users
                    .insert(user.partial_id(), user.clone());
            }
        }
    }

    /// Bulk variant of [`CacheStore::cache_document`].
    pub fn cache_documents(&self, documents: &[AnyDocument]) {
        if documents.is_empty() {
            return;
        }

        debug!(count = documents.len(), "caching documents");

        for document in documents {
            self.cache_document(document);
        }
    }

    /// Remove a document from its per-collection map.
    pub fn unload_document(&self, document: &AnyDocument) {
        match document {
            AnyDocument::DatabaseMetadata(_) => {
                // Uncached.
            }
            AnyDocument::GuildStatistics(statistics) => {
                self.documents
                    .guild_statistics
                    .remove(&statistics.partial_id());
            }
            AnyDocument::Guild(guild) => {
                self.documents.guilds.remove(&guild.partial_id());
            }
            AnyDocument::User(user) => {
                self.documents.users.remove(&user.partial_id());
            }
        }
    }

    pub fn guild(&self, partial_id: &str) -> Option<Guild> {
        self.documents
            .guilds
            .get(partial_id)
            .map(|entry| entry.clone())
    }

    pub fn user(&self, partial_id: &str) -> Option<User> {
        self.documents
            .users
            .get(partial_id)
            .map(|entry| entry.clone())
    }

    pub fn guild_statistics(&self, partial_id: &str) -> Option<GuildStatistics> {
        self.documents
            .guild_statistics
            .get(partial_id)
            .map(|entry| entry.clone())
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::database_metadata::DatabaseMetadata;

    #[test]
    fn documents_are_cached_by_partial_id() {
        let cache = CacheStore::new();
        let guild = Guild::new("123");

        cache.cache_document(&guild.clone().wrap());

        let cached = cache.guild("123").unwrap();
        assert_eq!(cached.guild_id(), "123");
        assert_eq!(
            serde_json::to_value(&cached).unwrap(),
            serde_json::to_value(&guild).unwrap(),
        );
    }

    #[test]
    fn collections_do_not_collide_on_partial_id() {
        let cache = CacheStore::new();
        cache.cache_document(&Guild::new("123").wrap());
        cache.cache_document(&User::new("123").wrap());
        cache.cache_document(&GuildStatistics::new("123").wrap());

        assert!(cache.guild("123").is_some());
        assert!(cache.user("123").is_some());
        assert!(cache.guild_statistics("123").is_some());

        cache.unload_document(&Guild::new("123").wrap());
        assert!(cache.guild("123").is_none());
        assert!(cache.user("123").is_some());
    }

    #[test]
    fn database_metadata_is_never_cached() {
        let cache = CacheStore::new();
        cache.cache_document(&DatabaseMetadata::new().wrap());

        // Nothing to look up: the metadata document has no cache region.
        assert!(cache.guild("metadata").is_none());
        assert!(cache.user("metadata").is_none());
    }

    #[test]
    fn cache_documents_handles_empty_input() {
        let cache = CacheStore::new();
        cache.cache_documents(&[]);

        cache.cache_documents(&[Guild::new("1").wrap(), Guild::new("2").wrap()]);
        assert!(cache.guild("1").is_some());
        assert!(cache.guild("2").is_some());
    }

    #[test]
    fn entity_region_is_independent() {
        let cache = CacheStore::new();
        cache
            .entities()
            .cache_guild(123, serde_json::json!({ "name": "Glossa HQ" }));

        assert!(cache.entities().guild(123).is_some());
        // Platform entities never leak into the document region.
        assert!(cache.guild("123").is_none());

        cache.entities().evict_guild(123);
        assert!(cache.entities().guild(123).is_none());
    }
}
