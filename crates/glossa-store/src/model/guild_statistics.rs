//! Per-guild usage statistics document.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::conventions::AnyDocument;
use crate::database::DatabaseStore;
use crate::error::StoreResult;
use crate::model::{Collection, DocumentId, Model};

/// Aggregate game-session counters for one learning language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameStatistics {
    pub total_sessions: u64,
    pub total_score: u64,
    pub unique_players: u64,
}

/// Usage statistics for one guild, broken down by learning language.
///
/// Identified by the guild's platform id: `id_parts = [guild_id]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildStatistics {
    guild_id: String,
    pub created_at: i64,
    #[serde(default)]
    pub statistics: HashMap<String, GameStatistics>,
}

impl GuildStatistics {
    pub fn new(guild_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            created_at: Utc::now().timestamp_millis(),
            statistics: HashMap::new(),
        }
    }

    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }

    /// Fetch a statistics document, consulting the cache before the backend.
    pub async fn get(store: &DatabaseStore, guild_id: &str) -> StoreResult<Option<GuildStatistics>> {
        if let Some(cached) = store.cache().guild_statistics(guild_id) {
            return Ok(Some(cached));
        }

        let id = DocumentId::new(Collection::GuildStatistics, vec![guild_id.to_string()]);
        let loaded = store
            .with_session(move |session| async move { session.load::<GuildStatistics>(&id).await })
            .await?;

        if let Some(statistics) = &loaded {
            store.cache().cache_document(&statistics.clone().wrap());
        }

        Ok(loaded)
    }

    pub async fn create(store: &DatabaseStore, guild_id: &str) -> StoreResult<GuildStatistics> {
        let statistics = GuildStatistics::new(guild_id);

        let stored = statistics.clone();
        store
            .with_session(move |session| async move { session.store(&stored).await })
            .await?;
        store.cache().cache_document(&statistics.clone().wrap());

        Ok(statistics)
    }

    pub async fn get_or_create(
        store: &DatabaseStore,
        guild_id: &str,
    ) -> StoreResult<GuildStatistics> {
        if let Some(statistics) = GuildStatistics::get(store, guild_id).await? {
            return Ok(statistics);
        }

        GuildStatistics::create(store, guild_id).await
    }

    /// Record a finished game session in the given learning language.
    ///
    /// Mutates in memory only; the caller persists through
    /// `session.store` when the unit of work completes.
    pub fn register_session(&mut self, language: &str, score: u64, new_player: bool) {
        let entry = self.statistics.entry(language.to_string()).or_default();
        entry.total_sessions += 1;
        entry.total_score += score;
        if new_player {
            entry.unique_players += 1;
        }
    }
}

impl Model for GuildStatistics {
    const COLLECTION: Collection = Collection::GuildStatistics;

    fn id_parts(&self) -> Vec<String> {
        vec![self.guild_id.clone()]
    }

    fn wrap(self) -> AnyDocument {
        AnyDocument::GuildStatistics(self)
    }

    fn unwrap_from(document: AnyDocument) -> Option<Self> {
        match document {
            AnyDocument::GuildStatistics(statistics) => Some(statistics),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_deterministic() {
        let statistics = GuildStatistics::new("123");
        assert_eq!(statistics.id(), "GuildStatistics/123");
        assert_eq!(statistics.partial_id(), "123");
    }

    #[test]
    fn register_session_accumulates() {
        let mut statistics = GuildStatistics::new("123");
        statistics.register_session("Polish", 7, true);
        statistics.register_session("Polish", 3, false);

        let polish = statistics.statistics.get("Polish").unwrap();
        assert_eq!(polish.total_sessions, 2);
        assert_eq!(polish.total_score, 10);
        assert_eq!(polish.unique_players, 1);
    }
}
