//! Guild configuration document.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::conventions::AnyDocument;
use crate::database::DatabaseStore;
use crate::error::StoreResult;
use crate::model::guild_statistics::GuildStatistics;
use crate::model::{Collection, DocumentId, Model};

/// The languages a guild operates in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildLanguages {
    pub localisation: String,
    pub target: String,
    pub feature: String,
}

impl Default for GuildLanguages {
    fn default() -> Self {
        Self {
            localisation: "English/British".to_string(),
            target: "English/British".to_string(),
            feature: "English".to_string(),
        }
    }
}

/// Feature toggles for a guild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnabledFeatures {
    pub answers: bool,
    pub corrections: bool,
    pub cefr: bool,
    pub game: bool,
    pub resources: bool,
    pub translate: bool,
    pub word: bool,
    pub target_only: bool,
    pub role_languages: bool,
}

/// Per-feature configuration, present only for features that need it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureConfigurations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrections: Option<CorrectionsConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_only: Option<TargetOnlyConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_languages: Option<RoleLanguagesConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorrectionsConfiguration {
    pub do_not_correct_role_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesConfiguration {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetOnlyConfiguration {
    pub channel_ids: Vec<String>,
}

/// Role-to-language assignments, keyed by role id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleLanguagesConfiguration {
    pub ids: HashMap<String, String>,
}

/// One guild's persisted configuration.
///
/// Identified by the guild's platform id: `id_parts = [guild_id]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guild {
    guild_id: String,
    pub created_at: i64,
    pub languages: GuildLanguages,
    #[serde(default)]
    pub enabled_features: EnabledFeatures,
    #[serde(default)]
    pub features: FeatureConfigurations,
}

impl Guild {
    /// Construct a fresh guild document with default configuration.
    pub fn new(guild_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            created_at: Utc::now().timestamp_millis(),
            languages: GuildLanguages::default(),
            enabled_features: EnabledFeatures::default(),
            features: FeatureConfigurations::default(),
        }
    }

    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }

    /// Fetch a guild document, consulting the cache before the backend.
    ///
    /// A backend hit is written into the cache here, by the factory —
    /// the session layer has no knowledge of the cache.
    pub async fn get(store: &DatabaseStore, guild_id: &str) -> StoreResult<Option<Guild>> {
        if let Some(cached) = store.cache().guild(guild_id) {
            return Ok(Some(cached));
        }

        let id = DocumentId::new(Collection::Guilds, vec![guild_id.to_string()]);
        let loaded = store
            .with_session(move |session| async move { session.load::<Guild>(&id).await })
            .await?;

        if let Some(guild) = &loaded {
            store.cache().cache_document(&guild.clone().wrap());
        }

        Ok(loaded)
    }

    /// Persist a fresh guild document, and make sure its statistics
    /// document exists alongside it.
    pub async fn create(store: &DatabaseStore, guild_id: &str) -> StoreResult<Guild> {
        let guild = Guild::new(guild_id);

        let stored = guild.clone();
        store
            .with_session(move |session| async move { session.store(&stored).await })
            .await?;
        store.cache().cache_document(&guild.clone().wrap());

        GuildStatistics::get_or_create(store, guild_id).await?;

        Ok(guild)
    }

    pub async fn get_or_create(store: &DatabaseStore, guild_id: &str) -> StoreResult<Guild> {
        if let Some(guild) = Guild::get(store, guild_id).await? {
            return Ok(guild);
        }

        Guild::create(store, guild_id).await
    }

    pub fn has_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Answers => self.enabled_features.answers,
            Feature::Corrections => self.enabled_features.corrections,
            Feature::Cefr => self.enabled_features.cefr,
            Feature::Game => self.enabled_features.game,
            Feature::Resources => self.enabled_features.resources,
            Feature::Translate => self.enabled_features.translate,
            Feature::Word => self.enabled_features.word,
            Feature::TargetOnly => self.enabled_features.target_only,
            Feature::RoleLanguages => self.enabled_features.role_languages,
        }
    }

    /// Whether messages in the given channel must be in the target language.
    pub fn is_target_language_only_channel(&self, channel_id: &str) -> bool {
        if !self.enabled_features.target_only {
            return false;
        }

        self.features
            .target_only
            .as_ref()
            .is_some_and(|config| config.channel_ids.iter().any(|id| id == channel_id))
    }
}

/// The guild features that can be toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Answers,
    Corrections,
    Cefr,
    Game,
    Resources,
    Translate,
    Word,
    TargetOnly,
    RoleLanguages,
}

impl Model for Guild {
    const COLLECTION: Collection = Collection::Guilds;

    fn id_parts(&self) -> Vec<String> {
        vec![self.guild_id.clone()]
    }

    fn wrap(self) -> AnyDocument {
        AnyDocument::Guild(self)
    }

    fn unwrap_from(document: AnyDocument) -> Option<Self> {
        match document {
            AnyDocument::Guild(guild) => Some(guild),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_deterministic() {
        let first = Guild::new("123");
        let second = Guild::new("123");

        assert_eq!(first.id(), "Guilds/123");
        assert_eq!(first.id(), second.id());
        assert_eq!(first.partial_id(), "123");
    }

    #[test]
    fn target_only_channel_requires_feature() {
        let mut guild = Guild::new("123");
        guild.features.target_only = Some(TargetOnlyConfiguration {
            channel_ids: vec!["555".to_string()],
        });

        assert!(!guild.is_target_language_only_channel("555"));

        guild.enabled_features.target_only = true;
        assert!(guild.is_target_language_only_channel("555"));
        assert!(!guild.is_target_language_only_channel("556"));
    }

    #[test]
    fn serialization_round_trips() {
        let mut guild = Guild::new("123");
        guild.enabled_features.game = true;
        guild.features.resources = Some(ResourcesConfiguration {
            url: "https://example.com/resources".to_string(),
        });

        let json = serde_json::to_value(&guild).unwrap();
        let back: Guild = serde_json::from_value(json).unwrap();

        assert_eq!(back.guild_id(), "123");
        assert!(back.enabled_features.game);
        assert_eq!(back.features.resources, guild.features.resources);
    }
}
