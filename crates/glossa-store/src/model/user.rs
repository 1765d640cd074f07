//! User profile document.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::conventions::AnyDocument;
use crate::database::DatabaseStore;
use crate::error::StoreResult;
use crate::model::{Collection, DocumentId, Model};

/// Account-level preferences a user has set for themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    /// The user's preferred localisation language, if chosen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// One user's persisted profile.
///
/// Identified by the user's platform id: `id_parts = [user_id]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    user_id: String,
    pub created_at: i64,
    #[serde(default)]
    pub account: Account,
}

impl User {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            created_at: Utc::now().timestamp_millis(),
            account: Account::default(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Fetch a user document, consulting the cache before the backend.
    pub async fn get(store: &DatabaseStore, user_id: &str) -> StoreResult<Option<User>> {
        if let Some(cached) = store.cache().user(user_id) {
            return Ok(Some(cached));
        }

        let id = DocumentId::new(Collection::Users, vec![user_id.to_string()]);
        let loaded = store
            .with_session(move |session| async move { session.load::<User>(&id).await })
            .await?;

        if let Some(user) = &loaded {
            store.cache().cache_document(&user.clone().wrap());
        }

        Ok(loaded)
    }

    pub async fn create(store: &DatabaseStore, user_id: &str) -> StoreResult<User> {
        let user = User::new(user_id);

        let stored = user.clone();
        store
            .with_session(move |session| async move { session.store(&stored).await })
            .await?;
        store.cache().cache_document(&user.clone().wrap());

        Ok(user)
    }

    pub async fn get_or_create(store: &DatabaseStore, user_id: &str) -> StoreResult<User> {
        if let Some(user) = User::get(store, user_id).await? {
            return Ok(user);
        }

        User::create(store, user_id).await
    }
}

impl Model for User {
    const COLLECTION: Collection = Collection::Users;

    fn id_parts(&self) -> Vec<String> {
        vec![self.user_id.clone()]
    }

    fn wrap(self) -> AnyDocument {
        AnyDocument::User(self)
    }

    fn unwrap_from(document: AnyDocument) -> Option<Self> {
        match document {
            AnyDocument::User(user) => Some(user),
            _ => None,
        }
    }
}
