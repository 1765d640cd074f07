//! End-to-end scenarios against the store facade and entity factories.

use std::sync::Arc;

use glossa_store::{
    BackendKind, CacheStore, Collection, DatabaseConfig, DatabaseStore, DocumentId, Guild,
    GuildStatistics, Model, SqliteConfig, User,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn in_memory_store() -> DatabaseStore {
    init_tracing();
    DatabaseStore::create(&DatabaseConfig::default(), Arc::new(CacheStore::new()))
}

#[tokio::test]
async fn unconfigured_store_boots_and_round_trips_a_guild() {
    let store = in_memory_store();
    store.setup().await.unwrap();

    let guild = Guild::new("123");
    let stored = guild.clone();
    store
        .with_session(move |session| async move { session.store(&stored).await })
        .await
        .unwrap();

    let fetched = Guild::get(&store, "123").await.unwrap().unwrap();
    assert_eq!(fetched.guild_id(), "123");
}

#[tokio::test]
async fn creating_a_guild_also_creates_its_statistics() {
    let store = in_memory_store();
    store.setup().await.unwrap();

    let guild = Guild::create(&store, "123").await.unwrap();
    assert_eq!(guild.guild_id(), "123");

    let statistics = GuildStatistics::get(&store, "123").await.unwrap();
    assert!(statistics.is_some());
}

#[tokio::test]
async fn get_or_create_is_stable_across_calls() {
    let store = in_memory_store();
    store.setup().await.unwrap();

    let first = User::get_or_create(&store, "456").await.unwrap();
    let second = User::get_or_create(&store, "456").await.unwrap();

    assert_eq!(first.user_id(), second.user_id());
    assert_eq!(first.created_at, second.created_at);
}

#[tokio::test]
async fn factories_populate_the_cache_on_load() {
    let store = in_memory_store();
    store.setup().await.unwrap();

    // Write through a session only; the cache knows nothing yet.
    let guild = Guild::new("123");
    let stored = guild.clone();
    store
        .with_session(move |session| async move { session.store(&stored).await })
        .await
        .unwrap();
    assert!(store.cache().guild("123").is_none());

    // The factory load mirrors the backend value into the cache.
    let _ = Guild::get(&store, "123").await.unwrap().unwrap();
    let cached = store.cache().guild("123").unwrap();
    assert_eq!(
        serde_json::to_value(&cached).unwrap(),
        serde_json::to_value(&guild).unwrap(),
    );
}

#[tokio::test]
async fn unloaded_documents_are_fetched_from_the_backend_again() {
    let store = in_memory_store();
    store.setup().await.unwrap();

    let guild = Guild::create(&store, "123").await.unwrap();
    assert!(store.cache().guild("123").is_some());

    store.cache().unload_document(&guild.wrap());
    assert!(store.cache().guild("123").is_none());

    // Still present in the backend.
    let fetched = Guild::get(&store, "123").await.unwrap();
    assert!(fetched.is_some());
}

#[tokio::test]
async fn load_many_reports_missing_ids_positionally() {
    let store = in_memory_store();
    store.setup().await.unwrap();

    for id in ["A", "C"] {
        let guild = Guild::new(id);
        store
            .with_session(move |session| async move { session.store(&guild).await })
            .await
            .unwrap();
    }

    // "A" appears twice: every occurrence must resolve, positionally.
    let ids: Vec<DocumentId> = ["A", "B", "C", "A"]
        .iter()
        .map(|id| DocumentId::new(Collection::Guilds, vec![id.to_string()]))
        .collect();
    let loaded: Vec<Option<Guild>> = store
        .with_session(move |session| async move { session.load_many(&ids).await })
        .await
        .unwrap();

    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded[0].as_ref().unwrap().guild_id(), "A");
    assert!(loaded[1].is_none());
    assert_eq!(loaded[2].as_ref().unwrap().guild_id(), "C");
    assert_eq!(loaded[3].as_ref().unwrap().guild_id(), "A");
}

#[tokio::test]
async fn sequential_stores_resolve_to_the_last_payload() {
    let store = in_memory_store();
    store.setup().await.unwrap();

    let mut guild = Guild::new("123");
    let first = guild.clone();
    store
        .with_session(move |session| async move { session.store(&first).await })
        .await
        .unwrap();

    guild.enabled_features.word = true;
    let second = guild.clone();
    store
        .with_session(move |session| async move { session.store(&second).await })
        .await
        .unwrap();

    let id = guild.document_id();
    let loaded: Guild = store
        .with_session(move |session| async move { session.load(&id).await })
        .await
        .unwrap()
        .unwrap();
    assert!(loaded.enabled_features.word);
}

#[tokio::test]
async fn sqlite_backed_store_supports_the_same_flow() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        backend: Some(BackendKind::Sqlite),
        sqlite: SqliteConfig {
            path: Some(dir.path().join("glossa.db")),
        },
        ..DatabaseConfig::default()
    };

    let store = DatabaseStore::create(&config, Arc::new(CacheStore::new()));
    assert_eq!(store.backend(), "sqlite");
    store.setup().await.unwrap();

    let guild = Guild::get_or_create(&store, "123").await.unwrap();
    assert_eq!(guild.guild_id(), "123");

    let statistics = GuildStatistics::get(&store, "123").await.unwrap();
    assert!(statistics.is_some());

    store.teardown().await.unwrap();
}

#[tokio::test]
async fn query_scopes_to_one_collection() {
    let store = in_memory_store();
    store.setup().await.unwrap();

    Guild::create(&store, "1").await.unwrap();
    User::create(&store, "1").await.unwrap();

    let guilds: Vec<Guild> = store
        .with_session(|session| async move {
            session.query::<Guild>().where_eq("guildId", "1").run().await
        })
        .await
        .unwrap();

    assert_eq!(guilds.len(), 1);
    assert_eq!(guilds[0].guild_id(), "1");
}
