//! # glossa-store
//!
//! Persistence layer for Glossa: a uniform, backend-agnostic interface
//! for storing and retrieving documents (guild configuration, user
//! profiles, usage statistics) against one of several interchangeable
//! backends, fronted by an in-process cache.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  CacheStore (entities + documents)           │
//! ├──────────────────────────────────────────────┤
//! │  DatabaseStore  (with_session, fallback)     │
//! │  Session        (load / store / query)       │
//! │  Conventions    (ids + rehydration)          │
//! ├──────────────────────────────────────────────┤
//! │  SqliteAdapter │ PostgresAdapter │ InMemory  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use glossa_store::{CacheStore, DatabaseConfig, DatabaseStore, Guild};
//!
//! let cache = Arc::new(CacheStore::new());
//! let store = DatabaseStore::create(&DatabaseConfig::from_env(), cache);
//! store.setup().await?;
//!
//! let guild = Guild::get_or_create(&store, "123").await?;
//! ```
//!
//! Application code reaches the backend only through
//! [`DatabaseStore::with_session`], which disposes the session on every
//! exit path. Entity factories consult the cache before opening a
//! session and are responsible for caching what they load — the session
//! layer itself has no knowledge of the cache.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod conventions;
pub mod database;
pub mod error;
pub mod model;
pub mod session;

// ── re-exports ───────────────────────────────────────────────────────

pub use adapters::DatabaseAdapter;
pub use adapters::memory::InMemoryAdapter;
pub use adapters::postgres::PostgresAdapter;
pub use adapters::sqlite::SqliteAdapter;
pub use cache::{CacheStore, EntityCache};
pub use config::{BackendKind, DatabaseConfig, PostgresConfig, SqliteConfig};
pub use conventions::{AnyDocument, DocumentConventions, RawDocument};
pub use database::DatabaseStore;
pub use error::{StoreError, StoreResult};
pub use model::database_metadata::DatabaseMetadata;
pub use model::guild::{Feature, Guild};
pub use model::guild_statistics::{GameStatistics, GuildStatistics};
pub use model::user::User;
pub use model::{Collection, DocumentId, Model};
pub use session::{DocumentQuery, Session};
