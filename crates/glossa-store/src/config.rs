//! Database configuration.
//!
//! An explicit, immutable configuration struct constructed once at the
//! composition root and passed by reference into [`DatabaseStore::create`].
//! Missing values never fail construction — backend selection handles
//! absence by falling back to the in-memory adapter.
//!
//! [`DatabaseStore::create`]: crate::database::DatabaseStore::create

use std::env;
use std::path::PathBuf;

use tracing::{debug, warn};

/// The backend technologies a deployment can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    Postgres,
}

impl BackendKind {
    /// Parse a selector string. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sqlite" => Some(Self::Sqlite),
            "postgres" => Some(Self::Postgres),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }
}

/// Connection parameters for the SQLite backend.
#[derive(Debug, Clone, Default)]
pub struct SqliteConfig {
    /// Path to the database file.
    pub path: Option<PathBuf>,
}

/// Connection parameters for the PostgreSQL backend.
#[derive(Debug, Clone, Default)]
pub struct PostgresConfig {
    pub host: Option<String>,
    pub port: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Complete persistence configuration.
///
/// Exactly one backend kind is ever selected. When `backend` is `None`,
/// or the selected backend is missing required parameters, the store
/// runs in memory.
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    pub backend: Option<BackendKind>,
    pub sqlite: SqliteConfig,
    pub postgres: PostgresConfig,
}

impl DatabaseConfig {
    /// Read configuration from environment variables.
    ///
    /// Recognised keys: `DATABASE_BACKEND` (`sqlite`, `postgres`, or
    /// `none`), `SQLITE_PATH`, and `POSTGRES_HOST` / `POSTGRES_PORT` /
    /// `POSTGRES_DATABASE` / `POSTGRES_USERNAME` / `POSTGRES_PASSWORD`.
    /// Load the `.env` file (if one exists), then read configuration.
    pub fn load() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded environment file");
        }
        Self::from_env()
    }

    /// Read configuration from the process environment as-is.
    pub fn from_env() -> Self {
        let backend = match env::var("DATABASE_BACKEND") {
            Ok(value) if value == "none" => None,
            Ok(value) => {
                let kind = BackendKind::parse(&value);
                if kind.is_none() {
                    warn!(value, "unrecognised `DATABASE_BACKEND`, running in memory");
                }
                kind
            }
            Err(_) => None,
        };

        Self {
            backend,
            sqlite: SqliteConfig {
                path: env::var("SQLITE_PATH").ok().map(PathBuf::from),
            },
            postgres: PostgresConfig {
                host: env::var("POSTGRES_HOST").ok(),
                port: env::var("POSTGRES_PORT").ok(),
                database: env::var("POSTGRES_DATABASE").ok(),
                username: env::var("POSTGRES_USERNAME").ok(),
                password: env::var("POSTGRES_PASSWORD").ok(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_backends() {
        assert_eq!(BackendKind::parse("sqlite"), Some(BackendKind::Sqlite));
        assert_eq!(BackendKind::parse("postgres"), Some(BackendKind::Postgres));
        assert_eq!(BackendKind::parse("ravendb"), None);
    }

    #[test]
    fn default_config_selects_nothing() {
        let config = DatabaseConfig::default();
        assert!(config.backend.is_none());
        assert!(config.sqlite.path.is_none());
        assert!(config.postgres.host.is_none());
    }
}
