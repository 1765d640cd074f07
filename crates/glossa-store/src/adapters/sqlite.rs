//! SQLite backend adapter.
//!
//! Documents are rows in a single `documents` table, keyed by their
//! native identifier, with the entity body stored as a JSON text
//! column. The `rusqlite::Connection` sits behind an `Arc<Mutex<>>`
//! and every operation dispatches onto the blocking thread pool via
//! `tokio::task::spawn_blocking` to avoid stalling the async runtime.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::adapters::DatabaseAdapter;
use crate::config::DatabaseConfig;
use crate::conventions::RawDocument;
use crate::error::{StoreError, StoreResult};
use crate::model::{Collection, ID_SEPARATOR};
use crate::session::{Session, SessionBackend};

const BACKEND: &str = "sqlite";

/// The connection slot is empty until `setup` runs.
type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// SQLite-backed document storage.
pub struct SqliteAdapter {
    path: PathBuf,
    conn: SharedConnection,
}

impl SqliteAdapter {
    /// Validate configuration and construct the adapter without
    /// connecting. Returns `None` when the database path is missing.
    pub fn try_create(config: &DatabaseConfig) -> Option<Self> {
        let Some(path) = config.sqlite.path.clone() else {
            warn!("`SQLITE_PATH` has not been provided, running in memory");
            return None;
        };

        Some(Self {
            path,
            conn: Arc::new(Mutex::new(None)),
        })
    }

    /// Apply performance pragmas to a fresh connection.
    fn apply_pragmas(conn: &Connection) -> StoreResult<()> {
        // WAL mode: concurrent readers, non-blocking writes.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        // Concurrent writers wait instead of failing immediately.
        conn.pragma_update(None, "busy_timeout", 5_000_i32)?;
        Ok(())
    }

    fn create_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                data TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents (collection);",
        )?;
        Ok(())
    }
}

/// Run a closure against the shared connection on the blocking pool.
async fn execute<F, T>(conn: &SharedConnection, f: F) -> StoreResult<T>
where
    F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let conn = Arc::clone(conn);
    tokio::task::spawn_blocking(move || {
        let guard = conn
            .lock()
            .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))?;
        let conn = guard.as_ref().ok_or_else(|| StoreError::Connection {
            backend: BACKEND,
            message: "setup has not run".to_string(),
        })?;
        f(conn)
    })
    .await?
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    fn identifier(&self) -> &'static str {
        BACKEND
    }

    fn collection_separator(&self) -> &'static str {
        ID_SEPARATOR
    }

    async fn setup(&self) -> StoreResult<()> {
        let path = self.path.clone();
        let slot = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            info!(path = %path.display(), "opening sqlite database");

            let conn = Connection::open(&path).map_err(|e| StoreError::Connection {
                backend: BACKEND,
                message: e.to_string(),
            })?;
            SqliteAdapter::apply_pragmas(&conn)?;
            SqliteAdapter::create_schema(&conn)?;

            let mut guard = slot
                .lock()
                .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))?;
            *guard = Some(conn);
            Ok(())
        })
        .await?
    }

    async fn teardown(&self) -> StoreResult<()> {
        let slot = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = slot
                .lock()
                .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))?;
            if guard.take().is_some() {
                debug!("sqlite connection closed");
            }
            Ok(())
        })
        .await?
    }

    fn open_session(&self) -> Session {
        Session::new(
            self.identifier(),
            Box::new(SqliteSession {
                conn: Arc::clone(&self.conn),
            }),
            self.collection_separator(),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Session backend
// ═══════════════════════════════════════════════════════════════════════

struct SqliteSession {
    conn: SharedConnection,
}

fn row_to_raw(id: String, collection: String, data: String) -> StoreResult<RawDocument> {
    Ok(RawDocument {
        id,
        collection: Collection::parse(&collection)?,
        data: serde_json::from_str(&data)?,
    })
}

/// Convert a JSON filter value into the SQL value `json_extract`
/// produces for it: booleans become integers, everything non-scalar
/// compares as serialized text.
fn bind_value(value: &serde_json::Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;

    match value {
        serde_json::Value::Null => Sql::Null,
        serde_json::Value::Bool(b) => Sql::Integer(i64::from(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Sql::Integer(i),
            None => Sql::Real(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Sql::Text(s.clone()),
        other => Sql::Text(other.to_string()),
    }
}

#[async_trait]
impl SessionBackend for SqliteSession {
    async fn load_raw(&self, native_id: &str) -> StoreResult<Option<RawDocument>> {
        let native_id = native_id.to_string();
        execute(&self.conn, move |conn| {
            let result = conn.query_row(
                "SELECT id, collection, data FROM documents WHERE id = ?1",
                rusqlite::params![native_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            );
            match result {
                Ok((id, collection, data)) => row_to_raw(id, collection, data).map(Some),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn load_many_raw(&self, native_ids: Vec<String>) -> StoreResult<Vec<Option<RawDocument>>> {
        execute(&self.conn, move |conn| {
            let mut stmt =
                conn.prepare("SELECT id, collection, data FROM documents WHERE id = ?1")?;

            native_ids
                .iter()
                .map(|native_id| {
                    let result = stmt.query_row(rusqlite::params![native_id], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                    });
                    match result {
                        Ok((id, collection, data)) => row_to_raw(id, collection, data).map(Some),
                        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                        Err(e) => Err(e.into()),
                    }
                })
                .collect()
        })
        .await
    }

    async fn store_raw(&self, raw: RawDocument) -> StoreResult<()> {
        let data = serde_json::to_string(&raw.data)?;
        execute(&self.conn, move |conn| {
            conn.execute(
                "INSERT INTO documents (id, collection, data) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(id) DO UPDATE SET collection = excluded.collection, data = excluded.data",
                rusqlite::params![raw.id, raw.collection.as_str(), data],
            )?;
            Ok(())
        })
        .await
    }

    async fn query_raw(
        &self,
        collection: Collection,
        filters: Vec<(String, serde_json::Value)>,
    ) -> StoreResult<Vec<RawDocument>> {
        execute(&self.conn, move |conn| {
            let mut sql =
                "SELECT id, collection, data FROM documents WHERE collection = ?1".to_string();
            let mut params: Vec<rusqlite::types::Value> =
                vec![rusqlite::types::Value::Text(collection.as_str().to_string())];

            for (field, value) in &filters {
                params.push(rusqlite::types::Value::Text(format!("$.{field}")));
                params.push(bind_value(value));
                sql.push_str(&format!(
                    " AND json_extract(data, ?{}) = ?{}",
                    params.len() - 1,
                    params.len(),
                ));
            }

            let mut stmt = conn.prepare(&sql)?;
            let rows: Vec<(String, String, String)> = stmt
                .query_map(rusqlite::params_from_iter(params), |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?
                .collect::<Result<_, _>>()?;

            rows.into_iter()
                .map(|(id, collection, data)| row_to_raw(id, collection, data))
                .collect()
        })
        .await
    }

    async fn dispose(&self) -> StoreResult<()> {
        // The connection is shared by all sessions; nothing to release.
        Ok(())
    }
}
