use crate::error::LedgerError;
use crate::selector::Selector;
use crate::storage_traits::{
    check_read_version, CommitBatch, MaterializedIterator, SelectorFilterIterator, StateEntry,
    StateQueryIterator, Version, VersionedValue, WorldStateStore,
};
use anyhow::Context;
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::{Arc, Mutex},
};
use tokio::runtime::Runtime;

/// SQL statements used by the store
mod sql {
    pub const CREATE_WORLD_STATE: &str = r#"
        CREATE TABLE IF NOT EXISTS world_state (
            key TEXT PRIMARY KEY,
            value BLOB NOT NULL,
            version INTEGER NOT NULL
        )
    "#;

    pub const CREATE_LEDGER_META: &str = r#"
        CREATE TABLE IF NOT EXISTS ledger_meta (
            id INTEGER PRIMARY KEY CHECK (id = 0),
            height INTEGER NOT NULL
        )
    "#;

    pub const SEED_LEDGER_META: &str =
        "INSERT OR IGNORE INTO ledger_meta (id, height) VALUES (0, 0)";

    pub const GET_STATE: &str = "SELECT value, version FROM world_state WHERE key = ?";

    pub const GET_VERSION: &str = "SELECT version FROM world_state WHERE key = ?";

    pub const GET_HEIGHT: &str = "SELECT height FROM ledger_meta WHERE id = 0";

    pub const SET_HEIGHT: &str = "UPDATE ledger_meta SET height = ? WHERE id = 0";

    pub const UPSERT_STATE: &str = r#"
        INSERT INTO world_state (key, value, version) VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, version = excluded.version
    "#;

    pub const SCAN_PREFIX: &str = r#"
        SELECT key, value FROM world_state
        WHERE substr(key, 1, ?) = ?
        ORDER BY key
    "#;
}

/// A SQLite-backed world state using sqlx.
///
/// Selector conditions on string, number and boolean fields are pushed into
/// SQL through `json_extract`; every candidate row is then re-checked
/// against the full selector.
pub struct SqliteStore {
    pool: SqlitePool,
    rt: Arc<Runtime>,
    db_path: PathBuf,
    // Serializes read-set validation and the write that follows
    commit_lock: Mutex<()>,
}

impl SqliteStore {
    /// Opens (creating if needed) a SQLite store at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let db_path = path.as_ref().to_path_buf();
        let db_url = format!("sqlite:{}", db_path.to_string_lossy());

        // Create a runtime for async operations
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create runtime")?;
        let rt = Arc::new(rt);

        let options = SqliteConnectOptions::from_str(&db_url)
            .with_context(|| format!("Invalid database URL: {}", db_url))?
            .create_if_missing(true);

        let pool = rt
            .block_on(async {
                SqlitePoolOptions::new()
                    .max_connections(5)
                    .connect_with(options)
                    .await
            })
            .with_context(|| format!("Failed to connect to database at {:?}", db_path))?;

        rt.block_on(Self::initialize_schema(&pool))
            .context("Failed to initialize database schema")?;

        log::info!("Opened SQLite world state at {:?}", db_path);

        Ok(Self {
            pool,
            rt,
            db_path,
            commit_lock: Mutex::new(()),
        })
    }

    /// Creates the necessary tables in the database
    async fn initialize_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(sql::CREATE_WORLD_STATE).execute(pool).await?;
        sqlx::query(sql::CREATE_LEDGER_META).execute(pool).await?;
        sqlx::query(sql::SEED_LEDGER_META).execute(pool).await?;
        Ok(())
    }

    fn row_to_entry(row: &SqliteRow) -> StateEntry {
        StateEntry {
            key: row.get(0),
            value: row.get(1),
        }
    }

    /// `$."a"."b"` path for a dotted selector field
    fn json_path(field: &str) -> String {
        let mut path = String::from("$");
        for segment in field.split('.') {
            path.push_str(&format!(".\"{}\"", segment.replace('"', "\\\"")));
        }
        path
    }

    /// Pushes the selector's scalar conditions into a SQL filter
    fn selector_candidates(&self, selector: &Selector) -> Result<Vec<StateEntry>, LedgerError> {
        let mut query = String::from(
            "SELECT key, value FROM world_state WHERE substr(key, 1, ?) = ?",
        );
        let mut bindings: Vec<(String, Value)> = Vec::new();
        for (field, expected) in selector.fields() {
            if matches!(expected, Value::String(_) | Value::Number(_) | Value::Bool(_)) {
                query.push_str(
                    " AND CASE WHEN json_valid(CAST(value AS TEXT)) \
                     THEN json_extract(CAST(value AS TEXT), ?) END = ?",
                );
                bindings.push((Self::json_path(field), expected.clone()));
            }
        }
        query.push_str(" ORDER BY key");

        let prefix = selector.key_prefix();
        self.rt.block_on(async {
            let mut statement = sqlx::query(&query)
                .bind(prefix.chars().count() as i64)
                .bind(prefix);
            for (path, expected) in &bindings {
                statement = statement.bind(path.clone());
                statement = match expected {
                    Value::String(s) => statement.bind(s.clone()),
                    // json_extract yields 1/0 for JSON booleans
                    Value::Bool(b) => statement.bind(*b as i64),
                    Value::Number(n) => match n.as_i64() {
                        Some(i) => statement.bind(i),
                        None => statement.bind(n.as_f64().unwrap_or_default()),
                    },
                    _ => statement,
                };
            }

            let rows = statement
                .fetch_all(&self.pool)
                .await
                .context("Failed to run selector query")?;
            Ok::<_, LedgerError>(rows.iter().map(Self::row_to_entry).collect())
        })
    }
}

impl WorldStateStore for SqliteStore {
    fn get_state(&self, key: &str) -> Result<Option<VersionedValue>, LedgerError> {
        self.rt.block_on(async {
            let row = sqlx::query(sql::GET_STATE)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Failed to read key {}", key))?;

            Ok::<_, LedgerError>(row.map(|row| {
                let version: i64 = row.get(1);
                VersionedValue {
                    value: row.get(0),
                    version: version as Version,
                }
            }))
        })
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Box<dyn StateQueryIterator + '_>, LedgerError> {
        let entries = self.rt.block_on(async {
            sqlx::query(sql::SCAN_PREFIX)
                .bind(prefix.chars().count() as i64)
                .bind(prefix)
                .fetch_all(&self.pool)
                .await
                .with_context(|| format!("Failed to scan prefix {:?}", prefix))
        })?;

        Ok(Box::new(MaterializedIterator::new(
            entries.iter().map(Self::row_to_entry).collect(),
        )))
    }

    fn query_selector(
        &self,
        selector: &Selector,
    ) -> Result<Box<dyn StateQueryIterator + '_>, LedgerError> {
        let candidates = self.selector_candidates(selector)?;
        Ok(Box::new(SelectorFilterIterator::new(
            Box::new(MaterializedIterator::new(candidates)),
            selector.clone(),
        )))
    }

    fn commit(&self, batch: &CommitBatch) -> Result<Version, LedgerError> {
        let _guard = self
            .commit_lock
            .lock()
            .map_err(|e| LedgerError::Store(anyhow::anyhow!("Failed to acquire lock: {}", e)))?;

        self.rt.block_on(async {
            // Use a transaction to ensure atomicity
            let mut tx = self
                .pool
                .begin()
                .await
                .context("Failed to begin transaction")?;

            for (key, observed) in &batch.read_set {
                let current: Option<i64> = sqlx::query_scalar(sql::GET_VERSION)
                    .bind(key)
                    .fetch_optional(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to read version of {}", key))?;
                check_read_version(key, *observed, current.map(|v| v as Version))?;
            }

            let height: i64 = sqlx::query_scalar(sql::GET_HEIGHT)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to read ledger height")?;

            if batch.is_read_only() {
                return Ok(height as Version);
            }

            let version = height + 1;
            for (key, value) in &batch.write_set {
                sqlx::query(sql::UPSERT_STATE)
                    .bind(key)
                    .bind(value.as_slice())
                    .bind(version)
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to write key {}", key))?;
            }
            sqlx::query(sql::SET_HEIGHT)
                .bind(version)
                .execute(&mut *tx)
                .await
                .context("Failed to advance ledger height")?;

            tx.commit()
                .await
                .with_context(|| format!("Failed to commit tx {}", batch.tx_id))?;

            log::debug!(
                "Committed tx {} at height {} ({} writes)",
                batch.tx_id,
                version,
                batch.write_set.len()
            );
            Ok::<_, LedgerError>(version as Version)
        })
    }

    fn height(&self) -> Result<Version, LedgerError> {
        self.rt.block_on(async {
            let height: i64 = sqlx::query_scalar(sql::GET_HEIGHT)
                .fetch_one(&self.pool)
                .await
                .context("Failed to read ledger height")?;
            Ok::<_, LedgerError>(height as Version)
        })
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}
