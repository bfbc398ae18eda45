use crate::models::{ContextId, Preferences, SessionId, SessionResult};
use anyhow::Context;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A finished session as read back from storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResult {
    pub session_id: SessionId,
    pub context_id: Option<ContextId>,
    pub hosts: Vec<String>,
    pub finished_at: i64,
}

impl From<SessionResult> for StoredResult {
    fn from(result: SessionResult) -> Self {
        Self {
            session_id: result.session_id,
            context_id: result.context_id,
            hosts: result.hosts,
            finished_at: result.finished_at,
        }
    }
}

pub struct ScopeStore {
    db: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl ScopeStore {
    pub fn new(base_path: &Path) -> anyhow::Result<Self> {
        if !base_path.exists() {
            fs::create_dir_all(base_path)
                .with_context(|| format!("creating storage directory {:?}", base_path))?;
        }
        let db_path = base_path.join("domainscope.sqlite");
        let conn = Connection::open(&db_path)
            .with_context(|| format!("opening database at {:?}", db_path))?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS results (
                session_id TEXT PRIMARY KEY,
                context_id TEXT,
                finished_at INTEGER NOT NULL,
                host_count INTEGER NOT NULL,
                hosts TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_results_finished_at
                ON results(finished_at DESC);
            ",
        )?;

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            db_path,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Load preferences; keys never written keep their defaults.
    pub async fn load_preferences(&self) -> anyhow::Result<Preferences> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().expect("db mutex poisoned");
            let mut stmt = conn.prepare("SELECT key, value FROM preferences")?;
            let mut rows = stmt.query([])?;
            let mut map = serde_json::Map::new();
            while let Some(row) = rows.next()? {
                let key: String = row.get(0)?;
                let raw: String = row.get(1)?;
                match serde_json::from_str(&raw) {
                    Ok(value) => {
                        map.insert(key, value);
                    }
                    Err(err) => {
                        tracing::warn!("Skipping corrupt preference {}: {}", key, err);
                    }
                }
            }
            let prefs: Preferences = serde_json::from_value(serde_json::Value::Object(map))
                .context("decoding preferences")?;
            Ok::<_, anyhow::Error>(prefs)
        })
        .await?
    }

    /// Write every preference key.
    pub async fn save_preferences(&self, prefs: &Preferences) -> anyhow::Result<()> {
        let serde_json::Value::Object(map) = serde_json::to_value(prefs)? else {
            anyhow::bail!("preferences did not serialize to an object");
        };
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db.lock().expect("db mutex poisoned");
            let now = Utc::now().timestamp_millis();
            let tx = conn.transaction()?;
            for (key, value) in map {
                tx.execute(
                    "INSERT OR REPLACE INTO preferences (key, value, updated_at)
                     VALUES (?1, ?2, ?3)",
                    params![key, value.to_string(), now],
                )
                .with_context(|| format!("writing preference {}", key))?;
            }
            tx.commit()?;
            Ok::<_, anyhow::Error>(())
        })
        .await??;
        Ok(())
    }

    pub async fn record_result(&self, result: &SessionResult) -> anyhow::Result<()> {
        let db = Arc::clone(&self.db);
        let hosts = serde_json::to_string(&result.hosts)?;
        let session_id = result.session_id.to_string();
        let context_id = result.context_id.as_ref().map(ToString::to_string);
        let finished_at = result.finished_at;
        let host_count = result.hosts.len() as i64;
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().expect("db mutex poisoned");
            conn.execute(
                "INSERT OR REPLACE INTO results
                   (session_id, context_id, finished_at, host_count, hosts)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![session_id, context_id, finished_at, host_count, hosts],
            )
            .context("inserting result")
        })
        .await??;
        Ok(())
    }

    /// Most recently finished session, if any
    pub async fn last_result(&self) -> anyhow::Result<Option<StoredResult>> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || -> anyhow::Result<Option<StoredResult>> {
            let conn = db.lock().expect("db mutex poisoned");
            let row = conn
                .query_row(
                    "SELECT session_id, context_id, finished_at, hosts FROM results
                     ORDER BY finished_at DESC, rowid DESC LIMIT 1",
                    [],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;
            let Some((session_id, context_id, finished_at, hosts)) = row else {
                return Ok(None);
            };
            Ok(Some(StoredResult {
                session_id: SessionId::from(session_id),
                context_id: context_id.map(ContextId::from),
                hosts: serde_json::from_str(&hosts).context("decoding stored hosts")?,
                finished_at,
            }))
        })
        .await?
    }

    pub async fn result_count(&self) -> anyhow::Result<u64> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().expect("db mutex poisoned");
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;
            Ok::<_, anyhow::Error>(count.max(0) as u64)
        })
        .await?
    }

    /// Delete stored results, keeping preferences
    pub async fn clear_results(&self) -> anyhow::Result<u64> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().expect("db mutex poisoned");
            let removed = conn.execute("DELETE FROM results", [])?;
            Ok::<_, anyhow::Error>(removed as u64)
        })
        .await?
    }
}
