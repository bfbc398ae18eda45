//! Preference and result storage

mod scope_store;

pub use scope_store::{ScopeStore, StoredResult};

use crate::models::{Preferences, SessionResult};
use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::{Arc, Mutex};

static STORE: Lazy<Mutex<Option<Arc<ScopeStore>>>> = Lazy::new(|| Mutex::new(None));

/// Initialize the global store if not already present
pub fn init_store(storage_path: &Path) -> anyhow::Result<()> {
    let mut guard = STORE
        .lock()
        .map_err(|e| anyhow::anyhow!("lock poisoned: {}", e))?;
    if guard.is_some() {
        return Ok(());
    }
    let store = Arc::new(ScopeStore::new(storage_path)?);
    tracing::debug!("Store opened at {}", store.db_path().display());
    *guard = Some(store);
    Ok(())
}

/// Replace the global store so tests can start from a fresh directory.
#[cfg(test)]
pub fn reset_store_for_tests(storage_path: &Path) -> anyhow::Result<()> {
    let mut guard = STORE
        .lock()
        .map_err(|e| anyhow::anyhow!("lock poisoned: {}", e))?;
    *guard = None;
    let store = Arc::new(ScopeStore::new(storage_path)?);
    *guard = Some(store);
    Ok(())
}

pub fn is_initialized() -> bool {
    STORE.lock().map(|guard| guard.is_some()).unwrap_or(false)
}

fn store() -> anyhow::Result<Arc<ScopeStore>> {
    let guard = STORE
        .lock()
        .map_err(|e| anyhow::anyhow!("lock poisoned: {}", e))?;
    guard
        .clone()
        .ok_or_else(|| anyhow::anyhow!("store not initialized"))
}

/// Load preferences, falling back to defaults when no store is configured
pub async fn load_preferences() -> anyhow::Result<Preferences> {
    match store() {
        Ok(store) => store.load_preferences().await,
        Err(_) => Ok(Preferences::default()),
    }
}

pub async fn save_preferences(prefs: &Preferences) -> anyhow::Result<()> {
    let store = store()?;
    store.save_preferences(prefs).await
}

/// Persist a finished session. A missing store is not an error.
pub async fn persist_result(result: &SessionResult) -> anyhow::Result<()> {
    if let Ok(store) = store() {
        store.record_result(result).await
    } else {
        Ok(())
    }
}

pub async fn last_result() -> anyhow::Result<Option<StoredResult>> {
    let store = store()?;
    store.last_result().await
}

pub async fn clear_results() -> anyhow::Result<u64> {
    let store = store()?;
    store.clear_results().await
}
