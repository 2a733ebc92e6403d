//! Local persistence for the workout collection
//!
//! The whole collection lives as one JSON array under a single key of a
//! string key-value store. Writes replace the previous value; reads treat a
//! missing or unreadable value as "no workouts yet".

use crate::db::SqliteStore;
use crate::models::Workout;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

pub const WORKOUTS_KEY: &str = "workouts";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// String key-value store surviving restarts
pub trait LocalStore: Send + Sync {
  fn get_item(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

  fn set_item(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// ---------------------------------------------------------------------------
/// In-Memory Store
/// ---------------------------------------------------------------------------

/// Process-local store; used when the database cannot be opened
#[derive(Debug, Default)]
pub struct MemoryStore {
  items: Mutex<HashMap<String, String>>,
}

impl LocalStore for MemoryStore {
  async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
    let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(items.get(key).cloned())
  }

  async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
    items.insert(key.to_string(), value.to_string());
    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Backend Selection
/// ---------------------------------------------------------------------------

pub enum StoreBackend {
  Sqlite(SqliteStore),
  Memory(MemoryStore),
}

impl LocalStore for StoreBackend {
  async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
    match self {
      StoreBackend::Sqlite(store) => store.get_item(key).await,
      StoreBackend::Memory(store) => store.get_item(key).await,
    }
  }

  async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
    match self {
      StoreBackend::Sqlite(store) => store.set_item(key, value).await,
      StoreBackend::Memory(store) => store.set_item(key, value).await,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Workout Collection
/// ---------------------------------------------------------------------------

/// Overwrite the stored collection. Failures are logged, never returned:
/// whatever is already on screen stays valid.
pub async fn save_workouts<S: LocalStore>(store: &S, workouts: &[Workout]) {
  let result = match serde_json::to_string(workouts) {
    Ok(json) => store.set_item(WORKOUTS_KEY, &json).await,
    Err(e) => Err(e.into()),
  };

  match result {
    Ok(()) => tracing::debug!(count = workouts.len(), "Workouts persisted"),
    Err(e) => tracing::warn!(error = %e, count = workouts.len(), "Failed to persist workouts"),
  }
}

/// Read the stored collection; absent or corrupt data yields an empty one.
/// Records that fail to decode are skipped without dropping the rest.
pub async fn load_workouts<S: LocalStore>(store: &S) -> Vec<Workout> {
  let raw = match store.get_item(WORKOUTS_KEY).await {
    Ok(Some(raw)) => raw,
    Ok(None) => return Vec::new(),
    Err(e) => {
      tracing::warn!(error = %e, "Failed to read stored workouts");
      return Vec::new();
    }
  };

  let records = match serde_json::from_str::<Option<Vec<serde_json::Value>>>(&raw) {
    Ok(records) => records.unwrap_or_default(),
    Err(e) => {
      tracing::warn!(error = %e, "Ignoring unparsable stored workouts");
      return Vec::new();
    }
  };

  records
    .into_iter()
    .enumerate()
    .filter_map(|(index, record)| match serde_json::from_value::<Workout>(record) {
      Ok(workout) => Some(workout),
      Err(e) => {
        tracing::warn!(error = %e, index, "Skipping unreadable stored workout");
        None
      }
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
