//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - A recording view sink
//! - Mock data factories

use crate::app::Tracker;
use crate::config::AppConfig;
use crate::geolocation::ReportedPosition;
use crate::models::{Coords, Workout, WorkoutId};
use crate::storage::{LocalStore, StoreError};
use crate::view::{EventSink, EventView, ViewEvent};
use chrono::{DateTime, Local, TimeZone};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Store whose every operation fails
pub struct FailingStore;

impl LocalStore for FailingStore {
  async fn get_item(&self, _key: &str) -> Result<Option<String>, StoreError> {
    Err(StoreError::Database(sqlx::Error::PoolClosed))
  }

  async fn set_item(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
    Err(StoreError::Database(sqlx::Error::PoolClosed))
  }
}

/// ---------------------------------------------------------------------------
/// View Test Utilities
/// ---------------------------------------------------------------------------

/// Captures view events; clones share the same buffer
#[derive(Clone, Default)]
pub struct RecordingSink {
  events: Arc<Mutex<Vec<ViewEvent>>>,
}

impl RecordingSink {
  pub fn events(&self) -> Vec<ViewEvent> {
    self.events.lock().unwrap().clone()
  }

  pub fn clear(&self) {
    self.events.lock().unwrap().clear();
  }
}

impl EventSink for RecordingSink {
  fn emit(&self, event: ViewEvent) {
    self.events.lock().unwrap().push(event);
  }
}

/// Tracker wired to a recording view and default config
pub fn recording_tracker<S: LocalStore>(store: S) -> (Tracker<EventView, S>, RecordingSink) {
  let sink = RecordingSink::default();
  let tracker = Tracker::new(EventView::new(sink.clone()), store, AppConfig::default());
  (tracker, sink)
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// 09:00 local time on the given day
pub fn local_datetime(year: i32, month: u32, day: u32) -> DateTime<Local> {
  Local
    .with_ymd_and_hms(year, month, day, 9, 0, 0)
    .earliest()
    .expect("valid local datetime")
}

pub fn granted(lat: f64, lng: f64) -> ReportedPosition {
  ReportedPosition::Granted { latitude: lat, longitude: lng }
}

pub fn mock_running(id: &str) -> Workout {
  Workout::running(
    WorkoutId::from(id.to_string()),
    Coords::new(51.5, -0.12),
    5.0,
    25.0,
    180.0,
    local_datetime(2024, 4, 14),
  )
}

pub fn mock_cycling(id: &str) -> Workout {
  Workout::cycling(
    WorkoutId::from(id.to_string()),
    Coords::new(46.0, 7.0),
    30.0,
    60.0,
    -30.0,
    local_datetime(2024, 4, 15),
  )
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> =
      sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = 'local_storage'")
        .fetch_all(&pool)
        .await
        .expect("Failed to query tables");

    assert_eq!(tables.len(), 1);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let run = mock_running("0000000001");
    assert_eq!(run.pace(), Some(5.0));
    assert_eq!(run.description(), "Running on April 14");

    let ride = mock_cycling("0000000002");
    assert_eq!(ride.speed(), Some(30.0));
    assert_eq!(ride.description(), "Cycling on April 15");
  }

  #[test]
  fn test_recording_sink_shares_buffer() {
    let sink = RecordingSink::default();
    let clone = sink.clone();
    clone.emit(ViewEvent::ShowForm);
    assert_eq!(sink.events(), vec![ViewEvent::ShowForm]);

    sink.clear();
    assert!(clone.events().is_empty());
  }
}
