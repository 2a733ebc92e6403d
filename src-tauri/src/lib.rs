pub mod app;
pub mod commands;
pub mod config;
pub mod db;
pub mod form;
pub mod geolocation;
pub mod models;
pub mod storage;
pub mod view;

#[cfg(test)]
mod test_utils;

use app::{AppState, Tracker};
use config::AppConfig;
use db::SqliteStore;
use std::sync::Arc;
use storage::{MemoryStore, StoreBackend};
use tauri::Manager;
use tracing_subscriber::EnvFilter;
use view::{EventView, WebviewSink};

fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  // A subscriber may already be installed (e.g. by an embedding host)
  let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();
  init_logging();

  let config = AppConfig::from_env().unwrap_or_else(|e| {
    tracing::warn!(error = %e, "Invalid configuration, using defaults");
    AppConfig::default()
  });

  tauri::Builder::default()
    .plugin(tauri_plugin_opener::init())
    .setup(move |app| {
      let app_handle = app.handle().clone();

      let store = tauri::async_runtime::block_on(async { db::initialize_db(&app_handle).await });
      let store = match store {
        Ok(pool) => StoreBackend::Sqlite(SqliteStore::new(pool)),
        Err(e) => {
          // Workouts still work for this session, they just won't survive a restart
          tracing::error!(error = %e, "Failed to initialize database, keeping workouts in memory");
          StoreBackend::Memory(MemoryStore::default())
        }
      };

      let view = EventView::new(WebviewSink::new(app_handle.clone()));
      let tracker = Tracker::new(view, store, config.clone());
      app_handle.manage(Arc::new(AppState {
        tracker: tokio::sync::Mutex::new(tracker),
        config: config.clone(),
      }));
      Ok(())
    })
    .invoke_handler(tauri::generate_handler![
      commands::initialize,
      commands::map_clicked,
      commands::workout_type_changed,
      commands::submit_workout,
      commands::workout_selected,
      commands::get_workouts,
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
