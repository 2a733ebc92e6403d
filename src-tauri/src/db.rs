use crate::storage::{LocalStore, StoreError};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::PathBuf;
use tauri::Manager;

pub type DbPool = SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
  #[error("Failed to get app data dir: {0}")]
  DataDir(#[from] tauri::Error),

  #[error("Failed to create data directory: {0}")]
  Io(#[from] std::io::Error),

  #[error("Failed to open database: {0}")]
  Connect(#[from] sqlx::Error),

  #[error("Failed to run migrations: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Get the path to the database file
/// Stored in the platform app data dir, e.g. ~/.local/share/dev.workoutmap.app/workout-map.db
fn get_db_path<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<PathBuf, DbError> {
  let data_dir = app.path().app_data_dir()?;

  // Create directory if it doesn't exist
  fs::create_dir_all(&data_dir)?;

  Ok(data_dir.join("workout-map.db"))
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<DbPool, DbError> {
  let db_path = get_db_path(app)?;
  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  tracing::info!(path = %db_path.display(), "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("Database initialized successfully");

  Ok(pool)
}

/// `LocalStore` over the `local_storage` table
#[derive(Debug, Clone)]
pub struct SqliteStore {
  pool: DbPool,
}

impl SqliteStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }
}

impl LocalStore for SqliteStore {
  async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM local_storage WHERE key = ?1")
      .bind(key)
      .fetch_optional(&self.pool)
      .await?;
    Ok(value)
  }

  async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      INSERT INTO local_storage (key, value, updated_at)
      VALUES (?1, ?2, CURRENT_TIMESTAMP)
      ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(key)
    .bind(value)
    .execute(&self.pool)
    .await?;
    Ok(())
  }
}
