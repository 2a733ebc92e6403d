//! Tauri commands: the webview forwards raw UI events here

use crate::app::{AppState, SubmitError};
use crate::form::FormSubmission;
use crate::geolocation::{IpGeolocator, ReportedPosition};
use crate::models::{Coords, Workout, WorkoutType};
use serde::Serialize;
use std::sync::Arc;
use tauri::State;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
  #[error(transparent)]
  Submit(#[from] SubmitError),

  #[error("Invalid coordinates: {lat}, {lng}")]
  InvalidCoordinates { lat: f64, lng: f64 },
}

impl Serialize for CommandError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Startup
/// ---------------------------------------------------------------------------

/// Build the map around the user's position and draw stored workouts.
///
/// `position` is what the webview got from its geolocation API; `None`
/// means it has none and the IP lookup is used. A failed lookup, including
/// one whose endpoint is misconfigured, has already been shown to the user,
/// so it resolves to `None` rather than an error.
#[tauri::command]
pub async fn initialize(
  state: State<'_, Arc<AppState>>,
  position: Option<ReportedPosition>,
) -> Result<Option<Coords>, CommandError> {
  let mut tracker = state.tracker.lock().await;

  let located = match position {
    Some(reported) => tracker.initialize(&reported).await,
    None => {
      let locator = IpGeolocator::new(&state.config.geoip_url, state.config.geoip_timeout);
      tracker.initialize(&locator).await
    }
  };

  Ok(located.ok())
}

/// ---------------------------------------------------------------------------
/// UI Events
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn map_clicked(
  state: State<'_, Arc<AppState>>,
  lat: f64,
  lng: f64,
) -> Result<bool, CommandError> {
  let coords = Coords::new(lat, lng);
  if !coords.is_valid() {
    return Err(CommandError::InvalidCoordinates { lat, lng });
  }

  Ok(state.tracker.lock().await.on_map_click(coords))
}

#[tauri::command]
pub async fn workout_type_changed(
  state: State<'_, Arc<AppState>>,
  workout_type: WorkoutType,
) -> Result<(), CommandError> {
  state.tracker.lock().await.on_type_change(workout_type);
  Ok(())
}

#[tauri::command]
pub async fn submit_workout(
  state: State<'_, Arc<AppState>>,
  submission: FormSubmission,
) -> Result<Workout, CommandError> {
  let workout = state.tracker.lock().await.on_submit(&submission).await?;
  Ok(workout)
}

#[tauri::command]
pub async fn workout_selected(
  state: State<'_, Arc<AppState>>,
  id: String,
) -> Result<bool, CommandError> {
  Ok(state.tracker.lock().await.on_list_item_click(&id))
}

#[tauri::command]
pub async fn get_workouts(state: State<'_, Arc<AppState>>) -> Result<Vec<Workout>, CommandError> {
  Ok(state.tracker.lock().await.workouts().to_vec())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
