//! Application controller
//!
//! Owns the workout collection and drives the form lifecycle:
//!
//! ```text
//! Idle --map click--> Open { pending } --valid submit--> Idle
//!                          |      ^
//!                          +------+ invalid submit (alert, nothing changes)
//! ```

use crate::config::AppConfig;
use crate::form::{validate, FormError, FormSubmission, ValidatedInput, WorkoutForm};
use crate::geolocation::{GeoError, Geolocator};
use crate::models::{Coords, IdGenerator, Workout, WorkoutType};
use crate::storage::{load_workouts, save_workouts, LocalStore, StoreBackend};
use crate::view::{
  popup_content, EventView, FormView, MapView, Notifier, PanOptions, PopupOptions, WorkoutListView,
  WorkoutRow,
};
use chrono::{Local, Utc};
use tokio::sync::Mutex;

pub const GEOLOCATION_FAILED_MESSAGE: &str = "Could not get your position!";

/// Tracker as wired in the desktop app
pub type DesktopTracker = Tracker<EventView, StoreBackend>;

/// Application state managed by Tauri
pub struct AppState {
  pub tracker: Mutex<DesktopTracker>,
  pub config: AppConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormState {
  Idle,
  /// Form visible, waiting for submission at the clicked location
  Open { pending: Coords },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
  #[error("No map location selected")]
  NoPendingLocation,

  #[error(transparent)]
  Invalid(#[from] FormError),
}

/// Every view concern the tracker talks to
pub trait TrackerView: MapView + FormView + WorkoutListView + Notifier {}

impl<T: MapView + FormView + WorkoutListView + Notifier> TrackerView for T {}

pub struct Tracker<V, S> {
  view: V,
  store: S,
  config: AppConfig,
  ids: IdGenerator,
  form: WorkoutForm,
  state: FormState,
  center: Option<Coords>,
  workouts: Vec<Workout>,
}

impl<V: TrackerView, S: LocalStore> Tracker<V, S> {
  pub fn new(view: V, store: S, config: AppConfig) -> Self {
    Self {
      view,
      store,
      config,
      ids: IdGenerator::default(),
      form: WorkoutForm::default(),
      state: FormState::Idle,
      center: None,
      workouts: Vec::new(),
    }
  }

  /// ---------------------------------------------------------------------------
  /// Startup
  /// ---------------------------------------------------------------------------

  /// Load persisted workouts, then locate the user and build the map.
  ///
  /// Stored workouts are only drawn once a map exists. Without a position
  /// the user is alerted and nothing can be logged.
  ///
  /// Once a map exists, a repeat call comes from a reloaded webview: the map
  /// and every workout are redrawn from memory at the first center, and the
  /// form starts over hidden.
  pub async fn initialize<G: Geolocator>(&mut self, geolocator: &G) -> Result<Coords, GeoError> {
    if let Some(center) = self.center {
      tracing::debug!(count = self.workouts.len(), "Redrawing existing map");
      self.form = WorkoutForm::default();
      self.state = FormState::Idle;
      self.load_map(center);
      return Ok(center);
    }

    self.workouts = load_workouts(&self.store).await;
    for workout in &self.workouts {
      self.ids.observe(workout.id());
    }
    tracing::info!(count = self.workouts.len(), "Loaded stored workouts");

    match geolocator.locate().await {
      Ok(center) => {
        self.load_map(center);
        Ok(center)
      }
      Err(e) => {
        tracing::warn!(error = %e, "Could not determine position");
        self.view.alert(GEOLOCATION_FAILED_MESSAGE);
        Err(e)
      }
    }
  }

  fn load_map(&mut self, center: Coords) {
    self.view.create_view(center, self.config.zoom);
    self
      .view
      .add_tile_layer(&self.config.tile_url, &self.config.tile_attribution);
    self.center = Some(center);

    for workout in &self.workouts {
      render_row(&mut self.view, workout);
      render_marker(&mut self.view, workout);
    }
    tracing::info!(lat = center.lat, lng = center.lng, "Map ready");
  }

  /// ---------------------------------------------------------------------------
  /// Events
  /// ---------------------------------------------------------------------------

  /// Capture the clicked location and open the form. Returns false when
  /// there is no map yet.
  pub fn on_map_click(&mut self, coords: Coords) -> bool {
    if self.center.is_none() {
      tracing::warn!("Map click before map was created");
      return false;
    }

    self.state = FormState::Open { pending: coords };
    self.form.open(&mut self.view);
    true
  }

  pub fn on_type_change(&mut self, workout_type: WorkoutType) {
    self.form.select_type(workout_type, &mut self.view);
  }

  /// Build, render and persist a workout from the submitted form.
  ///
  /// Invalid input alerts the user and leaves the form open with its
  /// pending location.
  pub async fn on_submit(&mut self, submission: &FormSubmission) -> Result<Workout, SubmitError> {
    let FormState::Open { pending } = self.state else {
      tracing::warn!("Form submitted without a selected location");
      return Err(SubmitError::NoPendingLocation);
    };

    let input = match validate(submission) {
      Ok(input) => input,
      Err(e) => {
        tracing::debug!(field = %e.field(), "Rejected workout input");
        self.view.alert(&e.to_string());
        return Err(e.into());
      }
    };

    let now = Local::now();
    let id = self.ids.next_at(now.with_timezone(&Utc));
    let workout = match input {
      ValidatedInput::Running { distance_km, duration_min, cadence_spm } => {
        Workout::running(id, pending, distance_km, duration_min, cadence_spm, now)
      }
      ValidatedInput::Cycling { distance_km, duration_min, elevation_gain_m } => {
        Workout::cycling(id, pending, distance_km, duration_min, elevation_gain_m, now)
      }
    };
    self.workouts.push(workout.clone());

    render_marker(&mut self.view, &workout);
    render_row(&mut self.view, &workout);

    self.form.reset(&mut self.view);
    self.state = FormState::Idle;

    save_workouts(&self.store, &self.workouts).await;

    tracing::info!(
      id = %workout.id(),
      workout_type = workout.workout_type().as_str(),
      "Workout logged"
    );
    Ok(workout)
  }

  /// Pan to the workout behind a list row and count the selection.
  /// Unknown ids are ignored.
  pub fn on_list_item_click(&mut self, id: &str) -> bool {
    if self.center.is_none() {
      return false;
    }

    let Some(workout) = self.workouts.iter_mut().find(|w| w.id().as_str() == id) else {
      tracing::debug!(id, "No workout for selected row");
      return false;
    };

    self
      .view
      .set_view(workout.coords(), self.config.zoom, PanOptions::default());
    workout.click();
    true
  }

  /// ---------------------------------------------------------------------------
  /// Accessors
  /// ---------------------------------------------------------------------------

  pub fn workouts(&self) -> &[Workout] {
    &self.workouts
  }

  pub fn form_state(&self) -> FormState {
    self.state
  }

  pub fn is_map_ready(&self) -> bool {
    self.center.is_some()
  }
}

fn render_marker<V: MapView>(view: &mut V, workout: &Workout) {
  let marker = view.add_marker(workout.coords());
  view.bind_popup(
    marker,
    &popup_content(workout),
    &PopupOptions::for_workout(workout.workout_type()),
  );
}

fn render_row<V: WorkoutListView>(view: &mut V, workout: &Workout) {
  view.insert_row(&WorkoutRow::from(workout));
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
