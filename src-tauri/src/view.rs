//! View adapter between the tracker and the webview
//!
//! The tracker talks to four narrow traits. `EventView` implements all of
//! them by turning each call into a `ViewEvent` and handing it to an
//! `EventSink`; the desktop build forwards those to the webview, which
//! applies them to Leaflet and the DOM.

use crate::models::{Coords, Workout, WorkoutKind, WorkoutType};
use serde::Serialize;
use std::time::Duration;
use tauri::{AppHandle, Emitter, Runtime};

/// Event name the webview listens on
pub const VIEW_EVENT: &str = "view";

/// ---------------------------------------------------------------------------
/// Collaborator Traits
/// ---------------------------------------------------------------------------

pub trait MapView {
  fn create_view(&mut self, center: Coords, zoom: u8);
  fn add_tile_layer(&mut self, url: &str, attribution: &str);
  fn add_marker(&mut self, coords: Coords) -> MarkerId;
  fn bind_popup(&mut self, marker: MarkerId, content: &str, options: &PopupOptions);
  fn set_view(&mut self, coords: Coords, zoom: u8, pan: PanOptions);
}

pub trait FormView {
  fn show_form(&mut self);
  fn focus_distance(&mut self);
  /// Show the cadence row for running, the elevation row for cycling
  fn set_visible_metric(&mut self, workout_type: WorkoutType);
  fn clear_fields(&mut self);
  /// Hide at once; layout display comes back after `transition`
  fn hide_form(&mut self, transition: Duration);
}

pub trait WorkoutListView {
  fn insert_row(&mut self, row: &WorkoutRow);
}

pub trait Notifier {
  /// Blocking acknowledgement in the webview
  fn alert(&mut self, message: &str);
}

/// ---------------------------------------------------------------------------
/// View Models
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MarkerId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupOptions {
  pub max_width: u32,
  pub min_width: u32,
  pub auto_close: bool,
  pub close_on_click: bool,
  pub class_name: String,
}

impl PopupOptions {
  /// Popups stay open so every workout on the map keeps its label
  pub fn for_workout(workout_type: WorkoutType) -> Self {
    Self {
      max_width: 250,
      min_width: 100,
      auto_close: false,
      close_on_click: false,
      class_name: format!("{}-popup", workout_type.as_str()),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanOptions {
  pub animate: bool,
  pub duration_secs: f64,
}

impl Default for PanOptions {
  fn default() -> Self {
    Self {
      animate: true,
      duration_secs: 1.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowDetail {
  pub icon: &'static str,
  pub value: String,
  pub unit: &'static str,
}

impl RowDetail {
  fn new(icon: &'static str, value: String, unit: &'static str) -> Self {
    Self { icon, value, unit }
  }
}

/// One entry in the workout list; `id` is the join key back to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRow {
  pub id: String,
  pub workout_type: WorkoutType,
  pub title: String,
  pub details: Vec<RowDetail>,
}

impl From<&Workout> for WorkoutRow {
  fn from(workout: &Workout) -> Self {
    let mut details = vec![
      RowDetail::new(workout.icon(), workout.distance_km().to_string(), "km"),
      RowDetail::new("⏱", workout.duration_min().to_string(), "min"),
    ];

    match *workout.kind() {
      WorkoutKind::Running { cadence_spm, pace_min_per_km } => {
        details.push(RowDetail::new("⚡️", format!("{:.1}", pace_min_per_km), "min/km"));
        details.push(RowDetail::new("🦶🏼", cadence_spm.to_string(), "spm"));
      }
      WorkoutKind::Cycling { elevation_gain_m, speed_km_per_h } => {
        details.push(RowDetail::new("⚡️", format!("{:.1}", speed_km_per_h), "km/h"));
        details.push(RowDetail::new("🗻", elevation_gain_m.to_string(), "m"));
      }
    }

    Self {
      id: workout.id().to_string(),
      workout_type: workout.workout_type(),
      title: workout.description().to_string(),
      details,
    }
  }
}

/// Popup text shown on a workout marker
pub fn popup_content(workout: &Workout) -> String {
  format!("{} {}", workout.icon(), workout.description())
}

/// ---------------------------------------------------------------------------
/// Event Transport
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ViewEvent {
  CreateView { center: Coords, zoom: u8 },
  AddTileLayer { url: String, attribution: String },
  AddMarker { marker: MarkerId, coords: Coords },
  BindPopup { marker: MarkerId, content: String, options: PopupOptions },
  SetView { coords: Coords, zoom: u8, pan: PanOptions },
  ShowForm,
  FocusDistance,
  SetVisibleMetric { workout_type: WorkoutType },
  ClearFields,
  HideForm { restore_display_after_ms: u64 },
  InsertRow { row: WorkoutRow },
  Alert { message: String },
}

pub trait EventSink: Send + Sync {
  fn emit(&self, event: ViewEvent);
}

/// Forwards view events to every webview of the app
pub struct WebviewSink<R: Runtime> {
  app: AppHandle<R>,
}

impl<R: Runtime> WebviewSink<R> {
  pub fn new(app: AppHandle<R>) -> Self {
    Self { app }
  }
}

impl<R: Runtime> EventSink for WebviewSink<R> {
  fn emit(&self, event: ViewEvent) {
    if let Err(e) = self.app.emit(VIEW_EVENT, &event) {
      tracing::warn!(error = %e, ?event, "Failed to emit view event");
    }
  }
}

/// Implements every view trait on top of an `EventSink`
pub struct EventView {
  sink: Box<dyn EventSink>,
  next_marker: u32,
}

impl EventView {
  pub fn new(sink: impl EventSink + 'static) -> Self {
    Self {
      sink: Box::new(sink),
      next_marker: 0,
    }
  }

  fn send(&self, event: ViewEvent) {
    self.sink.emit(event);
  }
}

impl MapView for EventView {
  fn create_view(&mut self, center: Coords, zoom: u8) {
    self.send(ViewEvent::CreateView { center, zoom });
  }

  fn add_tile_layer(&mut self, url: &str, attribution: &str) {
    self.send(ViewEvent::AddTileLayer {
      url: url.to_string(),
      attribution: attribution.to_string(),
    });
  }

  fn add_marker(&mut self, coords: Coords) -> MarkerId {
    let marker = MarkerId(self.next_marker);
    self.next_marker += 1;
    self.send(ViewEvent::AddMarker { marker, coords });
    marker
  }

  fn bind_popup(&mut self, marker: MarkerId, content: &str, options: &PopupOptions) {
    self.send(ViewEvent::BindPopup {
      marker,
      content: content.to_string(),
      options: options.clone(),
    });
  }

  fn set_view(&mut self, coords: Coords, zoom: u8, pan: PanOptions) {
    self.send(ViewEvent::SetView { coords, zoom, pan });
  }
}

impl FormView for EventView {
  fn show_form(&mut self) {
    self.send(ViewEvent::ShowForm);
  }

  fn focus_distance(&mut self) {
    self.send(ViewEvent::FocusDistance);
  }

  fn set_visible_metric(&mut self, workout_type: WorkoutType) {
    self.send(ViewEvent::SetVisibleMetric { workout_type });
  }

  fn clear_fields(&mut self) {
    self.send(ViewEvent::ClearFields);
  }

  fn hide_form(&mut self, transition: Duration) {
    let restore_display_after_ms = u64::try_from(transition.as_millis()).unwrap_or(u64::MAX);
    self.send(ViewEvent::HideForm { restore_display_after_ms });
  }
}

impl WorkoutListView for EventView {
  fn insert_row(&mut self, row: &WorkoutRow) {
    self.send(ViewEvent::InsertRow { row: row.clone() });
  }
}

impl Notifier for EventView {
  fn alert(&mut self, message: &str) {
    self.send(ViewEvent::Alert {
      message: message.to_string(),
    });
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::WorkoutId;
  use crate::test_utils::{local_datetime, RecordingSink};

  fn run() -> Workout {
    Workout::running(
      WorkoutId::from("0000000001".to_string()),
      Coords::new(51.5, -0.12),
      5.0,
      27.0,
      180.0,
      local_datetime(2024, 4, 14),
    )
  }

  #[test]
  fn test_running_row_formats_pace_with_one_decimal() {
    let row = WorkoutRow::from(&run());

    assert_eq!(row.id, "0000000001");
    assert_eq!(row.title, "Running on April 14");
    let rendered: Vec<(String, &str)> = row.details.iter().map(|d| (d.value.clone(), d.unit)).collect();
    assert_eq!(
      rendered,
      vec![
        ("5".to_string(), "km"),
        ("27".to_string(), "min"),
        ("5.4".to_string(), "min/km"),
        ("180".to_string(), "spm"),
      ]
    );
  }

  #[test]
  fn test_cycling_row_shows_speed_and_elevation() {
    let ride = Workout::cycling(
      WorkoutId::from("0000000002".to_string()),
      Coords::new(39.0, 12.0),
      27.0,
      95.0,
      -30.0,
      local_datetime(2024, 4, 14),
    );
    let row = WorkoutRow::from(&ride);

    assert_eq!(row.details[0].icon, "🚴‍♀️");
    assert_eq!(row.details[2].value, "17.1");
    assert_eq!(row.details[2].unit, "km/h");
    assert_eq!(row.details[3].value, "-30");
    assert_eq!(row.details[3].unit, "m");
  }

  #[test]
  fn test_popup_options_per_type() {
    let options = PopupOptions::for_workout(WorkoutType::Cycling);
    assert_eq!(options.class_name, "cycling-popup");
    assert_eq!((options.max_width, options.min_width), (250, 100));
    assert!(!options.auto_close && !options.close_on_click);
    assert_eq!(popup_content(&run()), "🏃‍♂️ Running on April 14");
  }

  #[test]
  fn test_event_view_numbers_markers() {
    let sink = RecordingSink::default();
    let mut view = EventView::new(sink.clone());

    let first = view.add_marker(Coords::new(1.0, 2.0));
    let second = view.add_marker(Coords::new(3.0, 4.0));
    assert_eq!((first, second), (MarkerId(0), MarkerId(1)));
    assert_eq!(sink.events().len(), 2);
  }

  #[test]
  fn test_view_event_wire_format() {
    let event = ViewEvent::HideForm { restore_display_after_ms: 1000 };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value, serde_json::json!({ "op": "hideForm", "restoreDisplayAfterMs": 1000 }));

    let event = ViewEvent::SetView {
      coords: Coords::new(51.5, -0.12),
      zoom: 13,
      pan: PanOptions::default(),
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["coords"], serde_json::json!([51.5, -0.12]));
    assert_eq!(value["pan"]["durationSecs"], 1.0);
  }
}
