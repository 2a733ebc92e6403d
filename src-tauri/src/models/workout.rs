//! Workout entity model
//!
//! A workout is logged at a map location with a distance and a duration.
//! The variant payload carries the sport-specific input together with the
//! derived metric, which is computed exactly once at construction and then
//! read back as stored (including after a reload).

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MONTHS: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December",
];

/// Identifiers keep the ten least-significant digits of a millisecond timestamp
const ID_MODULUS: u64 = 10_000_000_000;

/// ---------------------------------------------------------------------------
/// Coordinates
/// ---------------------------------------------------------------------------

/// Latitude/longitude in degrees, stored as a `[lat, lng]` pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
  pub lat: f64,
  pub lng: f64,
}

impl Coords {
  pub fn new(lat: f64, lng: f64) -> Self {
    Self { lat, lng }
  }

  /// Finite and within the WGS84 ranges
  pub fn is_valid(&self) -> bool {
    self.lat.is_finite()
      && self.lng.is_finite()
      && (-90.0..=90.0).contains(&self.lat)
      && (-180.0..=180.0).contains(&self.lng)
  }
}

impl From<[f64; 2]> for Coords {
  fn from([lat, lng]: [f64; 2]) -> Self {
    Self { lat, lng }
  }
}

impl From<Coords> for [f64; 2] {
  fn from(coords: Coords) -> Self {
    [coords.lat, coords.lng]
  }
}

/// ---------------------------------------------------------------------------
/// Identifiers
/// ---------------------------------------------------------------------------

/// Opaque workout identifier; joins list rows back to the model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
  fn from_value(value: u64) -> Self {
    Self(format!("{:010}", value % ID_MODULUS))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<String> for WorkoutId {
  fn from(value: String) -> Self {
    Self(value)
  }
}

impl fmt::Display for WorkoutId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Issues timestamp-derived ids that strictly increase within a session.
///
/// Two workouts created in the same millisecond get consecutive values
/// instead of colliding. Seed with `observe` for every id loaded from
/// storage so new ids never repeat a persisted one.
#[derive(Debug, Default)]
pub struct IdGenerator {
  last: Option<u64>,
}

impl IdGenerator {
  pub fn next_at(&mut self, now: DateTime<Utc>) -> WorkoutId {
    let stamp = u64::try_from(now.timestamp_millis()).unwrap_or(0) % ID_MODULUS;
    let value = match self.last {
      Some(last) if stamp <= last => (last + 1) % ID_MODULUS,
      _ => stamp,
    };
    self.last = Some(value);
    WorkoutId::from_value(value)
  }

  pub fn observe(&mut self, id: &WorkoutId) {
    let Ok(value) = id.as_str().parse::<u64>() else {
      return;
    };
    if value < ID_MODULUS && self.last.map_or(true, |last| value > last) {
      self.last = Some(value);
    }
  }
}

/// ---------------------------------------------------------------------------
/// Workout Types
/// ---------------------------------------------------------------------------

/// Discriminant shared by the form selector and the stored records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
  #[default]
  Running,
  Cycling,
}

impl WorkoutType {
  pub fn as_str(&self) -> &'static str {
    match self {
      WorkoutType::Running => "running",
      WorkoutType::Cycling => "cycling",
    }
  }

  pub fn display_name(&self) -> &'static str {
    match self {
      WorkoutType::Running => "Running",
      WorkoutType::Cycling => "Cycling",
    }
  }

  pub fn icon(&self) -> &'static str {
    match self {
      WorkoutType::Running => "🏃‍♂️",
      WorkoutType::Cycling => "🚴‍♀️",
    }
  }

  pub fn other(&self) -> Self {
    match self {
      WorkoutType::Running => WorkoutType::Cycling,
      WorkoutType::Cycling => WorkoutType::Running,
    }
  }
}

/// Sport-specific payload. Aliases accept records written by the browser build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkoutKind {
  #[serde(rename_all = "camelCase")]
  Running {
    #[serde(alias = "cadence")]
    cadence_spm: f64,
    #[serde(alias = "pace")]
    pace_min_per_km: f64,
  },
  #[serde(rename_all = "camelCase")]
  Cycling {
    /// May be negative (net descent)
    #[serde(alias = "elevationGain")]
    elevation_gain_m: f64,
    #[serde(alias = "speed")]
    speed_km_per_h: f64,
  },
}

impl WorkoutKind {
  pub fn workout_type(&self) -> WorkoutType {
    match self {
      WorkoutKind::Running { .. } => WorkoutType::Running,
      WorkoutKind::Cycling { .. } => WorkoutType::Cycling,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Workout
/// ---------------------------------------------------------------------------

/// A logged session. Immutable after construction apart from `click_count`.
///
/// Inputs are trusted: the form validates before anything is built here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
  id: WorkoutId,
  #[serde(alias = "date")]
  created_at: DateTime<Utc>,
  coords: Coords,
  #[serde(alias = "distance")]
  distance_km: f64,
  #[serde(alias = "duration")]
  duration_min: f64,
  description: String,
  #[serde(default, alias = "clicks")]
  click_count: u32,
  #[serde(flatten)]
  kind: WorkoutKind,
}

impl Workout {
  pub fn running(
    id: WorkoutId,
    coords: Coords,
    distance_km: f64,
    duration_min: f64,
    cadence_spm: f64,
    created_at: DateTime<Local>,
  ) -> Self {
    let kind = WorkoutKind::Running {
      cadence_spm,
      pace_min_per_km: duration_min / distance_km,
    };
    Self::build(id, coords, distance_km, duration_min, kind, created_at)
  }

  pub fn cycling(
    id: WorkoutId,
    coords: Coords,
    distance_km: f64,
    duration_min: f64,
    elevation_gain_m: f64,
    created_at: DateTime<Local>,
  ) -> Self {
    let kind = WorkoutKind::Cycling {
      elevation_gain_m,
      speed_km_per_h: distance_km / (duration_min / 60.0),
    };
    Self::build(id, coords, distance_km, duration_min, kind, created_at)
  }

  fn build(
    id: WorkoutId,
    coords: Coords,
    distance_km: f64,
    duration_min: f64,
    kind: WorkoutKind,
    created_at: DateTime<Local>,
  ) -> Self {
    Self {
      description: describe(kind.workout_type(), &created_at),
      id,
      created_at: created_at.with_timezone(&Utc),
      coords,
      distance_km,
      duration_min,
      click_count: 0,
      kind,
    }
  }

  pub fn id(&self) -> &WorkoutId {
    &self.id
  }

  pub fn created_at(&self) -> DateTime<Utc> {
    self.created_at
  }

  pub fn coords(&self) -> Coords {
    self.coords
  }

  pub fn distance_km(&self) -> f64 {
    self.distance_km
  }

  pub fn duration_min(&self) -> f64 {
    self.duration_min
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn click_count(&self) -> u32 {
    self.click_count
  }

  pub fn kind(&self) -> &WorkoutKind {
    &self.kind
  }

  pub fn workout_type(&self) -> WorkoutType {
    self.kind.workout_type()
  }

  pub fn icon(&self) -> &'static str {
    self.workout_type().icon()
  }

  /// Minutes per kilometre (running only)
  pub fn pace(&self) -> Option<f64> {
    match self.kind {
      WorkoutKind::Running { pace_min_per_km, .. } => Some(pace_min_per_km),
      WorkoutKind::Cycling { .. } => None,
    }
  }

  /// Kilometres per hour (cycling only)
  pub fn speed(&self) -> Option<f64> {
    match self.kind {
      WorkoutKind::Cycling { speed_km_per_h, .. } => Some(speed_km_per_h),
      WorkoutKind::Running { .. } => None,
    }
  }

  pub fn click(&mut self) {
    self.click_count = self.click_count.saturating_add(1);
  }
}

/// "Running on April 14"
pub fn describe<Tz: TimeZone>(workout_type: WorkoutType, at: &DateTime<Tz>) -> String {
  format!(
    "{} on {} {}",
    workout_type.display_name(),
    MONTHS[at.month0() as usize],
    at.day()
  )
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
