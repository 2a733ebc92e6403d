//! Workout entry form
//!
//! Raw field strings come in with the submit event. They are coerced the way
//! a numeric text input would be (blank is zero, garbage is NaN) and then
//! validated before any workout gets built.

use crate::models::WorkoutType;
use crate::view::FormView;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const INVALID_INPUT_MESSAGE: &str = "Inputs have to be positive numbers!";

/// Delay before the hidden form gets its layout display back
pub const FORM_HIDE_TRANSITION: Duration = Duration::from_millis(1000);

/// ---------------------------------------------------------------------------
/// Input
/// ---------------------------------------------------------------------------

/// Field values as typed, plus the active selector value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
  #[serde(rename = "type")]
  pub workout_type: WorkoutType,
  #[serde(default)]
  pub distance: String,
  #[serde(default)]
  pub duration: String,
  #[serde(default)]
  pub cadence: String,
  #[serde(default)]
  pub elevation: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidatedInput {
  Running {
    distance_km: f64,
    duration_min: f64,
    cadence_spm: f64,
  },
  Cycling {
    distance_km: f64,
    duration_min: f64,
    elevation_gain_m: f64,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Distance,
  Duration,
  Cadence,
  Elevation,
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Field::Distance => "distance",
      Field::Duration => "duration",
      Field::Cadence => "cadence",
      Field::Elevation => "elevation",
    };
    f.write_str(name)
  }
}

/// The user always sees the same message; the variant says what failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
  #[error("Inputs have to be positive numbers!")]
  NotFinite(Field),

  #[error("Inputs have to be positive numbers!")]
  NotPositive(Field),

  /// Inputs pass on their own but the derived pace or speed overflows
  #[error("Inputs have to be positive numbers!")]
  MetricNotFinite(Field),
}

impl FormError {
  pub fn field(&self) -> Field {
    match *self {
      FormError::NotFinite(field)
      | FormError::NotPositive(field)
      | FormError::MetricNotFinite(field) => field,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Validation
/// ---------------------------------------------------------------------------

pub fn parse_field(raw: &str) -> f64 {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return 0.0;
  }
  trimmed.parse().unwrap_or(f64::NAN)
}

/// Every value must be finite. Distance, duration and cadence must also be
/// strictly positive; elevation gain may be negative. The derived pace or
/// speed has to be finite too, or the stored record could not be read back.
pub fn validate(submission: &FormSubmission) -> Result<ValidatedInput, FormError> {
  let distance = parse_field(&submission.distance);
  let duration = parse_field(&submission.duration);

  match submission.workout_type {
    WorkoutType::Running => {
      let cadence = parse_field(&submission.cadence);
      let values = [
        (Field::Distance, distance),
        (Field::Duration, duration),
        (Field::Cadence, cadence),
      ];
      all_finite(&values)?;
      all_positive(&values)?;
      if !(duration / distance).is_finite() {
        return Err(FormError::MetricNotFinite(Field::Distance));
      }
      Ok(ValidatedInput::Running {
        distance_km: distance,
        duration_min: duration,
        cadence_spm: cadence,
      })
    }
    WorkoutType::Cycling => {
      let elevation = parse_field(&submission.elevation);
      all_finite(&[
        (Field::Distance, distance),
        (Field::Duration, duration),
        (Field::Elevation, elevation),
      ])?;
      all_positive(&[(Field::Distance, distance), (Field::Duration, duration)])?;
      if !(distance / (duration / 60.0)).is_finite() {
        return Err(FormError::MetricNotFinite(Field::Duration));
      }
      Ok(ValidatedInput::Cycling {
        distance_km: distance,
        duration_min: duration,
        elevation_gain_m: elevation,
      })
    }
  }
}

fn all_finite(values: &[(Field, f64)]) -> Result<(), FormError> {
  match values.iter().find(|(_, v)| !v.is_finite()) {
    Some((field, _)) => Err(FormError::NotFinite(*field)),
    None => Ok(()),
  }
}

fn all_positive(values: &[(Field, f64)]) -> Result<(), FormError> {
  match values.iter().find(|(_, v)| *v <= 0.0) {
    Some((field, _)) => Err(FormError::NotPositive(*field)),
    None => Ok(()),
  }
}

/// ---------------------------------------------------------------------------
/// Form State
/// ---------------------------------------------------------------------------

/// Tracks which metric row is visible
#[derive(Debug, Default)]
pub struct WorkoutForm {
  active: WorkoutType,
}

impl WorkoutForm {
  pub fn active_type(&self) -> WorkoutType {
    self.active
  }

  pub fn select_type<V: FormView>(&mut self, workout_type: WorkoutType, view: &mut V) {
    if workout_type != self.active {
      self.toggle_fields(view);
    }
  }

  /// Swap cadence and elevation rows. Presentation only.
  pub fn toggle_fields<V: FormView>(&mut self, view: &mut V) {
    self.active = self.active.other();
    view.set_visible_metric(self.active);
  }

  pub fn open<V: FormView>(&self, view: &mut V) {
    view.show_form();
    view.focus_distance();
  }

  pub fn reset<V: FormView>(&self, view: &mut V) {
    view.clear_fields();
    view.hide_form(FORM_HIDE_TRANSITION);
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::RecordingSink;
  use crate::view::{EventView, ViewEvent};

  fn running(distance: &str, duration: &str, cadence: &str) -> FormSubmission {
    FormSubmission {
      workout_type: WorkoutType::Running,
      distance: distance.into(),
      duration: duration.into(),
      cadence: cadence.into(),
      elevation: String::new(),
    }
  }

  fn cycling(distance: &str, duration: &str, elevation: &str) -> FormSubmission {
    FormSubmission {
      workout_type: WorkoutType::Cycling,
      distance: distance.into(),
      duration: duration.into(),
      cadence: String::new(),
      elevation: elevation.into(),
    }
  }

  #[test]
  fn test_parse_field_coercion() {
    assert_eq!(parse_field(""), 0.0);
    assert_eq!(parse_field("   "), 0.0);
    assert_eq!(parse_field(" 5.5 "), 5.5);
    assert_eq!(parse_field("-30"), -30.0);
    assert!(parse_field("five").is_nan());
    assert!(parse_field("Infinity").is_infinite());
  }

  #[test]
  fn test_valid_running_input() {
    let input = validate(&running("5", "25", "180")).unwrap();
    assert_eq!(
      input,
      ValidatedInput::Running { distance_km: 5.0, duration_min: 25.0, cadence_spm: 180.0 }
    );
  }

  #[test]
  fn test_rejects_zero_and_negative_distance() {
    assert_eq!(
      validate(&running("0", "25", "180")),
      Err(FormError::NotPositive(Field::Distance))
    );
    assert_eq!(
      validate(&running("-5", "25", "180")),
      Err(FormError::NotPositive(Field::Distance))
    );
  }

  #[test]
  fn test_rejects_non_finite_values() {
    assert_eq!(
      validate(&running("5", "NaN", "180")),
      Err(FormError::NotFinite(Field::Duration))
    );
    assert_eq!(
      validate(&running("5", "25", "Infinity")),
      Err(FormError::NotFinite(Field::Cadence))
    );
    assert_eq!(
      validate(&cycling("5", "abc", "10")),
      Err(FormError::NotFinite(Field::Duration))
    );
  }

  #[test]
  fn test_cycling_rejects_non_finite_elevation() {
    assert_eq!(
      validate(&cycling("20", "60", "abc")),
      Err(FormError::NotFinite(Field::Elevation))
    );
    assert_eq!(
      validate(&cycling("20", "60", "Infinity")),
      Err(FormError::NotFinite(Field::Elevation))
    );
  }

  #[test]
  fn test_rejects_overflowing_speed() {
    let err = validate(&cycling("1e308", "0.5", "10")).unwrap_err();
    assert_eq!(err, FormError::MetricNotFinite(Field::Duration));
    assert_eq!(err.to_string(), INVALID_INPUT_MESSAGE);
  }

  #[test]
  fn test_rejects_overflowing_pace() {
    assert_eq!(
      validate(&running("1e-320", "25", "180")),
      Err(FormError::MetricNotFinite(Field::Distance))
    );
  }

  #[test]
  fn test_running_cadence_must_be_positive() {
    assert_eq!(
      validate(&running("5", "25", "")),
      Err(FormError::NotPositive(Field::Cadence))
    );
  }

  #[test]
  fn test_cycling_accepts_negative_elevation() {
    let input = validate(&cycling("20", "60", "-30")).unwrap();
    assert_eq!(
      input,
      ValidatedInput::Cycling { distance_km: 20.0, duration_min: 60.0, elevation_gain_m: -30.0 }
    );
  }

  #[test]
  fn test_cycling_ignores_cadence_field() {
    let mut submission = cycling("20", "60", "0");
    submission.cadence = "garbage".into();
    assert!(validate(&submission).is_ok());
  }

  #[test]
  fn test_error_message_is_fixed() {
    let err = validate(&running("0", "25", "180")).unwrap_err();
    assert_eq!(err.to_string(), INVALID_INPUT_MESSAGE);
    assert_eq!(err.field(), Field::Distance);
  }

  #[test]
  fn test_submission_wire_format() {
    let submission: FormSubmission = serde_json::from_str(
      r#"{"type":"cycling","distance":"12","duration":"40","elevation":"-8"}"#,
    )
    .unwrap();
    assert_eq!(submission.workout_type, WorkoutType::Cycling);
    assert_eq!(submission.cadence, "");
  }

  #[test]
  fn test_select_type_toggles_only_on_change() {
    let sink = RecordingSink::default();
    let mut view = EventView::new(sink.clone());
    let mut form = WorkoutForm::default();

    form.select_type(WorkoutType::Running, &mut view);
    assert!(sink.events().is_empty());

    form.select_type(WorkoutType::Cycling, &mut view);
    assert_eq!(form.active_type(), WorkoutType::Cycling);
    assert_eq!(
      sink.events(),
      vec![ViewEvent::SetVisibleMetric { workout_type: WorkoutType::Cycling }]
    );
  }

  #[test]
  fn test_reset_clears_then_hides_with_transition() {
    let sink = RecordingSink::default();
    let mut view = EventView::new(sink.clone());

    WorkoutForm::default().reset(&mut view);
    assert_eq!(
      sink.events(),
      vec![ViewEvent::ClearFields, ViewEvent::HideForm { restore_display_after_ms: 1000 }]
    );
  }
}
