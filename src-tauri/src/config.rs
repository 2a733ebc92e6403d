//! Runtime configuration from environment variables (and `.env`)

use std::env;
use std::time::Duration;
use url::Url;

/// ---------------------------------------------------------------------------
/// Defaults
/// ---------------------------------------------------------------------------

pub const DEFAULT_ZOOM: u8 = 13;
pub const MAX_ZOOM: u8 = 19;
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.fr/hot/{z}/{x}/{y}.png";
pub const DEFAULT_TILE_ATTRIBUTION: &str =
  r#"&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors"#;
pub const DEFAULT_GEOIP_URL: &str = "https://ipapi.co/json/";
pub const DEFAULT_GEOIP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
  #[error("Invalid value for {var}: {value:?} ({reason})")]
  Invalid {
    var: &'static str,
    value: String,
    reason: String,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  /// Zoom used when the map is created and when panning to a workout
  pub zoom: u8,
  pub tile_url: String,
  pub tile_attribution: String,
  pub geoip_url: String,
  pub geoip_timeout: Duration,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      zoom: DEFAULT_ZOOM,
      tile_url: DEFAULT_TILE_URL.to_string(),
      tile_attribution: DEFAULT_TILE_ATTRIBUTION.to_string(),
      geoip_url: DEFAULT_GEOIP_URL.to_string(),
      geoip_timeout: Duration::from_secs(DEFAULT_GEOIP_TIMEOUT_SECS),
    }
  }
}

impl AppConfig {
  /// Unset variables fall back to defaults; set-but-invalid ones are errors
  pub fn from_env() -> Result<Self, ConfigError> {
    let defaults = Self::default();

    let zoom = match env::var("WORKOUT_MAP_ZOOM") {
      Ok(raw) => parse_zoom(&raw)?,
      Err(_) => defaults.zoom,
    };

    let geoip_url = match env::var("WORKOUT_MAP_GEOIP_URL") {
      Ok(raw) => match Url::parse(raw.trim()) {
        Ok(url) => url.to_string(),
        Err(e) => {
          return Err(ConfigError::Invalid {
            var: "WORKOUT_MAP_GEOIP_URL",
            value: raw,
            reason: e.to_string(),
          })
        }
      },
      Err(_) => defaults.geoip_url,
    };

    let geoip_timeout = match env::var("WORKOUT_MAP_GEOIP_TIMEOUT_SECS") {
      Ok(raw) => raw
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::Invalid {
          var: "WORKOUT_MAP_GEOIP_TIMEOUT_SECS",
          value: raw.clone(),
          reason: "expected a positive number of seconds".to_string(),
        })?,
      Err(_) => defaults.geoip_timeout,
    };

    Ok(Self {
      zoom,
      tile_url: env::var("WORKOUT_MAP_TILE_URL").unwrap_or(defaults.tile_url),
      tile_attribution: env::var("WORKOUT_MAP_TILE_ATTRIBUTION").unwrap_or(defaults.tile_attribution),
      geoip_url,
      geoip_timeout,
    })
  }
}

fn parse_zoom(raw: &str) -> Result<u8, ConfigError> {
  match raw.trim().parse::<u8>() {
    Ok(zoom) if zoom <= MAX_ZOOM => Ok(zoom),
    _ => Err(ConfigError::Invalid {
      var: "WORKOUT_MAP_ZOOM",
      value: raw.to_string(),
      reason: format!("expected an integer between 0 and {}", MAX_ZOOM),
    }),
  }
}
