//! One-shot position lookup used to center the map at startup
//!
//! The webview normally resolves `navigator.geolocation` itself and reports
//! the outcome. When it can't, the IP lookup endpoint is asked instead.

use crate::models::Coords;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
  #[error("Position unavailable: {0}")]
  Unavailable(String),

  #[error("HTTP request failed: {0}")]
  Request(String),

  #[error("Invalid position: {lat}, {lng}")]
  InvalidPosition { lat: f64, lng: f64 },
}

impl From<reqwest::Error> for GeoError {
  fn from(e: reqwest::Error) -> Self {
    GeoError::Request(e.to_string())
  }
}

pub trait Geolocator: Send + Sync {
  fn locate(&self) -> impl Future<Output = Result<Coords, GeoError>> + Send;
}

fn checked(lat: f64, lng: f64) -> Result<Coords, GeoError> {
  let coords = Coords::new(lat, lng);
  if coords.is_valid() {
    Ok(coords)
  } else {
    Err(GeoError::InvalidPosition { lat, lng })
  }
}

/// ---------------------------------------------------------------------------
/// Webview Report
/// ---------------------------------------------------------------------------

/// Outcome of `navigator.geolocation.getCurrentPosition` in the webview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReportedPosition {
  Granted { latitude: f64, longitude: f64 },
  Denied { message: String },
}

impl Geolocator for ReportedPosition {
  async fn locate(&self) -> Result<Coords, GeoError> {
    match self {
      ReportedPosition::Granted { latitude, longitude } => checked(*latitude, *longitude),
      ReportedPosition::Denied { message } => Err(GeoError::Unavailable(message.clone())),
    }
  }
}

/// A locator that could not be built fails like a lookup would
impl<G: Geolocator> Geolocator for Result<G, GeoError> {
  async fn locate(&self) -> Result<Coords, GeoError> {
    match self {
      Ok(locator) => locator.locate().await,
      Err(e) => Err(e.clone()),
    }
  }
}

/// ---------------------------------------------------------------------------
/// IP Lookup
/// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
  latitude: Option<f64>,
  longitude: Option<f64>,
  #[serde(default)]
  reason: Option<String>,
}

/// Coarse position from the public IP; one GET, bounded by a timeout
#[derive(Debug, Clone)]
pub struct IpGeolocator {
  client: Client,
  endpoint: Url,
}

impl IpGeolocator {
  pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GeoError> {
    let endpoint = Url::parse(endpoint)
      .map_err(|e| GeoError::Request(format!("Invalid lookup endpoint {}: {}", endpoint, e)))?;
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, endpoint })
  }
}

impl Geolocator for IpGeolocator {
  async fn locate(&self) -> Result<Coords, GeoError> {
    let response = self.client.get(self.endpoint.clone()).send().await?;

    if !response.status().is_success() {
      let status = response.status();
      let error_text = response.text().await.unwrap_or_default();
      return Err(GeoError::Request(format!("Lookup failed ({}): {}", status, error_text)));
    }

    let body: IpLookupResponse = response.json().await?;
    match (body.latitude, body.longitude) {
      (Some(lat), Some(lng)) => checked(lat, lng),
      _ => Err(GeoError::Unavailable(
        body.reason.unwrap_or_else(|| "lookup returned no coordinates".to_string()),
      )),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
