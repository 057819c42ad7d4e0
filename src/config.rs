use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::location_provider::LocationRequest;
use crate::polyline;

pub const API_KEY_ENV: &str = "ROUTEMAP_API_KEY";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_key: String,
    /// Prefix for the `directions/`, `geocode/` and `place/` endpoints.
    pub maps_base_url: String,
    pub request_timeout_ms: u64,
    /// Extra attempts after a timeout or connect failure.
    pub max_retries: u32,
    pub geocode_max_results: usize,
    pub polyline_precision: u32,
    pub location_request: LocationRequest,
    pub first_fix_zoom: f32,
    pub route_zoom: f32,
    pub follow_user: bool,
    pub record_path: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_key: String::new(),
            maps_base_url: "https://maps.googleapis.com/maps/api".to_string(),
            request_timeout_ms: 10_000,
            max_retries: 2,
            geocode_max_results: 1,
            polyline_precision: polyline::DEFAULT_PRECISION,
            location_request: LocationRequest::default(),
            first_fix_zoom: 16.0,
            route_zoom: 12.0,
            follow_user: true,
            record_path: true,
        }
    }
}

impl AppConfig {
    /// Reads a JSON config file. Missing fields keep their defaults and a
    /// non-empty `ROUTEMAP_API_KEY` overrides the key from the file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config = Self::from_json(&content)?;
        config.apply_env();
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                debug!("[config] api key taken from {}", API_KEY_ENV);
                self.api_key = key;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.maps_base_url.trim().is_empty() {
            bail!("`maps_base_url` must not be empty");
        }
        if self.geocode_max_results == 0 {
            bail!("`geocode_max_results` must be at least 1");
        }
        if self.polyline_precision > 10 {
            bail!(
                "`polyline_precision` too large: {}",
                self.polyline_precision
            );
        }
        self.location_request.validate()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
