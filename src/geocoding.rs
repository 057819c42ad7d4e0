use serde::Deserialize;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::coordinate::Coordinate;
use crate::directions::check_status;
use crate::error::{Result, RouteError};
use crate::http::{self, HttpClient};

/// Forward geocoding: free text to ranked coordinate candidates.
pub trait Geocoder: Send + Sync {
    fn find_from_location_name(&self, address: &str, max_results: usize)
        -> Result<Vec<Coordinate>>;
}

/// Resolves an address to a single coordinate by taking the provider's top
/// candidate.
#[derive(Clone)]
pub struct GeocodingAdapter {
    geocoder: Arc<dyn Geocoder>,
    max_results: usize,
}

impl GeocodingAdapter {
    pub fn new(geocoder: Arc<dyn Geocoder>, max_results: usize) -> Self {
        GeocodingAdapter {
            geocoder,
            max_results: max_results.max(1),
        }
    }

    pub fn geocode(&self, address: &str) -> Result<Coordinate> {
        let address = address.trim();
        if address.is_empty() {
            return Err(RouteError::EmptyAddress);
        }
        let candidates = self
            .geocoder
            .find_from_location_name(address, self.max_results)?;
        match candidates.first() {
            Some(c) => {
                debug!(
                    "[geocoding] {} candidates for {:?}, using {:?}",
                    candidates.len(),
                    address,
                    c
                );
                Ok(*c)
            }
            None => Err(RouteError::AddressNotFound {
                address: address.to_string(),
            }),
        }
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

pub fn parse_geocode_response(body: &str, max_results: usize) -> Result<Vec<Coordinate>> {
    let response: GeocodeResponse = serde_json::from_str(body)?;
    check_status(response.status.as_deref(), response.error_message.as_deref())?;
    Ok(response
        .results
        .iter()
        .take(max_results)
        .map(|r| Coordinate::new(r.geometry.location.lat, r.geometry.location.lng))
        .collect())
}

/// Geocoder backed by the maps web service.
pub struct HttpGeocoder {
    http: Arc<HttpClient>,
    base_url: String,
    api_key: String,
}

impl HttpGeocoder {
    pub fn new(config: &AppConfig, http: Arc<HttpClient>) -> Self {
        HttpGeocoder {
            http,
            base_url: config.maps_base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

impl Geocoder for HttpGeocoder {
    fn find_from_location_name(
        &self,
        address: &str,
        max_results: usize,
    ) -> Result<Vec<Coordinate>> {
        let url = http::build_url(
            &self.base_url,
            "geocode/json",
            &[("address", address), ("key", &self.api_key)],
        )?;
        let body = self.http.get_text(&url)?;
        parse_geocode_response(&body, max_results)
    }
}
