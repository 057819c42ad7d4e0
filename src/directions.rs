use serde::Deserialize;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::coordinate::Coordinate;
use crate::error::{Result, RouteError};
use crate::http::{self, HttpClient};
use crate::polyline;

/// The decoded overview path of a route. Empty means "no route".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteResult {
    points: Vec<Coordinate>,
}

impl RouteResult {
    pub fn new(points: Vec<Coordinate>) -> Self {
        RouteResult { points }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub trait RouteService: Send + Sync {
    fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<RouteResult>;
}

#[derive(Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Deserialize)]
struct Route {
    overview_polyline: OverviewPolyline,
}

#[derive(Deserialize)]
struct OverviewPolyline {
    points: String,
}

/// Anything other than these is a service-side failure.
pub(crate) fn check_status(status: Option<&str>, error_message: Option<&str>) -> Result<()> {
    match status {
        None | Some("OK") | Some("ZERO_RESULTS") => Ok(()),
        Some(status) => Err(RouteError::Api {
            status: status.to_string(),
            message: error_message.unwrap_or_default().to_string(),
        }),
    }
}

/// Takes the first route's overview polyline. A response without routes
/// decodes to an empty result.
pub fn parse_directions_response(body: &str, precision: u32) -> Result<RouteResult> {
    let response: DirectionsResponse = serde_json::from_str(body)?;
    check_status(response.status.as_deref(), response.error_message.as_deref())?;
    match response.routes.first() {
        None => Ok(RouteResult::empty()),
        Some(route) => Ok(RouteResult::new(polyline::decode(
            &route.overview_polyline.points,
            precision,
        )?)),
    }
}

pub struct DirectionsClient {
    http: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    precision: u32,
}

impl DirectionsClient {
    pub fn new(config: &AppConfig, http: Arc<HttpClient>) -> Self {
        DirectionsClient {
            http,
            base_url: config.maps_base_url.clone(),
            api_key: config.api_key.clone(),
            precision: config.polyline_precision,
        }
    }

    pub fn request_url(&self, origin: Coordinate, destination: Coordinate) -> Result<reqwest::Url> {
        http::build_url(
            &self.base_url,
            "directions/json",
            &[
                ("origin", &origin.to_query_value()),
                ("destination", &destination.to_query_value()),
                ("key", &self.api_key),
            ],
        )
    }
}

impl RouteService for DirectionsClient {
    fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<RouteResult> {
        let url = self.request_url(origin, destination)?;
        debug!("[directions] requesting {}", http::redact(&url));
        let body = self.http.get_text(&url)?;
        let route = parse_directions_response(&body, self.precision)?;
        info!("[directions] route with {} points", route.len());
        Ok(route)
    }
}
