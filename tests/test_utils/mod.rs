#![allow(dead_code)]

use routemap_core::autocomplete::PlaceAutocomplete;
use routemap_core::controller::{AppController, Services, UserMessage};
use routemap_core::coordinate::{Coordinate, RawData};
use routemap_core::directions::{RouteResult, RouteService};
use routemap_core::error::{Result, RouteError};
use routemap_core::events::LocationSink;
use routemap_core::geocoding::Geocoder;
use routemap_core::location_provider::{LocationProvider, LocationRequest, PermissionStatus};
use routemap_core::renderer::{CameraUpdate, MapSurface, Marker, MarkerRole, PolylineLayer, PolylineStyle};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const GOLDEN_POLYLINE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

pub fn golden_points() -> Vec<Coordinate> {
    vec![
        Coordinate::new(38.5, -120.2),
        Coordinate::new(40.7, -120.95),
        Coordinate::new(43.252, -126.453),
    ]
}

pub fn fix(latitude: f64, longitude: f64, timestamp_ms: i64) -> RawData {
    RawData {
        latitude,
        longitude,
        timestamp_ms: Some(timestamp_ms),
        accuracy: Some(3.9),
        altitude: None,
        speed: None,
    }
}

/// A walk heading north-east from People's Square, one fix every 3 seconds
/// and roughly 15 meters apart.
pub fn walk(n: usize) -> Vec<RawData> {
    (0..n)
        .map(|i| {
            fix(
                31.2304 + i as f64 * 0.0001,
                121.4737 + i as f64 * 0.0001,
                1697349116000 + i as i64 * 3000,
            )
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    AddMarker(Marker),
    MoveMarker(Uuid, Coordinate),
    RemoveMarker(Uuid),
    SetPolyline(PolylineLayer, Vec<Coordinate>),
    RemovePolyline(PolylineLayer),
    AnimateCamera(CameraUpdate),
}

/// Behaves like a map widget and remembers every call it got.
#[derive(Default)]
pub struct RecordingSurface {
    pub calls: Vec<SurfaceCall>,
    pub live_markers: HashMap<Uuid, Marker>,
    pub polylines: HashMap<PolylineLayer, Vec<Coordinate>>,
}

impl RecordingSurface {
    pub fn live_markers_with_role(&self, role: MarkerRole) -> Vec<&Marker> {
        self.live_markers
            .values()
            .filter(|m| m.role == role)
            .collect()
    }

    pub fn camera_updates(&self) -> Vec<CameraUpdate> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::AnimateCamera(update) => Some(*update),
                _ => None,
            })
            .collect()
    }

    pub fn recenter_count(&self) -> usize {
        self.camera_updates()
            .iter()
            .filter(|u| u.zoom.is_some())
            .count()
    }
}

impl MapSurface for RecordingSurface {
    fn add_marker(&mut self, marker: &Marker) {
        self.live_markers.insert(marker.id, marker.clone());
        self.calls.push(SurfaceCall::AddMarker(marker.clone()));
    }

    fn move_marker(&mut self, id: Uuid, position: Coordinate) {
        let marker = self
            .live_markers
            .get_mut(&id)
            .expect("moving a marker that was never added");
        marker.position = position;
        self.calls.push(SurfaceCall::MoveMarker(id, position));
    }

    fn remove_marker(&mut self, id: Uuid) {
        assert!(
            self.live_markers.remove(&id).is_some(),
            "removing a marker that is not on the map"
        );
        self.calls.push(SurfaceCall::RemoveMarker(id));
    }

    fn set_polyline(&mut self, layer: PolylineLayer, points: &[Coordinate], _style: PolylineStyle) {
        self.polylines.insert(layer, points.to_vec());
        self.calls.push(SurfaceCall::SetPolyline(layer, points.to_vec()));
    }

    fn remove_polyline(&mut self, layer: PolylineLayer) {
        self.polylines.remove(&layer);
        self.calls.push(SurfaceCall::RemovePolyline(layer));
    }

    fn animate_camera(&mut self, update: &CameraUpdate) {
        self.calls.push(SurfaceCall::AnimateCamera(*update));
    }
}

/// Address book geocoder that counts lookups.
#[derive(Default)]
pub struct FakeGeocoder {
    pub addresses: HashMap<String, Vec<Coordinate>>,
    pub fail_with: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn with(mut self, address: &str, candidates: Vec<Coordinate>) -> Self {
        self.addresses.insert(address.to_string(), candidates);
        self
    }
}

impl Geocoder for FakeGeocoder {
    fn find_from_location_name(
        &self,
        address: &str,
        max_results: usize,
    ) -> Result<Vec<Coordinate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_with {
            return Err(RouteError::Other(message.clone()));
        }
        Ok(self
            .addresses
            .get(address)
            .map(|c| c.iter().take(max_results).copied().collect())
            .unwrap_or_default())
    }
}

/// Routes keyed by destination, each with an optional delay.
#[derive(Default)]
pub struct FakeRouteService {
    pub routes: Vec<(Coordinate, Duration, RouteResult)>,
    pub fail_with: Option<String>,
    /// Destinations that fail even when `fail_with` is unset.
    pub failing: Vec<Coordinate>,
    pub calls: AtomicUsize,
}

impl FakeRouteService {
    pub fn with(mut self, destination: Coordinate, delay: Duration, route: RouteResult) -> Self {
        self.routes.push((destination, delay, route));
        self
    }

    pub fn failing_for(mut self, destination: Coordinate) -> Self {
        self.failing.push(destination);
        self
    }
}

impl RouteService for FakeRouteService {
    fn route(&self, _origin: Coordinate, destination: Coordinate) -> Result<RouteResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_with {
            return Err(RouteError::Other(message.clone()));
        }
        if self.failing.contains(&destination) {
            return Err(RouteError::Other("connection reset".to_string()));
        }
        match self.routes.iter().find(|(d, _, _)| *d == destination) {
            Some((_, delay, route)) => {
                thread::sleep(*delay);
                Ok(route.clone())
            }
            None => Ok(RouteResult::empty()),
        }
    }
}

#[derive(Default)]
pub struct FakeAutocomplete {
    pub calls: AtomicUsize,
}

impl PlaceAutocomplete for FakeAutocomplete {
    fn find_autocomplete_predictions(&self, query: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![
            format!("{query} Station"),
            format!("{query} Road"),
        ])
    }
}

pub struct FakeServices {
    pub geocoder: Arc<FakeGeocoder>,
    pub route_service: Arc<FakeRouteService>,
    pub autocomplete: Arc<FakeAutocomplete>,
}

impl FakeServices {
    pub fn new(geocoder: FakeGeocoder, route_service: FakeRouteService) -> Self {
        FakeServices {
            geocoder: Arc::new(geocoder),
            route_service: Arc::new(route_service),
            autocomplete: Arc::new(FakeAutocomplete::default()),
        }
    }

    pub fn services(&self) -> Services {
        Services {
            geocoder: self.geocoder.clone(),
            route_service: self.route_service.clone(),
            autocomplete: self.autocomplete.clone(),
        }
    }

    pub fn network_calls(&self) -> usize {
        self.geocoder.calls.load(Ordering::SeqCst)
            + self.route_service.calls.load(Ordering::SeqCst)
    }
}

/// A location service the test drives by hand.
pub struct ManualLocationProvider {
    pub permission: PermissionStatus,
    pub services_enabled: bool,
    pub last_location: Option<RawData>,
    pub sink: Option<LocationSink>,
    pub requests: Vec<LocationRequest>,
    pub removals: usize,
}

impl Default for ManualLocationProvider {
    fn default() -> Self {
        ManualLocationProvider {
            permission: PermissionStatus::Granted,
            services_enabled: true,
            last_location: None,
            sink: None,
            requests: Vec::new(),
            removals: 0,
        }
    }
}

impl ManualLocationProvider {
    pub fn push(&self, fixes: Vec<RawData>) -> bool {
        match &self.sink {
            Some(sink) => sink.deliver(fixes),
            None => false,
        }
    }
}

impl LocationProvider for ManualLocationProvider {
    fn permission_status(&self) -> PermissionStatus {
        self.permission
    }

    fn location_services_enabled(&self) -> bool {
        self.services_enabled
    }

    fn last_location(&self) -> Option<RawData> {
        self.last_location.clone()
    }

    fn request_location_updates(
        &mut self,
        request: &LocationRequest,
        sink: LocationSink,
    ) -> anyhow::Result<()> {
        self.requests.push(request.clone());
        self.sink = Some(sink);
        Ok(())
    }

    fn remove_location_updates(&mut self) {
        self.removals += 1;
        self.sink = None;
    }
}

/// Processes events until `done` holds, failing after a few seconds.
pub fn wait_for<S, L, F>(controller: &mut AppController<S, L>, mut done: F)
where
    S: MapSurface,
    L: LocationProvider,
    F: FnMut(&AppController<S, L>) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(controller) {
        assert!(Instant::now() < deadline, "timed out waiting for events");
        controller.wait_and_process_events(Duration::from_millis(20));
    }
}

/// Processes events until the controller has something to tell the user.
pub fn wait_for_messages<S, L>(controller: &mut AppController<S, L>) -> Vec<UserMessage>
where
    S: MapSurface,
    L: LocationProvider,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let messages = controller.drain_messages();
        if !messages.is_empty() {
            return messages;
        }
        assert!(Instant::now() < deadline, "timed out waiting for a message");
        controller.wait_and_process_events(Duration::from_millis(20));
    }
}

/// Answers exactly one HTTP request with `status` and `body`. The handle
/// yields the request line that was received.
pub fn serve_once(status: &str, body: &str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let mut stream = stream;
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        request_line.trim_end().to_string()
    });
    (base_url, handle)
}
