use anyhow::Result;
use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::autocomplete::{AddressField, HttpPlaceAutocomplete, PlaceAutocomplete, SuggestionList};
use crate::config::AppConfig;
use crate::coordinate::Coordinate;
use crate::directions::{DirectionsClient, RouteResult, RouteService};
use crate::error::RouteError;
use crate::events::{LocationSink, RouteStage, UiEvent};
use crate::geocoding::{Geocoder, GeocodingAdapter, HttpGeocoder};
use crate::http::HttpClient;
use crate::location_provider::{LocationProvider, PermissionStatus};
use crate::location_tracker::{LocationTracker, TrackerOptions};
use crate::place_store::{PlaceStore, SavedPlace};
use crate::renderer::{CameraUpdate, MapRenderer, MapSurface, MarkerRole};

/// Something the user should be told, usually as a toast or a dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserMessage {
    MissingAddress,
    AddressNotFound,
    GeocodingFailed(String),
    RouteFailed(String),
    NoRouteFound,
    /// Permission was never asked for; the host should show the system prompt
    /// and report back through `on_permission_result`.
    RequestLocationPermission,
    LocationPermissionRationale,
    LocationPermissionDenied,
    /// Location services are off; the host should offer to open settings.
    EnableLocationServices,
    LocationFeedFailed(String),
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserMessage::MissingAddress => write!(f, "Please enter start and destination"),
            UserMessage::AddressNotFound => write!(f, "Address not found"),
            UserMessage::GeocodingFailed(e) => write!(f, "Geocoding failed: {e}"),
            UserMessage::RouteFailed(e) => write!(f, "Route request failed: {e}"),
            UserMessage::NoRouteFound => write!(f, "No route found"),
            UserMessage::RequestLocationPermission => {
                write!(f, "Allow access to your location to show it on the map.")
            }
            UserMessage::LocationPermissionRationale => write!(
                f,
                "This app needs location to show your position on the map."
            ),
            UserMessage::LocationPermissionDenied => write!(f, "Location permission denied"),
            UserMessage::EnableLocationServices => write!(
                f,
                "Your location services are turned off. Please enable them in settings."
            ),
            UserMessage::LocationFeedFailed(e) => write!(f, "Location updates failed: {e}"),
        }
    }
}

impl UserMessage {
    fn from_route_error(stage: RouteStage, error: &RouteError) -> Self {
        match (stage, error) {
            (_, RouteError::EmptyAddress) => UserMessage::MissingAddress,
            (_, RouteError::AddressNotFound { .. }) => UserMessage::AddressNotFound,
            (RouteStage::Geocoding, e) => UserMessage::GeocodingFailed(e.to_string()),
            (RouteStage::Directions, e) => UserMessage::RouteFailed(e.to_string()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrackingState {
    Disabled,
    AwaitingPermission,
    ServicesDisabled,
    Active,
    Paused,
}

/// The web services the controller talks to from worker threads.
#[derive(Clone)]
pub struct Services {
    pub geocoder: Arc<dyn Geocoder>,
    pub route_service: Arc<dyn RouteService>,
    pub autocomplete: Arc<dyn PlaceAutocomplete>,
}

impl Services {
    /// HTTP-backed services sharing one client.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http = Arc::new(HttpClient::from_config(config)?);
        Ok(Services {
            geocoder: Arc::new(HttpGeocoder::new(config, http.clone())),
            route_service: Arc::new(DirectionsClient::new(config, http.clone())),
            autocomplete: Arc::new(HttpPlaceAutocomplete::new(config, http)),
        })
    }
}

/// Lives on the UI context. Workers get a clone of the event sender and
/// nothing else, so every overlay change happens in `process_events`.
pub struct AppController<S: MapSurface, L: LocationProvider> {
    config: AppConfig,
    renderer: MapRenderer<S>,
    tracker: LocationTracker,
    location_provider: L,
    geocoding: GeocodingAdapter,
    services: Services,
    tx: Sender<UiEvent>,
    rx: Receiver<UiEvent>,
    route_generation: u64,
    location_subscription: Option<u64>,
    next_subscription: u64,
    tracking_state: TrackingState,
    start_suggestions: SuggestionList,
    destination_suggestions: SuggestionList,
    messages: Vec<UserMessage>,
}

impl<S: MapSurface, L: LocationProvider> AppController<S, L> {
    pub fn new(config: AppConfig, surface: S, location_provider: L, services: Services) -> Self {
        let (tx, rx) = mpsc::channel();
        let geocoding =
            GeocodingAdapter::new(services.geocoder.clone(), config.geocode_max_results);
        let tracker = LocationTracker::new(TrackerOptions::from(&config));
        AppController {
            config,
            renderer: MapRenderer::new(surface),
            tracker,
            location_provider,
            geocoding,
            services,
            tx,
            rx,
            route_generation: 0,
            location_subscription: None,
            next_subscription: 0,
            tracking_state: TrackingState::Disabled,
            start_suggestions: SuggestionList::default(),
            destination_suggestions: SuggestionList::default(),
            messages: Vec::new(),
        }
    }

    fn notify(&mut self, message: UserMessage) {
        info!("[controller] user message: {}", message);
        self.messages.push(message);
    }

    /// Starts geocoding both addresses and fetching a route between them on
    /// a worker. Returns the request's generation, or `None` when the input
    /// was rejected.
    pub fn request_route(&mut self, start: &str, destination: &str) -> Option<u64> {
        let start = start.trim().to_string();
        let destination = destination.trim().to_string();
        if start.is_empty() || destination.is_empty() {
            self.notify(UserMessage::MissingAddress);
            return None;
        }

        self.route_generation += 1;
        let generation = self.route_generation;
        info!(
            "[controller] route request #{}: {:?} -> {:?}",
            generation, start, destination
        );

        let tx = self.tx.clone();
        let geocoding = self.geocoding.clone();
        let route_service = self.services.route_service.clone();
        let spawned = thread::Builder::new()
            .name(format!("route-request-{generation}"))
            .spawn(move || {
                run_route_request(
                    generation,
                    &start,
                    &destination,
                    &geocoding,
                    route_service.as_ref(),
                    &tx,
                )
            });
        if let Err(e) = spawned {
            error!("[controller] failed to spawn route worker: {}", e);
            self.notify(UserMessage::RouteFailed(e.to_string()));
            return None;
        }
        Some(generation)
    }

    fn is_current_route(&self, generation: u64) -> bool {
        if generation != self.route_generation {
            debug!(
                "[controller] dropping result of route request #{} (latest is #{})",
                generation, self.route_generation
            );
            return false;
        }
        true
    }

    fn on_route_endpoints(
        &mut self,
        generation: u64,
        start: Coordinate,
        destination: Coordinate,
    ) {
        if !self.is_current_route(generation) {
            return;
        }
        // the previous route no longer matches these endpoints
        self.renderer.replace_route(RouteResult::empty());
        self.renderer.set_marker(MarkerRole::Start, start);
        self.renderer.set_marker(MarkerRole::Destination, destination);
        self.renderer
            .animate_camera(CameraUpdate::new_lat_lng_zoom(start, self.config.route_zoom));
    }

    fn on_route_fetched(&mut self, generation: u64, route: RouteResult) {
        if !self.is_current_route(generation) {
            return;
        }
        let no_route = route.is_empty();
        self.renderer.replace_route(route);
        if no_route {
            self.notify(UserMessage::NoRouteFound);
        }
    }

    fn on_route_failed(&mut self, generation: u64, stage: RouteStage, error: RouteError) {
        if !self.is_current_route(generation) {
            return;
        }
        warn!(
            "[controller] route request #{} failed during {:?}: {}",
            generation, stage, error
        );
        self.notify(UserMessage::from_route_error(stage, &error));
    }

    pub fn clear_route(&mut self) {
        // anything still in flight is now stale
        self.route_generation += 1;
        self.renderer.clear_route();
    }

    /// Checks permission and location services, then starts tracking.
    pub fn enable_my_location(&mut self) {
        match self.location_provider.permission_status() {
            PermissionStatus::Granted => self.check_location_services(),
            PermissionStatus::NotRequested => {
                self.tracking_state = TrackingState::AwaitingPermission;
                self.notify(UserMessage::RequestLocationPermission);
            }
            PermissionStatus::NeedsRationale => {
                self.tracking_state = TrackingState::AwaitingPermission;
                self.notify(UserMessage::LocationPermissionRationale);
            }
            PermissionStatus::Denied => {
                self.stop_location_updates();
                self.tracking_state = TrackingState::Disabled;
                self.notify(UserMessage::LocationPermissionDenied);
            }
        }
    }

    /// The answer to a permission prompt.
    pub fn on_permission_result(&mut self, granted: bool) {
        if granted {
            self.check_location_services();
        } else {
            self.tracking_state = TrackingState::Disabled;
            self.notify(UserMessage::LocationPermissionDenied);
        }
    }

    fn check_location_services(&mut self) {
        if !self.location_provider.location_services_enabled() {
            self.tracking_state = TrackingState::ServicesDisabled;
            self.notify(UserMessage::EnableLocationServices);
            return;
        }
        if let Some(last) = self.location_provider.last_location() {
            self.tracker.show_last_location(&last, &mut self.renderer);
        }
        self.start_location_updates();
    }

    fn start_location_updates(&mut self) {
        self.stop_location_updates();

        self.next_subscription += 1;
        let subscription = self.next_subscription;
        let sink = LocationSink::new(subscription, self.tx.clone());
        match self
            .location_provider
            .request_location_updates(&self.config.location_request, sink)
        {
            Ok(()) => {
                info!("[controller] location subscription #{} started", subscription);
                self.location_subscription = Some(subscription);
                self.tracking_state = TrackingState::Active;
            }
            Err(e) => {
                error!("[controller] failed to start location updates: {:#}", e);
                self.tracking_state = TrackingState::Disabled;
                self.notify(UserMessage::LocationFeedFailed(e.to_string()));
            }
        }
    }

    pub fn stop_location_updates(&mut self) {
        if let Some(subscription) = self.location_subscription.take() {
            info!("[controller] location subscription #{} stopped", subscription);
            self.location_provider.remove_location_updates();
        }
    }

    fn is_current_subscription(&self, subscription: u64) -> bool {
        if self.location_subscription != Some(subscription) {
            debug!(
                "[controller] dropping location event from subscription #{}",
                subscription
            );
            return false;
        }
        true
    }

    /// The screen is no longer visible.
    pub fn on_pause(&mut self) {
        self.stop_location_updates();
        if self.tracking_state == TrackingState::Active {
            self.tracking_state = TrackingState::Paused;
        }
    }

    pub fn on_resume(&mut self) {
        self.enable_my_location();
    }

    fn suggestion_list(&mut self, field: AddressField) -> &mut SuggestionList {
        match field {
            AddressField::Start => &mut self.start_suggestions,
            AddressField::Destination => &mut self.destination_suggestions,
        }
    }

    /// Looks up suggestions for the new text on a worker.
    pub fn on_address_text_changed(&mut self, field: AddressField, text: &str) {
        let Some(query) = self.suggestion_list(field).on_text_changed(text) else {
            return;
        };
        let tx = self.tx.clone();
        let autocomplete = self.services.autocomplete.clone();
        let spawned = thread::Builder::new()
            .name(format!("autocomplete-{field}"))
            .spawn(move || {
                let result = autocomplete.find_autocomplete_predictions(&query);
                let _ = tx.send(UiEvent::Suggestions {
                    field,
                    query,
                    result,
                });
            });
        if let Err(e) = spawned {
            warn!("[controller] failed to spawn autocomplete worker: {}", e);
        }
    }

    pub fn suggestions(&self, field: AddressField) -> &[String] {
        match field {
            AddressField::Start => self.start_suggestions.suggestions(),
            AddressField::Destination => self.destination_suggestions.suggestions(),
        }
    }

    fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::LocationResult {
                subscription,
                fixes,
            } => {
                if self.is_current_subscription(subscription) {
                    self.tracker.on_location_result(&fixes, &mut self.renderer);
                }
            }
            UiEvent::LocationFeedError {
                subscription,
                message,
            } => {
                if self.is_current_subscription(subscription) {
                    warn!("[controller] location feed error: {}", message);
                    self.notify(UserMessage::LocationFeedFailed(message));
                }
            }
            UiEvent::EndpointsResolved {
                generation,
                start,
                destination,
            } => self.on_route_endpoints(generation, start, destination),
            UiEvent::RouteFetched { generation, route } => self.on_route_fetched(generation, route),
            UiEvent::RouteFailed {
                generation,
                stage,
                error,
            } => self.on_route_failed(generation, stage, error),
            UiEvent::Suggestions {
                field,
                query,
                result,
            } => {
                self.suggestion_list(field).apply(&query, result);
            }
        }
    }

    /// Applies everything queued so far. Call from the UI context.
    pub fn process_events(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(event);
            processed += 1;
        }
        processed
    }

    /// Like `process_events` but waits up to `timeout` for the first event.
    pub fn wait_and_process_events(&mut self, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_event(event);
                1 + self.process_events()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    pub fn drain_messages(&mut self) -> Vec<UserMessage> {
        std::mem::take(&mut self.messages)
    }

    pub fn save_current_position(&self, store: &PlaceStore, name: &str) -> Result<SavedPlace> {
        let Some(position) = self.tracker.current_position() else {
            bail!("no location fix yet");
        };
        let place = SavedPlace::new(name, position);
        store.save(&place)?;
        Ok(place)
    }

    pub fn set_follow_user(&mut self, follow_user: bool) {
        self.tracker.set_follow_user(follow_user);
    }

    pub fn renderer(&self) -> &MapRenderer<S> {
        &self.renderer
    }

    pub fn tracker(&self) -> &LocationTracker {
        &self.tracker
    }

    pub fn location_provider(&self) -> &L {
        &self.location_provider
    }

    pub fn location_provider_mut(&mut self) -> &mut L {
        &mut self.location_provider
    }

    pub fn tracking_state(&self) -> TrackingState {
        self.tracking_state
    }

    pub fn latest_route_generation(&self) -> u64 {
        self.route_generation
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl<S: MapSurface, L: LocationProvider> Drop for AppController<S, L> {
    fn drop(&mut self) {
        self.stop_location_updates();
    }
}

fn run_route_request(
    generation: u64,
    start: &str,
    destination: &str,
    geocoding: &GeocodingAdapter,
    route_service: &dyn RouteService,
    tx: &Sender<UiEvent>,
) {
    let failed = |stage, error| UiEvent::RouteFailed {
        generation,
        stage,
        error,
    };

    let endpoints = geocoding
        .geocode(start)
        .and_then(|s| geocoding.geocode(destination).map(|d| (s, d)));
    let (start, destination) = match endpoints {
        Ok(endpoints) => endpoints,
        Err(e) => {
            let _ = tx.send(failed(RouteStage::Geocoding, e));
            return;
        }
    };
    if tx
        .send(UiEvent::EndpointsResolved {
            generation,
            start,
            destination,
        })
        .is_err()
    {
        return;
    }

    let event = match route_service.route(start, destination) {
        Ok(route) => UiEvent::RouteFetched { generation, route },
        Err(e) => failed(RouteStage::Directions, e),
    };
    let _ = tx.send(event);
}
