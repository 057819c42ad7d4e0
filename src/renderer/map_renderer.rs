use std::collections::HashMap;
use uuid::Uuid;

use super::map_surface::{CameraUpdate, MapSurface, Marker, MarkerRole, PolylineLayer};
use crate::coordinate::Coordinate;
use crate::directions::RouteResult;

/// Owns the overlay state shown on top of the map and keeps the surface in
/// sync with it. One marker per role, one polyline per layer.
pub struct MapRenderer<S: MapSurface> {
    surface: S,
    markers: HashMap<MarkerRole, Marker>,
    polylines: HashMap<PolylineLayer, Vec<Coordinate>>,
    camera: Option<CameraUpdate>,
    version: u64,
}

impl<S: MapSurface> MapRenderer<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            markers: HashMap::new(),
            polylines: HashMap::new(),
            camera: None,
            version: 0,
        }
    }

    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Puts the marker for `role` at `position`, removing the previous one
    /// first.
    pub fn set_marker(&mut self, role: MarkerRole, position: Coordinate) {
        self.remove_marker(role);
        let marker = Marker {
            id: Uuid::new_v4(),
            role,
            position,
            title: role.to_string(),
        };
        self.surface.add_marker(&marker);
        self.markers.insert(role, marker);
        self.bump();
    }

    /// Moves the user marker, creating it on first use.
    pub fn place_user_marker(&mut self, position: Coordinate) {
        match self.markers.get_mut(&MarkerRole::User) {
            Some(marker) => {
                marker.position = position;
                self.surface.move_marker(marker.id, position);
                self.bump();
            }
            None => self.set_marker(MarkerRole::User, position),
        }
    }

    pub fn remove_marker(&mut self, role: MarkerRole) -> bool {
        match self.markers.remove(&role) {
            Some(marker) => {
                self.surface.remove_marker(marker.id);
                self.bump();
                true
            }
            None => false,
        }
    }

    fn set_polyline(&mut self, layer: PolylineLayer, points: Vec<Coordinate>) {
        self.surface.set_polyline(layer, &points, layer.style());
        self.polylines.insert(layer, points);
        self.bump();
    }

    fn remove_polyline(&mut self, layer: PolylineLayer) {
        if self.polylines.remove(&layer).is_some() {
            self.surface.remove_polyline(layer);
            self.bump();
        }
    }

    /// Swaps the route polyline for `route`. An empty route leaves no
    /// polyline behind.
    pub fn replace_route(&mut self, route: RouteResult) {
        self.remove_polyline(PolylineLayer::Route);
        if !route.is_empty() {
            self.set_polyline(PolylineLayer::Route, route.into_points());
        }
    }

    pub fn clear_route(&mut self) {
        self.remove_polyline(PolylineLayer::Route);
        self.remove_marker(MarkerRole::Start);
        self.remove_marker(MarkerRole::Destination);
    }

    pub fn set_tracked_path(&mut self, points: &[Coordinate]) {
        if points.is_empty() {
            self.remove_polyline(PolylineLayer::TrackedPath);
        } else {
            self.set_polyline(PolylineLayer::TrackedPath, points.to_vec());
        }
    }

    pub fn animate_camera(&mut self, update: CameraUpdate) {
        self.surface.animate_camera(&update);
        self.camera = Some(update);
        self.bump();
    }

    pub fn marker(&self, role: MarkerRole) -> Option<&Marker> {
        self.markers.get(&role)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn polyline(&self, layer: PolylineLayer) -> Option<&[Coordinate]> {
        self.polylines.get(&layer).map(|p| p.as_slice())
    }

    pub fn camera(&self) -> Option<&CameraUpdate> {
        self.camera.as_ref()
    }

    pub fn get_current_version(&self) -> u64 {
        self.version
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
