use strum_macros::{Display, EnumIter};
use uuid::Uuid;

use crate::coordinate::Coordinate;

/// The fixed purpose of a marker. There is at most one marker per role.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum MarkerRole {
    #[strum(serialize = "You")]
    User,
    Start,
    Destination,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub id: Uuid,
    pub role: MarkerRole,
    pub position: Coordinate,
    pub title: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum PolylineLayer {
    Route,
    TrackedPath,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PolylineStyle {
    /// ARGB
    pub color: u32,
    pub width: f32,
}

const BLUE: u32 = 0xFF0000FF;

impl PolylineLayer {
    pub fn style(&self) -> PolylineStyle {
        match self {
            PolylineLayer::Route => PolylineStyle {
                color: BLUE,
                width: 12.0,
            },
            PolylineLayer::TrackedPath => PolylineStyle {
                color: BLUE,
                width: 10.0,
            },
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraUpdate {
    pub target: Coordinate,
    /// `None` keeps the current zoom.
    pub zoom: Option<f32>,
}

impl CameraUpdate {
    pub fn new_lat_lng(target: Coordinate) -> Self {
        CameraUpdate { target, zoom: None }
    }

    pub fn new_lat_lng_zoom(target: Coordinate, zoom: f32) -> Self {
        CameraUpdate {
            target,
            zoom: Some(zoom),
        }
    }
}

/// The platform map widget. Implementations are only ever called from the
/// UI context.
pub trait MapSurface {
    fn add_marker(&mut self, marker: &Marker);
    fn move_marker(&mut self, id: Uuid, position: Coordinate);
    fn remove_marker(&mut self, id: Uuid);
    /// Replaces whatever the layer showed before.
    fn set_polyline(&mut self, layer: PolylineLayer, points: &[Coordinate], style: PolylineStyle);
    fn remove_polyline(&mut self, layer: PolylineLayer);
    fn animate_camera(&mut self, update: &CameraUpdate);
}
