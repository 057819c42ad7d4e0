use crate::config::AppConfig;
use crate::coordinate::{Coordinate, RawData};
use crate::renderer::{CameraUpdate, MapRenderer, MapSurface};

/// The user's travelled route for this session. Append-only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackedPath {
    points: Vec<Coordinate>,
}

impl TrackedPath {
    pub fn push(&mut self, c: Coordinate) {
        self.points.push(c);
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn last(&self) -> Option<&Coordinate> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackerOptions {
    pub first_fix_zoom: f32,
    /// Pan the camera to every update after the first.
    pub follow_user: bool,
    /// Keep a `TrackedPath` and draw it.
    pub record_path: bool,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        TrackerOptions {
            first_fix_zoom: 16.0,
            follow_user: true,
            record_path: true,
        }
    }
}

impl From<&AppConfig> for TrackerOptions {
    fn from(config: &AppConfig) -> Self {
        TrackerOptions {
            first_fix_zoom: config.first_fix_zoom,
            follow_user: config.follow_user,
            record_path: config.record_path,
        }
    }
}

/// Turns location fixes into user-marker, camera and path updates. Every fix
/// it is given gets applied, in order.
pub struct LocationTracker {
    options: TrackerOptions,
    path: TrackedPath,
    current_position: Option<Coordinate>,
    camera_moved_once: bool,
    updates_applied: u64,
}

impl LocationTracker {
    pub fn new(options: TrackerOptions) -> Self {
        LocationTracker {
            options,
            path: TrackedPath::default(),
            current_position: None,
            camera_moved_once: false,
            updates_applied: 0,
        }
    }

    pub fn on_location_result<S: MapSurface>(
        &mut self,
        fixes: &[RawData],
        renderer: &mut MapRenderer<S>,
    ) {
        for fix in fixes {
            self.on_location_update(fix, renderer);
        }
    }

    pub fn on_location_update<S: MapSurface>(
        &mut self,
        fix: &RawData,
        renderer: &mut MapRenderer<S>,
    ) {
        let position = fix.coordinate();
        renderer.place_user_marker(position);
        self.current_position = Some(position);
        self.updates_applied += 1;

        if !self.recenter_once(position, renderer) && self.options.follow_user {
            renderer.animate_camera(CameraUpdate::new_lat_lng(position));
        }

        if self.options.record_path {
            self.path.push(position);
            renderer.set_tracked_path(self.path.points());
        }
    }

    /// Shows the platform's cached fix. It is not part of the feed, so it
    /// never lands on the tracked path and doesn't count as an update.
    pub fn show_last_location<S: MapSurface>(
        &mut self,
        fix: &RawData,
        renderer: &mut MapRenderer<S>,
    ) {
        let position = fix.coordinate();
        renderer.place_user_marker(position);
        self.current_position = Some(position);
        self.recenter_once(position, renderer);
    }

    // Returns whether this call did the recenter.
    fn recenter_once<S: MapSurface>(
        &mut self,
        position: Coordinate,
        renderer: &mut MapRenderer<S>,
    ) -> bool {
        if self.camera_moved_once {
            return false;
        }
        debug!("[tracker] first fix, recentering on {:?}", position);
        renderer.animate_camera(CameraUpdate::new_lat_lng_zoom(
            position,
            self.options.first_fix_zoom,
        ));
        self.camera_moved_once = true;
        true
    }

    pub fn set_follow_user(&mut self, follow_user: bool) {
        self.options.follow_user = follow_user;
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    pub fn current_position(&self) -> Option<Coordinate> {
        self.current_position
    }

    pub fn path(&self) -> &TrackedPath {
        &self.path
    }

    pub fn has_recentered(&self) -> bool {
        self.camera_moved_once
    }

    pub fn updates_applied(&self) -> u64 {
        self.updates_applied
    }
}
