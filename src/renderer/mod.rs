pub mod map_renderer;
pub use map_renderer::MapRenderer;

pub mod map_surface;
pub use map_surface::{CameraUpdate, MapSurface, Marker, MarkerRole, PolylineLayer, PolylineStyle};
