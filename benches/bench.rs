use criterion::{criterion_group, criterion_main, Criterion};
use uuid::Uuid;

use routemap_core::coordinate::{Coordinate, RawData};
use routemap_core::location_tracker::{LocationTracker, TrackerOptions};
use routemap_core::polyline;
use routemap_core::renderer::{CameraUpdate, MapRenderer, MapSurface, Marker, PolylineLayer, PolylineStyle};

struct NullSurface;

impl MapSurface for NullSurface {
    fn add_marker(&mut self, _marker: &Marker) {}
    fn move_marker(&mut self, _id: Uuid, _position: Coordinate) {}
    fn remove_marker(&mut self, _id: Uuid) {}
    fn set_polyline(&mut self, _layer: PolylineLayer, _points: &[Coordinate], _style: PolylineStyle) {}
    fn remove_polyline(&mut self, _layer: PolylineLayer) {}
    fn animate_camera(&mut self, _update: &CameraUpdate) {}
}

// Shanghai to Hangzhou, one point every ~20m
fn long_route() -> Vec<Coordinate> {
    let n = 8000;
    (0..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            Coordinate::new(
                31.2304 + (30.2741 - 31.2304) * t + (t * 50.0).sin() * 0.001,
                121.4737 + (120.1551 - 121.4737) * t,
            )
        })
        .collect()
}

fn polyline_decode(c: &mut Criterion) {
    let encoded = polyline::encode(&long_route(), polyline::DEFAULT_PRECISION).unwrap();
    c.bench_function("polyline_decode", |b| {
        b.iter(|| {
            std::hint::black_box(
                polyline::decode(&encoded, polyline::DEFAULT_PRECISION).unwrap(),
            );
        });
    });
}

fn location_tracker(c: &mut Criterion) {
    let fixes: Vec<RawData> = long_route()
        .into_iter()
        .take(1000)
        .enumerate()
        .map(|(i, c)| RawData {
            latitude: c.latitude,
            longitude: c.longitude,
            timestamp_ms: Some(1697349116000 + i as i64 * 3000),
            accuracy: Some(3.9),
            altitude: None,
            speed: None,
        })
        .collect();
    c.bench_function("location_tracker", |b| {
        b.iter(|| {
            let mut map_renderer = MapRenderer::new(NullSurface);
            let mut tracker = LocationTracker::new(TrackerOptions::default());
            for batch in fixes.chunks(5) {
                tracker.on_location_result(batch, &mut map_renderer);
            }
            std::hint::black_box(map_renderer.get_current_version());
        });
    });
}

criterion_group!(benches, polyline_decode, location_tracker);
criterion_main!(benches);
