use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::coordinate::RawData;
use crate::events::LocationSink;
use crate::gps_processor::GpsProcessor;

/// How often and how far apart the feed should deliver fixes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationRequest {
    /// Desired interval between updates.
    pub interval_ms: u64,
    /// Fixes closer in time than this to the previous delivered one are
    /// dropped.
    pub min_update_interval_ms: u64,
    /// Fixes closer in space than this to the previous delivered one are
    /// dropped.
    pub min_distance_m: f64,
    pub max_accuracy_m: Option<f32>,
}

impl Default for LocationRequest {
    fn default() -> Self {
        LocationRequest {
            interval_ms: 5_000,
            min_update_interval_ms: 2_000,
            min_distance_m: 5.0,
            max_accuracy_m: None,
        }
    }
}

impl LocationRequest {
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            bail!("location `interval_ms` must be positive");
        }
        if self.min_update_interval_ms > self.interval_ms {
            bail!(
                "location `min_update_interval_ms` ({}) exceeds `interval_ms` ({})",
                self.min_update_interval_ms,
                self.interval_ms
            );
        }
        if self.min_distance_m.is_nan() || self.min_distance_m < 0.0 {
            bail!("location `min_distance_m` must be non-negative");
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PermissionStatus {
    /// The user has not been asked yet.
    NotRequested,
    Granted,
    /// The platform wants the app to explain itself before asking again.
    NeedsRationale,
    Denied,
}

/// The platform location service.
pub trait LocationProvider {
    fn permission_status(&self) -> PermissionStatus;

    /// Whether any OS-level location source (GPS or network) is on.
    fn location_services_enabled(&self) -> bool;

    fn last_location(&self) -> Option<RawData>;

    /// Starts periodic updates. Batches are posted to `sink` from whatever
    /// context the platform uses until `remove_location_updates` is called.
    fn request_location_updates(
        &mut self,
        request: &LocationRequest,
        sink: LocationSink,
    ) -> Result<()>;

    fn remove_location_updates(&mut self);
}

struct ReplayWorker {
    stop: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

/// Plays a recorded list of fixes through the same filter a platform feed
/// applies, on its own thread.
pub struct ReplayLocationProvider {
    fixes: Arc<Vec<RawData>>,
    permission: PermissionStatus,
    services_enabled: bool,
    last_location: Option<RawData>,
    batch_size: usize,
    pace: Duration,
    worker: Option<ReplayWorker>,
}

impl ReplayLocationProvider {
    pub fn new(fixes: Vec<RawData>) -> Self {
        ReplayLocationProvider {
            fixes: Arc::new(fixes),
            permission: PermissionStatus::Granted,
            services_enabled: true,
            last_location: None,
            batch_size: 1,
            pace: Duration::ZERO,
            worker: None,
        }
    }

    pub fn with_permission(mut self, permission: PermissionStatus) -> Self {
        self.permission = permission;
        self
    }

    pub fn with_services_enabled(mut self, enabled: bool) -> Self {
        self.services_enabled = enabled;
        self
    }

    pub fn with_last_location(mut self, last_location: Option<RawData>) -> Self {
        self.last_location = last_location;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Delay between batches, zero means as fast as possible.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    pub fn set_permission(&mut self, permission: PermissionStatus) {
        self.permission = permission;
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map(|w| !w.handle.is_finished())
            .unwrap_or(false)
    }

    fn replay(
        fixes: &[RawData],
        request: LocationRequest,
        batch_size: usize,
        pace: Duration,
        stop: &AtomicBool,
        sink: &LocationSink,
    ) {
        let mut gps_processor = GpsProcessor::new(request);
        let mut batch = Vec::with_capacity(batch_size);
        let mut skipped = 0;
        for fix in fixes {
            if stop.load(Ordering::Acquire) {
                return;
            }
            if !gps_processor.preprocess(fix).is_accepted() {
                skipped += 1;
                continue;
            }
            batch.push(fix.clone());
            if batch.len() >= batch_size {
                if !sink.deliver(std::mem::take(&mut batch)) {
                    return;
                }
                if !pace.is_zero() {
                    thread::sleep(pace);
                }
            }
        }
        if !batch.is_empty() && !stop.load(Ordering::Acquire) {
            sink.deliver(batch);
        }
        debug!(
            "[replay] subscription {} finished, {} fixes filtered out",
            sink.subscription(),
            skipped
        );
    }
}

impl LocationProvider for ReplayLocationProvider {
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
    ) -> Result<()> {
        self.remove_location_updates();
        if self.permission != PermissionStatus::Granted {
            bail!("location permission not granted");
        }
        request.validate()?;

        let stop = Arc::new(AtomicBool::new(false));
        let fixes = self.fixes.clone();
        let request = request.clone();
        let batch_size = self.batch_size;
        let pace = self.pace;
        let worker_stop = stop.clone();
        let handle = thread::Builder::new()
            .name("location-replay".to_string())
            .spawn(move || {
                Self::replay(&fixes, request, batch_size, pace, &worker_stop, &sink)
            })?;
        self.worker = Some(ReplayWorker { stop, handle });
        Ok(())
    }

    fn remove_location_updates(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Release);
            if worker.handle.join().is_err() {
                error!("[replay] worker panicked");
            }
        }
    }
}

impl Drop for ReplayLocationProvider {
    fn drop(&mut self) {
        self.remove_location_updates();
    }
}
