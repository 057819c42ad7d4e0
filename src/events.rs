use std::sync::mpsc::Sender;

use crate::autocomplete::AddressField;
use crate::coordinate::{Coordinate, RawData};
use crate::directions::RouteResult;
use crate::error::RouteError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RouteStage {
    Geocoding,
    Directions,
}

/// Everything that background work hands back to the UI context.
#[derive(Debug)]
pub enum UiEvent {
    LocationResult {
        subscription: u64,
        fixes: Vec<RawData>,
    },
    LocationFeedError {
        subscription: u64,
        message: String,
    },
    EndpointsResolved {
        generation: u64,
        start: Coordinate,
        destination: Coordinate,
    },
    RouteFetched {
        generation: u64,
        route: RouteResult,
    },
    RouteFailed {
        generation: u64,
        stage: RouteStage,
        error: RouteError,
    },
    Suggestions {
        field: AddressField,
        query: String,
        result: Result<Vec<String>, RouteError>,
    },
}

/// Handed to a location provider when updates are requested. Batches posted
/// through it are tagged with the subscription they belong to, so the UI can
/// drop anything that arrives after the feed was stopped.
#[derive(Clone)]
pub struct LocationSink {
    subscription: u64,
    tx: Sender<UiEvent>,
}

impl LocationSink {
    pub fn new(subscription: u64, tx: Sender<UiEvent>) -> Self {
        LocationSink { subscription, tx }
    }

    pub fn subscription(&self) -> u64 {
        self.subscription
    }

    /// Returns `false` once the UI side has gone away.
    pub fn deliver(&self, fixes: Vec<RawData>) -> bool {
        self.tx
            .send(UiEvent::LocationResult {
                subscription: self.subscription,
                fixes,
            })
            .is_ok()
    }

    pub fn report_error(&self, message: impl Into<String>) -> bool {
        self.tx
            .send(UiEvent::LocationFeedError {
                subscription: self.subscription,
                message: message.into(),
            })
            .is_ok()
    }
}
