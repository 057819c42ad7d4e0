use thiserror::Error;

use crate::polyline::PolylineError;

/// Failures of the geocode -> directions pipeline and the other web-service
/// clients.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("start or destination is empty")]
    EmptyAddress,

    #[error("address not found: {address}")]
    AddressNotFound { address: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("service returned {status}: {message}")]
    Api { status: String, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("invalid polyline: {0}")]
    Polyline(#[from] PolylineError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RouteError>;
