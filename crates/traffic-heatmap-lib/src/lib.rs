//! Traffic Heatmap Library - Core logic for the live traffic heatmap
//!
//! This library keeps the map view, the city search and the periodically fetched
//! congestion samples consistent with each other, and turns those samples into
//! weighted heat points. It does not depend on any UI toolkit: the application
//! crate polls the [`ViewController`] once per frame and renders what it exposes.
//!
//! # Architecture
//!
//! - **[`Coordinates`]**: Validated WGS84 latitude/longitude pair
//! - **[`TrafficSample`]**: One congestion reading as returned by the backend
//! - **[`heat`]**: Pure transform from samples to [`HeatPoint`]s
//! - **[`Geocoder`] / [`TrafficSource`]**: Async seams over the two HTTP services
//! - **[`RefreshTask`]**: Cancellable repeating timer
//! - **[`ViewController`]**: Owns all view state and every network operation
//!
//! # Concurrency
//!
//! Network calls run as spawned tokio tasks. They never touch controller state
//! directly; results are queued on a channel and applied in order by
//! [`ViewController::process_events`] on the thread that owns the controller.

mod config;
mod controller;
mod coords;
mod geocode;
pub mod heat;
mod refresh;
mod runtime;
mod sample;
mod traffic;

// Public API exports
pub use config::Config;
pub use controller::{HttpViewController, Notice, SearchState, ViewController};
pub use coords::Coordinates;
pub use geocode::{GeocodeCandidate, Geocoder, NominatimClient};
pub use heat::HeatPoint;
pub use refresh::RefreshTask;
pub use sample::{SampleSummary, TrafficLevel, TrafficSample, parse_samples};
pub use traffic::{HttpTrafficClient, TrafficSource};

/// Error types for the clients and the controller
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Invalid coordinates ({lat}, {lon})")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("Invalid geocode candidate: {0}")]
    InvalidCandidate(String),
}

impl Error {
    /// Whether the failure happened below the application protocol (network, HTTP status)
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
