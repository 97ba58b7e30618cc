use crate::Coordinates;
use std::time::Duration;

/// Runtime configuration for the clients and the view controller
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the traffic backend (`/traffic` is appended)
    pub traffic_url: String,

    /// Base URL of the geocoding service (`/search` is appended)
    pub geocode_url: String,

    /// Appended to every geocode query to scope results to a country or region.
    /// Empty means no scoping.
    pub region_suffix: String,

    /// Period of the automatic sample refresh
    pub refresh_interval: Duration,

    /// Where the view starts before any search
    pub default_coordinates: Coordinates,

    /// Initial content of the search box
    pub default_city: String,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    /// Sent as `User-Agent` on every request
    pub user_agent: String,

    /// Drop sample responses that arrive after a newer request's response
    pub discard_stale_responses: bool,
}

impl Config {
    /// Shortest refresh period accepted; shorter values are raised to it
    pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(100);

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval.max(Self::MIN_REFRESH_INTERVAL)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            traffic_url: "http://127.0.0.1:5000".to_string(),
            geocode_url: "https://nominatim.openstreetmap.org".to_string(),
            region_suffix: "India".to_string(),
            refresh_interval: Duration::from_secs(10),
            default_coordinates: Coordinates::BANGALORE,
            default_city: "Bangalore".to_string(),
            request_timeout: Duration::from_secs(10),
            user_agent: concat!("traffic-heatmap/", env!("CARGO_PKG_VERSION")).to_string(),
            discard_stale_responses: true,
        }
    }
}
