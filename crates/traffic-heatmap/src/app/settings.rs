use clap::Parser;
use eframe_entrypoints::{get_env, parse_args};
use std::time::Duration;
use traffic_heatmap_lib::{Config, Coordinates};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Live Traffic Heatmap - Renders live traffic congestion around a searched city
pub struct Settings {
    /// Base URL of the traffic backend [env: TRAFFIC_URL] [default: http://127.0.0.1:5000]
    #[clap(long, value_name = "URL")]
    pub traffic_url: Option<String>,

    /// Base URL of the geocoding service [env: GEOCODE_URL] [default: https://nominatim.openstreetmap.org]
    #[clap(long, value_name = "URL")]
    pub geocode_url: Option<String>,

    /// Appended to every city search to scope it to a country or region (empty to disable)
    #[clap(long, default_value = "India")]
    pub region_suffix: String,

    /// Automatic refresh period in milliseconds
    #[clap(long, default_value = "10000")]
    pub refresh_interval_ms: u64,

    /// HTTP request timeout in milliseconds
    #[clap(long, default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Latitude the map starts at
    #[clap(long, default_value = "12.9716", allow_negative_numbers = true)]
    pub default_lat: f64,

    /// Longitude the map starts at
    #[clap(long, default_value = "77.5946", allow_negative_numbers = true)]
    pub default_lon: f64,

    /// City shown in the search box on startup
    #[clap(long, default_value = "Bangalore")]
    pub default_city: String,

    /// Initial map zoom level
    #[clap(long, default_value = "13")]
    pub zoom: f64,

    /// Fit the view to the traffic samples whenever new ones arrive
    #[clap(long, default_value = "false")]
    pub fit_to_samples: bool,

    /// Apply traffic responses in arrival order even when an older request answers last
    #[clap(long, default_value = "false")]
    pub last_response_wins: bool,
}

impl Settings {
    /// Parse from the command line, exiting with usage on error
    pub fn from_cli() -> Self {
        match parse_args::<Settings>() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Build the library configuration, falling back to environment variables
    /// and then to the built-in defaults for the service URLs.
    pub fn to_config(&self) -> traffic_heatmap_lib::Result<Config> {
        let defaults = Config::default();

        let traffic_url = self
            .traffic_url
            .clone()
            .or_else(|| get_env::<String>("TRAFFIC_URL"))
            .unwrap_or(defaults.traffic_url);
        let geocode_url = self
            .geocode_url
            .clone()
            .or_else(|| get_env::<String>("GEOCODE_URL"))
            .unwrap_or(defaults.geocode_url);

        Ok(Config {
            traffic_url,
            geocode_url,
            region_suffix: self.region_suffix.clone(),
            refresh_interval: Duration::from_millis(self.refresh_interval_ms),
            default_coordinates: Coordinates::new(self.default_lat, self.default_lon)?,
            default_city: self.default_city.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            discard_stale_responses: !self.last_response_wins,
            ..defaults
        })
    }
}
