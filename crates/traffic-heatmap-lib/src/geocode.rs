//! Geocoding: free-text place names to coordinates

use crate::{Config, Coordinates, Error, Result};
use serde::{Deserialize, Deserializer};
use std::future::Future;

/// A service that resolves place names.
///
/// Returns candidates ranked by the provider's relevance; an empty list means
/// nothing matched and is not an error.
pub trait Geocoder: Send + Sync + 'static {
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<GeocodeCandidate>>> + Send;
}

/// One geocoding match. Nominatim returns positions as decimal strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeCandidate {
    #[serde(deserialize_with = "string_or_number")]
    pub lat: String,
    #[serde(deserialize_with = "string_or_number")]
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl GeocodeCandidate {
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            lat: lat.into(),
            lon: lon.into(),
            display_name: None,
        }
    }

    pub fn coordinates(&self) -> Result<Coordinates> {
        Coordinates::parse(&self.lat, &self.lon)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Parse a geocoder response body into its candidate list
pub fn parse_candidates(body: &[u8]) -> Result<Vec<GeocodeCandidate>> {
    serde_json::from_slice(body)
        .map_err(|e| Error::Protocol(format!("malformed geocoding response: {e}")))
}

/// Geocoder backed by a Nominatim-compatible `/search` endpoint
pub struct NominatimClient {
    http: reqwest::Client,
    search_url: String,
    region_suffix: String,
}

impl NominatimClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            search_url: format!("{}/search", config.geocode_url.trim_end_matches('/')),
            region_suffix: config.region_suffix.trim().to_string(),
        })
    }

    /// The `q` parameter sent for a user query, scoped by the region suffix
    pub fn scoped_query(&self, query: &str) -> String {
        let query = query.trim();
        if self.region_suffix.is_empty() {
            query.to_string()
        } else {
            format!("{},{}", query, self.region_suffix)
        }
    }
}

impl Geocoder for NominatimClient {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>> {
        let q = self.scoped_query(query);
        tracing::debug!("Geocoding '{}' via {}", q, self.search_url);

        let response = self
            .http
            .get(&self.search_url)
            .query(&[("format", "json"), ("q", q.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: self.search_url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let candidates = parse_candidates(&body)?;
        tracing::debug!("Geocoder returned {} candidates for '{}'", candidates.len(), q);
        Ok(candidates)
    }
}
