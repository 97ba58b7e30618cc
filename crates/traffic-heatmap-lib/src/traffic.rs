//! Traffic backend client

use crate::{Config, Coordinates, Error, Result, TrafficSample, parse_samples};
use std::future::Future;

/// A source of congestion samples around a location.
///
/// The area covered is the backend's decision. Network and HTTP failures are
/// reported as transport errors; a body that is not a sample list is an
/// [`Error::Protocol`].
pub trait TrafficSource: Send + Sync + 'static {
    fn samples_near(
        &self,
        at: Coordinates,
    ) -> impl Future<Output = Result<Vec<TrafficSample>>> + Send;
}

/// Client for the `GET /traffic?lat=..&lon=..` backend endpoint
pub struct HttpTrafficClient {
    http: reqwest::Client,
    traffic_url: String,
}

impl HttpTrafficClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            traffic_url: format!("{}/traffic", config.traffic_url.trim_end_matches('/')),
        })
    }
}

impl TrafficSource for HttpTrafficClient {
    async fn samples_near(&self, at: Coordinates) -> Result<Vec<TrafficSample>> {
        tracing::debug!("Fetching traffic samples near {}", at);

        let response = self
            .http
            .get(&self.traffic_url)
            .query(&[("lat", at.lat()), ("lon", at.lon())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: self.traffic_url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        parse_samples(&body)
    }
}
