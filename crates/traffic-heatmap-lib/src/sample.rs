//! Traffic samples as returned by the backend, and their parsing

use crate::{Error, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One congestion reading near the queried location
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrafficSample {
    pub lat: f64,
    pub lon: f64,

    /// Congestion in percent (0-100). Absent or non-numeric values become `None`.
    #[serde(default, deserialize_with = "lenient_number")]
    pub congestion_percent: Option<f64>,

    /// Backend's own banding ("Low", "Medium", "High"), used when the percentage is missing
    #[serde(default)]
    pub traffic_level: Option<String>,

    /// Current speed in km/h
    #[serde(default, deserialize_with = "lenient_number")]
    pub current_speed: Option<f64>,

    /// Free-flow speed in km/h
    #[serde(default, deserialize_with = "lenient_number")]
    pub free_flow_speed: Option<f64>,
}

impl TrafficSample {
    pub fn new(lat: f64, lon: f64, congestion_percent: Option<f64>) -> Self {
        Self {
            lat,
            lon,
            congestion_percent,
            traffic_level: None,
            current_speed: None,
            free_flow_speed: None,
        }
    }

    /// Congestion in percent, with missing or unusable values read as 0
    pub fn congestion(&self) -> f64 {
        self.congestion_percent
            .filter(|p| p.is_finite())
            .unwrap_or(0.0)
    }

    pub fn level(&self) -> TrafficLevel {
        match (self.congestion_percent, self.traffic_level.as_deref()) {
            (Some(p), _) if p.is_finite() => TrafficLevel::from_percent(p),
            (_, Some(label)) => TrafficLevel::from_label(label).unwrap_or(TrafficLevel::Low),
            _ => TrafficLevel::Low,
        }
    }
}

/// Accepts numbers and numeric strings; anything else reads as absent.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|v| v.is_finite()))
}

/// Parse a traffic response body.
///
/// The body must be a JSON array of sample objects. Anything else (an object,
/// a bare value, invalid JSON, an element missing `lat`/`lon`) is a protocol
/// violation, kept distinct from a valid empty array.
pub fn parse_samples(body: &[u8]) -> Result<Vec<TrafficSample>> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| Error::Protocol(format!("response is not valid JSON: {e}")))?;

    match value {
        Value::Array(_) => serde_json::from_value(value)
            .map_err(|e| Error::Protocol(format!("malformed traffic sample: {e}"))),
        other => Err(Error::Protocol(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Congestion severity bands, matching the legend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrafficLevel {
    Low,
    Moderate,
    Heavy,
}

impl TrafficLevel {
    pub fn from_percent(percent: f64) -> Self {
        if percent > 50.0 {
            Self::Heavy
        } else if percent > 25.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Parse the backend's band name ("Low", "Medium", "High")
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "moderate" => Some(Self::Moderate),
            "high" | "heavy" => Some(Self::Heavy),
            _ => None,
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Low, Self::Moderate, Self::Heavy]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low / Smooth",
            Self::Moderate => "Moderate",
            Self::Heavy => "Heavy Congestion",
        }
    }

    /// Representative congestion for the band, used to pick a legend color
    pub fn representative_percent(&self) -> f64 {
        match self {
            Self::Low => 10.0,
            Self::Moderate => 40.0,
            Self::Heavy => 90.0,
        }
    }
}

/// Aggregate figures over the current sample list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSummary {
    pub count: usize,
    pub mean_percent: f64,
    pub max_percent: f64,
    pub low: usize,
    pub moderate: usize,
    pub heavy: usize,
    /// Mean current speed in km/h over the samples that report one
    pub mean_speed: Option<f64>,
    /// Mean free-flow speed in km/h over the samples that report one
    pub mean_free_flow_speed: Option<f64>,
}

impl SampleSummary {
    pub fn from_samples(samples: &[TrafficSample]) -> Self {
        let mut summary = Self {
            count: samples.len(),
            ..Default::default()
        };
        if samples.is_empty() {
            return summary;
        }

        let mut total = 0.0;
        for sample in samples {
            let percent = sample.congestion();
            total += percent;
            summary.max_percent = summary.max_percent.max(percent);
            match sample.level() {
                TrafficLevel::Low => summary.low += 1,
                TrafficLevel::Moderate => summary.moderate += 1,
                TrafficLevel::Heavy => summary.heavy += 1,
            }
        }
        summary.mean_percent = total / samples.len() as f64;
        summary.mean_speed = mean_of(samples.iter().filter_map(|s| s.current_speed));
        summary.mean_free_flow_speed = mean_of(samples.iter().filter_map(|s| s.free_flow_speed));
        summary
    }

    pub fn count_for(&self, level: TrafficLevel) -> usize {
        match level {
            TrafficLevel::Low => self.low,
            TrafficLevel::Moderate => self.moderate,
            TrafficLevel::Heavy => self.heavy,
        }
    }
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
