//! Conversion of traffic samples into heat points

use crate::TrafficSample;

/// A weighted point for the heat overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub lat: f64,
    pub lon: f64,
    /// Weight in [0, 1]
    pub intensity: f64,
}

/// Map a congestion percentage to a heat intensity in [0, 1].
///
/// Missing and non-finite values map to 0; values outside 0-100 are clamped.
#[inline]
pub fn intensity(congestion_percent: Option<f64>) -> f64 {
    congestion_percent
        .filter(|p| p.is_finite())
        .map(|p| (p / 100.0).clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

/// One heat point per sample, in input order
pub fn heat_points(samples: &[TrafficSample]) -> Vec<HeatPoint> {
    profiling::scope!("heat_points");

    samples
        .iter()
        .map(|sample| HeatPoint {
            lat: sample.lat,
            lon: sample.lon,
            intensity: intensity(sample.congestion_percent),
        })
        .collect()
}
