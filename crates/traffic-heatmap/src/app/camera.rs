//! Animated map recentering

use std::time::Duration;
use traffic_heatmap_lib::{Coordinates, HeatPoint};

/// Duration of a recenter flight
pub const FLY_DURATION: Duration = Duration::from_millis(1500);

/// Eased flight of the map center from one position to another
pub struct FlyTo {
    from: Coordinates,
    to: Coordinates,
    started_at: instant::Instant,
    duration: Duration,
}

impl FlyTo {
    pub fn new(from: Coordinates, to: Coordinates) -> Self {
        Self {
            from,
            to,
            started_at: instant::Instant::now(),
            duration: FLY_DURATION,
        }
    }

    pub fn target(&self) -> Coordinates {
        self.to
    }

    /// Current center and whether the flight is over
    pub fn current(&self) -> (walkers::Position, bool) {
        let elapsed = self.started_at.elapsed();
        let (lat, lon) = self.position_at(elapsed);
        (walkers::lat_lon(lat, lon), elapsed >= self.duration)
    }

    /// Center `elapsed` into the flight, as (lat, lon)
    pub fn position_at(&self, elapsed: Duration) -> (f64, f64) {
        let t = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
        };
        let k = ease_in_out(t);

        let lat = self.from.lat() + (self.to.lat() - self.from.lat()) * k;

        // Go the short way around the antimeridian
        let mut dlon = self.to.lon() - self.from.lon();
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }
        let lon = wrap_lon(self.from.lon() + dlon * k);

        (lat, lon)
    }
}

/// Where a new flight should start: the map's own center once the user or a
/// previous flight has moved it, otherwise `fallback`.
pub fn flight_origin(map_center: Option<walkers::Position>, fallback: Coordinates) -> Coordinates {
    map_center
        .and_then(|p| Coordinates::new(p.y(), wrap_lon(p.x())).ok())
        .unwrap_or(fallback)
}

/// Center and zoom that fit every point, or `None` without points
pub fn fit_to_points(points: &[HeatPoint]) -> Option<(Coordinates, f64)> {
    let first = points.first()?;
    let (mut min_lat, mut max_lat) = (first.lat, first.lat);
    let (mut min_lon, mut max_lon) = (first.lon, first.lon);
    for p in &points[1..] {
        min_lat = min_lat.min(p.lat);
        max_lat = max_lat.max(p.lat);
        min_lon = min_lon.min(p.lon);
        max_lon = max_lon.max(p.lon);
    }

    let center = Coordinates::new((min_lat + max_lat) / 2.0, (min_lon + max_lon) / 2.0).ok()?;
    let max_span = (max_lat - min_lat).max(max_lon - min_lon);
    let zoom = if max_span > 0.0 {
        ((4.0 * 360.0 / max_span).log2() - 0.5).clamp(1.0, 17.0)
    } else {
        15.0
    };
    Some((center, zoom))
}

fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

fn wrap_lon(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}
