//! Validated geographic coordinates

use crate::{Error, Result};

/// A WGS84 position in degrees.
///
/// Both components are finite, latitude lies in [-90, 90] and longitude in
/// [-180, 180]. The only way to build one is through [`Coordinates::new`] or
/// [`Coordinates::parse`], so holders never need to re-check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    /// Bangalore city center
    pub const BANGALORE: Coordinates = Coordinates {
        lat: 12.9716,
        lon: 77.5946,
    };

    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if valid {
            Ok(Self { lat, lon })
        } else {
            Err(Error::InvalidCoordinates { lat, lon })
        }
    }

    /// Parse coordinates from decimal strings, as geocoders usually return them
    pub fn parse(lat: &str, lon: &str) -> Result<Self> {
        let parse = |s: &str| {
            s.trim()
                .parse::<f64>()
                .map_err(|e| Error::InvalidCandidate(format!("'{s}' is not a number: {e}")))
        };
        Self::new(parse(lat)?, parse(lon)?)
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}
