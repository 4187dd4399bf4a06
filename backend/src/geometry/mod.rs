//! Celestial geometry seam.
//!
//! Everything the core needs from an ephemeris is behind [`GeometryProvider`]:
//! sun, moon and fixed-target positions in horizontal coordinates for a given
//! instant and site. [`MeeusGeometry`] is the bundled implementation.

pub mod meeus;

use serde::{Deserialize, Serialize};

use crate::error::GeometryResult;
use crate::models::{Instant, Site};

pub use meeus::MeeusGeometry;

/// Horizontal coordinates. Azimuth is measured from north through east.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltAz {
    pub alt_deg: f64,
    pub az_deg: f64,
}

impl AltAz {
    pub fn new(alt_deg: f64, az_deg: f64) -> Self {
        Self { alt_deg, az_deg }
    }
}

/// Apparent equatorial coordinates of date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquatorialCoord {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

/// Source of sun, moon and target positions.
///
/// Implementations must be deterministic for a given instant and site. The core
/// adds no retry logic; errors are propagated to the caller unchanged.
pub trait GeometryProvider: Send + Sync {
    fn sun_altaz(&self, instant: Instant, site: &Site) -> GeometryResult<AltAz>;

    fn moon_altaz(&self, instant: Instant, site: &Site) -> GeometryResult<AltAz>;

    /// Horizontal position of a fixed ICRS target (decimal degrees).
    fn target_altaz(
        &self,
        ra_deg: f64,
        dec_deg: f64,
        instant: Instant,
        site: &Site,
    ) -> GeometryResult<AltAz>;

    /// Geocentric apparent sun position.
    fn sun_radec(&self, instant: Instant) -> GeometryResult<EquatorialCoord>;

    /// Geocentric apparent moon position.
    fn moon_radec(&self, instant: Instant) -> GeometryResult<EquatorialCoord>;

    /// Angular distance in degrees between two horizontal positions.
    fn angular_separation(&self, a: &AltAz, b: &AltAz) -> f64 {
        angular_separation_deg(a.alt_deg, a.az_deg, b.alt_deg, b.az_deg)
    }

    /// Illuminated fraction of the lunar disk (0 = new moon, 1 = full moon).
    fn moon_illumination(&self, instant: Instant) -> GeometryResult<f64> {
        let sun = self.sun_radec(instant)?;
        let moon = self.moon_radec(instant)?;
        let elongation = angular_separation_deg(sun.dec_deg, sun.ra_deg, moon.dec_deg, moon.ra_deg);
        Ok((1.0 - elongation.to_radians().cos()) / 2.0)
    }
}

/// Great-circle distance in degrees between two points given as
/// (latitude-like, longitude-like) pairs, using the Vincenty formula.
pub fn angular_separation_deg(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> f64 {
    let (sin_lat1, cos_lat1) = lat1_deg.to_radians().sin_cos();
    let (sin_lat2, cos_lat2) = lat2_deg.to_radians().sin_cos();
    let (sin_dlon, cos_dlon) = (lon2_deg - lon1_deg).to_radians().sin_cos();

    let num1 = cos_lat2 * sin_dlon;
    let num2 = cos_lat1 * sin_lat2 - sin_lat1 * cos_lat2 * cos_dlon;
    let denominator = sin_lat1 * sin_lat2 + cos_lat1 * cos_lat2 * cos_dlon;

    num1.hypot(num2).atan2(denominator).to_degrees()
}

/// Wrap an angle into [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}
