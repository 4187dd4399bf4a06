//! Observatory site: geodetic location, timezone and identity.

use std::str::FromStr;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::error::{GeometryResult, StaraltError, StaraltResult};
use crate::geometry::{AltAz, GeometryProvider};
use crate::models::{Instant, Target};

/// Lowest accepted site elevation in meters.
pub const MIN_ELEVATION_M: f64 = -500.0;

/// Default horizon (degrees) below which the sun must be for it to be night.
pub const NIGHT_HORIZON_DEG: f64 = -18.0;

/// Immutable ground observatory.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    latitude_deg: f64,
    longitude_deg: f64,
    elevation_m: f64,
    timezone: Tz,
    observer_name: String,
    observatory_name: String,
}

impl Site {
    /// Validate and build a site.
    ///
    /// # Errors
    /// `StaraltError::Configuration` if latitude is outside [-90, 90], longitude
    /// outside [-180, 180], elevation below -500 m, any value is non-finite, or
    /// the timezone identifier is unknown.
    pub fn new(
        latitude_deg: f64,
        longitude_deg: f64,
        elevation_m: f64,
        timezone: &str,
        observer_name: impl Into<String>,
        observatory_name: impl Into<String>,
    ) -> StaraltResult<Self> {
        if !latitude_deg.is_finite() || !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(StaraltError::Configuration(format!(
                "Latitude must be between -90 and 90 degrees, got {}",
                latitude_deg
            )));
        }
        if !longitude_deg.is_finite() || !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(StaraltError::Configuration(format!(
                "Longitude must be between -180 and 180 degrees, got {}",
                longitude_deg
            )));
        }
        if !elevation_m.is_finite() || elevation_m < MIN_ELEVATION_M {
            return Err(StaraltError::Configuration(format!(
                "Elevation must be at least {} m, got {}",
                MIN_ELEVATION_M, elevation_m
            )));
        }
        let timezone = Tz::from_str(timezone.trim()).map_err(|_| {
            StaraltError::Configuration(format!("Unknown timezone identifier '{}'", timezone))
        })?;

        Ok(Self {
            latitude_deg,
            longitude_deg,
            elevation_m,
            timezone,
            observer_name: observer_name.into(),
            observatory_name: observatory_name.into(),
        })
    }

    pub fn latitude_deg(&self) -> f64 {
        self.latitude_deg
    }

    pub fn longitude_deg(&self) -> f64 {
        self.longitude_deg
    }

    pub fn elevation_m(&self) -> f64 {
        self.elevation_m
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn observer_name(&self) -> &str {
        &self.observer_name
    }

    pub fn observatory_name(&self) -> &str {
        &self.observatory_name
    }

    /// Project a UTC instant into the site's local time.
    pub fn local_time(&self, instant: Instant) -> DateTime<Tz> {
        instant.datetime().with_timezone(&self.timezone)
    }

    /// True iff the sun's altitude at `instant` is below `horizon_deg`.
    pub fn is_night<G: GeometryProvider + ?Sized>(
        &self,
        geometry: &G,
        instant: Instant,
        horizon_deg: f64,
    ) -> GeometryResult<bool> {
        Ok(geometry.sun_altaz(instant, self)?.alt_deg < horizon_deg)
    }

    /// Horizontal coordinates of a target seen from this site.
    pub fn to_altaz<G: GeometryProvider + ?Sized>(
        &self,
        geometry: &G,
        target: &Target,
        instant: Instant,
    ) -> GeometryResult<AltAz> {
        geometry.target_altaz(target.ra_deg(), target.dec_deg(), instant, self)
    }
}
