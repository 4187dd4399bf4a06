//! Observer status snapshot.

use serde::{Deserialize, Serialize};

use crate::error::GeometryResult;
use crate::geometry::GeometryProvider;
use crate::models::{Instant, Site, NIGHT_HORIZON_DEG};

/// Site identity plus the sky state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverStatus {
    pub update_time: String,
    pub jd: f64,
    pub name_observer: String,
    pub name_observatory: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    /// Illuminated fraction of the moon, 0 to 1.
    pub moonphase: f64,
    pub timezone: String,
    pub is_night: bool,
    pub is_connected: bool,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Status of `site` at `now`.
pub fn observer_status<G: GeometryProvider + ?Sized>(
    site: &Site,
    geometry: &G,
    now: Instant,
) -> GeometryResult<ObserverStatus> {
    Ok(ObserverStatus {
        update_time: now.datetime().format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
        jd: round_to(now.julian_date(), 6),
        name_observer: site.observer_name().to_string(),
        name_observatory: site.observatory_name().to_string(),
        latitude: round_to(site.latitude_deg(), 4),
        longitude: round_to(site.longitude_deg(), 4),
        elevation: round_to(site.elevation_m(), 2),
        moonphase: geometry.moon_illumination(now)?,
        timezone: site.timezone().name().to_string(),
        is_night: site.is_night(geometry, now, NIGHT_HORIZON_DEG)?,
        is_connected: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MeeusGeometry;

    #[test]
    fn test_status_fields() {
        let site = Site::new(
            -30.470_412,
            -70.780_367,
            1580.123,
            "America/Santiago",
            "7DT observer",
            "7DT",
        )
        .unwrap();
        let now: Instant = "2024-01-26T04:00:00Z".parse().unwrap();
        let status = observer_status(&site, &MeeusGeometry::new(), now).unwrap();

        assert_eq!(status.update_time, "2024-01-26T04:00:00.000");
        assert_eq!(status.jd, 2_460_335.666_667);
        assert_eq!(status.latitude, -30.4704);
        assert_eq!(status.longitude, -70.7804);
        assert_eq!(status.elevation, 1580.12);
        assert_eq!(status.timezone, "America/Santiago");
        assert_eq!(status.name_observatory, "7DT");
        assert!(status.is_night);
        assert!(status.is_connected);
        // Full moon on 2024-01-25.
        assert!(status.moonphase > 0.95);
    }

    #[test]
    fn test_daytime_status() {
        let site = Site::new(-30.4704, -70.7804, 1580.0, "America/Santiago", "", "7DT").unwrap();
        let now: Instant = "2024-01-25T17:00:00Z".parse().unwrap();
        let status = observer_status(&site, &MeeusGeometry::new(), now).unwrap();
        assert!(!status.is_night);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["is_connected"], true);
    }
}
