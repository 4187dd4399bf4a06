//! Visibility track computation service.
//!
//! Samples a target's altitude and moon separation over one night and
//! classifies every sample as observable or not. A sample is observable when:
//!
//! - it lies inside the -18° night (boundaries included)
//! - the target altitude is strictly above the minimum altitude
//! - the moon separation is strictly above the minimum separation

use chrono::TimeDelta;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{StaraltError, StaraltResult};
use crate::geometry::GeometryProvider;
use crate::models::{
    Instant, NightWindow, ObservabilityThresholds, Site, Target, TrackSample, VisibilityTrack,
};

/// Time grid of a track: how far to pad the astronomical window and the
/// nominal spacing between samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackGrid {
    pub padding_seconds: f64,
    pub cadence_seconds: f64,
}

impl Default for TrackGrid {
    fn default() -> Self {
        Self {
            padding_seconds: 2.0 * 3600.0,
            cadence_seconds: 300.0,
        }
    }
}

/// Build the visibility track of `target` over `window` on the default grid.
///
/// `reference` defaults to the current wall-clock time and is only echoed back.
///
/// # Errors
/// * `StaraltError::DegenerateWindow` if an astronomical or -18° night boundary is undefined
/// * `StaraltError::Geometry` if the provider fails for any sample
pub fn build_track<G: GeometryProvider + ?Sized>(
    geometry: &G,
    site: &Site,
    target: &Target,
    window: &NightWindow,
    thresholds: ObservabilityThresholds,
    reference: Option<Instant>,
) -> StaraltResult<VisibilityTrack> {
    build_track_on_grid(
        geometry,
        site,
        target,
        window,
        thresholds,
        reference,
        TrackGrid::default(),
    )
}

/// [`build_track`] with an explicit padding and cadence.
pub fn build_track_on_grid<G: GeometryProvider + ?Sized>(
    geometry: &G,
    site: &Site,
    target: &Target,
    window: &NightWindow,
    thresholds: ObservabilityThresholds,
    reference: Option<Instant>,
    grid: TrackGrid,
) -> StaraltResult<VisibilityTrack> {
    let (sunset_astro, sunrise_astro) = window.astronomical_bounds().ok_or_else(|| {
        StaraltError::DegenerateWindow(format!(
            "astronomical twilight undefined for night of {} at lat {:.4}",
            window.reference.isoformat(),
            site.latitude_deg()
        ))
    })?;
    if window.night_bounds().is_none() {
        return Err(StaraltError::DegenerateWindow(format!(
            "sun never reaches -18° in the night of {} at lat {:.4}",
            window.reference.isoformat(),
            site.latitude_deg()
        )));
    }

    let cadence_ok = grid.cadence_seconds.is_finite() && grid.cadence_seconds > 0.0;
    let padding_ok = grid.padding_seconds.is_finite() && grid.padding_seconds >= 0.0;
    if !cadence_ok || !padding_ok {
        return Err(StaraltError::Configuration(format!(
            "track cadence must be positive and padding non-negative, got {:?}",
            grid
        )));
    }

    let range_start = sunset_astro.offset_seconds(-grid.padding_seconds);
    let range_end = sunrise_astro.offset_seconds(grid.padding_seconds);
    if range_end < range_start {
        return Err(StaraltError::DegenerateWindow(format!(
            "astronomical sunrise {} precedes sunset {}",
            sunrise_astro.isoformat(),
            sunset_astro.isoformat()
        )));
    }

    let instants = sample_instants(range_start, range_end, grid.cadence_seconds);
    let mut samples = Vec::with_capacity(instants.len());
    for instant in instants {
        let moon = geometry.moon_altaz(instant, site)?;
        let sun = geometry.sun_altaz(instant, site)?;
        let target_altaz = site.to_altaz(geometry, target, instant)?;
        let moon_separation_deg = geometry.angular_separation(&moon, &target_altaz);

        samples.push(TrackSample {
            instant,
            sun_alt: sun.alt_deg,
            moon_alt: moon.alt_deg,
            target_alt: target_altaz.alt_deg,
            target_az: target_altaz.az_deg,
            moon_separation_deg,
            is_observable: VisibilityTrack::classify(
                window,
                &thresholds,
                instant,
                target_altaz.alt_deg,
                moon_separation_deg,
            ),
        });
    }

    let track = VisibilityTrack {
        target: target.clone(),
        window: *window,
        reference: reference.unwrap_or_else(Instant::now),
        range_start,
        range_end,
        samples,
        thresholds,
    };

    debug!(
        "Track for {} ({:.4}, {:.4}): {} samples, {} observable",
        target.name().unwrap_or("<anonymous>"),
        target.ra_deg(),
        target.dec_deg(),
        track.len(),
        track.observable_samples().count()
    );
    Ok(track)
}

/// Evenly spaced instants over `[start, end]`, both ends included.
///
/// The count is `floor(duration / cadence) + 1`; the actual spacing is
/// stretched so the last sample lands exactly on `end`.
pub fn sample_instants(start: Instant, end: Instant, cadence_seconds: f64) -> Vec<Instant> {
    let duration = end.seconds_since(start);
    if duration <= 0.0 || cadence_seconds.is_nan() || cadence_seconds <= 0.0 {
        return vec![start];
    }
    let count = (duration / cadence_seconds).floor() as usize + 1;
    if count == 1 {
        return vec![start];
    }
    let step = duration / (count - 1) as f64;
    (0..count)
        .map(|i| {
            if i == count - 1 {
                end
            } else {
                start + TimeDelta::microseconds((step * i as f64 * 1e6).round() as i64)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryResult;
    use crate::geometry::{AltAz, EquatorialCoord};
    use crate::models::Twilight;

    /// Fixed positions: moon at the zenith, target on the meridian at 45°.
    struct StillSky;

    impl GeometryProvider for StillSky {
        fn sun_altaz(&self, _instant: Instant, _site: &Site) -> GeometryResult<AltAz> {
            Ok(AltAz::new(-30.0, 0.0))
        }
        fn moon_altaz(&self, _instant: Instant, _site: &Site) -> GeometryResult<AltAz> {
            Ok(AltAz::new(90.0, 0.0))
        }
        fn target_altaz(&self, _ra: f64, _dec: f64, _i: Instant, _s: &Site) -> GeometryResult<AltAz> {
            Ok(AltAz::new(45.0, 180.0))
        }
        fn sun_radec(&self, _instant: Instant) -> GeometryResult<EquatorialCoord> {
            Ok(EquatorialCoord { ra_deg: 0.0, dec_deg: 0.0 })
        }
        fn moon_radec(&self, _instant: Instant) -> GeometryResult<EquatorialCoord> {
            Ok(EquatorialCoord { ra_deg: 0.0, dec_deg: 0.0 })
        }
    }

    fn at(s: &str) -> Instant {
        s.parse().unwrap()
    }

    fn site() -> Site {
        Site::new(-30.0, -70.0, 0.0, "UTC", "", "").unwrap()
    }

    fn window() -> NightWindow {
        let mut w = NightWindow::empty(at("2024-01-25T20:00:00Z"));
        w.set_boundaries(
            Twilight::Astronomical,
            Some(at("2024-01-26T00:30:00Z")),
            Some(at("2024-01-26T08:30:00Z")),
        );
        w.set_boundaries(
            Twilight::Night,
            Some(at("2024-01-26T01:10:00Z")),
            Some(at("2024-01-26T07:50:00Z")),
        );
        w
    }

    #[test]
    fn test_sample_count_and_endpoints() {
        let start = at("2024-01-26T00:00:00Z");
        let end = at("2024-01-26T01:02:30Z");
        let grid = sample_instants(start, end, 300.0);
        // 62.5 minutes / 5 = 12.5 -> 13 samples.
        assert_eq!(grid.len(), 13);
        assert_eq!(grid[0], start);
        assert_eq!(*grid.last().unwrap(), end);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sample_exact_multiple() {
        let start = at("2024-01-26T00:00:00Z");
        let end = at("2024-01-26T01:00:00Z");
        let grid = sample_instants(start, end, 300.0);
        assert_eq!(grid.len(), 13);
        assert_eq!(grid[1], at("2024-01-26T00:05:00Z"));
    }

    #[test]
    fn test_track_range_is_padded_astronomical_window() {
        let track = build_track(
            &StillSky,
            &site(),
            &Target::new(10.0, -20.0, None).unwrap(),
            &window(),
            ObservabilityThresholds::default(),
            Some(at("2024-01-25T20:00:00Z")),
        )
        .unwrap();
        assert_eq!(track.range_start, at("2024-01-25T22:30:00Z"));
        assert_eq!(track.range_end, at("2024-01-26T10:30:00Z"));
        // 12 hours at 5 minutes.
        assert_eq!(track.len(), 145);
        assert!((track.samples[0].moon_separation_deg - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_classification_follows_night_override() {
        let w = window();
        let track = build_track(
            &StillSky,
            &site(),
            &Target::new(10.0, -20.0, None).unwrap(),
            &w,
            ObservabilityThresholds::default(),
            None,
        )
        .unwrap();
        let (night_start, night_end) = w.night_bounds().unwrap();
        for s in &track.samples {
            let inside = s.instant >= night_start && s.instant <= night_end;
            assert_eq!(s.is_observable, inside, "sample at {}", s.instant);
        }
        assert!(track.has_observable_sample());
    }

    #[test]
    fn test_degenerate_window_fails() {
        let mut w = window();
        w.sunset_astro = None;
        let err = build_track(
            &StillSky,
            &site(),
            &Target::new(10.0, -20.0, None).unwrap(),
            &w,
            ObservabilityThresholds::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, StaraltError::DegenerateWindow(_)));
    }

    #[test]
    fn test_missing_night_fails() {
        for (set, rise) in [(true, true), (true, false), (false, true)] {
            let mut w = window();
            if set {
                w.sunset_night = None;
            }
            if rise {
                w.sunrise_night = None;
            }
            let err = build_track(
                &StillSky,
                &site(),
                &Target::new(10.0, -20.0, None).unwrap(),
                &w,
                ObservabilityThresholds::new(-90.0, 0.0).unwrap(),
                None,
            )
            .unwrap_err();
            assert!(matches!(err, StaraltError::DegenerateWindow(_)), "{:?}", w);
        }
    }

    #[test]
    fn test_invalid_grid_rejected() {
        let grid = TrackGrid {
            padding_seconds: 0.0,
            cadence_seconds: 0.0,
        };
        let err = build_track_on_grid(
            &StillSky,
            &site(),
            &Target::new(10.0, -20.0, None).unwrap(),
            &window(),
            ObservabilityThresholds::default(),
            None,
            grid,
        )
        .unwrap_err();
        assert!(matches!(err, StaraltError::Configuration(_)));
    }
}
