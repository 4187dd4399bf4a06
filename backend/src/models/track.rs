//! Sampled visibility track of one target over one night.

use serde::{Deserialize, Serialize};

use crate::error::{StaraltError, StaraltResult};
use crate::models::{Instant, NightWindow, Target};

/// Default minimum target altitude, degrees.
pub const DEFAULT_MIN_ALTITUDE_DEG: f64 = 20.0;
/// Default minimum target-moon separation, degrees.
pub const DEFAULT_MIN_MOONSEP_DEG: f64 = 30.0;

/// Altitude and moon-separation limits a sample must strictly exceed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityThresholds {
    pub min_altitude_deg: f64,
    pub min_moonsep_deg: f64,
}

impl Default for ObservabilityThresholds {
    fn default() -> Self {
        Self {
            min_altitude_deg: DEFAULT_MIN_ALTITUDE_DEG,
            min_moonsep_deg: DEFAULT_MIN_MOONSEP_DEG,
        }
    }
}

impl ObservabilityThresholds {
    pub fn new(min_altitude_deg: f64, min_moonsep_deg: f64) -> StaraltResult<Self> {
        if !min_altitude_deg.is_finite() || !min_moonsep_deg.is_finite() {
            return Err(StaraltError::InvalidTarget(format!(
                "thresholds must be finite (minalt={}, minmoonsep={})",
                min_altitude_deg, min_moonsep_deg
            )));
        }
        Ok(Self {
            min_altitude_deg,
            min_moonsep_deg,
        })
    }

    /// Fill omitted values with the defaults.
    pub fn from_options(
        min_altitude_deg: Option<f64>,
        min_moonsep_deg: Option<f64>,
        defaults: ObservabilityThresholds,
    ) -> StaraltResult<Self> {
        Self::new(
            min_altitude_deg.unwrap_or(defaults.min_altitude_deg),
            min_moonsep_deg.unwrap_or(defaults.min_moonsep_deg),
        )
    }

    /// Altitude and separation both strictly above their limits.
    pub fn admits(&self, target_alt_deg: f64, moon_separation_deg: f64) -> bool {
        target_alt_deg > self.min_altitude_deg && moon_separation_deg > self.min_moonsep_deg
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    pub instant: Instant,
    pub sun_alt: f64,
    pub moon_alt: f64,
    pub target_alt: f64,
    pub target_az: f64,
    pub moon_separation_deg: f64,
    pub is_observable: bool,
}

/// Classified samples plus everything needed to re-render or re-classify them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityTrack {
    pub target: Target,
    pub window: NightWindow,
    /// Instant the track was requested for.
    pub reference: Instant,
    pub range_start: Instant,
    pub range_end: Instant,
    pub samples: Vec<TrackSample>,
    pub thresholds: ObservabilityThresholds,
}

impl VisibilityTrack {
    /// Observable iff inside the night window and admitted by the thresholds.
    pub fn classify(
        window: &NightWindow,
        thresholds: &ObservabilityThresholds,
        instant: Instant,
        target_alt_deg: f64,
        moon_separation_deg: f64,
    ) -> bool {
        window.contains_night(instant) && thresholds.admits(target_alt_deg, moon_separation_deg)
    }

    /// Re-apply classification with new thresholds; geometry is not recomputed.
    pub fn reclassify(&mut self, thresholds: ObservabilityThresholds) {
        for sample in &mut self.samples {
            sample.is_observable = Self::classify(
                &self.window,
                &thresholds,
                sample.instant,
                sample.target_alt,
                sample.moon_separation_deg,
            );
        }
        self.thresholds = thresholds;
    }

    pub fn observable_samples(&self) -> impl Iterator<Item = &TrackSample> {
        self.samples.iter().filter(|s| s.is_observable)
    }

    pub fn has_observable_sample(&self) -> bool {
        self.samples.iter().any(|s| s.is_observable)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Twilight;
    use chrono::TimeDelta;

    fn night() -> NightWindow {
        let t: Instant = "2024-01-26T04:00:00Z".parse().unwrap();
        let mut w = NightWindow::empty(t);
        w.set_boundaries(
            Twilight::Astronomical,
            Some(t - TimeDelta::hours(4)),
            Some(t + TimeDelta::hours(4)),
        );
        w.set_boundaries(
            Twilight::Night,
            Some(t - TimeDelta::hours(3)),
            Some(t + TimeDelta::hours(3)),
        );
        w
    }

    fn sample(instant: Instant, target_alt: f64, sep: f64) -> TrackSample {
        TrackSample {
            instant,
            sun_alt: -30.0,
            moon_alt: 10.0,
            target_alt,
            target_az: 180.0,
            moon_separation_deg: sep,
            is_observable: false,
        }
    }

    fn track(samples: Vec<TrackSample>) -> VisibilityTrack {
        let window = night();
        let target = Target::new(10.0, -20.0, None).unwrap();
        VisibilityTrack {
            target,
            reference: window.reference,
            range_start: samples[0].instant,
            range_end: samples[samples.len() - 1].instant,
            window,
            samples,
            thresholds: ObservabilityThresholds::default(),
        }
    }

    #[test]
    fn test_threshold_strictness() {
        let th = ObservabilityThresholds::default();
        assert!(!th.admits(20.0, 50.0));
        assert!(th.admits(20.000_001, 50.0));
        assert!(!th.admits(45.0, 30.0));
    }

    #[test]
    fn test_threshold_defaults_fill_missing() {
        let th =
            ObservabilityThresholds::from_options(Some(35.0), None, Default::default()).unwrap();
        assert_eq!(th.min_altitude_deg, 35.0);
        assert_eq!(th.min_moonsep_deg, 30.0);
        assert!(ObservabilityThresholds::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_reclassify_with_looser_thresholds() {
        let mid = night().reference;
        let outside = night().sunset_night.unwrap() - TimeDelta::minutes(5);
        let mut t = track(vec![sample(outside, 80.0, 90.0), sample(mid, 15.0, 25.0)]);

        t.reclassify(ObservabilityThresholds::default());
        assert!(!t.has_observable_sample());

        t.reclassify(ObservabilityThresholds::new(10.0, 20.0).unwrap());
        let observable: Vec<_> = t.observable_samples().map(|s| s.instant).collect();
        assert_eq!(observable, vec![mid]);
        assert_eq!(t.thresholds.min_altitude_deg, 10.0);
    }

    #[test]
    fn test_override_outside_night() {
        let w = night();
        let th = ObservabilityThresholds::new(-90.0, 0.0).unwrap();
        let before = w.sunset_night.unwrap().offset_seconds(-1.0);
        let after = w.sunrise_night.unwrap().offset_seconds(1.0);
        assert!(!VisibilityTrack::classify(&w, &th, before, 60.0, 90.0));
        assert!(!VisibilityTrack::classify(&w, &th, after, 60.0, 90.0));
        assert!(VisibilityTrack::classify(&w, &th, w.sunset_night.unwrap(), 60.0, 90.0));
        assert!(VisibilityTrack::classify(&w, &th, w.sunrise_night.unwrap(), 60.0, 90.0));
    }
}
