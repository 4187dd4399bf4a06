//! Horizon crossing solver.
//!
//! Finds the instant a body's altitude equals a given horizon angle, rising or
//! setting, relative to a reference instant. The altitude curve is scanned at a
//! coarse fixed step to bracket the sign change, then refined by bisection.
//!
//! "No crossing within the search span" is a valid outcome (`Ok(None)`), not an
//! error: at high latitudes the sun may not reach a given depression for days.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::GeometryResult;
use crate::geometry::GeometryProvider;
use crate::models::{Instant, Site, Target};

/// Default horizon for sun and moon rise/set helpers, degrees.
pub const DEFAULT_BODY_HORIZON_DEG: f64 = -18.0;

/// Default horizon for target rise/set helpers, degrees.
pub const DEFAULT_TARGET_HORIZON_DEG: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Sun,
    Moon,
    /// Fixed ICRS position, decimal degrees.
    Target { ra_deg: f64, dec_deg: f64 },
}

impl From<&Target> for Body {
    fn from(target: &Target) -> Self {
        Body::Target {
            ra_deg: target.ra_deg(),
            dec_deg: target.dec_deg(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum CrossingMode {
    /// Earliest crossing after the reference.
    Next,
    /// Latest crossing before the reference.
    Previous,
    /// Crossing closest to the reference; ties go to the later one.
    Nearest,
}

/// Numeric parameters of a crossing search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossingSearch {
    /// Coarse scan step, seconds.
    pub step_seconds: f64,
    /// How far from the reference to look, seconds, in each direction.
    pub span_seconds: f64,
    /// Width of the final bisection bracket, seconds.
    pub tolerance_seconds: f64,
    /// Hard cap on altitude evaluations per directional search.
    pub max_evaluations: usize,
}

impl Default for CrossingSearch {
    fn default() -> Self {
        Self {
            step_seconds: 600.0,
            span_seconds: 36.0 * 3600.0,
            tolerance_seconds: 0.5,
            max_evaluations: 20_000,
        }
    }
}

/// Scan direction relative to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Forward,
    Backward,
}

/// Solves horizon crossings for one site through a geometry provider.
pub struct HorizonSolver<'a, G: GeometryProvider + ?Sized> {
    geometry: &'a G,
    site: &'a Site,
    search: CrossingSearch,
}

impl<'a, G: GeometryProvider + ?Sized> HorizonSolver<'a, G> {
    pub fn new(geometry: &'a G, site: &'a Site) -> Self {
        Self {
            geometry,
            site,
            search: CrossingSearch::default(),
        }
    }

    pub fn with_search(mut self, search: CrossingSearch) -> Self {
        self.search = search;
        self
    }

    pub fn search(&self) -> &CrossingSearch {
        &self.search
    }

    pub fn site(&self) -> &Site {
        self.site
    }

    /// Altitude of `body` at `instant`, degrees.
    pub fn altitude(&self, body: Body, instant: Instant) -> GeometryResult<f64> {
        let altaz = match body {
            Body::Sun => self.geometry.sun_altaz(instant, self.site)?,
            Body::Moon => self.geometry.moon_altaz(instant, self.site)?,
            Body::Target { ra_deg, dec_deg } => {
                self.geometry.target_altaz(ra_deg, dec_deg, instant, self.site)?
            }
        };
        Ok(altaz.alt_deg)
    }

    /// Instant at which `body` crosses `horizon_deg`, rising or setting.
    ///
    /// Returns `Ok(None)` if no such crossing lies within the search span or the
    /// evaluation budget runs out. Provider errors propagate unchanged.
    pub fn find_crossing(
        &self,
        body: Body,
        reference: Instant,
        horizon_deg: f64,
        mode: CrossingMode,
        rising: bool,
    ) -> GeometryResult<Option<Instant>> {
        let found = match mode {
            CrossingMode::Next => {
                self.directional(body, reference, horizon_deg, rising, Scan::Forward)?
            }
            CrossingMode::Previous => {
                self.directional(body, reference, horizon_deg, rising, Scan::Backward)?
            }
            CrossingMode::Nearest => {
                let next = self.directional(body, reference, horizon_deg, rising, Scan::Forward)?;
                let previous =
                    self.directional(body, reference, horizon_deg, rising, Scan::Backward)?;
                match (previous, next) {
                    (Some(p), Some(n)) => {
                        if n.seconds_since(reference) <= reference.seconds_since(p) {
                            Some(n)
                        } else {
                            Some(p)
                        }
                    }
                    (p, n) => n.or(p),
                }
            }
        };

        debug!(
            "{:?} {} {:.1}° {:?} from {}: {}",
            body,
            if rising { "rising" } else { "setting" },
            horizon_deg,
            mode,
            reference.isoformat(),
            found.map_or_else(|| "not found".to_string(), |t| t.isoformat())
        );
        Ok(found)
    }

    /// First bracketing interval found walking away from the reference, refined.
    fn directional(
        &self,
        body: Body,
        reference: Instant,
        horizon_deg: f64,
        rising: bool,
        scan: Scan,
    ) -> GeometryResult<Option<Instant>> {
        let search = &self.search;
        if search.step_seconds.is_nan()
            || search.span_seconds.is_nan()
            || search.step_seconds <= 0.0
            || search.span_seconds <= 0.0
        {
            return Ok(None);
        }

        let mut evaluations = 0usize;
        let offset_value = |offset: f64, evaluations: &mut usize| -> GeometryResult<f64> {
            *evaluations += 1;
            Ok(self.altitude(body, reference.offset_seconds(offset))? - horizon_deg)
        };

        // Rising: below before, at or above after. Setting: the mirror.
        let brackets = |early: f64, late: f64| {
            if rising {
                early < 0.0 && late >= 0.0
            } else {
                early > 0.0 && late <= 0.0
            }
        };

        let sign = match scan {
            Scan::Forward => 1.0,
            Scan::Backward => -1.0,
        };

        let mut near = 0.0_f64;
        let mut near_value = offset_value(near, &mut evaluations)?;

        while near.abs() < search.span_seconds {
            if evaluations >= search.max_evaluations {
                warn!(
                    "Crossing search for {:?} at {:.1}° exhausted {} evaluations",
                    body, horizon_deg, search.max_evaluations
                );
                return Ok(None);
            }
            let far = sign * (near.abs() + search.step_seconds).min(search.span_seconds);
            let far_value = offset_value(far, &mut evaluations)?;

            let ((early, early_value), (late, late_value)) = match scan {
                Scan::Forward => ((near, near_value), (far, far_value)),
                Scan::Backward => ((far, far_value), (near, near_value)),
            };

            if brackets(early_value, late_value) {
                let remaining = search.max_evaluations.saturating_sub(evaluations);
                return self.refine(
                    early,
                    early_value,
                    late,
                    remaining,
                    &mut |offset| offset_value(offset, &mut evaluations),
                    reference,
                    body,
                    horizon_deg,
                );
            }

            near = far;
            near_value = far_value;
        }

        Ok(None)
    }

    /// Bisect `[early, late]` (offsets from `reference`) down to the tolerance.
    #[allow(clippy::too_many_arguments)]
    fn refine(
        &self,
        mut early: f64,
        early_value: f64,
        mut late: f64,
        budget: usize,
        value_at: &mut dyn FnMut(f64) -> GeometryResult<f64>,
        reference: Instant,
        body: Body,
        horizon_deg: f64,
    ) -> GeometryResult<Option<Instant>> {
        let early_negative = early_value < 0.0;
        let mut spent = 0usize;

        while late - early > self.search.tolerance_seconds {
            if spent >= budget {
                warn!(
                    "Bisection for {:?} at {:.1}° did not converge within {} evaluations",
                    body, horizon_deg, budget
                );
                return Ok(None);
            }
            let mid = 0.5 * (early + late);
            let mid_value = value_at(mid)?;
            spent += 1;
            if (mid_value < 0.0) == early_negative && mid_value != 0.0 {
                early = mid;
            } else {
                late = mid;
            }
        }

        Ok(Some(reference.offset_seconds(0.5 * (early + late))))
    }

    pub fn sun_rise_time(
        &self,
        reference: Instant,
        mode: CrossingMode,
        horizon_deg: f64,
    ) -> GeometryResult<Option<Instant>> {
        self.find_crossing(Body::Sun, reference, horizon_deg, mode, true)
    }

    pub fn sun_set_time(
        &self,
        reference: Instant,
        mode: CrossingMode,
        horizon_deg: f64,
    ) -> GeometryResult<Option<Instant>> {
        self.find_crossing(Body::Sun, reference, horizon_deg, mode, false)
    }

    pub fn moon_rise_time(
        &self,
        reference: Instant,
        mode: CrossingMode,
        horizon_deg: f64,
    ) -> GeometryResult<Option<Instant>> {
        self.find_crossing(Body::Moon, reference, horizon_deg, mode, true)
    }

    pub fn moon_set_time(
        &self,
        reference: Instant,
        mode: CrossingMode,
        horizon_deg: f64,
    ) -> GeometryResult<Option<Instant>> {
        self.find_crossing(Body::Moon, reference, horizon_deg, mode, false)
    }

    pub fn target_rise_time(
        &self,
        target: &Target,
        reference: Instant,
        mode: CrossingMode,
        horizon_deg: f64,
    ) -> GeometryResult<Option<Instant>> {
        self.find_crossing(target.into(), reference, horizon_deg, mode, true)
    }

    pub fn target_set_time(
        &self,
        target: &Target,
        reference: Instant,
        mode: CrossingMode,
        horizon_deg: f64,
    ) -> GeometryResult<Option<Instant>> {
        self.find_crossing(target.into(), reference, horizon_deg, mode, false)
    }
}
