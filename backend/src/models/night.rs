//! Twilight boundaries bracketing one reference instant.

use serde::{Deserialize, Serialize};

use crate::models::Instant;

/// Sun-altitude thresholds that delimit twilight levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Twilight {
    Civil,
    Nautical,
    Astronomical,
    Night,
}

impl Twilight {
    /// Shallowest first.
    pub const ALL: [Twilight; 4] = [
        Twilight::Civil,
        Twilight::Nautical,
        Twilight::Astronomical,
        Twilight::Night,
    ];

    pub fn horizon_deg(self) -> f64 {
        match self {
            Twilight::Civil => 0.0,
            Twilight::Nautical => -6.0,
            Twilight::Astronomical => -12.0,
            Twilight::Night => -18.0,
        }
    }

    /// The next shallower level, if any.
    pub fn shallower(self) -> Option<Twilight> {
        match self {
            Twilight::Civil => None,
            Twilight::Nautical => Some(Twilight::Civil),
            Twilight::Astronomical => Some(Twilight::Nautical),
            Twilight::Night => Some(Twilight::Astronomical),
        }
    }
}

/// Sunset/sunrise pairs for the four twilight levels of one night.
///
/// A `None` field means the sun did not cross that horizon inside the search
/// span (polar day or night).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NightWindow {
    pub reference: Instant,
    pub sunset_civil: Option<Instant>,
    pub sunrise_civil: Option<Instant>,
    pub sunset_nautical: Option<Instant>,
    pub sunrise_nautical: Option<Instant>,
    pub sunset_astro: Option<Instant>,
    pub sunrise_astro: Option<Instant>,
    pub sunset_night: Option<Instant>,
    pub sunrise_night: Option<Instant>,
}

impl NightWindow {
    /// A window with every boundary undefined.
    pub fn empty(reference: Instant) -> Self {
        Self {
            reference,
            sunset_civil: None,
            sunrise_civil: None,
            sunset_nautical: None,
            sunrise_nautical: None,
            sunset_astro: None,
            sunrise_astro: None,
            sunset_night: None,
            sunrise_night: None,
        }
    }

    /// (sunset, sunrise) for a twilight level.
    pub fn boundaries(&self, level: Twilight) -> (Option<Instant>, Option<Instant>) {
        match level {
            Twilight::Civil => (self.sunset_civil, self.sunrise_civil),
            Twilight::Nautical => (self.sunset_nautical, self.sunrise_nautical),
            Twilight::Astronomical => (self.sunset_astro, self.sunrise_astro),
            Twilight::Night => (self.sunset_night, self.sunrise_night),
        }
    }

    pub fn set_boundaries(
        &mut self,
        level: Twilight,
        sunset: Option<Instant>,
        sunrise: Option<Instant>,
    ) {
        let (set, rise) = match level {
            Twilight::Civil => (&mut self.sunset_civil, &mut self.sunrise_civil),
            Twilight::Nautical => (&mut self.sunset_nautical, &mut self.sunrise_nautical),
            Twilight::Astronomical => (&mut self.sunset_astro, &mut self.sunrise_astro),
            Twilight::Night => (&mut self.sunset_night, &mut self.sunrise_night),
        };
        *set = sunset;
        *rise = sunrise;
    }

    /// Both ends of a level, when both were found.
    pub fn bounds(&self, level: Twilight) -> Option<(Instant, Instant)> {
        match self.boundaries(level) {
            (Some(set), Some(rise)) => Some((set, rise)),
            _ => None,
        }
    }

    pub fn astronomical_bounds(&self) -> Option<(Instant, Instant)> {
        self.bounds(Twilight::Astronomical)
    }

    pub fn night_bounds(&self) -> Option<(Instant, Instant)> {
        self.bounds(Twilight::Night)
    }

    /// True when a visibility track cannot be built: the astronomical
    /// window or the -18° night is missing an end.
    pub fn is_degenerate(&self) -> bool {
        self.astronomical_bounds().is_none() || self.night_bounds().is_none()
    }

    /// Whether `instant` lies inside the -18° night, boundaries included.
    ///
    /// An undefined night contains nothing.
    pub fn contains_night(&self, instant: Instant) -> bool {
        match self.night_bounds() {
            Some((start, end)) => instant >= start && instant <= end,
            None => false,
        }
    }

    /// Checks civil ⊇ nautical ⊇ astronomical ⊇ night over the levels that
    /// were found.
    pub fn is_nested(&self) -> bool {
        let found: Vec<(Instant, Instant)> =
            Twilight::ALL.iter().filter_map(|&l| self.bounds(l)).collect();
        found.iter().all(|(set, rise)| set <= rise)
            && found
                .windows(2)
                .all(|pair| pair[0].0 <= pair[1].0 && pair[1].1 <= pair[0].1)
    }
}
