//! Query boundary.
//!
//! DTOs exchanged with the embedding layer plus [`StaraltContext`], which runs
//! a query end to end: normalize the target, build the night window around the
//! reference instant, build and serialize the visibility track.
//!
//! The serialized field names and per-sample list alignment of [`StaraltData`]
//! are consumed verbatim by the existing frontend.

use serde::{Deserialize, Serialize};

use crate::error::{StaraltError, StaraltResult};
use crate::geometry::GeometryProvider;
use crate::models::{
    CoordinateInput, Instant, NightWindow, ObservabilityThresholds, Site, Target, VisibilityTrack,
};
use crate::services::{
    astronomical_night, visibility_computer, CrossingSearch, HorizonSolver, TrackGrid,
};

/// Incoming staralt request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaraltQuery {
    pub ra: CoordinateInput,
    pub dec: CoordinateInput,
    #[serde(default)]
    pub objname: Option<String>,
    #[serde(default)]
    pub target_minalt: Option<f64>,
    #[serde(default)]
    pub target_minmoonsep: Option<f64>,
    /// RFC 3339 or naive UTC timestamp; omitted means now.
    #[serde(default)]
    pub reference_instant: Option<String>,
}

impl StaraltQuery {
    pub fn new(ra: impl Into<CoordinateInput>, dec: impl Into<CoordinateInput>) -> Self {
        Self {
            ra: ra.into(),
            dec: dec.into(),
            objname: None,
            target_minalt: None,
            target_minmoonsep: None,
            reference_instant: None,
        }
    }

    pub fn with_objname(mut self, objname: impl Into<String>) -> Self {
        self.objname = Some(objname.into());
        self
    }

    pub fn with_thresholds(mut self, minalt: f64, minmoonsep: f64) -> Self {
        self.target_minalt = Some(minalt);
        self.target_minmoonsep = Some(minmoonsep);
        self
    }

    pub fn with_reference(mut self, reference: Instant) -> Self {
        self.reference_instant = Some(reference.to_string());
        self
    }

    /// Parsed reference instant, or the current time when omitted.
    pub fn resolve_reference(&self) -> StaraltResult<Instant> {
        match &self.reference_instant {
            Some(text) => text.parse(),
            None => Ok(Instant::now()),
        }
    }

    pub fn target(&self) -> StaraltResult<Target> {
        Target::from_inputs(&self.ra, &self.dec, self.objname.clone())
    }
}

/// Night boundaries echoed to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonightData {
    pub sunset_night: Option<String>,
    pub sunrise_night: Option<String>,
    pub sunset_civil: Option<String>,
    pub sunrise_civil: Option<String>,
}

impl From<&NightWindow> for TonightData {
    fn from(window: &NightWindow) -> Self {
        let iso = |t: Option<Instant>| t.map(|t| t.isoformat());
        Self {
            sunset_night: iso(window.sunset_night),
            sunrise_night: iso(window.sunrise_night),
            sunset_civil: iso(window.sunset_civil),
            sunrise_civil: iso(window.sunrise_civil),
        }
    }
}

/// Serialized visibility track. Every list has one entry per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaraltData {
    pub objname: Option<String>,
    /// Wall-clock time the response was produced, not the query's reference instant.
    pub now_datetime: String,
    pub time_range_start: String,
    pub time_range_end: String,
    pub moon_times: Vec<String>,
    pub moon_alts: Vec<f64>,
    pub sun_times: Vec<String>,
    pub sun_alts: Vec<f64>,
    pub target_times: Vec<String>,
    pub target_alts: Vec<f64>,
    pub target_moonsep: Vec<f64>,
    /// `"g"` observable, `"r"` not.
    pub color_target: Vec<String>,
    pub tonight: TonightData,
    pub target_minalt: f64,
    pub target_minmoonsep: f64,
}

impl From<&VisibilityTrack> for StaraltData {
    fn from(track: &VisibilityTrack) -> Self {
        Self::from_track(track, Instant::now())
    }
}

impl StaraltData {
    /// Serialize `track`, stamping `now` as the response time.
    pub fn from_track(track: &VisibilityTrack, now: Instant) -> Self {
        let times: Vec<String> = track.samples.iter().map(|s| s.instant.isoformat()).collect();
        Self {
            objname: track.target.name().map(str::to_string),
            now_datetime: now.isoformat(),
            time_range_start: track.range_start.isoformat(),
            time_range_end: track.range_end.isoformat(),
            moon_times: times.clone(),
            moon_alts: track.samples.iter().map(|s| s.moon_alt).collect(),
            sun_times: times.clone(),
            sun_alts: track.samples.iter().map(|s| s.sun_alt).collect(),
            target_times: times,
            target_alts: track.samples.iter().map(|s| s.target_alt).collect(),
            target_moonsep: track.samples.iter().map(|s| s.moon_separation_deg).collect(),
            color_target: track
                .samples
                .iter()
                .map(|s| if s.is_observable { "g" } else { "r" }.to_string())
                .collect(),
            tonight: TonightData::from(&track.window),
            target_minalt: track.thresholds.min_altitude_deg,
            target_minmoonsep: track.thresholds.min_moonsep_deg,
        }
    }

    pub fn len(&self) -> usize {
        self.target_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target_times.is_empty()
    }

    pub fn to_json(&self, pretty: bool) -> StaraltResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Everything a query needs besides its own parameters.
pub struct StaraltContext<'a, G: GeometryProvider + ?Sized> {
    geometry: &'a G,
    site: &'a Site,
    search: CrossingSearch,
    grid: TrackGrid,
    defaults: ObservabilityThresholds,
}

impl<'a, G: GeometryProvider + ?Sized> StaraltContext<'a, G> {
    pub fn new(geometry: &'a G, site: &'a Site) -> Self {
        Self {
            geometry,
            site,
            search: CrossingSearch::default(),
            grid: TrackGrid::default(),
            defaults: ObservabilityThresholds::default(),
        }
    }

    pub fn with_search(mut self, search: CrossingSearch) -> Self {
        self.search = search;
        self
    }

    pub fn with_grid(mut self, grid: TrackGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Thresholds applied when a query omits them.
    pub fn with_default_thresholds(mut self, defaults: ObservabilityThresholds) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn site(&self) -> &Site {
        self.site
    }

    pub fn solver(&self) -> HorizonSolver<'a, G> {
        HorizonSolver::new(self.geometry, self.site).with_search(self.search)
    }

    pub fn night_window(&self, reference: Instant) -> StaraltResult<NightWindow> {
        Ok(astronomical_night::compute_night_window(&self.solver(), reference)?)
    }

    pub fn track(
        &self,
        target: &Target,
        thresholds: ObservabilityThresholds,
        reference: Instant,
    ) -> StaraltResult<VisibilityTrack> {
        let window = self.night_window(reference)?;
        visibility_computer::build_track_on_grid(
            self.geometry,
            self.site,
            target,
            &window,
            thresholds,
            Some(reference),
            self.grid,
        )
    }

    /// Run a query end to end.
    ///
    /// # Errors
    /// * `InvalidTarget` for malformed coordinates or thresholds
    /// * `InvalidInstant` for an unparseable reference instant
    /// * `DegenerateWindow` when the astronomical twilight or the -18° night is undefined
    /// * `Geometry` when the provider fails
    pub fn staralt(&self, query: &StaraltQuery) -> StaraltResult<StaraltData> {
        let target = query.target()?;
        let thresholds = ObservabilityThresholds::from_options(
            query.target_minalt,
            query.target_minmoonsep,
            self.defaults,
        )?;
        let reference = query.resolve_reference()?;
        let track = self.track(&target, thresholds, reference)?;
        Ok(StaraltData::from(&track))
    }
}

/// Run a query with default search, grid and thresholds.
pub fn compute_staralt<G: GeometryProvider + ?Sized>(
    geometry: &G,
    site: &Site,
    query: &StaraltQuery,
) -> StaraltResult<StaraltData> {
    StaraltContext::new(geometry, site).staralt(query)
}

/// Parse a JSON query body.
pub fn parse_query(json: &str) -> StaraltResult<StaraltQuery> {
    serde_json::from_str(json).map_err(StaraltError::from)
}
