//! Configuration file support.
//!
//! Site, crossing-search and track settings are read from a TOML file; every
//! section and key is optional and falls back to the 7DT defaults. Site values
//! can also be overridden from `OBSERVER_*` environment variables.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{StaraltError, StaraltResult};
use crate::models::{ObservabilityThresholds, Site};
use crate::services::{CrossingSearch, TrackGrid};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaraltConfig {
    #[serde(default)]
    pub site: SiteSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub track: TrackSettings,
}

/// Observatory location and identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default = "default_elevation")]
    pub elevation: f64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub observer_name: String,
    #[serde(default = "default_observatory_name")]
    pub observatory_name: String,
}

/// Horizon crossing search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_coarse_step_minutes")]
    pub coarse_step_minutes: f64,
    #[serde(default = "default_span_hours")]
    pub span_hours: f64,
    #[serde(default = "default_tolerance_seconds")]
    pub tolerance_seconds: f64,
    #[serde(default = "default_max_evaluations")]
    pub max_evaluations: usize,
}

/// Visibility track defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSettings {
    #[serde(default = "default_min_altitude_deg")]
    pub min_altitude_deg: f64,
    #[serde(default = "default_min_moonsep_deg")]
    pub min_moonsep_deg: f64,
    #[serde(default = "default_padding_hours")]
    pub padding_hours: f64,
    #[serde(default = "default_cadence_minutes")]
    pub cadence_minutes: f64,
}

fn default_latitude() -> f64 {
    -30.4704
}

fn default_longitude() -> f64 {
    -70.7804
}

fn default_elevation() -> f64 {
    1580.0
}

fn default_timezone() -> String {
    "America/Santiago".to_string()
}

fn default_observatory_name() -> String {
    "7DT".to_string()
}

fn default_coarse_step_minutes() -> f64 {
    10.0
}

fn default_span_hours() -> f64 {
    36.0
}

fn default_tolerance_seconds() -> f64 {
    0.5
}

fn default_max_evaluations() -> usize {
    20_000
}

fn default_min_altitude_deg() -> f64 {
    20.0
}

fn default_min_moonsep_deg() -> f64 {
    30.0
}

fn default_padding_hours() -> f64 {
    2.0
}

fn default_cadence_minutes() -> f64 {
    5.0
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            elevation: default_elevation(),
            timezone: default_timezone(),
            observer_name: String::new(),
            observatory_name: default_observatory_name(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            coarse_step_minutes: default_coarse_step_minutes(),
            span_hours: default_span_hours(),
            tolerance_seconds: default_tolerance_seconds(),
            max_evaluations: default_max_evaluations(),
        }
    }
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            min_altitude_deg: default_min_altitude_deg(),
            min_moonsep_deg: default_min_moonsep_deg(),
            padding_hours: default_padding_hours(),
            cadence_minutes: default_cadence_minutes(),
        }
    }
}

/// Environment variables that override `[site]` keys.
pub const ENV_LATITUDE: &str = "OBSERVER_LATITUDE";
pub const ENV_LONGITUDE: &str = "OBSERVER_LONGITUDE";
pub const ENV_ELEVATION: &str = "OBSERVER_ELEVATION";
pub const ENV_TIMEZONE: &str = "OBSERVER_TIMEZONE";
pub const ENV_NAME: &str = "OBSERVER_NAME";
pub const ENV_OBSERVATORY: &str = "OBSERVER_OBSERVATORY";

// Upper bounds on search and grid settings, keeping instant arithmetic in range.
const MAX_STEP_MINUTES: f64 = 60.0;
const MAX_SPAN_HOURS: f64 = 240.0;
const MAX_TOLERANCE_SECONDS: f64 = 3_600.0;
const MAX_CADENCE_MINUTES: f64 = 1_440.0;
const MAX_PADDING_HOURS: f64 = 48.0;

impl StaraltConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// `StaraltError::Configuration` if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> StaraltResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            StaraltError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> StaraltResult<Self> {
        toml::from_str(content).map_err(|e| {
            StaraltError::Configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `staralt.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    ///
    /// # Errors
    /// `StaraltError::Configuration` if no file is found or it fails to parse.
    pub fn from_default_location() -> StaraltResult<Self> {
        let search_paths = [
            PathBuf::from("staralt.toml"),
            PathBuf::from("backend/staralt.toml"),
            PathBuf::from("../staralt.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(StaraltError::Configuration(
            "No staralt.toml found in standard locations".to_string(),
        ))
    }

    /// Apply `OBSERVER_*` environment overrides to the `[site]` section.
    pub fn with_env_overrides(self) -> StaraltResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply site overrides from an arbitrary key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> StaraltResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str| -> StaraltResult<Option<f64>> {
            match lookup(key) {
                Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| {
                    StaraltError::Configuration(format!("{} is not a number: '{}'", key, raw))
                }),
                None => Ok(None),
            }
        };

        if let Some(v) = number(ENV_LATITUDE)? {
            self.site.latitude = v;
        }
        if let Some(v) = number(ENV_LONGITUDE)? {
            self.site.longitude = v;
        }
        if let Some(v) = number(ENV_ELEVATION)? {
            self.site.elevation = v;
        }
        if let Some(v) = lookup(ENV_TIMEZONE) {
            self.site.timezone = v;
        }
        if let Some(v) = lookup(ENV_NAME) {
            self.site.observer_name = v;
        }
        if let Some(v) = lookup(ENV_OBSERVATORY) {
            self.site.observatory_name = v;
        }
        Ok(self)
    }

    /// Validated site.
    pub fn site(&self) -> StaraltResult<Site> {
        let s = &self.site;
        Site::new(
            s.latitude,
            s.longitude,
            s.elevation,
            &s.timezone,
            s.observer_name.clone(),
            s.observatory_name.clone(),
        )
    }

    pub fn search(&self) -> StaraltResult<CrossingSearch> {
        let s = &self.search;
        let positive = |name: &str, v: f64, max: f64| {
            if v.is_finite() && v > 0.0 && v <= max {
                Ok(v)
            } else {
                Err(StaraltError::Configuration(format!(
                    "search.{} must be in (0, {}], got {}",
                    name, max, v
                )))
            }
        };
        if s.max_evaluations == 0 {
            return Err(StaraltError::Configuration(
                "search.max_evaluations must be positive".to_string(),
            ));
        }
        Ok(CrossingSearch {
            step_seconds: positive("coarse_step_minutes", s.coarse_step_minutes, MAX_STEP_MINUTES)?
                * 60.0,
            span_seconds: positive("span_hours", s.span_hours, MAX_SPAN_HOURS)? * 3600.0,
            tolerance_seconds: positive(
                "tolerance_seconds",
                s.tolerance_seconds,
                MAX_TOLERANCE_SECONDS,
            )?,
            max_evaluations: s.max_evaluations,
        })
    }

    pub fn grid(&self) -> StaraltResult<TrackGrid> {
        let t = &self.track;
        if !(t.cadence_minutes.is_finite()
            && t.cadence_minutes > 0.0
            && t.cadence_minutes <= MAX_CADENCE_MINUTES)
        {
            return Err(StaraltError::Configuration(format!(
                "track.cadence_minutes must be in (0, {}], got {}",
                MAX_CADENCE_MINUTES, t.cadence_minutes
            )));
        }
        if !(t.padding_hours.is_finite()
            && t.padding_hours >= 0.0
            && t.padding_hours <= MAX_PADDING_HOURS)
        {
            return Err(StaraltError::Configuration(format!(
                "track.padding_hours must be in [0, {}], got {}",
                MAX_PADDING_HOURS, t.padding_hours
            )));
        }
        Ok(TrackGrid {
            padding_seconds: t.padding_hours * 3600.0,
            cadence_seconds: t.cadence_minutes * 60.0,
        })
    }

    pub fn thresholds(&self) -> StaraltResult<ObservabilityThresholds> {
        ObservabilityThresholds::new(self.track.min_altitude_deg, self.track.min_moonsep_deg)
            .map_err(|e| StaraltError::Configuration(e.to_string()))
    }
}
