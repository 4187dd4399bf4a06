//! # Staralt
//!
//! Nightly observing windows and target visibility tracks for a ground
//! observatory.
//!
//! Given a site and a reference instant, the crate derives the sunset/sunrise
//! boundaries of the surrounding night for the civil (0°), nautical (-6°),
//! astronomical (-12°) and night (-18°) horizons, then samples a target's
//! altitude and moon separation over that night and classifies every sample
//! as observable or not.
//!
//! ## Architecture
//!
//! - [`models`]: `Instant`, `Site`, `Target`, `NightWindow`, `VisibilityTrack`
//! - [`geometry`]: the `GeometryProvider` seam and the bundled Meeus ephemeris
//! - [`services`]: horizon crossing solver, night window builder, track generator
//! - [`api`]: query/response DTOs consumed by the frontend
//! - [`config`]: TOML and environment configuration
//! - [`error`]: error taxonomy
//!
//! ## Example
//!
//! ```no_run
//! use staralt::api::{compute_staralt, StaraltQuery};
//! use staralt::geometry::MeeusGeometry;
//! use staralt::models::Site;
//!
//! let site = Site::new(-30.4704, -70.7804, 1580.0, "America/Santiago", "", "7DT")?;
//! let query = StaraltQuery::new(20.5243, -20.245).with_thresholds(30.0, 40.0);
//! let data = compute_staralt(&MeeusGeometry::new(), &site, &query)?;
//! println!("{}", data.to_json(true)?);
//! # Ok::<(), staralt::error::StaraltError>(())
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod geometry;
pub mod models;
pub mod services;

pub use error::{GeometryError, StaraltError, StaraltResult};
