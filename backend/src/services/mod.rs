//! Service layer: the computations behind every query.
//!
//! Services take plain values (site, target, instants) plus a geometry
//! provider and return plain values. None of them hold state between calls.

pub mod astronomical_night;
pub mod horizon;
pub mod observer_status;
pub mod visibility_computer;

pub use astronomical_night::{compute_astronomical_nights, compute_night_window, tonight};
pub use horizon::{Body, CrossingMode, CrossingSearch, HorizonSolver};
pub use observer_status::{observer_status, ObserverStatus};
pub use visibility_computer::{build_track, build_track_on_grid, sample_instants, TrackGrid};
