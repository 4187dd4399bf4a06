//! Error types for observing-window computations.
//!
//! The core is purely computational, so errors fall into two groups:
//! invalid input (site configuration, target coordinates, instants) that is
//! surfaced immediately, and geometry provider failures that are propagated
//! unchanged. A horizon crossing that does not exist is not an error; it is
//! reported as `None` by the solver.

/// Result type for observing-window operations.
pub type StaraltResult<T> = Result<T, StaraltError>;

/// Result type for geometry provider calls.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Failure reported by a [`GeometryProvider`](crate::geometry::GeometryProvider).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// The instant lies outside the range the provider's series are valid for.
    #[error("Instant {instant} is outside the provider validity range ({min_year}..{max_year})")]
    OutOfRange {
        instant: String,
        min_year: i32,
        max_year: i32,
    },

    /// A computed quantity was NaN or infinite.
    #[error("Non-finite {quantity} computed at {instant}")]
    NonFinite { quantity: &'static str, instant: String },

    /// A SOFA routine rejected its inputs.
    #[error("SOFA {routine} failed at {instant}: status {status}")]
    Transform {
        routine: &'static str,
        instant: String,
        status: String,
    },
}

/// Error type for site, target and track operations.
#[derive(Debug, thiserror::Error)]
pub enum StaraltError {
    /// Invalid site parameters or configuration file. Fatal at construction.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed or out-of-range target coordinates.
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Malformed reference instant at the query boundary.
    #[error("Invalid instant: {0}")]
    InvalidInstant(String),

    /// The astronomical twilight crossings needed to bound a track are undefined.
    #[error("Degenerate night window: {0}")]
    DegenerateWindow(String),

    /// Geometry provider failure, propagated unchanged.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Query boundary serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StaraltError {
    /// Whether the error was caused by caller input (as opposed to the provider).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            StaraltError::Configuration(_)
                | StaraltError::InvalidTarget(_)
                | StaraltError::InvalidInstant(_)
        )
    }
}
