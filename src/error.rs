use thiserror::Error;

use crate::physics::environment::AngleConvention;
use crate::sim::integrator::IntegrationError;

// ---------------------------------------------------------------------------
// Crate-wide error type
// ---------------------------------------------------------------------------

/// Errors surfaced by construction, commanding, stepping, and persistence.
///
/// Configuration problems fail fast; saturation is never an error (it is
/// clamped and reported through the event sink); integrator failures abort
/// the offending step and leave the engine at its last committed state.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid vehicle envelope: {0}")]
    InvalidEnvelope(String),

    #[error("invalid control gains: {0}")]
    InvalidGains(String),

    #[error("invalid initial conditions: {0}")]
    InvalidInitialConditions(String),

    #[error(
        "commanded trajectory must be finite \
         (velocity {velocity}, flight path angle {flight_path_angle}, heading {heading})"
    )]
    InvalidCommand {
        velocity: f64,
        flight_path_angle: f64,
        heading: f64,
    },

    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),

    #[error("invalid simulation options: {0}")]
    InvalidOptions(String),

    #[error("guidance requires angles in radians, envelope declares {0:?}")]
    UnsupportedAngleConvention(AngleConvention),

    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
