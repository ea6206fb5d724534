//! # Lateral control module
//!
//! Converts the lateral line error measured by LineDet into a steering angle
//! demand. A PID controller produces a raw correction which is then scaled,
//! bounded and sign corrected for the steering servo.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod pid;
mod state;
mod steer_map;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use pid::*;
pub use state::*;
pub use steer_map::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LatCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LatCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid lateral control parameters: {0}")]
    InvalidParams(String),

    #[error("Lateral error is not finite: {0}")]
    NonFiniteError(f64),

    #[error("LatCtrl has not been initialised")]
    NotInitialised
}
