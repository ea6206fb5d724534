//! # Simulation module
//!
//! Simulated equipment for running the control loop without the car. The
//! camera renders a line at a scripted position, the mechanisms record every
//! command, the detector publishes a scripted timeline of detections and the
//! scheduler steps with a fixed timestep without sleeping.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod sim_cam;
mod sim_det;
mod sim_mech;
mod sim_sched;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use sim_cam::*;
pub use sim_det::*;
pub use sim_mech::*;
pub use sim_sched::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised while setting up the simulated equipment.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Invalid simulation parameters: {0}")]
    InvalidParams(String)
}
