//! # Control loop module
//!
//! Runs the fixed rate perception to actuation loop. Each cycle the latest
//! detections are checked for overrides, and if there are none the frame is
//! passed through line detection and lateral control before the drive and
//! steering demands are sent to the mechanisms.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cycle;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::ovr_mgr::OvrMode;

pub use cycle::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Archived summary of a single cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleRecord {
    /// Cycle number, starting at 0
    pub cycle: u64,

    /// Sum of the cycle timesteps up to and including this one.
    ///
    /// Units: seconds
    pub loop_time_s: f64,

    /// Time since the previous cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// True if the cycle was part of the warm-up
    pub warmup: bool,

    pub mode: OvrMode,

    /// True if a frame was acquired
    pub frame_acquired: bool,

    /// Detected line centre.
    ///
    /// Units: pixels
    pub line_centre_px: Option<u32>,

    /// Lateral error of the line.
    ///
    /// Units: pixels
    pub error_px: Option<i32>,

    /// Unbounded lateral controller output
    pub raw_ctrl: Option<f64>,

    /// Steering angle commanded on this cycle.
    ///
    /// Units: degrees
    pub steer_cmd_deg: Option<f64>,

    /// Drive power commanded on this cycle
    pub drive_power: Option<f64>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during control loop operation.
#[derive(Debug, thiserror::Error)]
pub enum CtrlLoopError {
    #[error("Mechanisms error: {0}")]
    Mech(#[from] comms_if::eqpt::mech::MechError),

    #[error("Line detection error: {0}")]
    LineDet(#[from] crate::line_det::LineDetError),

    #[error("Lateral control error: {0}")]
    LatCtrl(#[from] crate::lat_ctrl::LatCtrlError),

    #[error("Invalid control loop parameters: {0}")]
    InvalidParams(String)
}
