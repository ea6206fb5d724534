//! # Car library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the car crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Control loop - sequences detection checks, line detection, lateral control and actuation
pub mod ctrl_loop;

/// Lateral control module - converts the line error into a bounded steering demand
pub mod lat_ctrl;

/// Line detection module - finds the line in the bottom of the camera frame
pub mod line_det;

/// Override manager - stop and park overrides from detected signs
pub mod ovr_mgr;

/// Car executable parameters
pub mod params;

/// Simulated equipment for running the car without hardware
pub mod sim;
