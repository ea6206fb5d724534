//! # Communications interface crate.
//!
//! Provides the interfaces between the control software and the car's equipment: the camera, the
//! steering and drive mechanisms, and the object detector.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Interface definitions for equipment (camera, mechanisms, detector)
pub mod eqpt;
