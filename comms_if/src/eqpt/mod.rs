//! # Equipment Interface
//!
//! This module defines the interfaces through which the control loop talks to the car's
//! equipment. Drivers for the real hardware live outside this workspace and implement the traits
//! defined here.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cam;
pub mod det;
pub mod mech;
