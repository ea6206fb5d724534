//! # Line detection module
//!
//! Extracts the lateral position of the line ahead of the car from a camera frame. A horizontal
//! band near the bottom of the frame is blurred and passed through a Canny edge detector, the
//! line centre is taken as the midpoint of the leftmost and rightmost edge columns in the band.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod edges;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use edges::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The line position measured in a single frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LineError {
    /// Column of the detected line centre.
    ///
    /// Units: pixels
    pub line_centre_px: u32,

    /// Horizontal image centre minus the line centre. Positive if the line is
    /// to the left of the image centre, meaning the car must steer left.
    ///
    /// Units: pixels
    pub error_px: i32
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Output of line detection for one frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LineDetOutput {
    /// No frame was given
    NoFrame,

    /// Fewer than two edge columns were found in the detection band
    NoLine,

    /// A line was found
    Line(LineError)
}

/// Possible errors that can occur during LineDet operation.
#[derive(Debug, thiserror::Error)]
pub enum LineDetError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid line detection parameters: {0}")]
    InvalidParams(String),

    #[error("LineDet has not been initialised")]
    NotInitialised
}
