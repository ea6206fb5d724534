//! Parameters for the simulated equipment

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the whole simulation.
#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {
    /// Simulated camera
    pub cam: SimCamParams,

    /// Period at which the simulated detector publishes.
    ///
    /// Units: seconds
    pub det_period_s: f64,

    /// Time windows in which objects are detected
    #[serde(default)]
    pub det_windows: Vec<DetWindow>
}

/// Parameters for the simulated camera.
#[derive(Debug, Clone, Deserialize)]
pub struct SimCamParams {
    /// Units: pixels
    pub width: u32,

    /// Units: pixels
    pub height: u32,

    /// Frame rate used to compute the time of each frame.
    ///
    /// Units: Hertz
    pub frame_rate_hz: f64,

    /// Width of the line drawn on the ground. The rendered stripe is one
    /// pixel wider for even widths so it is symmetric about its centre.
    ///
    /// Units: pixels
    pub stripe_width_px: u32,

    /// Every nth frame is dropped, 0 to never drop frames.
    pub drop_every_n_frames: u64,

    /// Position of the line over time
    pub line_profile: LineProfile
}

/// A window of time in which an object is detected.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DetWindow {
    /// Units: seconds
    pub start_s: f64,

    /// Units: seconds
    pub end_s: f64,

    /// Raw class identifier reported by the detector
    pub class_id: u16,

    pub confidence: f32
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Horizontal position of the line centre in the image over time.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub enum LineProfile {
    /// Line at a fixed column
    Fixed {
        /// Units: pixels
        centre_px: f64
    },

    /// Line oscillating sinusoidally about a column
    Sine {
        /// Units: pixels
        centre_px: f64,

        /// Units: pixels
        amplitude_px: f64,

        /// Units: seconds
        period_s: f64
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LineProfile {
    /// Line centre at the given time.
    pub fn centre_at(&self, t_s: f64) -> f64 {
        match *self {
            LineProfile::Fixed { centre_px } => centre_px,
            LineProfile::Sine { centre_px, amplitude_px, period_s } => {
                centre_px
                    + amplitude_px * (2.0 * std::f64::consts::PI * t_s / period_s).sin()
            }
        }
    }
}

impl DetWindow {
    pub fn is_active(&self, t_s: f64) -> bool {
        t_s >= self.start_s && t_s < self.end_s
    }
}
