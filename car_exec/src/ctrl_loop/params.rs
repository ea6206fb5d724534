//! Parameters structure for CtrlLoop

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::CtrlLoopError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the control loop.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Number of cycles at the start of the run in which no commands are sent
    /// to the mechanisms, giving the camera and detector time to start.
    pub warmup_cycles: u64,

    /// Forwards drive power while following the line.
    pub drive_power: f64,

    /// Number of cycles in a row without a frame after which steering and
    /// drive are zeroed.
    pub max_consec_no_frame_cycles: u64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            warmup_cycles: 11,
            drive_power: 0.1,
            max_consec_no_frame_cycles: 5
        }
    }
}

impl Params {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), CtrlLoopError> {
        if !(self.drive_power.is_finite() && self.drive_power >= 0.0) {
            return Err(CtrlLoopError::InvalidParams(format!(
                "drive_power must be finite and not negative, found {}",
                self.drive_power
            )));
        }

        Ok(())
    }
}
