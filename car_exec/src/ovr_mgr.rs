//! # Override manager
//!
//! Tracks the stop and park overrides raised by signs seen by the object
//! detector. An override holds the car stationary for every cycle in which
//! its sign is detected. Entering an override is logged once.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::Serialize;

use comms_if::eqpt::det::{DetClass, DetSet};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Override manager state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OvrMgr {
    state: OvrState
}

/// Override flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OvrState {
    /// Set once a stop sign has been seen, cleared when neither sign is seen
    pub stopped: bool,

    /// Set once a parking sign has been seen, cleared when neither sign is
    /// seen
    pub parked: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Driving mode for a single cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OvrMode {
    /// No override, the car follows the line
    Driving,

    /// Stop sign in view
    Stopped,

    /// Parking sign in view
    Parked
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for OvrMode {
    fn default() -> Self {
        OvrMode::Driving
    }
}

impl OvrMgr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OvrState {
        self.state
    }

    /// Update the overrides from the latest detections and get the mode for
    /// this cycle.
    ///
    /// Parking takes priority over stopping.
    pub fn update(&mut self, dets: &DetSet) -> OvrMode {
        if dets.contains(DetClass::Park) {
            if !self.state.parked {
                info!("Parking sign detected, parking");
            }
            self.state.parked = true;
            OvrMode::Parked
        }
        else if dets.contains(DetClass::Stop) {
            if !self.state.stopped {
                info!("Stop sign detected, stopping");
            }
            self.state.stopped = true;
            OvrMode::Stopped
        }
        else {
            if self.state.parked || self.state.stopped {
                info!("No signs detected, resuming line following");
            }
            self.state = OvrState::default();
            OvrMode::Driving
        }
    }
}
