//! # Mechanisms Equipment Interface
//!
//! The car has a single steering servo and a single drive motor.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Direction of the drive motor.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub enum DrvDir {
    Forward,
    Backward
}

/// A single command sent to the mechanisms.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum MechCmd {
    /// Steering servo angle demand.
    ///
    /// Units: degrees, in the servo's own sign convention
    SteerDeg(f64),

    /// Drive motor demand.
    Drive {
        /// Drive power, 0 being stationary.
        power: f64,
        dir: DrvDir
    },

    /// Stop all actuators.
    Stop
}

/// Errors raised by a mechanisms driver.
#[derive(Debug, thiserror::Error)]
pub enum MechError {
    #[error("The mechanisms rejected the command {0:?}: {1}")]
    Rejected(MechCmd, String)
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A sink for steering and drive commands.
pub trait MechSink {
    /// Set the steering servo angle in degrees.
    fn set_steer_deg(&mut self, angle_deg: f64) -> Result<(), MechError>;

    /// Set the drive motor power and direction.
    fn set_drive(&mut self, power: f64, dir: DrvDir) -> Result<(), MechError>;

    /// Stop all actuators.
    fn stop(&mut self) -> Result<(), MechError>;

    /// Send a generic command to the sink.
    fn send(&mut self, cmd: MechCmd) -> Result<(), MechError> {
        match cmd {
            MechCmd::SteerDeg(a) => self.set_steer_deg(a),
            MechCmd::Drive { power, dir } => self.set_drive(power, dir),
            MechCmd::Stop => self.stop()
        }
    }
}
