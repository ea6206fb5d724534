//! Simulated mechanisms

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

use comms_if::eqpt::mech::{DrvDir, MechCmd, MechError, MechSink};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mechanisms which record every command they accept.
#[derive(Debug, Clone, Default)]
pub struct SimMech {
    history: Vec<MechCmd>,

    /// Number of commands received, including rejected ones
    num_received: usize,

    /// Index of a received command to reject
    fail_on_cmd: Option<usize>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimMech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the command with the given index, counting from 0. Rejected
    /// commands are not recorded.
    pub fn failing_on(mut self, cmd_index: usize) -> Self {
        self.fail_on_cmd = Some(cmd_index);
        self
    }

    /// All accepted commands, oldest first.
    pub fn history(&self) -> &[MechCmd] {
        &self.history
    }

    /// The most recently accepted steering demand.
    pub fn last_steer_deg(&self) -> Option<f64> {
        self.history.iter().rev().find_map(|c| match c {
            MechCmd::SteerDeg(a) => Some(*a),
            _ => None
        })
    }

    fn accept(&mut self, cmd: MechCmd) -> Result<(), MechError> {
        let index = self.num_received;
        self.num_received += 1;

        if self.fail_on_cmd == Some(index) {
            return Err(MechError::Rejected(cmd, format!("simulated failure on command {}", index)));
        }

        trace!("SimMech command {}: {:?}", index, cmd);
        self.history.push(cmd);

        Ok(())
    }
}

impl MechSink for SimMech {
    fn set_steer_deg(&mut self, angle_deg: f64) -> Result<(), MechError> {
        self.accept(MechCmd::SteerDeg(angle_deg))
    }

    fn set_drive(&mut self, power: f64, dir: DrvDir) -> Result<(), MechError> {
        self.accept(MechCmd::Drive { power, dir })
    }

    fn stop(&mut self) -> Result<(), MechError> {
        self.accept(MechCmd::Stop)
    }
}
