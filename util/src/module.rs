//! Processing module interface
//!
//! The processing modules of `car_exec` (`line_det`, `lat_ctrl`) are
//! initialised once from their parameter file and then run once per control
//! cycle through [`State`].

use crate::session::Session;

/// A processing module and the state it keeps between cycles.
pub trait State {
    /// Data needed by [`State::init`], usually the parameter file name.
    type InitData;
    type InitError;

    type InputData;
    type OutputData;

    /// Diagnostics produced alongside the output of each cycle.
    type StatusReport;
    type ProcError;

    /// Initialise the module, replacing any previous state.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one cycle of the module.
    ///
    /// Returns the output and the status report for the cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
