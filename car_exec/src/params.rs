//! # Car Executable Parameters
//!
//! This module provide parameters for the car executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::{ctrl_loop, sim::SimParams};
use comms_if::eqpt::det::DetClassMap;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CarExecParams {

    /// Target frequency of the control loop.
    ///
    /// Units: Hertz
    pub cycle_frequency_hz: f64,

    /// Archive a record of every control cycle
    pub archive_enabled: bool,

    /// Control loop parameters
    pub ctrl_loop: ctrl_loop::Params,

    /// Mapping of the detector's class identifiers
    #[serde(default)]
    pub det_class_map: DetClassMap,

    /// Simulated equipment
    pub sim: SimParams
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_files_parse() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../params");

        let exec: CarExecParams = util::params::load_from_path(root.join("car_exec.toml"))
            .unwrap();
        assert_eq!(exec.ctrl_loop.warmup_cycles, 11);
        assert_eq!(exec.det_class_map.stop_class_id, 1);
        assert_eq!(exec.sim.det_windows.len(), 2);
        assert!(matches!(
            exec.sim.cam.line_profile,
            crate::sim::LineProfile::Sine { period_s, .. } if period_s == 4.0
        ));

        // The shipped settings give a usable scheduler and detector
        assert!(crate::ctrl_loop::RateScheduler::new(exec.cycle_frequency_hz).is_ok());
        assert!(crate::sim::SimDetector::new(
            comms_if::eqpt::det::DetHandoff::new(exec.det_class_map),
            exec.sim.det_windows.clone(),
            exec.sim.det_period_s
        ).is_ok());

        let line_det: crate::line_det::Params =
            util::params::load_from_path(root.join("line_det.toml")).unwrap();
        assert!(line_det.validate().is_ok());

        let lat_ctrl: crate::lat_ctrl::Params =
            util::params::load_from_path(root.join("lat_ctrl.toml")).unwrap();
        assert!(lat_ctrl.validate().is_ok());
    }
}
