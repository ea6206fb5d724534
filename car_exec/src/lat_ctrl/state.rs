//! Implementations for the LatCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::{LatCtrlError, LineLossPolicy, Params, PidController, PidState, SteerDem, SteerMap};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lateral control module state
#[derive(Default)]
pub struct LatCtrl {
    pub(crate) params: Params,

    /// Controller and map, `None` until initialised.
    ctrl: Option<Controllers>,

    /// Set while the line is not visible.
    line_lost: bool,

    pub(crate) report: StatusReport
}

struct Controllers {
    pid: PidController,
    steer_map: SteerMap
}

/// Input data to lateral control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Lateral error of the line.
    ///
    /// Units: pixels
    pub error_px: f64,

    /// Time since the previous cycle.
    ///
    /// Units: seconds
    pub dt_s: f64
}

/// Status report for LatCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Unbounded controller output
    pub raw_ctrl: f64,

    /// Integral accumulation after this cycle
    pub integral: f64,

    /// True if the derivative term was dropped as the timestep was not positive
    pub deriv_suppressed: bool,

    /// True if the steering demand was limited
    pub steer_limited: bool,

    /// True if the controller state was reset on this cycle
    pub state_reset: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LatCtrl {
    /// Create a new initialised instance with zero controller state.
    pub fn new(params: Params) -> Result<Self, LatCtrlError> {
        Self::with_state(params, PidState::default())
    }

    /// Create a new initialised instance starting from the given controller
    /// state.
    pub fn with_state(params: Params, state: PidState) -> Result<Self, LatCtrlError> {
        params.validate()?;

        let ctrl = Controllers {
            pid: PidController::with_state(
                params.k_p,
                params.k_i,
                params.k_d,
                params.integral_limit,
                state
            ),
            steer_map: SteerMap::from_params(&params)
        };

        Ok(Self {
            params,
            ctrl: Some(ctrl),
            line_lost: false,
            report: StatusReport::default()
        })
    }

    /// Notify the controller that no line was found on this cycle.
    pub fn line_lost(&mut self) {
        if !self.line_lost {
            trace!("LatCtrl line lost, policy {:?}", self.params.line_loss_policy);
        }
        self.line_lost = true;
    }

    /// Current controller state, if initialised.
    pub fn pid_state(&self) -> Option<PidState> {
        self.ctrl.as_ref().map(|c| c.pid.state())
    }
}

impl State for LatCtrl {
    type InitData = &'static str;
    type InitError = LatCtrlError;

    type InputData = InputData;
    type OutputData = SteerDem;
    type StatusReport = StatusReport;
    type ProcError = LatCtrlError;

    /// Initialise the LatCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        let params: Params = params::load(init_data)
            .map_err(LatCtrlError::ParamLoadError)?;

        *self = Self::new(params)?;

        Ok(())
    }

    /// Compute the steering demand for this cycle's lateral error.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        self.report = StatusReport::default();

        let ctrl = match self.ctrl.as_mut() {
            Some(c) => c,
            None => return Err(LatCtrlError::NotInitialised)
        };

        if !input_data.error_px.is_finite() {
            return Err(LatCtrlError::NonFiniteError(input_data.error_px));
        }

        // Line reacquired
        if self.line_lost {
            self.line_lost = false;
            if self.params.line_loss_policy == LineLossPolicy::ResetOnReacquire {
                debug!("Line reacquired, resetting lateral controller");
                ctrl.pid.reset();
                self.report.state_reset = true;
            }
        }

        let raw_ctrl = ctrl.pid.compute(input_data.error_px, input_data.dt_s);
        let dem = ctrl.steer_map.map(raw_ctrl);

        self.report.raw_ctrl = raw_ctrl;
        self.report.integral = ctrl.pid.state().integral;
        self.report.deriv_suppressed = input_data.dt_s <= 0.0;
        self.report.steer_limited = dem.limited;

        trace!(
            "LatCtrl error {} px -> raw {:.3}, steer {:.3} deg",
            input_data.error_px, raw_ctrl, dem.cmd_deg
        );

        Ok((dem, self.report))
    }
}
