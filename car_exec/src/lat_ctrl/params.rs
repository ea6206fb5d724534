//! Parameters structure for LatCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{LatCtrlError, SteerSign};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for lateral control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    // ---- PID ----

    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// The integral accumulation is limited to `[-integral_limit, +integral_limit]`.
    ///
    /// Units: pixel seconds
    pub integral_limit: f64,

    // ---- STEERING ----

    /// Largest possible lateral error, a raw correction of this size gives
    /// `steer_sensitivity_deg` of steering.
    ///
    /// Units: pixels
    pub max_error_px: f64,

    /// Steering angle produced by a raw correction of `max_error_px`.
    ///
    /// Units: degrees
    pub steer_sensitivity_deg: f64,

    /// Maximum magnitude of the steering demand.
    ///
    /// Units: degrees
    pub max_steer_deg: f64,

    /// Relation between the correction and the servo angle
    pub steer_sign: SteerSign,

    // ---- LINE LOSS ----

    /// What happens to the controller state while the line is not visible
    pub line_loss_policy: LineLossPolicy
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Behaviour of the controller state when the line is lost.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum LineLossPolicy {
    /// Keep the integral and previous error untouched until the line is seen
    /// again.
    Freeze,

    /// Clear the controller state when the line is seen again.
    ResetOnReacquire
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LineLossPolicy {
    fn default() -> Self {
        LineLossPolicy::Freeze
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            k_p: 0.9,
            k_i: 0.0,
            k_d: 0.0,
            integral_limit: 100.0,
            max_error_px: 320.0,
            steer_sensitivity_deg: 40.0,
            max_steer_deg: 35.0,
            steer_sign: SteerSign::Inverted,
            line_loss_policy: LineLossPolicy::Freeze
        }
    }
}

impl Params {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), LatCtrlError> {
        let finite = [
            ("k_p", self.k_p),
            ("k_i", self.k_i),
            ("k_d", self.k_d),
            ("steer_sensitivity_deg", self.steer_sensitivity_deg)
        ];
        for (name, val) in finite.iter() {
            if !val.is_finite() {
                return Err(LatCtrlError::InvalidParams(format!(
                    "{} must be finite, found {}", name, val
                )))
            }
        }

        let positive = [
            ("integral_limit", self.integral_limit),
            ("max_error_px", self.max_error_px),
            ("max_steer_deg", self.max_steer_deg)
        ];
        for (name, val) in positive.iter() {
            if !(val.is_finite() && *val > 0.0) {
                return Err(LatCtrlError::InvalidParams(format!(
                    "{} must be positive and finite, found {}", name, val
                )))
            }
        }

        Ok(())
    }
}
