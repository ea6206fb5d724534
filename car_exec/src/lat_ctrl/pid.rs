//! # PID controller
//!
//! Discrete PID controller with a bounded integral. The caller supplies the
//! timestep, so the controller is deterministic and can be driven in
//! simulation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Magnitude limit of the integral accumulation
    integral_limit: f64,

    state: PidState
}

/// Values carried by the controller between calls.
#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq)]
pub struct PidState {
    /// The integral accumulation
    pub integral: f64,

    /// Previous error
    pub prev_error: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains and zero state.
    pub fn new(k_p: f64, k_i: f64, k_d: f64, integral_limit: f64) -> Self {
        Self::with_state(k_p, k_i, k_d, integral_limit, PidState::default())
    }

    /// Create a new controller starting from the given state.
    pub fn with_state(
        k_p: f64,
        k_i: f64,
        k_d: f64,
        integral_limit: f64,
        state: PidState
    ) -> Self {
        let integral_limit = integral_limit.abs();
        Self {
            k_p, k_i, k_d,
            integral_limit,
            state: PidState {
                integral: clamp(&state.integral, &-integral_limit, &integral_limit),
                prev_error: state.prev_error
            }
        }
    }

    /// Get the value of the controller for the given error and timestep.
    ///
    /// If `dt` is not positive the derivative term is zero. The output is not
    /// bounded.
    pub fn compute(&mut self, error: f64, dt: f64) -> f64 {
        // Accumulate and bound the integral
        self.state.integral = clamp(
            &(self.state.integral + error * dt),
            &-self.integral_limit,
            &self.integral_limit
        );

        let deriv = if dt > 0.0 {
            (error - self.state.prev_error) / dt
        }
        else {
            0.0
        };

        let out =
            self.k_p * error
            + self.k_i * self.state.integral
            + self.k_d * deriv;

        self.state.prev_error = error;

        out
    }

    /// Current controller state.
    pub fn state(&self) -> PidState {
        self.state
    }

    /// Clear the integral and previous error.
    pub fn reset(&mut self) {
        self.state = PidState::default();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_integral_bounded() {
        let mut pid = PidController::new(0.9, 1.0, 0.1, 100.0);

        // Pseudo random error sequence
        let mut seed: u64 = 12345;
        for _ in 0..5000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let error = ((seed >> 33) % 641) as f64 - 320.0;
            let dt = ((seed >> 20) % 100) as f64 / 100.0 + 0.001;

            pid.compute(error, dt);
            let i = pid.state().integral;
            assert!(i >= -100.0 && i <= 100.0, "integral {} out of bounds", i);
        }

        // Sustained error drives the integral onto the limit
        for _ in 0..100 {
            pid.compute(320.0, 1.0);
        }
        assert_eq!(pid.state().integral, 100.0);
        for _ in 0..100 {
            pid.compute(-320.0, 1.0);
        }
        assert_eq!(pid.state().integral, -100.0);
    }

    #[test]
    fn test_zero_error() {
        for dt in [0.0, 1.0 / 30.0, 1.0, -1.0].iter() {
            let mut pid = PidController::new(0.9, 0.5, 0.2, 100.0);
            assert_eq!(pid.compute(0.0, *dt), 0.0);
        }
    }

    #[test]
    fn test_proportional() {
        let mut pid = PidController::new(0.9, 0.0, 0.0, 100.0);
        assert!((pid.compute(100.0, 1.0 / 30.0) - 90.0).abs() < 1e-12);
        assert!((pid.compute(-50.0, 1.0 / 30.0) + 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_dt() {
        let state = PidState { integral: 10.0, prev_error: 5.0 };

        for dt in [0.0, -0.5].iter() {
            let mut pid = PidController::with_state(1.0, 0.5, 2.0, 100.0, state);
            let out = pid.compute(20.0, *dt);

            // Integral accumulates error * dt, derivative forced to zero
            let integral = 10.0 + 20.0 * dt;
            assert!((out - (20.0 + 0.5 * integral)).abs() < 1e-12);
            assert_eq!(pid.state().prev_error, 20.0);
            assert!(out.is_finite());
        }
    }

    #[test]
    fn test_derivative() {
        let state = PidState { integral: 0.0, prev_error: 10.0 };
        let mut pid = PidController::with_state(0.0, 0.0, 1.0, 100.0, state);

        assert!((pid.compute(20.0, 0.5) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_initial_state_clamped() {
        let state = PidState { integral: 500.0, prev_error: 0.0 };
        let pid = PidController::with_state(1.0, 1.0, 0.0, 100.0, state);
        assert_eq!(pid.state().integral, 100.0);
    }

    #[test]
    fn test_reset() {
        let mut pid = PidController::new(1.0, 1.0, 1.0, 100.0);
        pid.compute(50.0, 0.1);
        assert_ne!(pid.state(), PidState::default());

        pid.reset();
        assert_eq!(pid.state(), PidState::default());
    }
}
