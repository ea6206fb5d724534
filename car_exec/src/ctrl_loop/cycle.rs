//! Cycle pacing

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::thread;
use std::time::{Duration, Instant};
use log::warn;

use super::CtrlLoopError;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Paces the control loop.
pub trait CycleScheduler {
    /// Wait until the start of the next cycle.
    ///
    /// Returns the time since the start of the previous cycle in seconds, or
    /// 0 on the first call.
    fn wait_next_cycle(&mut self) -> f64;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Real time scheduler running cycles at a fixed frequency.
#[derive(Debug)]
pub struct RateScheduler {
    period: Duration,

    /// Start of the current cycle
    cycle_start: Option<Instant>,

    /// Number of cycles which have overrun in a row
    num_consec_overruns: u64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RateScheduler {
    /// Create a scheduler for the given cycle frequency.
    pub fn new(frequency_hz: f64) -> Result<Self, CtrlLoopError> {
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return Err(CtrlLoopError::InvalidParams(format!(
                "Cycle frequency must be positive, found {} Hz", frequency_hz
            )));
        }

        let period = Duration::try_from_secs_f64(1.0 / frequency_hz)
            .map_err(|e| CtrlLoopError::InvalidParams(format!(
                "Cannot use a cycle frequency of {} Hz: {}", frequency_hz, e
            )))?;

        Ok(Self {
            period,
            cycle_start: None,
            num_consec_overruns: 0
        })
    }

    pub fn num_consec_overruns(&self) -> u64 {
        self.num_consec_overruns
    }
}

impl CycleScheduler for RateScheduler {
    fn wait_next_cycle(&mut self) -> f64 {
        let prev_start = match self.cycle_start {
            Some(s) => s,
            None => {
                self.cycle_start = Some(Instant::now());
                return 0.0;
            }
        };

        let cycle_dur = Instant::now() - prev_start;

        match self.period.checked_sub(cycle_dur) {
            Some(d) => {
                self.num_consec_overruns = 0;
                thread::sleep(d);
            },
            None => {
                self.num_consec_overruns += 1;
                warn!(
                    "Cycle overran by {:.06} s ({} consecutive)",
                    cycle_dur.as_secs_f64() - self.period.as_secs_f64(),
                    self.num_consec_overruns
                );
            }
        }

        let now = Instant::now();
        self.cycle_start = Some(now);

        (now - prev_start).as_secs_f64()
    }
}
