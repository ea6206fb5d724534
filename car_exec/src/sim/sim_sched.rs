//! Simulated cycle scheduler

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc
};

use crate::ctrl_loop::CycleScheduler;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Scheduler which returns a fixed timestep immediately.
#[derive(Debug, Clone)]
pub struct SimScheduler {
    dt_s: f64,

    num_calls: u64,

    /// Raise the flag once this many cycles have been started
    stop_after: Option<(u64, Arc<AtomicBool>)>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimScheduler {
    pub fn new(dt_s: f64) -> Self {
        Self {
            dt_s,
            num_calls: 0,
            stop_after: None
        }
    }

    /// Raise the stop flag after `num_cycles` cycles.
    pub fn stop_after(mut self, num_cycles: u64, stop: Arc<AtomicBool>) -> Self {
        self.stop_after = Some((num_cycles, stop));
        self
    }
}

impl CycleScheduler for SimScheduler {
    fn wait_next_cycle(&mut self) -> f64 {
        let index = self.num_calls;
        self.num_calls += 1;

        if let Some((n, ref stop)) = self.stop_after {
            if index >= n {
                stop.store(true, Ordering::SeqCst);
            }
        }

        if index == 0 {
            0.0
        }
        else {
            self.dt_s
        }
    }
}
