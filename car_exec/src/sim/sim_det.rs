//! Simulated object detector

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc
    },
    thread,
    time::{Duration, Instant}
};
use log::{debug, info};

use super::{DetWindow, SimError};
use comms_if::eqpt::det::{DetHandoff, Detection};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Detector publishing a scripted timeline of detections.
#[derive(Debug, Clone)]
pub struct SimDetector {
    handoff: DetHandoff,

    windows: Vec<DetWindow>,

    period: Duration
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimDetector {
    pub fn new(
        handoff: DetHandoff,
        windows: Vec<DetWindow>,
        period_s: f64
    ) -> Result<Self, SimError> {
        let period = Duration::try_from_secs_f64(period_s)
            .map_err(|e| SimError::InvalidParams(format!(
                "Cannot use a detector period of {} s: {}", period_s, e
            )))?;

        Ok(Self {
            handoff,
            windows,
            period
        })
    }

    /// Detections active at the given time since the detector started.
    pub fn detections_at(&self, t_s: f64) -> Vec<Detection> {
        self.windows
            .iter()
            .filter(|w| w.is_active(t_s))
            .map(|w| Detection {
                class_id: w.class_id,
                confidence: w.confidence
            })
            .collect()
    }

    /// Publish the detections for the given time.
    pub fn publish_at(&self, t_s: f64) {
        self.handoff.publish(&self.detections_at(t_s));
    }

    /// Run the detector on its own thread until the stop flag is raised.
    pub fn spawn(self, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            info!("SimDetector started with {} windows", self.windows.len());

            let start = Instant::now();
            let mut num_active = 0;

            while !stop.load(Ordering::SeqCst) {
                let t_s = start.elapsed().as_secs_f64();
                let dets = self.detections_at(t_s);

                if dets.len() != num_active {
                    debug!("SimDetector at {:.2} s: {:?}", t_s, dets);
                    num_active = dets.len();
                }

                self.handoff.publish(&dets);
                thread::sleep(self.period);
            }

            info!("SimDetector stopped");
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::det::{DetClass, DetClassMap, DetSource};

    fn windows() -> Vec<DetWindow> {
        vec![
            DetWindow { start_s: 1.0, end_s: 2.0, class_id: 1, confidence: 0.9 },
            DetWindow { start_s: 1.5, end_s: 3.0, class_id: 0, confidence: 0.5 },
        ]
    }

    #[test]
    fn test_timeline() {
        let handoff = DetHandoff::new(DetClassMap::default());
        let det = SimDetector::new(handoff.clone(), windows(), 0.01).unwrap();

        det.publish_at(0.5);
        assert!(handoff.latest().is_empty());

        det.publish_at(1.2);
        assert!(handoff.latest().contains(DetClass::Stop));

        // Low confidence park detection is discarded
        det.publish_at(1.7);
        assert_eq!(det.detections_at(1.7).len(), 2);
        assert!(!handoff.latest().contains(DetClass::Park));

        det.publish_at(2.5);
        assert!(handoff.latest().is_empty());
    }

    #[test]
    fn test_thread_stops() {
        let handoff = DetHandoff::new(DetClassMap::default());
        let windows = vec![DetWindow { start_s: 0.0, end_s: 100.0, class_id: 1, confidence: 1.0 }];
        let stop = Arc::new(AtomicBool::new(false));

        let handle = SimDetector::new(handoff.clone(), windows, 0.001)
            .unwrap()
            .spawn(stop.clone());

        let start = Instant::now();
        while !handoff.latest().contains(DetClass::Stop) {
            assert!(start.elapsed() < Duration::from_secs(5));
            thread::sleep(Duration::from_millis(1));
        }

        stop.store(true, Ordering::SeqCst);
        handle.join().unwrap();
    }

    #[test]
    fn test_invalid_period() {
        let handoff = DetHandoff::new(DetClassMap::default());

        for period_s in [f64::INFINITY, 1e30, -0.1, f64::NAN].iter() {
            assert!(matches!(
                SimDetector::new(handoff.clone(), windows(), *period_s),
                Err(SimError::InvalidParams(_))
            ), "period {} accepted", period_s);
        }
    }
}
