//! # Object Detector Interface
//!
//! The object detector runs independently of the control loop and publishes the set of object
//! classes it currently sees. Raw class identifiers are resolved into [`DetClass`] once, at
//! publication, so the control loop never deals with the detector's numbering.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use log::warn;
use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single raw detection as reported by the classifier.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Detection {
    /// The classifier's identifier for the object class
    pub class_id: u16,

    /// Classifier confidence between 0 and 1
    pub confidence: f32
}

/// Mapping from raw classifier identifiers to [`DetClass`].
#[derive(Serialize, Deserialize, Debug, Copy, Clone)]
pub struct DetClassMap {
    /// Class identifier which triggers parking
    pub park_class_id: u16,

    /// Class identifier which triggers a stop
    pub stop_class_id: u16,

    /// Detections with a confidence below this value are discarded
    pub min_confidence: f32
}

/// The set of object classes currently detected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetSet {
    classes: HashSet<DetClass>
}

/// Shared handoff of the latest detection set between the detector and the control loop.
///
/// The detector replaces the whole set on each publish, readers get the most recent set without
/// waiting for a detection cycle.
#[derive(Debug, Clone)]
pub struct DetHandoff {
    latest: Arc<RwLock<Arc<DetSet>>>,

    class_map: DetClassMap
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Classes of detected objects the control software reacts to.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum DetClass {
    /// Parking sign, the car stops and stays parked while it is seen
    Park,

    /// Stop sign, the car stops while it is seen
    Stop,

    /// Any other object
    Other
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of detection sets.
pub trait DetSource {
    /// Get the latest published detection set. Never blocks on the detector.
    fn latest(&self) -> Arc<DetSet>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DetClassMap {
    fn default() -> Self {
        Self {
            park_class_id: 0,
            stop_class_id: 1,
            min_confidence: 0.8
        }
    }
}

impl DetClassMap {
    /// Resolve a raw detection into a class, or `None` if its confidence is too low.
    pub fn resolve(&self, det: &Detection) -> Option<DetClass> {
        if det.confidence < self.min_confidence {
            return None;
        }

        if det.class_id == self.park_class_id {
            Some(DetClass::Park)
        }
        else if det.class_id == self.stop_class_id {
            Some(DetClass::Stop)
        }
        else {
            Some(DetClass::Other)
        }
    }
}

impl DetSet {
    /// Create an empty detection set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a detection set from raw detections.
    pub fn from_detections(dets: &[Detection], class_map: &DetClassMap) -> Self {
        Self {
            classes: dets.iter().filter_map(|d| class_map.resolve(d)).collect()
        }
    }

    /// Returns true if the given class is present.
    pub fn contains(&self, class: DetClass) -> bool {
        self.classes.contains(&class)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl std::iter::FromIterator<DetClass> for DetSet {
    fn from_iter<I: IntoIterator<Item = DetClass>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().collect()
        }
    }
}

impl DetHandoff {
    /// Create a new handoff with an empty detection set.
    pub fn new(class_map: DetClassMap) -> Self {
        Self {
            latest: Arc::new(RwLock::new(Arc::new(DetSet::new()))),
            class_map
        }
    }

    /// Publish a new set of raw detections, replacing the previous set.
    pub fn publish(&self, dets: &[Detection]) {
        self.publish_set(DetSet::from_detections(dets, &self.class_map));
    }

    /// Publish an already resolved detection set.
    pub fn publish_set(&self, set: DetSet) {
        let set = Arc::new(set);
        match self.latest.write() {
            Ok(mut l) => *l = set,
            Err(poisoned) => {
                warn!("Detection handoff lock poisoned, overwriting latest set");
                *poisoned.into_inner() = set
            }
        }
    }
}

impl DetSource for DetHandoff {
    fn latest(&self) -> Arc<DetSet> {
        match self.latest.read() {
            Ok(l) => l.clone(),
            Err(poisoned) => {
                warn!("Detection handoff lock poisoned, recovering latest set");
                poisoned.into_inner().clone()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_resolve_classes() {
        let map = DetClassMap::default();

        let set = DetSet::from_detections(&[
            Detection { class_id: 1, confidence: 0.9 },
            Detection { class_id: 7, confidence: 0.95 },
        ], &map);

        assert!(set.contains(DetClass::Stop));
        assert!(set.contains(DetClass::Other));
        assert!(!set.contains(DetClass::Park));
    }

    #[test]
    fn test_low_confidence_discarded() {
        let map = DetClassMap::default();

        let set = DetSet::from_detections(&[
            Detection { class_id: 0, confidence: 0.5 },
        ], &map);

        assert!(set.is_empty());
    }

    #[test]
    fn test_handoff_replaces_set() {
        let handoff = DetHandoff::new(DetClassMap::default());
        assert!(handoff.latest().is_empty());

        let reader = handoff.clone();
        handoff.publish(&[Detection { class_id: 0, confidence: 0.99 }]);
        assert!(reader.latest().contains(DetClass::Park));

        handoff.publish(&[]);
        assert!(reader.latest().is_empty());
    }

    #[test]
    fn test_handoff_across_threads() {
        let handoff = DetHandoff::new(DetClassMap::default());
        let producer = handoff.clone();

        std::thread::spawn(move || {
            producer.publish(&[Detection { class_id: 1, confidence: 1.0 }]);
        }).join().unwrap();

        assert!(handoff.latest().contains(DetClass::Stop));
    }
}
