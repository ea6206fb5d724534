//! # Steering map
//!
//! Scales the raw controller correction into a bounded servo angle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use serde::{Deserialize, Serialize};
use util::maths::{clamp, lin_map};

use super::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mapping from raw correction to steering servo angle.
#[derive(Debug, Clone, Copy)]
pub struct SteerMap {
    max_error_px: f64,
    sensitivity_deg: f64,
    max_steer_deg: f64,
    sign: SteerSign
}

/// Result of mapping a raw correction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SteerDem {
    /// Bounded correction before the sign convention is applied.
    ///
    /// Units: degrees
    pub scaled_deg: f64,

    /// Angle to command to the servo.
    ///
    /// Units: degrees
    pub cmd_deg: f64,

    /// True if the demand was limited to the maximum steering angle
    pub limited: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Sign relation between the correction and the servo angle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SteerSign {
    /// A positive correction (line to the left) gives a negative servo angle
    Inverted,

    /// A positive correction gives a positive servo angle
    Direct
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SteerSign {
    fn apply(&self, value: f64) -> f64 {
        match self {
            SteerSign::Inverted => -value,
            SteerSign::Direct => value
        }
    }
}

impl SteerMap {
    pub fn new(
        max_error_px: f64,
        sensitivity_deg: f64,
        max_steer_deg: f64,
        sign: SteerSign
    ) -> Self {
        Self {
            max_error_px,
            sensitivity_deg,
            max_steer_deg: max_steer_deg.abs(),
            sign
        }
    }

    pub fn from_params(params: &Params) -> Self {
        Self::new(
            params.max_error_px,
            params.steer_sensitivity_deg,
            params.max_steer_deg,
            params.steer_sign
        )
    }

    /// Map a raw correction into a steering demand.
    ///
    /// Infinite corrections saturate, NaN maps to zero.
    pub fn map(&self, raw: f64) -> SteerDem {
        if raw.is_nan() {
            warn!("NaN steering correction, commanding 0 deg");
            return SteerDem::default();
        }

        let unbounded = lin_map(
            (-self.max_error_px, self.max_error_px),
            (-self.sensitivity_deg, self.sensitivity_deg),
            raw
        );

        let scaled_deg = if unbounded.is_nan() {
            // inf * 0 sensitivity
            0.0
        }
        else {
            clamp(&unbounded, &-self.max_steer_deg, &self.max_steer_deg)
        };

        SteerDem {
            scaled_deg,
            cmd_deg: self.sign.apply(scaled_deg),
            limited: scaled_deg != unbounded
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn default_map() -> SteerMap {
        SteerMap::new(320.0, 40.0, 35.0, SteerSign::Inverted)
    }

    #[test]
    fn test_scaling() {
        let dem = default_map().map(160.0);
        assert!((dem.scaled_deg - 20.0).abs() < 1e-12);
        assert!((dem.cmd_deg + 20.0).abs() < 1e-12);
        assert!(!dem.limited);

        assert_eq!(default_map().map(0.0).cmd_deg, 0.0);
    }

    #[test]
    fn test_bounded() {
        let map = default_map();

        for raw in [1e300, -1e300, 320.0, -320.0, 1e6, f64::MAX, f64::MIN].iter() {
            let dem = map.map(*raw);
            assert!(dem.cmd_deg.abs() <= 35.0);
            assert!(dem.limited);
        }

        assert_eq!(map.map(f64::INFINITY).cmd_deg, -35.0);
        assert_eq!(map.map(f64::NEG_INFINITY).cmd_deg, 35.0);
    }

    #[test]
    fn test_nan() {
        let dem = default_map().map(f64::NAN);
        assert_eq!(dem, SteerDem::default());
    }

    #[test]
    fn test_sign_convention() {
        let inverted = default_map();
        let direct = SteerMap::new(320.0, 40.0, 35.0, SteerSign::Direct);

        // Line left of centre gives a positive correction
        assert!(inverted.map(100.0).cmd_deg < 0.0);
        assert!(direct.map(100.0).cmd_deg > 0.0);
        assert_eq!(inverted.map(100.0).scaled_deg, direct.map(100.0).scaled_deg);
    }
}
