//! Parameters structure for LineDet

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::LineDetError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for line detection.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    // ---- DETECTION BAND ----

    /// Row at which the detection band starts. The band is clipped to the
    /// frame.
    ///
    /// Units: pixels
    pub band_y_offset_px: u32,

    /// Height of the detection band.
    ///
    /// Units: pixels
    pub band_height_px: u32,

    // ---- SMOOTHING ----

    /// Size of the Gaussian blur kernel. Must be odd.
    pub blur_kernel_size: usize,

    /// Standard deviation of the Gaussian blur. A value less than or equal to
    /// zero uses the fixed binomial kernel for sizes up to 7, otherwise the
    /// deviation is derived from the kernel size.
    ///
    /// Units: pixels
    pub blur_sigma: f64,

    // ---- EDGE DETECTION ----

    /// Gradient magnitude above which a pixel may be part of an edge if it is
    /// connected to a strong edge.
    pub canny_low_threshold: u32,

    /// Gradient magnitude above which a pixel is a strong edge.
    pub canny_high_threshold: u32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            band_y_offset_px: 470,
            band_height_px: 150,
            blur_kernel_size: 5,
            blur_sigma: 0.0,
            canny_low_threshold: 50,
            canny_high_threshold: 150
        }
    }
}

impl Params {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), LineDetError> {
        if self.blur_kernel_size % 2 == 0 {
            return Err(LineDetError::InvalidParams(format!(
                "blur_kernel_size must be odd, found {}", self.blur_kernel_size
            )))
        }

        if !self.blur_sigma.is_finite() {
            return Err(LineDetError::InvalidParams(format!(
                "blur_sigma must be finite, found {}", self.blur_sigma
            )))
        }

        if self.canny_low_threshold > self.canny_high_threshold {
            return Err(LineDetError::InvalidParams(format!(
                "canny_low_threshold ({}) is greater than canny_high_threshold ({})",
                self.canny_low_threshold,
                self.canny_high_threshold
            )))
        }

        Ok(())
    }
}
