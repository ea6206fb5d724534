//! Simulated camera

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::{DynamicImage, Rgb, RgbImage};
use log::trace;

use super::{LineProfile, SimCamParams};
use comms_if::eqpt::cam::{CamImage, FrameSource};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const GROUND_COLOUR: Rgb<u8> = Rgb([40, 40, 40]);

const LINE_COLOUR: Rgb<u8> = Rgb([230, 230, 230]);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Camera rendering a bright vertical stripe on a dark ground.
#[derive(Debug, Clone)]
pub struct SimCam {
    params: SimCamParams,

    /// Number of calls to `get_frame`
    num_requests: u64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimCam {
    pub fn new(params: SimCamParams) -> Self {
        Self {
            params,
            num_requests: 0
        }
    }

    pub fn num_requests(&self) -> u64 {
        self.num_requests
    }

    pub fn set_line_profile(&mut self, line_profile: LineProfile) {
        self.params.line_profile = line_profile;
    }

    /// Render a frame with the line centred on the given column.
    pub fn render(&self, centre_px: f64) -> DynamicImage {
        let centre = centre_px.round() as i64;
        let half_width = (self.params.stripe_width_px / 2) as i64;

        DynamicImage::ImageRgb8(RgbImage::from_fn(
            self.params.width,
            self.params.height,
            |x, _| {
                if (x as i64 - centre).abs() <= half_width {
                    LINE_COLOUR
                }
                else {
                    GROUND_COLOUR
                }
            }
        ))
    }
}

impl FrameSource for SimCam {
    fn get_frame(&mut self) -> Option<CamImage> {
        let index = self.num_requests;
        self.num_requests += 1;

        let n = self.params.drop_every_n_frames;
        if n > 0 && (index + 1) % n == 0 {
            trace!("SimCam dropping frame {}", index);
            return None;
        }

        let t_s = index as f64 / self.params.frame_rate_hz;
        let centre_px = self.params.line_profile.centre_at(t_s);

        Some(CamImage::now(self.render(centre_px)))
    }
}
