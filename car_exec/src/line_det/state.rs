//! Implementations for the LineDet state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use image::GenericImageView;
use log::debug;
use serde::Serialize;

// Internal
use super::{canny, gaussian_blur, gaussian_kernel, LineDetError, LineDetOutput, LineError, Params};
use comms_if::eqpt::cam::CamImage;
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Line detection module state
#[derive(Default)]
pub struct LineDet {
    pub(crate) params: Params,

    /// Blur kernel built from the parameters, empty until initialised.
    blur_kernel: Vec<f32>,

    pub(crate) report: StatusReport
}

/// Status report for LineDet processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Number of rows of the detection band that lay inside the frame
    pub band_rows: u32,

    /// Number of edge pixels found in the band
    pub num_edge_px: usize,

    /// Number of columns in the band containing an edge
    pub num_edge_cols: usize
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LineDet {
    /// Create a new initialised instance from the given parameters.
    pub fn new(params: Params) -> Result<Self, LineDetError> {
        params.validate()?;

        Ok(Self {
            blur_kernel: gaussian_kernel(params.blur_kernel_size, params.blur_sigma),
            params,
            report: StatusReport::default()
        })
    }

    /// Find the line in the given frame.
    fn find_line(&mut self, frame: &CamImage) -> LineDetOutput {
        let (width, height) = frame.image.dimensions();

        // Clip the band to the frame
        let y0 = self.params.band_y_offset_px.min(height);
        let y1 = self.params.band_y_offset_px
            .saturating_add(self.params.band_height_px)
            .min(height);
        self.report.band_rows = y1 - y0;

        if width == 0 || y1 <= y0 {
            debug!("Detection band lies outside the {}x{} frame", width, height);
            return LineDetOutput::NoLine;
        }

        let band = frame.image.crop_imm(0, y0, width, y1 - y0).to_luma8();
        let blurred = gaussian_blur(&band, &self.blur_kernel);
        let edges = canny(
            &blurred,
            self.params.canny_low_threshold,
            self.params.canny_high_threshold
        );

        let cols = edges.edge_columns();
        self.report.num_edge_px = edges.num_edges();
        self.report.num_edge_cols = cols.len();

        let (min_col, max_col) = match (cols.first(), cols.last()) {
            (Some(&min), Some(&max)) if cols.len() >= 2 => (min, max),
            _ => return LineDetOutput::NoLine
        };

        let line_centre_px = (min_col + max_col) / 2;
        let error_px = (width / 2) as i32 - line_centre_px as i32;

        debug_assert!(error_px.abs() <= (width / 2) as i32);
        debug!("Line centre: {} px, error: {} px", line_centre_px, error_px);

        LineDetOutput::Line(LineError {
            line_centre_px,
            error_px
        })
    }
}

impl State for LineDet {
    type InitData = &'static str;
    type InitError = LineDetError;

    type InputData = Option<CamImage>;
    type OutputData = LineDetOutput;
    type StatusReport = StatusReport;
    type ProcError = LineDetError;

    /// Initialise the LineDet module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        let params: Params = params::load(init_data)
            .map_err(LineDetError::ParamLoadError)?;

        *self = Self::new(params)?;

        Ok(())
    }

    /// Find the line in the frame, if there is one.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        if self.blur_kernel.is_empty() {
            return Err(LineDetError::NotInitialised);
        }

        self.report = StatusReport::default();

        let output = match input_data {
            Some(frame) => self.find_line(frame),
            None => LineDetOutput::NoFrame
        };

        Ok((output, self.report))
    }
}
