//! # Camera Equipment Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single frame acquired from the camera.
#[derive(Clone)]
pub struct CamImage {
    /// UTC timestamp at which the frame was acquired
    pub timestamp: DateTime<Utc>,

    /// The image itself
    pub image: DynamicImage
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of camera frames.
pub trait FrameSource {
    /// Acquire the latest frame.
    ///
    /// Returns `None` if no frame is currently available. This is a normal transient condition
    /// (camera still starting, dropped frame) and not an error.
    fn get_frame(&mut self) -> Option<CamImage>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CamImage {
    /// Wrap an image acquired now.
    pub fn now(image: DynamicImage) -> Self {
        Self {
            timestamp: Utc::now(),
            image
        }
    }

    /// Width of the frame in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height of the frame in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl std::fmt::Debug for CamImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CamImage")
            .field("timestamp", &self.timestamp)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
