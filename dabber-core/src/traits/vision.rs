//! Camera feature detection trait

use core::future::Future;

/// Pixel coordinates in the camera frame (origin top-left, Y down)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    /// Create a pixel point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Errors from the vision subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VisionError {
    /// No camera frame available
    NoFrame,
    /// Alignment feature never found during a refinement
    NotDetected,
}

/// Trait for the alignment-feature detector
pub trait Vision {
    /// Detect the alignment feature (fiducial ring or pad circle) in the
    /// current camera frame
    ///
    /// `Ok(None)` means the frame was analysed but nothing was found; callers
    /// must tolerate it.
    fn detect_alignment_feature(
        &mut self,
    ) -> impl Future<Output = Result<Option<PixelPoint>, VisionError>>;
}
