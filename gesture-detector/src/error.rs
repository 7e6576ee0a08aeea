//! Error types for the hand detector.

use thiserror::Error;

/// Precondition violations reported by the detector.
///
/// "No hand in the frame" is not an error; it is reported through the
/// detection flag.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    /// The input frame has no pixels
    #[error("frame has zero width or height")]
    EmptyFrame,

    /// The frame does not match the captured background
    #[error("frame is {actual:?} but the background was captured at {expected:?}")]
    FrameSizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// The foreground mask does not cover the frame
    #[error("foreground mask is {mask:?} but the frame is {frame:?}")]
    MaskSizeMismatch { mask: (u32, u32), frame: (u32, u32) },

    /// Calibration values that cannot describe a valid filter
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, DetectError>;
