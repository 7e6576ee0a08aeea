//! Hand detection library for gesture sample collection
//! Provides skin color-based hand segmentation with fingertip detection
//!
//! Each frame runs through an optional background subtraction, an HSV skin
//! filter with morphological cleanup, contour selection, convexity-defect
//! fingertip extraction and palm estimation.

pub mod background;
pub mod color;
pub mod contour;
pub mod detector;
pub mod error;
pub mod filter;
pub mod fingers;
pub mod geometry;
pub mod overlay;
pub mod palm;

pub use background::{BackgroundModel, BackgroundObserver, BackgroundState};
pub use color::rgb_to_hsv;
pub use detector::{validate_settings, DetectionResult, HandDetector};
pub use error::{DetectError, Result};
pub use geometry::PixelPoint;

pub use gesture_shared::{
    BackgroundSettings, BoundingBox, DetectorSettings, FingerHeuristics, HandPose, HsvColor,
    PalmHeuristics, Position,
};
