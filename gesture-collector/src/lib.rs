//! Gesture sample collection on top of the hand detector
//!
//! Frames are cropped to a region of interest, run through
//! [`gesture_detector::HandDetector`], and accepted detections are stored as
//! paired samples: the original region as BMP and the extracted hand mask as
//! PGM, one folder pair per gesture label.

pub mod clean;
pub mod resize;
pub mod roi;
pub mod sample_store;
pub mod settings;

pub use clean::{plan_sync, SyncPlan};
pub use resize::{letterbox, resize_label, DEFAULT_SIZES};
pub use roi::Roi;
pub use sample_store::{SampleCollector, SampleOutcome, SamplingTask};
pub use settings::{load_settings, save_settings};
