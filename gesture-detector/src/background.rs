//! Background calibration and subtraction.
//!
//! The model keeps one Gaussian per pixel (mean color and a shared variance
//! over the three channels), seeded from the captured snapshot. Pixels close
//! to their Gaussian are background and slowly pull the model toward the
//! current frame; everything else is reported as foreground.

use gesture_shared::BackgroundSettings;
use image::{GrayImage, Luma, RgbImage};

use crate::error::{DetectError, Result};

/// Where the model is in its calibration cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundState {
    /// No background; every pixel is foreground
    Inactive,
    /// The next applied frame becomes the background
    AwaitingCapture,
    /// Frames are compared against the captured background
    Active,
}

/// Receives background calibration events
pub trait BackgroundObserver: Send {
    fn background_captured(&mut self, _snapshot: &RgbImage) {}

    fn background_cleared(&mut self) {}
}

/// Per-pixel Gaussian statistics
struct PixelModel {
    mean: Vec<[f32; 3]>,
    variance: Vec<f32>,
}

pub struct BackgroundModel {
    settings: BackgroundSettings,
    state: BackgroundState,
    snapshot: Option<RgbImage>,
    model: Option<PixelModel>,
    observer: Option<Box<dyn BackgroundObserver>>,
}

impl BackgroundModel {
    pub fn new(settings: BackgroundSettings) -> Self {
        Self {
            settings,
            state: BackgroundState::Inactive,
            snapshot: None,
            model: None,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn BackgroundObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn set_observer(&mut self, observer: Option<Box<dyn BackgroundObserver>>) {
        self.observer = observer;
    }

    pub fn set_settings(&mut self, settings: BackgroundSettings) {
        self.settings = settings;
    }

    pub fn state(&self) -> BackgroundState {
        self.state
    }

    pub fn is_awaiting_capture(&self) -> bool {
        self.state == BackgroundState::AwaitingCapture
    }

    /// The frame captured on the last capture transition
    pub fn snapshot(&self) -> Option<&RgbImage> {
        self.snapshot.as_ref()
    }

    /// Capture the next applied frame as background.
    ///
    /// Calling this while already awaiting a capture has no further effect.
    /// While active, the current background stays in use until the next frame
    /// replaces it.
    pub fn request_capture(&mut self) {
        if self.state != BackgroundState::AwaitingCapture {
            log::info!("Background capture requested");
        }
        self.state = BackgroundState::AwaitingCapture;
    }

    /// Drop the background and return to the inactive state
    pub fn clear(&mut self) {
        self.state = BackgroundState::Inactive;
        self.snapshot = None;
        self.model = None;
        log::info!("Background cleared");
        if let Some(observer) = self.observer.as_mut() {
            observer.background_cleared();
        }
    }

    /// Feed a frame through the model.
    ///
    /// Returns the foreground mask (255 = foreground) while a background is
    /// set, or `None` when every pixel counts as foreground.
    pub fn apply(&mut self, frame: &RgbImage) -> Result<Option<GrayImage>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(DetectError::EmptyFrame);
        }

        match self.state {
            BackgroundState::Inactive => return Ok(None),
            BackgroundState::AwaitingCapture => self.capture(frame),
            BackgroundState::Active => {
                if let Some(snapshot) = self.snapshot.as_ref() {
                    if snapshot.dimensions() != frame.dimensions() {
                        return Err(DetectError::FrameSizeMismatch {
                            expected: snapshot.dimensions(),
                            actual: frame.dimensions(),
                        });
                    }
                }
            }
        }

        Ok(self.subtract(frame))
    }

    fn capture(&mut self, frame: &RgbImage) {
        let mean = frame
            .pixels()
            .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
            .collect::<Vec<_>>();
        let variance = vec![self.settings.initial_variance; mean.len()];

        self.model = Some(PixelModel { mean, variance });
        self.snapshot = Some(frame.clone());
        self.state = BackgroundState::Active;

        log::info!(
            "Background captured ({}x{})",
            frame.width(),
            frame.height()
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.background_captured(frame);
        }
    }

    fn subtract(&mut self, frame: &RgbImage) -> Option<GrayImage> {
        let settings = &self.settings;
        let model = self.model.as_mut()?;
        let alpha = settings.learning_rate;
        let mut mask = GrayImage::new(frame.width(), frame.height());

        for ((pixel, out), (mean, variance)) in frame
            .pixels()
            .zip(mask.pixels_mut())
            .zip(model.mean.iter_mut().zip(model.variance.iter_mut()))
        {
            let diff = [
                pixel[0] as f32 - mean[0],
                pixel[1] as f32 - mean[1],
                pixel[2] as f32 - mean[2],
            ];
            let dist2 = diff[0] * diff[0] + diff[1] * diff[1] + diff[2] * diff[2];

            if dist2 > settings.variance_threshold * *variance {
                *out = Luma([255]);
                continue;
            }

            // Background pixel: follow slow lighting changes
            if alpha > 0.0 {
                for c in 0..3 {
                    mean[c] += alpha * diff[c];
                }
                *variance = (*variance + alpha * (dist2 - *variance))
                    .clamp(settings.min_variance, settings.max_variance);
            }
        }

        Some(mask)
    }
}

impl Default for BackgroundModel {
    fn default() -> Self {
        Self::new(BackgroundSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordedEvents {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl BackgroundObserver for RecordedEvents {
        fn background_captured(&mut self, snapshot: &RgbImage) {
            self.events.lock().unwrap().push(format!(
                "captured {}x{}",
                snapshot.width(),
                snapshot.height()
            ));
        }

        fn background_cleared(&mut self) {
            self.events.lock().unwrap().push("cleared".to_string());
        }
    }

    fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    #[test]
    fn test_inactive_apply_is_noop() {
        let mut model = BackgroundModel::default();
        assert_eq!(model.state(), BackgroundState::Inactive);
        assert!(model.apply(&solid(4, 4, [10, 20, 30])).unwrap().is_none());
        assert!(model.snapshot().is_none());
    }

    #[test]
    fn test_request_then_clear_stays_inactive() {
        let events = RecordedEvents::default();
        let mut model = BackgroundModel::default().with_observer(Box::new(events.clone()));

        model.request_capture();
        assert!(model.is_awaiting_capture());
        model.clear();

        assert_eq!(model.state(), BackgroundState::Inactive);
        assert!(model.snapshot().is_none());
        assert_eq!(*events.events.lock().unwrap(), vec!["cleared".to_string()]);
    }

    #[test]
    fn test_request_then_apply_captures_frame() {
        let events = RecordedEvents::default();
        let mut model = BackgroundModel::default().with_observer(Box::new(events.clone()));
        let frame = solid(8, 6, [40, 90, 200]);

        model.request_capture();
        model.request_capture();
        let mask = model.apply(&frame).unwrap().expect("mask while active");

        assert_eq!(model.state(), BackgroundState::Active);
        assert_eq!(model.snapshot(), Some(&frame));
        assert!(mask.pixels().all(|p| p[0] == 0));
        assert_eq!(*events.events.lock().unwrap(), vec!["captured 8x6".to_string()]);
    }

    #[test]
    fn test_foreground_is_detected_against_background() {
        let mut model = BackgroundModel::default();
        model.request_capture();
        model.apply(&solid(10, 10, [40, 90, 200])).unwrap();

        let mut frame = solid(10, 10, [40, 90, 200]);
        for y in 2..5 {
            for x in 3..7 {
                frame.put_pixel(x, y, Rgb([180, 150, 120]));
            }
        }
        // Slight noise stays background
        frame.put_pixel(0, 0, Rgb([42, 91, 198]));

        let mask = model.apply(&frame).unwrap().unwrap();
        let foreground = mask.pixels().filter(|p| p[0] == 255).count();
        assert_eq!(foreground, 12);
        assert_eq!(mask.get_pixel(4, 3)[0], 255);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_model_adapts_to_gradual_drift() {
        let mut model = BackgroundModel::new(BackgroundSettings {
            learning_rate: 0.2,
            ..BackgroundSettings::default()
        });
        model.request_capture();
        model.apply(&solid(4, 4, [100, 100, 100])).unwrap();

        // Drift by one level per frame; each step stays inside the variance
        // band, so the mean follows and the final frame is still background.
        let mut last = None;
        for level in 101..=130u8 {
            last = model.apply(&solid(4, 4, [level, level, level])).unwrap();
        }
        assert!(last.unwrap().pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let mut model = BackgroundModel::default();
        model.request_capture();
        model.apply(&solid(10, 10, [0, 0, 0])).unwrap();

        let err = model.apply(&solid(5, 5, [0, 0, 0])).unwrap_err();
        assert_eq!(
            err,
            DetectError::FrameSizeMismatch {
                expected: (10, 10),
                actual: (5, 5)
            }
        );
    }

    #[test]
    fn test_clear_after_capture_drops_snapshot() {
        let mut model = BackgroundModel::default();
        model.request_capture();
        model.apply(&solid(3, 3, [1, 2, 3])).unwrap();
        model.clear();
        model.clear();

        assert_eq!(model.state(), BackgroundState::Inactive);
        assert!(model.snapshot().is_none());
        assert!(model.apply(&solid(3, 3, [1, 2, 3])).unwrap().is_none());
    }
}
