//! The per-frame detection pipeline.
//!
//! **Not thread-safe for shared use**: every call to [`HandDetector::detect`]
//! overwrites the result images in place. Use one detector per stream.

use gesture_shared::{
    DetectorSettings, FingerHeuristics, HandPose, HsvColor, PalmHeuristics, Position,
};
use image::{GrayImage, RgbImage};

use crate::background::{BackgroundModel, BackgroundObserver, BackgroundState};
use crate::contour::select_hand_contour;
use crate::error::{DetectError, Result};
use crate::filter;
use crate::fingers::FingerExtractor;
use crate::geometry::PixelPoint;
use crate::overlay::{blank_overlay, render_overlay, OverlayContent};
use crate::palm::{filled_contour_mask, PalmEstimator};

/// Borrowed view of everything the last `detect` call produced
#[derive(Debug, Clone, Copy)]
pub struct DetectionResult<'a> {
    pub detected: bool,
    pub filtered: &'a GrayImage,
    pub overlay: &'a RgbImage,
    /// Filtered mask cropped to the hand; `None` when nothing was detected
    pub extract: Option<&'a GrayImage>,
    pub background: Option<&'a RgbImage>,
    pub pose: Option<&'a HandPose>,
}

/// Check a whole calibration before it replaces the current one.
///
/// The individual bound setters on [`HandDetector`] are not checked, so a
/// caller may move one bound past the other while adjusting them.
pub fn validate_settings(settings: &DetectorSettings) -> Result<()> {
    let invalid = |msg: &str| Err(DetectError::InvalidSettings(msg.to_string()));

    let (lower, upper) = (
        &settings.skin_color_lower_bound,
        &settings.skin_color_upper_bound,
    );
    if lower.h > upper.h || lower.s > upper.s || lower.v > upper.v {
        return invalid("skin color lower bound exceeds upper bound");
    }

    if !(settings.max_area_ratio > 0.0 && settings.max_area_ratio <= 1.0) {
        return invalid("max_area_ratio must be in (0, 1]");
    }
    // Comparisons are written so that NaN fails them
    let fingers = &settings.fingers;
    if !(fingers.approximation_epsilon > 0.0) {
        return invalid("approximation_epsilon must be positive");
    }
    if !(fingers.min_arm_distance_sq <= fingers.max_arm_distance_sq) {
        return invalid("min_arm_distance_sq exceeds max_arm_distance_sq");
    }
    if !(fingers.min_angle <= fingers.max_angle) {
        return invalid("min_angle exceeds max_angle");
    }
    if !(fingers.dedup_distance_sq >= 0.0 && fingers.merge_distance_sq >= 0.0) {
        return invalid("fingertip distances must not be negative");
    }
    if !(settings.palm.defect_radius_scale >= 0.0 && settings.palm.fallback_radius_scale >= 0.0) {
        return invalid("palm radius scales must not be negative");
    }
    let background = &settings.background;
    if !(0.0..=1.0).contains(&background.learning_rate) {
        return invalid("background learning_rate must be in [0, 1]");
    }
    if !(background.variance_threshold > 0.0) {
        return invalid("background variance_threshold must be positive");
    }
    if !(background.initial_variance > 0.0) {
        return invalid("background initial_variance must be positive");
    }
    if !(background.min_variance > 0.0 && background.min_variance <= background.max_variance) {
        return invalid("background variance bounds are inconsistent");
    }
    Ok(())
}

/// Detects a single hand in calibrated frames and extracts its binary mask
pub struct HandDetector {
    settings: DetectorSettings,
    background: BackgroundModel,
    fingers: FingerExtractor,
    palm: PalmEstimator,
    detected: bool,
    filtered: GrayImage,
    overlay: RgbImage,
    extracted: Option<GrayImage>,
    pose: Option<HandPose>,
}

impl HandDetector {
    pub fn new() -> Self {
        let settings = DetectorSettings::default();
        Self {
            background: BackgroundModel::new(settings.background.clone()),
            fingers: FingerExtractor::new(settings.fingers.clone()),
            palm: PalmEstimator::new(settings.palm.clone()),
            settings,
            detected: false,
            filtered: GrayImage::new(0, 0),
            overlay: RgbImage::new(0, 0),
            extracted: None,
            pose: None,
        }
    }

    pub fn with_settings(settings: DetectorSettings) -> Result<Self> {
        let mut detector = Self::new();
        detector.set_settings(settings)?;
        Ok(detector)
    }

    pub fn with_observer(mut self, observer: Box<dyn BackgroundObserver>) -> Self {
        self.background.set_observer(Some(observer));
        self
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// Replace the whole calibration; the background state is kept
    pub fn set_settings(&mut self, settings: DetectorSettings) -> Result<()> {
        validate_settings(&settings)?;
        self.background.set_settings(settings.background.clone());
        self.fingers = FingerExtractor::new(settings.fingers.clone());
        self.palm = PalmEstimator::new(settings.palm.clone());
        self.settings = settings;
        Ok(())
    }

    pub fn set_skin_color_lower_bound(&mut self, h: u8, s: u8, v: u8) {
        self.settings.skin_color_lower_bound = HsvColor::new(h, s, v);
    }

    pub fn set_skin_color_upper_bound(&mut self, h: u8, s: u8, v: u8) {
        self.settings.skin_color_upper_bound = HsvColor::new(h, s, v);
    }

    pub fn set_detection_area(&mut self, area: u32) {
        self.settings.detection_area = area;
    }

    pub fn set_morphology(&mut self, morphology: bool) {
        self.settings.morphology = morphology;
    }

    pub fn set_finger_heuristics(&mut self, heuristics: FingerHeuristics) -> Result<()> {
        let mut settings = self.settings.clone();
        settings.fingers = heuristics;
        self.set_settings(settings)
    }

    pub fn set_palm_heuristics(&mut self, heuristics: PalmHeuristics) -> Result<()> {
        let mut settings = self.settings.clone();
        settings.palm = heuristics;
        self.set_settings(settings)
    }

    pub fn set_background_observer(&mut self, observer: Option<Box<dyn BackgroundObserver>>) {
        self.background.set_observer(observer);
    }

    /// Use the next detected frame as background
    pub fn request_background_capture(&mut self) {
        self.background.request_capture();
    }

    pub fn clear_background(&mut self) {
        self.background.clear();
    }

    pub fn is_awaiting_background(&self) -> bool {
        self.background.is_awaiting_capture()
    }

    pub fn background_state(&self) -> BackgroundState {
        self.background.state()
    }

    pub fn background_image(&self) -> Option<&RgbImage> {
        self.background.snapshot()
    }

    pub fn filtered_image(&self) -> &GrayImage {
        &self.filtered
    }

    pub fn overlay_image(&self) -> &RgbImage {
        &self.overlay
    }

    /// The hand mask of the last successful detection
    pub fn extracted_image(&self) -> Option<&GrayImage> {
        self.extracted.as_ref()
    }

    pub fn hand_pose(&self) -> Option<&HandPose> {
        self.pose.as_ref()
    }

    pub fn result(&self) -> DetectionResult<'_> {
        DetectionResult {
            detected: self.detected,
            filtered: &self.filtered,
            overlay: &self.overlay,
            extract: self.extracted.as_ref(),
            background: self.background.snapshot(),
            pose: self.pose.as_ref(),
        }
    }

    /// Process one frame.
    ///
    /// Returns whether a hand was found. A hand without any fingertip
    /// candidates (a fist) still counts as detected. Malformed frames are
    /// rejected before any result is overwritten.
    pub fn detect(&mut self, frame: &RgbImage) -> Result<bool> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectError::EmptyFrame);
        }

        let foreground = self.background.apply(frame)?;
        let filtered = filter::filter(
            frame,
            foreground.as_ref(),
            &self.settings.skin_color_lower_bound,
            &self.settings.skin_color_upper_bound,
            self.settings.morphology,
        )?;

        self.filtered = filtered;
        self.overlay = blank_overlay(width, height);
        self.extracted = None;
        self.pose = None;
        self.detected = false;

        let Some(contour) = select_hand_contour(
            &self.filtered,
            self.settings.detection_area as f64,
            self.settings.max_area_ratio,
        ) else {
            log::debug!("No hand contour in {}x{} frame", width, height);
            return Ok(false);
        };

        let candidates = self.fingers.extract(&contour.points);
        let region = filled_contour_mask(&contour.points, width, height);
        let Some(palm) = self.palm.estimate_from_region(
            &region,
            &candidates.simplified,
            &candidates.farthest_points,
        ) else {
            return Ok(false);
        };

        let bounds = contour.bounds;
        self.extracted = Some(
            image::imageops::crop_imm(
                &self.filtered,
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height,
            )
            .to_image(),
        );
        self.overlay = render_overlay(&OverlayContent {
            region: &region,
            fingertips: &candidates.fingertips,
            center: palm.center,
            palm_radius: palm.radius,
            bounds,
        });

        let to_position = |p: &PixelPoint| Position::new(p.x as f32, p.y as f32);
        self.pose = Some(HandPose {
            center: to_position(&palm.center),
            palm_radius: palm.radius as f32,
            fingertips: candidates.fingertips.iter().map(to_position).collect(),
            bounds,
            contour_area: contour.area,
        });
        self.detected = true;

        log::debug!(
            "Hand at ({}, {}), radius {:.1}, {} fingertip(s), area {:.0}",
            palm.center.x,
            palm.center.y,
            palm.radius,
            candidates.fingertips.len(),
            contour.area
        );
        Ok(true)
    }
}

impl Default for HandDetector {
    fn default() -> Self {
        Self::new()
    }
}
