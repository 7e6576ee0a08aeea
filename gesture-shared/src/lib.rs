use serde::{Deserialize, Serialize};

/// Represents a 2D position in image coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another position
    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Summary of a successful hand detection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandPose {
    /// Most interior point of the hand region
    pub center: Position,
    pub palm_radius: f32,
    /// Fingertip candidates in the order they were accepted
    pub fingertips: Vec<Position>,
    pub bounds: BoundingBox,
    pub contour_area: f64,
}

impl HandPose {
    pub fn finger_count(&self) -> usize {
        self.fingertips.len()
    }
}

/// A color in OpenCV-style 8-bit HSV units (H in 0-180, S and V in 0-255)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HsvColor {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl HsvColor {
    pub fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }

    /// True if every channel of `self` lies within `[lower, upper]`
    pub fn within(&self, lower: &HsvColor, upper: &HsvColor) -> bool {
        (lower.h..=upper.h).contains(&self.h)
            && (lower.s..=upper.s).contains(&self.s)
            && (lower.v..=upper.v).contains(&self.v)
    }
}

/// Thresholds of the fingertip filter cascade.
///
/// Distances are squared pixel distances and assume a roughly VGA-sized
/// region of interest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FingerHeuristics {
    /// Douglas-Peucker tolerance used before the hull is computed
    pub approximation_epsilon: f64,
    pub min_arm_distance_sq: f64,
    pub max_arm_distance_sq: f64,
    /// Radians
    pub min_angle: f64,
    /// Radians
    pub max_angle: f64,
    pub dedup_distance_sq: f64,
    pub merge_distance_sq: f64,
}

impl Default for FingerHeuristics {
    fn default() -> Self {
        Self {
            approximation_epsilon: 10.0,
            min_arm_distance_sq: 100.0,
            max_arm_distance_sq: 30000.0,
            min_angle: 0.2618,
            max_angle: 2.3562,
            dedup_distance_sq: 900.0,
            merge_distance_sq: 1000.0,
        }
    }
}

/// Scale factors applied to the palm radius estimate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PalmHeuristics {
    pub defect_radius_scale: f64,
    pub fallback_radius_scale: f64,
}

impl Default for PalmHeuristics {
    fn default() -> Self {
        Self {
            defect_radius_scale: 1.2,
            fallback_radius_scale: 0.6,
        }
    }
}

/// Adaptive background model parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackgroundSettings {
    /// Weight given to each new background-matching observation
    pub learning_rate: f32,
    /// Squared Mahalanobis distance above which a pixel is foreground
    pub variance_threshold: f32,
    pub initial_variance: f32,
    pub min_variance: f32,
    pub max_variance: f32,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            learning_rate: 0.005,
            variance_threshold: 16.0,
            initial_variance: 15.0,
            min_variance: 4.0,
            max_variance: 75.0,
        }
    }
}

/// Calibration of the hand detector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorSettings {
    pub skin_color_lower_bound: HsvColor,
    pub skin_color_upper_bound: HsvColor,
    /// Minimum contour area, in pixels, considered as a hand
    pub detection_area: u32,
    /// Apply opening and closing to the skin mask
    pub morphology: bool,
    /// Contours covering more than this share of the frame are rejected
    pub max_area_ratio: f64,
    pub fingers: FingerHeuristics,
    pub palm: PalmHeuristics,
    pub background: BackgroundSettings,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            skin_color_lower_bound: HsvColor::new(0, 40, 60),
            skin_color_upper_bound: HsvColor::new(25, 255, 255),
            detection_area: 5000,
            morphology: true,
            max_area_ratio: 0.9,
            fingers: FingerHeuristics::default(),
            palm: PalmHeuristics::default(),
            background: BackgroundSettings::default(),
        }
    }
}

/// Region of interest, in percent of the captured frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoiSettings {
    pub start_x: u8,
    pub end_x: u8,
    pub start_y: u8,
    pub end_y: u8,
}

impl Default for RoiSettings {
    fn default() -> Self {
        Self {
            start_x: 48,
            end_x: 98,
            start_y: 2,
            end_y: 68,
        }
    }
}

/// Sampling task parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplingSettings {
    /// Number of samples collected by one task
    pub amount_per_time: u32,
    /// Minimum interval, in ms, between two stored samples
    pub interval_ms: u64,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            amount_per_time: 100,
            interval_ms: 150,
        }
    }
}

/// Everything the collector persists between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub detector: DetectorSettings,
    pub roi: RoiSettings,
    pub sampling: SamplingSettings,
    pub gesture_list: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            detector: DetectorSettings::default(),
            roi: RoiSettings::default(),
            sampling: SamplingSettings::default(),
            gesture_list: default_gesture_list(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Digits, letters and six extra labels `Z0`..`Z5`
pub fn default_gesture_list() -> Vec<String> {
    let digits = ('0'..='9').map(String::from);
    let letters = ('A'..='Z').map(String::from);
    let extra = (0..=5).map(|i| format!("Z{}", i));
    digits.chain(letters).chain(extra).collect()
}
