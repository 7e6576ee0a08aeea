use gesture_detector::contour::select_hand_contour;
use gesture_detector::geometry::{approximate_polygon, squared_distance};
use gesture_detector::palm::topmost_point;
use gesture_detector::{
    BackgroundObserver, BackgroundState, DetectError, DetectorSettings, HandDetector, Position,
};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use std::sync::{Arc, Mutex};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const SKIN: Rgb<u8> = Rgb([180, 150, 120]);
const BACKDROP: Rgb<u8> = Rgb([40, 60, 160]);
const PALM_CENTER: (i32, i32) = (320, 300);
const PALM_RADIUS: i32 = 90;

/// Creates a synthetic open hand: a round palm with four raised fingers of
/// different heights, so the fingertips do not line up on the hull
fn create_open_hand_image() -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKDROP);
    draw_filled_circle_mut(&mut img, PALM_CENTER, PALM_RADIUS, SKIN);

    // (left edge, top) of each 20 px wide finger
    let fingers = [(232, 150), (284, 120), (336, 115), (388, 140)];
    for (x, top) in fingers {
        let length = (PALM_CENTER.1 - top) as u32;
        draw_filled_rect_mut(&mut img, Rect::at(x, top).of_size(20, length), SKIN);
    }
    img
}

/// A wider palm with all five fingers spread
fn create_five_finger_hand_image() -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKDROP);
    draw_filled_circle_mut(&mut img, PALM_CENTER, 110, SKIN);

    // (left edge, top) of each 18 px wide finger, thumb first
    let fingers = [(223, 170), (267, 140), (311, 130), (355, 138), (399, 165)];
    for (x, top) in fingers {
        let length = (PALM_CENTER.1 - top) as u32;
        draw_filled_rect_mut(&mut img, Rect::at(x, top).of_size(18, length), SKIN);
    }
    img
}

fn create_fist_image() -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKDROP);
    draw_filled_circle_mut(&mut img, PALM_CENTER, 80, SKIN);
    img
}

#[derive(Clone, Default)]
struct ReceivedEvents {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl BackgroundObserver for ReceivedEvents {
    fn background_captured(&mut self, _snapshot: &RgbImage) {
        self.events.lock().unwrap().push("captured");
    }

    fn background_cleared(&mut self) {
        self.events.lock().unwrap().push("cleared");
    }
}

#[test]
fn test_black_frame() {
    let mut detector = HandDetector::new();
    let frame = RgbImage::new(WIDTH, HEIGHT);

    assert!(!detector.detect(&frame).unwrap());
    let result = detector.result();
    assert!(!result.detected);
    assert!(result.extract.is_none());
    assert!(result.filtered.pixels().all(|p| p[0] == 0));
    assert_eq!(result.overlay.dimensions(), (WIDTH, HEIGHT));
}

#[test]
fn test_open_hand_fingertips() {
    let mut detector = HandDetector::new();
    assert!(detector.detect(&create_open_hand_image()).unwrap());

    let pose = detector.hand_pose().unwrap();
    println!(
        "Detected {} fingertips: {:?}",
        pose.finger_count(),
        pose.fingertips
    );
    assert!(
        (3..=5).contains(&pose.finger_count()),
        "unexpected fingertip count {}",
        pose.finger_count()
    );
    // All fingertips are on the raised fingers, well above the palm
    for tip in &pose.fingertips {
        assert!(tip.y < 200.0, "fingertip {:?} is not on a finger", tip);
    }

    let center = Position::new(PALM_CENTER.0 as f32, PALM_CENTER.1 as f32);
    assert!(pose.center.distance_to(&center) < 10.0);
    assert!(pose.palm_radius > 0.0);

    // The extract is the filtered mask cropped to the hand
    let extract = detector.extracted_image().unwrap();
    assert_eq!(extract.dimensions(), (pose.bounds.width, pose.bounds.height));
    assert!(pose.bounds.y < 120);
    assert!(extract.pixels().all(|p| p[0] == 0 || p[0] == 255));
}

#[test]
fn test_five_finger_hand_fingertip_bound() {
    let mut detector = HandDetector::new();
    assert!(detector.detect(&create_five_finger_hand_image()).unwrap());

    let pose = detector.hand_pose().unwrap();
    println!(
        "Detected {} fingertips: {:?}",
        pose.finger_count(),
        pose.fingertips
    );
    assert!(
        (1..=5).contains(&pose.finger_count()),
        "unexpected fingertip count {}",
        pose.finger_count()
    );
    // The palm disk starts at y = 190
    for tip in &pose.fingertips {
        assert!(tip.y < 190.0, "fingertip {:?} is not on a finger", tip);
    }
}

#[test]
fn test_fist_has_no_fingertips() {
    let mut detector = HandDetector::new();
    assert!(detector.detect(&create_fist_image()).unwrap());

    let pose = detector.hand_pose().unwrap();
    assert_eq!(pose.finger_count(), 0);
    // Fallback radius: a fraction of the distance to the top of the fist
    assert!(
        pose.palm_radius > 40.0 && pose.palm_radius < 56.0,
        "radius {}",
        pose.palm_radius
    );

    // Exactly 0.6 times the distance from the center to the top of the
    // simplified contour
    let settings = detector.settings();
    let contour = select_hand_contour(
        detector.filtered_image(),
        settings.detection_area as f64,
        settings.max_area_ratio,
    )
    .unwrap();
    let simplified = approximate_polygon(&contour.points, settings.fingers.approximation_epsilon);
    let top = topmost_point(&simplified).unwrap();
    let center = Point::new(pose.center.x as i32, pose.center.y as i32);
    let expected = settings.palm.fallback_radius_scale * squared_distance(&top, &center).sqrt();
    assert!((settings.palm.fallback_radius_scale - 0.6).abs() < 1e-9);
    assert!(
        (pose.palm_radius as f64 - expected).abs() < 1e-3,
        "radius {} expected {}",
        pose.palm_radius,
        expected
    );
}

#[test]
fn test_full_frame_skin_is_rejected() {
    let mut detector = HandDetector::new();
    let frame = RgbImage::from_pixel(WIDTH, HEIGHT, SKIN);

    assert!(!detector.detect(&frame).unwrap());
    assert!(detector.extracted_image().is_none());
}

#[test]
fn test_small_blob_below_detection_area() {
    let mut detector = HandDetector::new();
    let mut frame = RgbImage::from_pixel(WIDTH, HEIGHT, BACKDROP);
    draw_filled_circle_mut(&mut frame, (100, 100), 20, SKIN);

    assert!(!detector.detect(&frame).unwrap());

    detector.set_detection_area(500);
    assert!(detector.detect(&frame).unwrap());
}

#[test]
fn test_background_capture_flow() {
    let events = ReceivedEvents::default();
    let mut detector = HandDetector::new().with_observer(Box::new(events.clone()));

    // A skin-colored object that is part of the scene
    let mut scene = RgbImage::from_pixel(WIDTH, HEIGHT, BACKDROP);
    draw_filled_rect_mut(&mut scene, Rect::at(20, 20).of_size(100, 300), SKIN);
    assert!(detector.detect(&scene).unwrap());

    detector.request_background_capture();
    assert!(!detector.detect(&scene).unwrap());
    assert_eq!(detector.background_state(), BackgroundState::Active);

    // Only the hand entering the scene is segmented
    let mut with_hand = scene.clone();
    draw_filled_circle_mut(&mut with_hand, (400, 250), 80, SKIN);
    assert!(detector.detect(&with_hand).unwrap());
    let pose = detector.hand_pose().unwrap();
    assert!(pose.center.distance_to(&Position::new(400.0, 250.0)) < 5.0);

    detector.clear_background();
    assert_eq!(detector.background_state(), BackgroundState::Inactive);
    assert_eq!(*events.events.lock().unwrap(), vec!["captured", "cleared"]);
}

#[test]
fn test_frame_size_change_with_background() {
    let mut detector = HandDetector::new();
    detector.request_background_capture();
    detector.detect(&create_fist_image()).unwrap();

    let err = detector.detect(&RgbImage::new(320, 240)).unwrap_err();
    assert_eq!(
        err,
        DetectError::FrameSizeMismatch {
            expected: (WIDTH, HEIGHT),
            actual: (320, 240),
        }
    );
}

#[test]
fn test_settings_from_json() {
    let json = r#"{
        "skin_color_lower_bound": { "h": 0, "s": 40, "v": 60 },
        "skin_color_upper_bound": { "h": 25, "s": 255, "v": 255 },
        "detection_area": 3000,
        "morphology": false
    }"#;
    let settings: DetectorSettings = serde_json::from_str(json).unwrap();
    let mut detector = HandDetector::with_settings(settings).unwrap();

    assert_eq!(detector.settings().detection_area, 3000);
    assert!(detector.detect(&create_fist_image()).unwrap());
}
