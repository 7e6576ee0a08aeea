//! Hand contour selection

use gesture_shared::BoundingBox;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

use crate::geometry::{bounding_box, polygon_area, PixelPoint};

/// The outer boundary chosen as the hand
#[derive(Debug, Clone, PartialEq)]
pub struct HandContour {
    pub points: Vec<PixelPoint>,
    pub area: f64,
    pub bounds: BoundingBox,
}

/// Outer (non-hole) boundaries of the foreground regions of `mask`
pub fn outer_contours(mask: &GrayImage) -> Vec<Vec<PixelPoint>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .map(|c| c.points)
        .collect()
}

/// Pick the largest outer contour with area strictly above `min_area`.
///
/// Ties keep the contour found first. A winner covering more than
/// `max_area_ratio` of the mask is treated as a filter failure and rejected.
pub fn select_hand_contour(
    mask: &GrayImage,
    min_area: f64,
    max_area_ratio: f64,
) -> Option<HandContour> {
    let mut best: Option<(Vec<PixelPoint>, f64)> = None;

    for points in outer_contours(mask) {
        let area = polygon_area(&points);
        if area <= min_area {
            continue;
        }
        if best.as_ref().map_or(true, |(_, best_area)| area > *best_area) {
            best = Some((points, area));
        }
    }

    let (points, area) = best?;
    let frame_area = mask.width() as f64 * mask.height() as f64;
    if area > max_area_ratio * frame_area {
        log::debug!(
            "Rejecting contour covering {:.1}% of the frame",
            100.0 * area / frame_area
        );
        return None;
    }

    let bounds = bounding_box(&points)?;
    Some(HandContour {
        points,
        area,
        bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    #[test]
    fn test_empty_mask_selects_nothing() {
        let mask = GrayImage::new(50, 50);
        assert!(select_hand_contour(&mask, 10.0, 0.9).is_none());
    }

    #[test]
    fn test_single_circle_is_selected() {
        let mut mask = GrayImage::new(200, 200);
        draw_filled_circle_mut(&mut mask, (100, 100), 40, Luma([255]));

        let contour = select_hand_contour(&mask, 1000.0, 0.9).expect("circle selected");
        let expected = std::f64::consts::PI * 40.0 * 40.0;
        assert!((contour.area - expected).abs() / expected < 0.1);
        assert_eq!(contour.bounds, BoundingBox::new(60, 60, 81, 81));
    }

    #[test]
    fn test_area_must_exceed_minimum() {
        let mut mask = GrayImage::new(100, 100);
        draw_filled_rect_mut(&mut mask, Rect::at(10, 10).of_size(11, 11), Luma([255]));

        // Traced boundary encloses 10 x 10
        assert!(select_hand_contour(&mask, 99.0, 0.9).is_some());
        assert!(select_hand_contour(&mask, 100.0, 0.9).is_none());
    }

    #[test]
    fn test_largest_contour_wins() {
        let mut mask = GrayImage::new(200, 100);
        draw_filled_rect_mut(&mut mask, Rect::at(5, 5).of_size(21, 21), Luma([255]));
        draw_filled_rect_mut(&mut mask, Rect::at(100, 20).of_size(41, 41), Luma([255]));

        let contour = select_hand_contour(&mask, 50.0, 0.9).unwrap();
        assert_eq!(contour.area, 1600.0);
        assert_eq!(contour.bounds, BoundingBox::new(100, 20, 41, 41));
    }

    #[test]
    fn test_equal_areas_keep_first_found() {
        let mut mask = GrayImage::new(200, 100);
        draw_filled_rect_mut(&mut mask, Rect::at(120, 10).of_size(21, 21), Luma([255]));
        draw_filled_rect_mut(&mut mask, Rect::at(10, 50).of_size(21, 21), Luma([255]));

        // Raster scan meets the upper square first
        let contour = select_hand_contour(&mask, 50.0, 0.9).unwrap();
        assert_eq!(contour.bounds.y, 10);
    }

    #[test]
    fn test_full_frame_blob_is_rejected() {
        let mask = GrayImage::from_pixel(100, 100, Luma([255]));
        assert!(select_hand_contour(&mask, 10.0, 0.9).is_none());
    }

    #[test]
    fn test_holes_are_not_candidates() {
        let mut mask = GrayImage::new(100, 100);
        draw_filled_rect_mut(&mut mask, Rect::at(10, 10).of_size(61, 61), Luma([255]));
        draw_filled_rect_mut(&mut mask, Rect::at(20, 20).of_size(41, 41), Luma([0]));

        let contours = outer_contours(&mask);
        assert_eq!(contours.len(), 1);
        let selected = select_hand_contour(&mask, 100.0, 0.9).unwrap();
        assert_eq!(selected.area, 3600.0);
    }
}
