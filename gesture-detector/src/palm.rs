//! Hand center and palm radius estimation

use gesture_shared::PalmHeuristics;
use image::{GrayImage, Luma};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::geometry::{squared_distance, PixelPoint};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palm {
    pub center: PixelPoint,
    pub radius: f64,
}

/// Rasterize a closed contour and its interior
pub fn filled_contour_mask(contour: &[PixelPoint], width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);

    let mut polygon = contour.to_vec();
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    if polygon.len() >= 3 {
        draw_polygon_mut(&mut mask, &polygon, Luma([255]));
    }
    // The boundary itself belongs to the region
    for p in contour {
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
            mask.put_pixel(p.x as u32, p.y as u32, Luma([255]));
        }
    }
    mask
}

/// Location of the region pixel farthest from any non-region pixel.
///
/// Everything outside the image counts as non-region, so a hand cut off by
/// the frame edge gets its center pulled away from that edge instead of
/// onto it. Ties resolve to the first maximum in row-major order.
pub fn most_interior_point(region: &GrayImage) -> Option<PixelPoint> {
    let (width, height) = region.dimensions();
    // One pixel of background around the region
    let outside = GrayImage::from_fn(width + 2, height + 2, |x, y| {
        let inside = x >= 1
            && y >= 1
            && x <= width
            && y <= height
            && region.get_pixel(x - 1, y - 1)[0] != 0;
        Luma([if inside { 0 } else { 255 }])
    });
    let distances = euclidean_squared_distance_transform(&outside);

    let mut best: Option<(PixelPoint, f64)> = None;
    for (x, y, d) in distances.enumerate_pixels() {
        let d = d[0];
        if d > 0.0 && best.map_or(true, |(_, best_d)| d > best_d) {
            best = Some((Point::new(x as i32 - 1, y as i32 - 1), d));
        }
    }
    best.map(|(p, _)| p)
}

/// First point with the smallest `y`
pub fn topmost_point(points: &[PixelPoint]) -> Option<PixelPoint> {
    points.iter().copied().reduce(|top, p| if p.y < top.y { p } else { top })
}

pub struct PalmEstimator {
    heuristics: PalmHeuristics,
}

impl PalmEstimator {
    pub fn new(heuristics: PalmHeuristics) -> Self {
        Self { heuristics }
    }

    /// Radius from the center and the defect points.
    ///
    /// With defect points the radius is the distance to the nearest one,
    /// scaled up; without any (a fist) it is a fraction of the distance to
    /// the top of the simplified contour.
    pub fn radius(
        &self,
        center: &PixelPoint,
        simplified: &[PixelPoint],
        farthest_points: &[PixelPoint],
    ) -> f64 {
        let nearest = farthest_points
            .iter()
            .map(|p| squared_distance(p, center))
            .min_by(f64::total_cmp);

        match nearest {
            Some(d) => self.heuristics.defect_radius_scale * d.sqrt(),
            None => topmost_point(simplified).map_or(0.0, |top| {
                self.heuristics.fallback_radius_scale * squared_distance(&top, center).sqrt()
            }),
        }
    }

    /// Estimate from an already rasterized hand region
    pub fn estimate_from_region(
        &self,
        region: &GrayImage,
        simplified: &[PixelPoint],
        farthest_points: &[PixelPoint],
    ) -> Option<Palm> {
        let center = most_interior_point(region)?;
        let radius = self.radius(&center, simplified, farthest_points);
        Some(Palm { center, radius })
    }

    pub fn estimate(
        &self,
        contour: &[PixelPoint],
        simplified: &[PixelPoint],
        farthest_points: &[PixelPoint],
        width: u32,
        height: u32,
    ) -> Option<Palm> {
        let region = filled_contour_mask(contour, width, height);
        self.estimate_from_region(&region, simplified, farthest_points)
    }
}

impl Default for PalmEstimator {
    fn default() -> Self {
        Self::new(PalmHeuristics::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::outer_contours;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    #[test]
    fn test_filled_mask_covers_interior() {
        let square = vec![
            Point::new(10, 10),
            Point::new(30, 10),
            Point::new(30, 30),
            Point::new(10, 30),
        ];
        let mask = filled_contour_mask(&square, 40, 40);
        assert_eq!(mask.get_pixel(20, 20)[0], 255);
        assert_eq!(mask.get_pixel(10, 10)[0], 255);
        assert_eq!(mask.get_pixel(5, 20)[0], 0);
        assert_eq!(mask.get_pixel(35, 35)[0], 0);
    }

    #[test]
    fn test_center_of_disk() {
        let mut region = GrayImage::new(120, 100);
        draw_filled_circle_mut(&mut region, (60, 45), 30, Luma([255]));

        let center = most_interior_point(&region).unwrap();
        assert_eq!(center, Point::new(60, 45));
    }

    #[test]
    fn test_center_prefers_wide_part() {
        // A palm with a thin arm below it
        let mut region = GrayImage::new(200, 200);
        draw_filled_circle_mut(&mut region, (100, 70), 40, Luma([255]));
        draw_filled_rect_mut(&mut region, Rect::at(90, 100).of_size(20, 100), Luma([255]));

        let center = most_interior_point(&region).unwrap();
        assert!(squared_distance(&center, &Point::new(100, 70)) <= 4.0);
    }

    #[test]
    fn test_empty_region_has_no_center() {
        assert!(most_interior_point(&GrayImage::new(10, 10)).is_none());
    }

    #[test]
    fn test_region_touching_border() {
        let region = GrayImage::from_pixel(9, 5, Luma([255]));
        let center = most_interior_point(&region).unwrap();
        assert_eq!(center.y, 2);
    }

    #[test]
    fn test_frame_edge_bounds_the_region() {
        // A 60 x 60 block flush with the left, top and bottom edges
        let mut region = GrayImage::new(200, 60);
        draw_filled_rect_mut(&mut region, Rect::at(0, 0).of_size(60, 60), Luma([255]));

        let center = most_interior_point(&region).unwrap();
        assert_eq!(center, Point::new(29, 29));
    }

    #[test]
    fn test_radius_from_nearest_defect_point() {
        let estimator = PalmEstimator::default();
        let center = Point::new(100, 100);
        let farthest = vec![Point::new(100, 60), Point::new(130, 100)];

        let radius = estimator.radius(&center, &[], &farthest);
        assert!((radius - 1.2 * 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_radius_fallback_uses_topmost_point() {
        let estimator = PalmEstimator::default();
        let center = Point::new(50, 80);
        let simplified = vec![
            Point::new(20, 60),
            Point::new(50, 30),
            Point::new(80, 30),
            Point::new(80, 120),
        ];

        let radius = estimator.radius(&center, &simplified, &[]);
        assert!((radius - 0.6 * 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_on_traced_square() {
        let mut mask = GrayImage::new(100, 100);
        draw_filled_rect_mut(&mut mask, Rect::at(20, 20).of_size(41, 41), Luma([255]));
        let contour = outer_contours(&mask).remove(0);
        let simplified = crate::geometry::approximate_polygon(&contour, 10.0);

        let palm = PalmEstimator::default()
            .estimate(&contour, &simplified, &[], 100, 100)
            .unwrap();

        assert_eq!(palm.center, Point::new(40, 40));
        // Topmost simplified point is the top-left corner (20, 20)
        let expected = 0.6 * (800.0f64).sqrt();
        assert!((palm.radius - expected).abs() < 1e-9);
    }
}
