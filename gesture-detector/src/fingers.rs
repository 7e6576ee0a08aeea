//! Fingertip candidates from convexity defects.
//!
//! Fingertips sit at the hull ends of moderate, valley-shaped defects between
//! raised fingers. Defects whose arms are too short or too long, or whose
//! opening angle is too sharp or too flat, are noise or palm curvature and are
//! dropped before deduplication.

use gesture_shared::FingerHeuristics;

use crate::geometry::{
    approximate_polygon, convex_hull_indices, convexity_defects, squared_distance,
    ConvexityDefect, PixelPoint,
};

/// Output of the fingertip extraction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FingerCandidates {
    /// Accepted fingertips in insertion order
    pub fingertips: Vec<PixelPoint>,
    /// Deepest points of the defects that contributed a fingertip
    pub farthest_points: Vec<PixelPoint>,
    /// The simplified polygon the defects were computed on
    pub simplified: Vec<PixelPoint>,
}

/// Angle at `far` between the directions to `start` and `end`, from the three
/// squared side lengths
pub fn defect_angle(start: &PixelPoint, end: &PixelPoint, far: &PixelPoint) -> f64 {
    let a2 = squared_distance(start, far);
    let b2 = squared_distance(end, far);
    let c2 = squared_distance(start, end);
    let denom = 2.0 * (a2 * b2).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    ((a2 + b2 - c2) / denom).clamp(-1.0, 1.0).acos()
}

pub struct FingerExtractor {
    heuristics: FingerHeuristics,
}

impl FingerExtractor {
    pub fn new(heuristics: FingerHeuristics) -> Self {
        Self { heuristics }
    }

    fn arm_in_range(&self, distance_sq: f64) -> bool {
        distance_sq >= self.heuristics.min_arm_distance_sq
            && distance_sq <= self.heuristics.max_arm_distance_sq
    }

    /// Both bounds reject
    fn angle_in_range(&self, angle: f64) -> bool {
        angle > self.heuristics.min_angle && angle < self.heuristics.max_angle
    }

    fn is_new_fingertip(&self, point: &PixelPoint, fingertips: &[PixelPoint]) -> bool {
        fingertips
            .iter()
            .all(|kept| squared_distance(point, kept) >= self.heuristics.dedup_distance_sq)
    }

    /// Simplify the contour and classify its convexity defects
    pub fn extract(&self, contour: &[PixelPoint]) -> FingerCandidates {
        let simplified = approximate_polygon(contour, self.heuristics.approximation_epsilon);
        let hull = convex_hull_indices(&simplified);
        let defects = convexity_defects(&simplified, &hull);

        let mut candidates = FingerCandidates::default();
        for defect in &defects {
            self.classify(&simplified, defect, &mut candidates);
        }

        log::debug!(
            "{} defects, {} fingertips, {} farthest points",
            defects.len(),
            candidates.fingertips.len(),
            candidates.farthest_points.len()
        );
        candidates.simplified = simplified;
        candidates
    }

    /// Run one defect through the filter cascade
    pub fn classify(
        &self,
        polygon: &[PixelPoint],
        defect: &ConvexityDefect,
        candidates: &mut FingerCandidates,
    ) {
        let start = polygon[defect.start];
        let end = polygon[defect.end];
        let far = polygon[defect.farthest];

        if !self.arm_in_range(squared_distance(&start, &far))
            || !self.arm_in_range(squared_distance(&end, &far))
        {
            return;
        }

        if !self.angle_in_range(defect_angle(&start, &end, &far)) {
            return;
        }

        let fingertips = &mut candidates.fingertips;
        let keep_start = self.is_new_fingertip(&start, fingertips);
        let keep_end = self.is_new_fingertip(&end, fingertips);

        match (keep_start, keep_end) {
            (true, true) => {
                if squared_distance(&start, &end) < self.heuristics.merge_distance_sq {
                    // One finger seen from both sides; keep the higher point
                    fingertips.push(if start.y < end.y { start } else { end });
                } else {
                    fingertips.push(start);
                    fingertips.push(end);
                }
            }
            (true, false) => fingertips.push(start),
            (false, true) => fingertips.push(end),
            (false, false) => return,
        }
        candidates.farthest_points.push(far);
    }
}

impl Default for FingerExtractor {
    fn default() -> Self {
        Self::new(FingerHeuristics::default())
    }
}
