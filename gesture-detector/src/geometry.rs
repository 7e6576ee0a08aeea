//! Polygon helpers used by the contour and finger stages

use gesture_shared::BoundingBox;
use imageproc::point::Point;

/// Integer pixel coordinate, as produced by contour tracing
pub type PixelPoint = Point<i32>;

/// A region where a contour deviates inward from its convex hull.
///
/// Indices refer to the polygon the hull was computed over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvexityDefect {
    pub start: usize,
    pub end: usize,
    pub farthest: usize,
    /// Distance of the farthest point from the hull edge
    pub depth: f64,
}

pub fn squared_distance(a: &PixelPoint, b: &PixelPoint) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    dx * dx + dy * dy
}

/// Distance from `p` to the infinite line through `a` and `b`
fn line_distance(p: &PixelPoint, a: &PixelPoint, b: &PixelPoint) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return squared_distance(p, a).sqrt();
    }
    let px = (p.x - a.x) as f64;
    let py = (p.y - a.y) as f64;
    (dx * py - dy * px).abs() / len
}

fn cross(o: &PixelPoint, a: &PixelPoint, b: &PixelPoint) -> i64 {
    (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
}

/// Shoelace area of a closed polygon
pub fn polygon_area(points: &[PixelPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice_area.abs() as f64 / 2.0
}

pub fn bounding_box(points: &[PixelPoint]) -> Option<BoundingBox> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;

    Some(BoundingBox::new(
        min_x.max(0) as u32,
        min_y.max(0) as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

/// Simplify a closed contour with the Douglas-Peucker algorithm.
///
/// The curve is split at the point farthest from the first point and both
/// halves are simplified independently; the result does not repeat its first
/// point.
pub fn approximate_polygon(points: &[PixelPoint], epsilon: f64) -> Vec<PixelPoint> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let mut split = 0;
    let mut split_dist = 0.0;
    for (i, p) in points.iter().enumerate().skip(1) {
        let d = squared_distance(&points[0], p);
        if d > split_dist {
            split_dist = d;
            split = i;
        }
    }
    if split == 0 {
        return vec![points[0]];
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[split] = true;

    // Chain ends are unwrapped indices; `n` stands for the first point again
    let mut stack = vec![(0, split), (split, n)];
    while let Some((start, end)) = stack.pop() {
        if end - start < 2 {
            continue;
        }
        let a = &points[start % n];
        let b = &points[end % n];

        let mut farthest = start;
        let mut farthest_dist = 0.0;
        for i in start + 1..end {
            let d = line_distance(&points[i % n], a, b);
            if d > farthest_dist {
                farthest_dist = d;
                farthest = i;
            }
        }

        if farthest_dist > epsilon {
            keep[farthest % n] = true;
            stack.push((start, farthest));
            stack.push((farthest, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Indices of the convex hull vertices of `points`, in ascending order.
///
/// Collinear points on hull edges are not part of the hull. For a simple
/// polygon the ascending order is also the order along the contour.
pub fn convex_hull_indices(points: &[PixelPoint]) -> Vec<usize> {
    let n = points.len();
    if n < 3 {
        return (0..n).collect();
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| (points[i].x, points[i].y, i));

    // Andrew's monotone chain
    let mut hull: Vec<usize> = Vec::with_capacity(2 * n);
    for &i in &order {
        while hull.len() >= 2
            && cross(
                &points[hull[hull.len() - 2]],
                &points[hull[hull.len() - 1]],
                &points[i],
            ) <= 0
        {
            hull.pop();
        }
        hull.push(i);
    }
    let lower_len = hull.len() + 1;
    for &i in order.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(
                &points[hull[hull.len() - 2]],
                &points[hull[hull.len() - 1]],
                &points[i],
            ) <= 0
        {
            hull.pop();
        }
        hull.push(i);
    }
    hull.pop();

    hull.sort_unstable();
    hull.dedup();
    hull
}

/// Convexity defects of a polygon given its hull indices.
///
/// For every hull edge, the polygon points between its two vertices are
/// scanned for the one farthest from the edge; edges whose span has no point
/// strictly off the edge line produce no defect.
pub fn convexity_defects(points: &[PixelPoint], hull: &[usize]) -> Vec<ConvexityDefect> {
    let n = points.len();
    if hull.len() < 3 || n < 4 {
        return Vec::new();
    }

    let mut defects = Vec::new();
    for (k, &start) in hull.iter().enumerate() {
        let end = hull[(k + 1) % hull.len()];
        let a = &points[start];
        let b = &points[end];

        let mut farthest = None;
        let mut depth = 0.0;
        let mut j = (start + 1) % n;
        while j != end {
            let d = line_distance(&points[j], a, b);
            if d > depth {
                depth = d;
                farthest = Some(j);
            }
            j = (j + 1) % n;
        }

        if let Some(farthest) = farthest {
            defects.push(ConvexityDefect {
                start,
                end,
                farthest,
                depth,
            });
        }
    }
    defects
}
