// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Convex hull and minimum-area rotated rectangle

use nalgebra::{Point2, Vector2};

use crate::error::{Error, Result};
use crate::polygon::{ring_edges, Polygon};
use crate::segment::Segment;

/// Convex hull (Andrew's monotone chain), counter-clockwise, no repeated
/// closing vertex. Collinear points are dropped.
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut pts: Vec<Point2<f64>> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    fn turn(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    }

    let mut lower: Vec<Point2<f64>> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && turn(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point2<f64>> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && turn(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Rectangle with arbitrary orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    /// Counter-clockwise corners
    pub corners: [Point2<f64>; 4],
}

impl RotatedRect {
    pub fn sides(&self) -> [Segment; 4] {
        let c = &self.corners;
        [
            Segment::new(c[0], c[1]),
            Segment::new(c[1], c[2]),
            Segment::new(c[2], c[3]),
            Segment::new(c[3], c[0]),
        ]
    }

    pub fn side_lengths(&self) -> [f64; 4] {
        self.sides().map(|s| s.length())
    }

    pub fn short_side(&self) -> f64 {
        self.side_lengths().into_iter().fold(f64::INFINITY, f64::min)
    }

    pub fn long_side(&self) -> f64 {
        self.side_lengths().into_iter().fold(0.0, f64::max)
    }

    pub fn perimeter(&self) -> f64 {
        self.side_lengths().iter().sum()
    }

    pub fn area(&self) -> f64 {
        let l = self.side_lengths();
        l[0] * l[1]
    }

    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(self.corners.to_vec())
    }
}

/// Minimum-area rectangle enclosing `points`.
///
/// One side of the optimal rectangle is collinear with a hull edge, so each
/// hull edge is tried as orientation. Fewer than three non-collinear points
/// is a degenerate input.
pub fn min_rotated_rect(points: &[Point2<f64>]) -> Result<RotatedRect> {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return Err(Error::Degenerate(format!(
            "cannot fit a rectangle to {} distinct non-collinear points",
            hull.len()
        )));
    }

    let mut best: Option<(f64, RotatedRect)> = None;
    for edge in ring_edges(&hull) {
        let Some(u) = edge.direction() else {
            continue;
        };
        let n = Vector2::new(-u.y, u.x);
        let origin = hull[0];

        let (mut min_u, mut max_u) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_n, mut max_n) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in &hull {
            let d = p - origin;
            let pu = d.dot(&u);
            let pn = d.dot(&n);
            min_u = min_u.min(pu);
            max_u = max_u.max(pu);
            min_n = min_n.min(pn);
            max_n = max_n.max(pn);
        }

        let area = (max_u - min_u) * (max_n - min_n);
        if best.as_ref().map_or(true, |(a, _)| area < *a) {
            let at = |su: f64, sn: f64| origin + u * su + n * sn;
            let rect = RotatedRect {
                corners: [
                    at(min_u, min_n),
                    at(max_u, min_n),
                    at(max_u, max_n),
                    at(min_u, max_n),
                ],
            };
            best = Some((area, rect));
        }
    }

    best.map(|(_, r)| r)
        .ok_or_else(|| Error::Degenerate("hull has no usable edges".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_convex_hull_drops_interior_and_collinear() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
            Point2::new(1.0, 1.0),
        ];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
    }

    #[test]
    fn test_rotated_rect_of_rotated_square() {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(s, s),
            Point2::new(0.0, 2.0 * s),
            Point2::new(-s, s),
        ];
        let rect = min_rotated_rect(&pts).unwrap();
        assert_relative_eq!(rect.area(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(rect.short_side(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_wall_rectangle() {
        let pts = vec![
            Point2::new(0.0, -0.1),
            Point2::new(5.0, -0.1),
            Point2::new(5.0, 0.1),
            Point2::new(0.0, 0.1),
        ];
        let rect = min_rotated_rect(&pts).unwrap();
        assert_relative_eq!(rect.long_side(), 5.0, epsilon = 1e-9);
        assert_relative_eq!(rect.short_side(), 0.2, epsilon = 1e-9);
        assert_relative_eq!(rect.perimeter(), 10.4, epsilon = 1e-9);
    }

    #[test]
    fn test_collinear_points_are_degenerate() {
        let pts = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)];
        assert!(matches!(min_rotated_rect(&pts), Err(Error::Degenerate(_))));
    }
}
