// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon with holes for point, segment and proximity queries

use floorplan_core::Polygon2D;
use nalgebra::Point2;
use smallvec::SmallVec;

use crate::bool2d::{compute_signed_area, contour_bounds, is_valid_contour, point_in_contour};
use crate::segment::{to_point, to_record, Segment};

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub outer: Vec<Point2<f64>>,
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Polygon {
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outer: Vec<Point2<f64>>, holes: Vec<Vec<Point2<f64>>>) -> Self {
        Self { outer, holes }
    }

    pub fn to_record(&self) -> Polygon2D {
        Polygon2D::with_holes(
            self.outer.iter().map(to_record).collect(),
            self.holes
                .iter()
                .map(|h| h.iter().map(to_record).collect())
                .collect(),
        )
    }

    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| compute_signed_area(h).abs()).sum();
        (compute_signed_area(&self.outer).abs() - holes).max(0.0)
    }

    pub fn is_valid(&self) -> bool {
        is_valid_contour(&self.outer)
    }

    /// Area-weighted centroid, falling back to the vertex mean for
    /// zero-area rings.
    pub fn centroid(&self) -> Point2<f64> {
        let (mut area, mut cx, mut cy) = ring_moments(&self.outer);
        let sign = area.signum();
        area *= sign;
        cx *= sign;
        cy *= sign;
        for hole in &self.holes {
            let (a, x, y) = ring_moments(hole);
            let s = a.signum();
            area -= a * s;
            cx -= x * s;
            cy -= y * s;
        }
        if area.abs() > 1e-12 {
            return Point2::new(cx / area, cy / area);
        }

        let n = self.outer.len().max(1) as f64;
        let (sx, sy) = self
            .outer
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point2::new(sx / n, sy / n)
    }

    pub fn bounds(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        contour_bounds(&self.outer)
    }

    /// Strict interior test (ray casting, holes excluded)
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        point_in_contour(p, &self.outer) && !self.holes.iter().any(|h| point_in_contour(p, h))
    }

    /// Edges of the outer ring, in ring order
    pub fn outer_edges(&self) -> Vec<Segment> {
        ring_edges(&self.outer)
    }

    /// Edges of every ring
    pub fn boundary(&self) -> Vec<Segment> {
        let mut edges = ring_edges(&self.outer);
        for hole in &self.holes {
            edges.extend(ring_edges(hole));
        }
        edges
    }

    pub fn perimeter(&self) -> f64 {
        self.outer_edges().iter().map(Segment::length).sum()
    }

    /// Distance to the polygon region (0 inside)
    pub fn distance_to_point(&self, p: &Point2<f64>) -> f64 {
        if self.contains(p) {
            return 0.0;
        }
        self.boundary()
            .iter()
            .map(|e| e.distance_to_point(p))
            .fold(f64::INFINITY, f64::min)
    }

    /// Distance from a segment to the polygon region (0 when touching)
    pub fn distance_to_segment(&self, seg: &Segment) -> f64 {
        if self.contains(&seg.start) || self.contains(&seg.end) {
            return 0.0;
        }
        self.boundary()
            .iter()
            .map(|e| e.distance_to_segment(seg))
            .fold(f64::INFINITY, f64::min)
    }

    /// Length of `seg` inside the polygon
    pub fn clip_length(&self, seg: &Segment) -> f64 {
        let mut params: SmallVec<[f64; 8]> = SmallVec::new();
        params.push(0.0);
        params.push(1.0);
        for edge in self.boundary() {
            if let Some(p) = seg.intersection(&edge) {
                params.push(seg.project(&p).clamp(0.0, 1.0));
            }
        }
        params.sort_by(f64::total_cmp);

        let len = seg.length();
        params
            .windows(2)
            .filter(|w| w[1] - w[0] > 0.0)
            .filter(|w| self.contains(&seg.point_at((w[0] + w[1]) / 2.0)))
            .map(|w| (w[1] - w[0]) * len)
            .sum()
    }

    /// Length of this polygon's boundary lying within `d` of `other`'s boundary.
    pub fn boundary_length_near(&self, other: &Polygon, d: f64) -> f64 {
        let other_edges = other.boundary();
        self.boundary()
            .iter()
            .map(|edge| {
                let mut intervals: Vec<(f64, f64)> = other_edges
                    .iter()
                    .filter_map(|o| edge.interval_near(o, d))
                    .collect();
                merged_length(&mut intervals) * edge.length()
            })
            .sum()
    }
}

impl From<&Polygon2D> for Polygon {
    fn from(p: &Polygon2D) -> Self {
        Self {
            outer: p.outer.iter().map(to_point).collect(),
            holes: p
                .holes
                .iter()
                .map(|h| h.iter().map(to_point).collect())
                .collect(),
        }
    }
}

/// Closed-ring edges; zero-length edges are skipped
pub fn ring_edges(ring: &[Point2<f64>]) -> Vec<Segment> {
    let n = ring.len();
    if n < 2 {
        return Vec::new();
    }
    (0..n)
        .map(|i| Segment::new(ring[i], ring[(i + 1) % n]))
        .filter(|s| s.length() > 0.0)
        .collect()
}

/// Signed area and first moments of a ring
fn ring_moments(ring: &[Point2<f64>]) -> (f64, f64, f64) {
    let n = ring.len();
    if n < 3 {
        return (0.0, 0.0, 0.0);
    }
    let mut a = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p = ring[i];
        let q = ring[(i + 1) % n];
        let c = p.x * q.y - q.x * p.y;
        a += c;
        cx += (p.x + q.x) * c;
        cy += (p.y + q.y) * c;
    }
    (a / 2.0, cx / 6.0, cy / 6.0)
}

/// Total length of the union of parameter intervals
fn merged_length(intervals: &mut [(f64, f64)]) -> f64 {
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut total = 0.0;
    let mut current: Option<(f64, f64)> = None;
    for &(lo, hi) in intervals.iter() {
        current = match current {
            Some((clo, chi)) if lo <= chi => Some((clo, chi.max(hi))),
            Some((clo, chi)) => {
                total += chi - clo;
                Some((lo, hi))
            }
            None => Some((lo, hi)),
        };
    }
    if let Some((lo, hi)) = current {
        total += hi - lo;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::from(&Polygon2D::rectangle(x0, y0, x1, y1))
    }

    #[test]
    fn test_centroid_with_hole() {
        let outer = rect(0.0, 0.0, 4.0, 4.0);
        let hole = rect(0.0, 0.0, 2.0, 2.0);
        let poly = Polygon::with_holes(outer.outer, vec![hole.outer]);
        let c = poly.centroid();
        // 16 * (2,2) - 4 * (1,1) over 12
        assert_relative_eq!(c.x, 28.0 / 12.0, epsilon = 1e-12);
        assert_relative_eq!(c.y, 28.0 / 12.0, epsilon = 1e-12);
        assert_relative_eq!(poly.area(), 12.0);
    }

    #[test]
    fn test_clip_length_through_wall() {
        let wall = rect(0.0, -0.1, 5.0, 0.1);
        let probe = Segment::new(Point2::new(2.5, -10.0), Point2::new(2.5, 10.0));
        assert_relative_eq!(wall.clip_length(&probe), 0.2, epsilon = 1e-9);

        // U-shape: probe crosses two legs
        let u = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(3.0, 2.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ]);
        let probe = Segment::new(Point2::new(-1.0, 1.5), Point2::new(4.0, 1.5));
        assert_relative_eq!(u.clip_length(&probe), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_distances() {
        let room = rect(0.0, 0.1, 5.0, 3.0);
        assert_relative_eq!(room.distance_to_point(&Point2::new(2.5, 0.3)), 0.0);
        assert_relative_eq!(room.distance_to_point(&Point2::new(2.5, -0.1)), 0.2, epsilon = 1e-12);
        let seg = Segment::new(Point2::new(6.0, 1.0), Point2::new(8.0, 1.0));
        assert_relative_eq!(room.distance_to_segment(&seg), 1.0);
    }

    #[test]
    fn test_boundary_length_near() {
        let a = rect(0.0, 0.0, 4.0, 3.0);
        let b = rect(0.0, 3.2, 2.0, 5.0);
        // top edge of a within 0.6 of b: x in [0, 2 + sqrt(0.36 - 0.04)]
        let reach = (0.36f64 - 0.04).sqrt();
        let near = a.boundary_length_near(&b, 0.6);
        // the left side of a also passes within 0.6 of the corner of b
        let sides = 0.6 - 0.2;
        assert_relative_eq!(near, 2.0 + reach + sides, epsilon = 1e-9);

        let far = rect(10.0, 10.0, 11.0, 11.0);
        assert_relative_eq!(a.boundary_length_near(&far, 0.6), 0.0);
    }
}
