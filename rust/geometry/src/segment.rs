// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Straight line segments
//!
//! All wall derivation and boundary sampling works on [`Segment`]. Points are
//! `nalgebra::Point2<f64>`; conversion from the serializable
//! [`floorplan_core::Line2D`] is lossless.

use floorplan_core::{Line2D, Point2D};
use nalgebra::{Point2, Vector2};

/// Tolerance for parallel-line and zero-length tests
pub const EPSILON: f64 = 1e-12;

#[inline]
pub fn to_point(p: &Point2D) -> Point2<f64> {
    Point2::new(p.x, p.y)
}

#[inline]
pub fn to_record(p: &Point2<f64>) -> Point2D {
    Point2D::new(p.x, p.y)
}

#[inline]
fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl Segment {
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Self {
        Self { start, end }
    }

    pub fn from_line(line: &Line2D) -> Self {
        Self::new(to_point(&line.start), to_point(&line.end))
    }

    pub fn to_line(&self) -> Line2D {
        Line2D::new(to_record(&self.start), to_record(&self.end))
    }

    #[inline]
    pub fn vector(&self) -> Vector2<f64> {
        self.end - self.start
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    /// Unit direction, `None` for a zero-length segment
    pub fn direction(&self) -> Option<Vector2<f64>> {
        let v = self.vector();
        let len = v.norm();
        if len <= EPSILON {
            None
        } else {
            Some(v / len)
        }
    }

    /// Left-hand unit normal `(-uy, ux)`
    pub fn normal(&self) -> Option<Vector2<f64>> {
        self.direction().map(|u| Vector2::new(-u.y, u.x))
    }

    pub fn midpoint(&self) -> Point2<f64> {
        self.point_at(0.5)
    }

    /// Point at parameter `t` in `[0, 1]`
    #[inline]
    pub fn point_at(&self, t: f64) -> Point2<f64> {
        self.start + self.vector() * t
    }

    /// Orientation angle in radians, `atan2(dy, dx)`
    pub fn angle(&self) -> f64 {
        let v = self.vector();
        v.y.atan2(v.x)
    }

    /// Lengthen both ends by `d` along the segment direction.
    pub fn extend(&self, d: f64) -> Segment {
        match self.direction() {
            Some(u) => Segment::new(self.start - u * d, self.end + u * d),
            None => *self,
        }
    }

    /// Single intersection point of two segments.
    ///
    /// Parallel and collinear pairs return `None`: an overlap is a line, not a
    /// point.
    pub fn intersection(&self, other: &Segment) -> Option<Point2<f64>> {
        let r = self.vector();
        let s = other.vector();
        let denom = cross(&r, &s);
        if denom.abs() <= EPSILON * r.norm() * s.norm() {
            return None;
        }
        let qp = other.start - self.start;
        let t = cross(&qp, &s) / denom;
        let u = cross(&qp, &r) / denom;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(self.point_at(t))
        } else {
            None
        }
    }

    /// Unclamped parameter of the projection of `p` onto the supporting line
    pub fn project(&self, p: &Point2<f64>) -> f64 {
        let v = self.vector();
        let len2 = v.norm_squared();
        if len2 <= EPSILON {
            return 0.0;
        }
        (p - self.start).dot(&v) / len2
    }

    pub fn distance_to_point(&self, p: &Point2<f64>) -> f64 {
        let t = self.project(p).clamp(0.0, 1.0);
        (p - self.point_at(t)).norm()
    }

    pub fn distance_to_segment(&self, other: &Segment) -> f64 {
        if self.intersection(other).is_some() {
            return 0.0;
        }
        self.distance_to_point(&other.start)
            .min(self.distance_to_point(&other.end))
            .min(other.distance_to_point(&self.start))
            .min(other.distance_to_point(&self.end))
    }

    /// Parameter interval of this segment lying within `d` of `other`.
    ///
    /// The set of points within `d` of a segment is a convex capsule, so the
    /// result is a single interval clipped to `[0, 1]`.
    pub fn interval_near(&self, other: &Segment, d: f64) -> Option<(f64, f64)> {
        let v = self.vector();
        if v.norm() <= EPSILON {
            return (other.distance_to_point(&self.start) <= d).then_some((0.0, 1.0));
        }

        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        let mut merge = |range: Option<(f64, f64)>| {
            if let Some((a, b)) = range {
                lo = lo.min(a);
                hi = hi.max(b);
            }
        };

        merge(line_disc_interval(&self.start, &v, &other.start, d));
        merge(line_disc_interval(&self.start, &v, &other.end, d));
        if let (Some(u), Some(n)) = (other.direction(), other.normal()) {
            merge(line_slab_interval(&self.start, &v, &other.start, &u, &n, other.length(), d));
        }

        let lo = lo.max(0.0);
        let hi = hi.min(1.0);
        (lo <= hi).then_some((lo, hi))
    }
}

/// Parameters where `p0 + t v` lies inside the disc `(c, r)`
fn line_disc_interval(
    p0: &Point2<f64>,
    v: &Vector2<f64>,
    c: &Point2<f64>,
    r: f64,
) -> Option<(f64, f64)> {
    let w = p0 - c;
    let a = v.norm_squared();
    let b = 2.0 * w.dot(v);
    let cc = w.norm_squared() - r * r;
    let disc = b * b - 4.0 * a * cc;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    Some(((-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)))
}

/// Parameters where `p0 + t v` lies inside the rectangle spanned by the
/// segment `origin + s u` (`0 <= s <= len`) buffered by `r` along `n`
fn line_slab_interval(
    p0: &Point2<f64>,
    v: &Vector2<f64>,
    origin: &Point2<f64>,
    u: &Vector2<f64>,
    n: &Vector2<f64>,
    len: f64,
    r: f64,
) -> Option<(f64, f64)> {
    let w = p0 - origin;
    let mut lo = f64::NEG_INFINITY;
    let mut hi = f64::INFINITY;
    for (axis, min, max) in [(u, 0.0, len), (n, -r, r)] {
        let start = w.dot(axis);
        let rate = v.dot(axis);
        if rate.abs() <= EPSILON {
            if start < min || start > max {
                return None;
            }
            continue;
        }
        let t1 = (min - start) / rate;
        let t2 = (max - start) / rate;
        lo = lo.max(t1.min(t2));
        hi = hi.min(t1.max(t2));
    }
    (lo <= hi).then_some((lo, hi))
}
