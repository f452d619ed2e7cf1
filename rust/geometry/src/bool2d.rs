// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Boolean Operations for Room and Wall Overlap Tests
//!
//! Polygon intersection and union use the i_overlay crate. Room overlap checks
//! only need areas, so results are reduced to areas or to plain polygons.

use crate::polygon::Polygon;
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

/// Minimum area threshold - polygons smaller than this are considered degenerate
const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Area of the intersection of two polygons
pub fn intersection_area(a: &Polygon, b: &Polygon) -> f64 {
    if !a.is_valid() || !b.is_valid() {
        return 0.0;
    }
    if let (Some((a_min, a_max)), Some((b_min, b_max))) = (a.bounds(), b.bounds()) {
        if !bounds_overlap(&a_min, &a_max, &b_min, &b_max) {
            return 0.0;
        }
    }

    let subject = polygon_to_paths(a);
    let clip = polygon_to_paths(b);

    // Result is Vec<Vec<Vec<[f64; 2]>>> - Vec of shapes, each shape is Vec of contours
    let result = subject.overlay(&clip, OverlayRule::Intersect, FillRule::EvenOdd);
    shapes_to_polygons(&result).iter().map(Polygon::area).sum()
}

/// Union of any number of polygons
///
/// Rings are oriented (outer counter-clockwise, holes clockwise) and filled
/// with the non-zero rule, so overlapping inputs merge instead of cancelling.
pub fn union_polygons(polygons: &[Polygon]) -> Vec<Polygon> {
    let valid: Vec<&Polygon> = polygons.iter().filter(|p| p.is_valid()).collect();
    match valid.len() {
        0 => return Vec::new(),
        1 => return vec![valid[0].clone()],
        _ => {}
    }

    let subject = polygon_to_paths(valid[0]);
    let clip: Vec<Vec<[f64; 2]>> = valid
        .iter()
        .skip(1)
        .flat_map(|p| polygon_to_paths(p))
        .collect();

    let result = subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero);
    shapes_to_polygons(&result)
}

/// True when `inner` lies inside `outer` up to an area tolerance
pub fn covers(outer: &Polygon, inner: &Polygon, tol: f64) -> bool {
    let inner_area = inner.area();
    inner_area > 0.0 && (inner_area - intersection_area(outer, inner)).abs() <= tol
}

/// Check if a contour is valid (has area, not degenerate)
pub fn is_valid_contour(contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    let area = compute_signed_area(contour).abs();
    area > MIN_AREA_THRESHOLD
}

/// Compute the signed area of a 2D contour
/// Positive = counter-clockwise, Negative = clockwise
pub fn compute_signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }

    area * 0.5
}

/// Ensure contour has counter-clockwise winding (positive area)
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let area = compute_signed_area(contour);
    if area < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Ensure contour has clockwise winding (for holes)
pub fn ensure_cw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let area = compute_signed_area(contour);
    if area > 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Check if a point is inside a contour using ray casting
pub fn point_in_contour(point: &Point2<f64>, contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = contour.len();

    let mut j = n - 1;
    for i in 0..n {
        let pi = &contour[i];
        let pj = &contour[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Compute bounding box of a contour
pub fn contour_bounds(contour: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    if contour.is_empty() {
        return None;
    }

    let mut min = contour[0];
    let mut max = contour[0];

    for p in contour.iter().skip(1) {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }

    Some((min, max))
}

/// Check if two bounding boxes overlap
pub fn bounds_overlap(
    a_min: &Point2<f64>,
    a_max: &Point2<f64>,
    b_min: &Point2<f64>,
    b_max: &Point2<f64>,
) -> bool {
    a_min.x <= b_max.x && a_max.x >= b_min.x && a_min.y <= b_max.y && a_max.y >= b_min.y
}

// ============================================================================
// Internal Helper Functions
// ============================================================================

/// Convert a polygon to i_overlay path format
fn polygon_to_paths(polygon: &Polygon) -> Vec<Vec<[f64; 2]>> {
    let mut paths = Vec::with_capacity(1 + polygon.holes.len());

    let outer = ensure_ccw(&polygon.outer);
    paths.push(contour_to_path(&outer));

    for hole in &polygon.holes {
        let hole_cw = ensure_cw(hole);
        paths.push(contour_to_path(&hole_cw));
    }

    paths
}

/// Convert a Point2 contour to i_overlay path format
fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

/// Convert i_overlay result shapes back to polygons
///
/// i_overlay returns Vec<Vec<Vec<[f64; 2]>>> where:
/// - Outer Vec: list of shapes
/// - Middle Vec: list of contours per shape (first is outer, rest are holes)
/// - Inner Vec: list of points per contour
fn shapes_to_polygons(shapes: &[Vec<Vec<[f64; 2]>>]) -> Vec<Polygon> {
    let mut polygons = Vec::with_capacity(shapes.len());
    for shape in shapes {
        let Some(first) = shape.first() else {
            continue;
        };
        let outer: Vec<Point2<f64>> = first.iter().map(|p| Point2::new(p[0], p[1])).collect();
        if !is_valid_contour(&outer) {
            continue;
        }

        let holes = shape
            .iter()
            .skip(1)
            .map(|c| c.iter().map(|p| Point2::new(p[0], p[1])).collect::<Vec<_>>())
            .filter(|h| is_valid_contour(h))
            .map(|h| ensure_cw(&h))
            .collect();

        polygons.push(Polygon::with_holes(ensure_ccw(&outer), holes));
    }
    polygons
}
