// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall centerlines
//!
//! A wall polygon is reduced to the line joining the midpoints of the two
//! short sides of its minimum rotated rectangle. Centerlines are split where
//! they cross each other and measured across by a perpendicular probe.

use nalgebra::Point2;
use smallvec::SmallVec;

use crate::error::Result;
use crate::polygon::Polygon;
use crate::rect::min_rotated_rect;
use crate::segment::Segment;

/// Centerline of a wall polygon.
///
/// The shortest rectangle side and the side opposite to it are joined at
/// their midpoints, so square footprints still get opposite sides.
pub fn wall_centerline(polygon: &Polygon) -> Result<Segment> {
    let rect = min_rotated_rect(&polygon.outer)?;
    let sides = rect.sides();
    let lengths = rect.side_lengths();
    let shortest = (0..4)
        .min_by(|&a, &b| lengths[a].total_cmp(&lengths[b]))
        .unwrap_or(0);
    Ok(Segment::new(
        sides[shortest].midpoint(),
        sides[(shortest + 2) % 4].midpoint(),
    ))
}

/// Cut a line around each point into consecutive pieces.
///
/// Every point at distance `s` along the line produces cuts at `s - eps` and
/// `s + eps`. The returned pieces tile the whole line, including the short
/// `2 * eps` pieces around the cut points; callers drop pieces by length.
pub fn split_at_points(line: &Segment, points: &[Point2<f64>], eps: f64) -> Vec<Segment> {
    let len = line.length();
    if len <= 0.0 || points.is_empty() {
        return vec![*line];
    }

    let mut cuts: SmallVec<[f64; 8]> = SmallVec::new();
    cuts.push(0.0);
    cuts.push(len);
    for p in points {
        let s = line.project(p) * len;
        for c in [s - eps, s + eps] {
            if c > 0.0 && c < len {
                cuts.push(c);
            }
        }
    }
    cuts.sort_by(f64::total_cmp);
    cuts.dedup();

    cuts.windows(2)
        .map(|w| Segment::new(line.point_at(w[0] / len), line.point_at(w[1] / len)))
        .collect()
}

/// Width of the parent polygon across the segment midpoint.
///
/// A probe perpendicular to the segment, twice the larger bounding extent of
/// the polygon on each side, is clipped to the polygon and its inside length
/// summed.
pub fn perpendicular_width(segment: &Segment, parent: &Polygon) -> f64 {
    let Some(n) = segment.normal() else {
        return 0.0;
    };
    let Some((min, max)) = parent.bounds() else {
        return 0.0;
    };
    let reach = (max.x - min.x).max(max.y - min.y) * 2.0;
    let mid = segment.midpoint();
    let probe = Segment::new(mid - n * reach, mid + n * reach);
    parent.clip_length(&probe)
}
