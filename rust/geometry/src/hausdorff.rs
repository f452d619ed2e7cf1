// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discrete Hausdorff distance between sets of line segments
//!
//! Vertices of each set are measured against the segments of the other set,
//! and the larger of the two directed distances is returned.

use nalgebra::Point2;

use crate::segment::Segment;

fn directed(from: &[Segment], to: &[Segment]) -> f64 {
    let distance = |p: &Point2<f64>| {
        to.iter()
            .map(|s| s.distance_to_point(p))
            .fold(f64::INFINITY, f64::min)
    };
    from.iter()
        .flat_map(|s| [s.start, s.end])
        .map(|p| distance(&p))
        .fold(0.0, f64::max)
}

/// Symmetric discrete Hausdorff distance. Empty inputs give 0.
pub fn hausdorff_distance(a: &[Segment], b: &[Segment]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    directed(a, b).max(directed(b, a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::ring_edges;
    use approx::assert_relative_eq;

    #[test]
    fn test_identical_rings() {
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let edges = ring_edges(&ring);
        assert_relative_eq!(hausdorff_distance(&edges, &edges), 0.0);
    }

    #[test]
    fn test_notched_square() {
        // L-shape inside its 2x2 bounding square
        let l = ring_edges(&[
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ]);
        let square = ring_edges(&[
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ]);
        assert_relative_eq!(hausdorff_distance(&l, &square), 1.0);
    }
}
