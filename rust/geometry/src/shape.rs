// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rectangularity of a group of polygons
//!
//! The fit rectangle is the minimum rotated rectangle of the convex hull of
//! all outer-ring vertices. The irregularity ratio is the Hausdorff distance
//! between the outer rings and the rectangle boundary, divided by a quarter
//! of the rectangle perimeter.

use crate::error::{Error, Result};
use crate::hausdorff::hausdorff_distance;
use crate::polygon::{ring_edges, Polygon};
use crate::rect::{min_rotated_rect, RotatedRect};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeFit {
    pub rect: RotatedRect,
    pub hausdorff: f64,
    /// Hausdorff distance over the mean rectangle side
    pub ratio: f64,
}

impl ShapeFit {
    /// Fit a rectangle around the outer rings of `polygons`.
    pub fn of(polygons: &[Polygon]) -> Result<Self> {
        let points: Vec<_> = polygons.iter().flat_map(|p| p.outer.iter().copied()).collect();
        let rect = min_rotated_rect(&points)?;

        let mean_side = rect.perimeter() / 4.0;
        if !(mean_side > 0.0) {
            return Err(Error::Degenerate("fit rectangle has zero perimeter".to_string()));
        }

        let rings: Vec<_> = polygons.iter().flat_map(|p| ring_edges(&p.outer)).collect();
        let hausdorff = hausdorff_distance(&rings, &rect.sides());
        Ok(Self {
            rect,
            hausdorff,
            ratio: hausdorff / mean_side,
        })
    }

    /// How far the ratio exceeds `threshold` (0 when within)
    pub fn violation(&self, threshold: f64) -> f64 {
        (self.ratio - threshold).max(0.0)
    }
}
