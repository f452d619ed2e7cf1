// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric plausibility of a match.
//!
//! A cluster of rooms is a module candidate when it is close to a rectangle,
//! no wider than the maximum module width, and its rooms only overlap by
//! full nesting.

use serde::{Deserialize, Serialize};

use floorplan_core::MiningParams;
use floorplan_geometry::{covers, intersection_area, Polygon, ShapeFit};

use crate::error::{Error, Result};

/// Overlaps at or below this area are ignored.
pub const OVERLAP_TOLERANCE: f64 = 1e-7;

/// Audit row for one evaluated match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchMetrics {
    pub gid: String,
    pub pattern: String,
    pub support: usize,
    pub ratio: f64,
    /// Short side of the fitted rectangle
    pub width: f64,
    pub violation: f64,
}

/// Outcome of the three checks for one room cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeCheck {
    pub ratio: f64,
    pub hausdorff: f64,
    pub width: f64,
    pub length: f64,
    pub violation: f64,
    pub nested_only: bool,
    pub accepted: bool,
}

/// True when every non-trivial overlap between two polygons is a full
/// containment of one in the other.
pub fn no_partial_overlap(polygons: &[Polygon], tol: f64) -> bool {
    for (i, a) in polygons.iter().enumerate() {
        for b in &polygons[i + 1..] {
            if intersection_area(a, b) <= tol {
                continue;
            }
            if !(covers(a, b, tol) || covers(b, a, tol)) {
                return false;
            }
        }
    }
    true
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialConstraintFilter {
    pub max_width: f64,
    pub ratio_threshold: f64,
}

impl SpatialConstraintFilter {
    pub fn new(params: &MiningParams) -> Self {
        Self {
            max_width: params.max_width,
            ratio_threshold: params.ratio_threshold,
        }
    }

    /// Runs the shape, width and overlap checks on a room cluster.
    ///
    /// Degenerate input (invalid polygons, a zero-extent fit rectangle, a
    /// non-finite ratio) is a [`Error::MatchEvaluation`].
    pub fn evaluate(&self, polygons: &[Polygon]) -> Result<ShapeCheck> {
        if polygons.is_empty() {
            return Err(Error::MatchEvaluation("match has no rooms".into()));
        }
        if let Some(i) = polygons.iter().position(|p| !p.is_valid()) {
            return Err(Error::MatchEvaluation(format!("room {i} has a degenerate polygon")));
        }
        let fit = ShapeFit::of(polygons).map_err(|e| Error::MatchEvaluation(e.to_string()))?;
        if !fit.ratio.is_finite() || fit.rect.area() <= 0.0 {
            return Err(Error::MatchEvaluation("fit rectangle has no area".into()));
        }

        let violation = fit.violation(self.ratio_threshold);
        let width = fit.rect.short_side();
        let nested_only = no_partial_overlap(polygons, OVERLAP_TOLERANCE);
        Ok(ShapeCheck {
            ratio: fit.ratio,
            hausdorff: fit.hausdorff,
            width,
            length: fit.rect.long_side(),
            violation,
            nested_only,
            accepted: violation == 0.0 && width <= self.max_width && nested_only,
        })
    }
}
