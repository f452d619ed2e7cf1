// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floorplan Geometry Processing
//!
//! 2D computations for wall and room analysis using nalgebra points and
//! i_overlay polygon booleans: centerlines, rotated rectangles, probes,
//! Hausdorff fits and overlap areas.

pub mod bool2d;
pub mod error;
pub mod hausdorff;
pub mod polygon;
pub mod rect;
pub mod segment;
pub mod shape;
pub mod walls;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};

pub use bool2d::{covers, intersection_area, union_polygons};
pub use error::{Error, Result};
pub use hausdorff::hausdorff_distance;
pub use polygon::{ring_edges, Polygon};
pub use rect::{convex_hull, min_rotated_rect, RotatedRect};
pub use segment::{to_point, to_record, Segment};
pub use shape::ShapeFit;
pub use walls::{perpendicular_width, split_at_points, wall_centerline};
