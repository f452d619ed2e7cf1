// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plain, serializable 2D geometry records.
//!
//! These are storage types: they carry coordinates between the dataset, the
//! graph snapshots and the JSON exports. All computation happens in
//! `floorplan-geometry`, which converts them to `nalgebra` points.

use serde::{Deserialize, Serialize};

/// A 2D point (simplified for serialization)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Bitwise-stable key, used to compare endpoints exactly.
    pub fn key(&self) -> (u64, u64) {
        (self.x.to_bits(), self.y.to_bits())
    }
}

/// A straight line between two points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Line2D {
    pub start: Point2D,
    pub end: Point2D,
}

impl Line2D {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    pub fn midpoint(&self) -> Point2D {
        Point2D::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    /// True when both lines have the same endpoints, in either order.
    pub fn same_endpoints(&self, other: &Line2D) -> bool {
        (self.start == other.start && self.end == other.end)
            || (self.start == other.end && self.end == other.start)
    }
}

/// Polygon with one outer ring and optional holes.
///
/// Rings are stored open: the closing vertex of the WKT ring is dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Polygon2D {
    pub outer: Vec<Point2D>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Point2D>>,
}

impl Polygon2D {
    pub fn new(outer: Vec<Point2D>) -> Self {
        Self {
            outer: open_ring(outer),
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outer: Vec<Point2D>, holes: Vec<Vec<Point2D>>) -> Self {
        Self {
            outer: open_ring(outer),
            holes: holes.into_iter().map(open_ring).collect(),
        }
    }

    /// Axis-aligned rectangle, counter-clockwise from `(min_x, min_y)`.
    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(vec![
            Point2D::new(min_x, min_y),
            Point2D::new(max_x, min_y),
            Point2D::new(max_x, max_y),
            Point2D::new(min_x, max_y),
        ])
    }

    /// Unsigned area of the outer ring minus holes (shoelace formula).
    pub fn area(&self) -> f64 {
        let outer = ring_area(&self.outer).abs();
        let holes: f64 = self.holes.iter().map(|h| ring_area(h).abs()).sum();
        (outer - holes).max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }
}

fn ring_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }

    area / 2.0
}

fn open_ring(mut ring: Vec<Point2D>) -> Vec<Point2D> {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Any geometry a dataset row may carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point2D),
    LineString(Vec<Point2D>),
    Polygon(Polygon2D),
    MultiLineString(Vec<Vec<Point2D>>),
    MultiPolygon(Vec<Polygon2D>),
}

impl Geometry {
    /// Geometry type name as used in WKT.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "POINT",
            Geometry::LineString(_) => "LINESTRING",
            Geometry::Polygon(_) => "POLYGON",
            Geometry::MultiLineString(_) => "MULTILINESTRING",
            Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        }
    }

    /// Polygonal parts of this geometry (empty for points and lines).
    pub fn polygons(&self) -> Vec<Polygon2D> {
        match self {
            Geometry::Polygon(p) => vec![p.clone()],
            Geometry::MultiPolygon(ps) => ps.clone(),
            _ => Vec::new(),
        }
    }

    /// Lineal parts of this geometry (empty for points and polygons).
    pub fn lines(&self) -> Vec<Vec<Point2D>> {
        match self {
            Geometry::LineString(l) => vec![l.clone()],
            Geometry::MultiLineString(ls) => ls.clone(),
            _ => Vec::new(),
        }
    }
}
