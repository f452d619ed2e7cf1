// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall segments and the wall-type vocabulary

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::floor::RoomId;
use crate::geom::Line2D;

/// Construction wall type assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WallType {
    /// Stair / corridor-to-stair partition
    T1,
    /// Shaft boundary
    T2a,
    /// Exterior envelope
    T2b,
    /// Apartment division
    T3,
    /// Bathroom against kitchen or bedroom
    T4,
    /// Bathroom against corridor or living room
    T5,
    /// Interior partition
    T6,
}

impl WallType {
    pub const ALL: [WallType; 7] = [
        WallType::T1,
        WallType::T2a,
        WallType::T2b,
        WallType::T3,
        WallType::T4,
        WallType::T5,
        WallType::T6,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WallType::T1 => "T1",
            WallType::T2a => "T2a",
            WallType::T2b => "T2b",
            WallType::T3 => "T3",
            WallType::T4 => "T4",
            WallType::T5 => "T5",
            WallType::T6 => "T6",
        }
    }

    /// Panel construction code handed to the exporter.
    pub fn panel_code(&self) -> &'static str {
        match self {
            WallType::T1 => "WAL_20_STD_REN",
            WallType::T2a => "WAL_02_CNI_REN",
            WallType::T2b => "WAL_01_CNI_REN",
            WallType::T3 => "WAL_22_STD_REN",
            WallType::T4 => "WAL_40+45_STD_REN",
            WallType::T5 => "WAL_43+45_STD_REN",
            WallType::T6 => "WAL_40_STD_REN",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.label() == label)
    }

    pub fn from_panel_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.panel_code() == code)
    }
}

impl fmt::Display for WallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Boundary piece classification used by module enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentType {
    Wall,
    Opening,
}

impl SegmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentType::Wall => "wall",
            SegmentType::Opening => "opening",
        }
    }
}

/// A piece of a wall centerline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallSegment {
    pub id: usize,
    pub line: Line2D,
    /// Perpendicular width through the parent polygon (0 for bare lines)
    pub width: f64,
    /// Rooms hit by the two perpendicular probes
    pub rooms: (Option<RoomId>, Option<RoomId>),
    /// Index of the parent structure in `Floor::structures`
    pub structure: usize,
    wall_type: Option<WallType>,
}

impl WallSegment {
    pub fn new(id: usize, line: Line2D, width: f64, structure: usize) -> Self {
        Self {
            id,
            line,
            width,
            rooms: (None, None),
            structure,
            wall_type: None,
        }
    }

    #[inline]
    pub fn wall_type(&self) -> Option<WallType> {
        self.wall_type
    }

    /// Set the wall type. A type, once set, is never replaced.
    pub fn assign_type(&mut self, wall_type: WallType) -> bool {
        if self.wall_type.is_some() {
            return false;
        }
        self.wall_type = Some(wall_type);
        true
    }

    /// Present adjacent rooms, without duplicates.
    pub fn adjacent_rooms(&self) -> SmallVec<[RoomId; 2]> {
        let mut out = SmallVec::new();
        if let Some(a) = self.rooms.0 {
            out.push(a);
        }
        if let Some(b) = self.rooms.1 {
            if !out.contains(&b) {
                out.push(b);
            }
        }
        out
    }

    pub fn length(&self) -> f64 {
        self.line.length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point2D;

    #[test]
    fn test_assign_type_once() {
        let line = Line2D::new(Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0));
        let mut seg = WallSegment::new(0, line, 0.2, 0);
        assert!(seg.wall_type().is_none());
        assert!(seg.assign_type(WallType::T1));
        assert!(!seg.assign_type(WallType::T6));
        assert_eq!(seg.wall_type(), Some(WallType::T1));
    }

    #[test]
    fn test_adjacent_rooms_dedup() {
        let line = Line2D::new(Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0));
        let mut seg = WallSegment::new(0, line, 0.2, 0);
        seg.rooms = (Some(RoomId(3)), Some(RoomId(3)));
        assert_eq!(seg.adjacent_rooms().as_slice(), &[RoomId(3)]);
        seg.rooms = (None, Some(RoomId(1)));
        assert_eq!(seg.adjacent_rooms().as_slice(), &[RoomId(1)]);
    }

    #[test]
    fn test_panel_codes() {
        assert_eq!(WallType::T4.panel_code(), "WAL_40+45_STD_REN");
        assert_eq!(WallType::from_panel_code("WAL_02_CNI_REN"), Some(WallType::T2a));
        assert_eq!(WallType::from_label("T2b"), Some(WallType::T2b));
        assert_eq!(SegmentType::Opening.as_str(), "opening");
    }
}
