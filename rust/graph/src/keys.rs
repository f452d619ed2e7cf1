// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Graph key types and node/edge discriminants.
//!
//! Nodes and edges live in `slotmap::SlotMap`s; keys stay valid when other
//! edges are removed (generational indices), which chain simplification
//! relies on.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Key for a graph node (apartment, room, wall or segment).
    pub struct NodeKey;

    /// Key for an undirected edge between two nodes.
    pub struct EdgeKey;
}

/// Discriminant for node variants. Fixed when the node is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Apartment,
    Room,
    Wall,
    Segment,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Apartment => "apartment",
            NodeKind::Room => "room",
            NodeKind::Wall => "wall",
            NodeKind::Segment => "segment",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Room to apartment, or panel wall to the room it lines
    #[serde(rename = "belongs_to")]
    BelongsTo,
    /// Two walls or segments with the same endpoints
    #[serde(rename = "identical")]
    Identical,
    /// Two collinear walls or segments with overlapping extents
    #[serde(rename = "aligned")]
    Aligned,
    /// Boundary segments sharing an endpoint
    #[serde(rename = "adjacent")]
    Adjacent,
    /// Near-parallel boundary segments facing each other across a wall
    #[serde(rename = "double_segment")]
    DoubleSegment,
    #[serde(rename = "core_to_apartment")]
    CoreToApartment,
    #[serde(rename = "room-room")]
    RoomRoom,
    #[serde(rename = "room-wall")]
    RoomWall,
    #[serde(rename = "room-segment")]
    RoomSegment,
    #[serde(rename = "wall-wall")]
    WallWall,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 10] = [
        EdgeKind::BelongsTo,
        EdgeKind::Identical,
        EdgeKind::Aligned,
        EdgeKind::Adjacent,
        EdgeKind::DoubleSegment,
        EdgeKind::CoreToApartment,
        EdgeKind::RoomRoom,
        EdgeKind::RoomWall,
        EdgeKind::RoomSegment,
        EdgeKind::WallWall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::BelongsTo => "belongs_to",
            EdgeKind::Identical => "identical",
            EdgeKind::Aligned => "aligned",
            EdgeKind::Adjacent => "adjacent",
            EdgeKind::DoubleSegment => "double_segment",
            EdgeKind::CoreToApartment => "core_to_apartment",
            EdgeKind::RoomRoom => "room-room",
            EdgeKind::RoomWall => "room-wall",
            EdgeKind::RoomSegment => "room-segment",
            EdgeKind::WallWall => "wall-wall",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }

    /// Edges that attach a wall or segment to a room.
    #[inline]
    pub fn is_attachment(&self) -> bool {
        matches!(
            self,
            EdgeKind::BelongsTo | EdgeKind::RoomSegment | EdgeKind::RoomWall
        )
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
