// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Panel/space JSON documents.
//!
//! The document is the hand-off format for downstream exporters: one panel
//! per classified wall segment and one space per room. It can also be read
//! back into a wall/room graph.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use floorplan_core::{
    ApartmentId, ExportConfig, Floor, Line2D, Point2D, Polygon2D, RoomType, WallSegment, WallType,
};
use floorplan_geometry::{Polygon, Segment};
use floorplan_graph::{
    apartment_node_id, EdgeKind, FloorplanGraph, NodeData, NodeKey, RoomNode, WallNode,
};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelDocument {
    pub panels: Panels,
    pub spaces: BTreeMap<String, Space>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panels {
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub items: BTreeMap<String, Panel>,
    pub max_key: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub panel_type: String,
    pub start_point: [f64; 3],
    pub end_point: [f64; 3],
    pub height: f64,
    pub thickness: f64,
    pub room: Option<String>,
    pub apartment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub room_type: String,
    pub apartment: Option<String>,
    pub coordinates: Vec<Coordinate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Entries of a string-keyed map in numeric key order; non-numeric keys
/// sort last, by text.
fn numeric_order<T>(map: &BTreeMap<String, T>) -> Vec<(&String, &T)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by_key(|(k, _)| (k.parse::<u64>().unwrap_or(u64::MAX), k.as_str()));
    entries
}

impl PanelDocument {
    /// Document for one classified floor.
    pub fn from_floor(floor: &Floor, segments: &[WallSegment], config: &ExportConfig) -> Self {
        let items: BTreeMap<String, Panel> = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| (i.to_string(), panel(floor, segment, config)))
            .collect();

        let spaces = floor
            .rooms
            .iter()
            .enumerate()
            .map(|(i, room)| {
                let mut coordinates: Vec<Coordinate> = room
                    .polygon
                    .outer
                    .iter()
                    .map(|p| Coordinate { x: p.x, y: p.y, z: 0.0 })
                    .collect();
                if let Some(first) = coordinates.first().copied() {
                    coordinates.push(first);
                }
                let space = Space {
                    room_type: room.room_type.to_string(),
                    apartment: room.apartment.as_ref().map(|a| a.as_str().to_string()),
                    coordinates,
                };
                (i.to_string(), space)
            })
            .collect();

        Self {
            panels: Panels {
                attributes: serde_json::Map::new(),
                max_key: items.len(),
                items,
            },
            spaces,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Wall/room graph of the document.
    ///
    /// Spaces become room nodes (`room_<key>`) tied to their apartment;
    /// panels become wall nodes (`wall_<key>`) that belong to every room of
    /// the panel's room type and apartment lying within the panel thickness
    /// of its axis. Identical and aligned panels are linked, cores are tied
    /// to the apartments they reach and identical diamonds are simplified.
    pub fn to_graph(&self) -> Result<FloorplanGraph> {
        let mut graph = FloorplanGraph::new();
        let mut rooms: Vec<(NodeKey, RoomType, Option<ApartmentId>, Polygon)> = Vec::new();

        for (key, space) in numeric_order(&self.spaces) {
            let polygon = Polygon2D::new(
                space
                    .coordinates
                    .iter()
                    .map(|c| Point2D::new(c.x, c.y))
                    .collect(),
            );
            let shape = Polygon::from(&polygon);
            if !shape.is_valid() {
                tracing::warn!(space = %key, "Skipping space with degenerate outline");
                continue;
            }
            let room_type = RoomType::parse(&space.room_type);
            let apartment = space.apartment.as_deref().and_then(ApartmentId::parse);
            let node = graph.add_node(
                format!("room_{key}"),
                NodeData::Room(RoomNode {
                    room_type: room_type.clone(),
                    apartment: apartment.clone(),
                    polygon,
                    matched: false,
                }),
            );
            if let Some(apt) = &apartment {
                let apt_node = graph.add_node(apartment_node_id(apt), NodeData::apartment(apt.as_str()));
                graph.add_edge(node, apt_node, EdgeKind::BelongsTo);
            }
            rooms.push((node, room_type, apartment, shape));
        }

        for (key, panel) in numeric_order(&self.panels.items) {
            let axis = Line2D::new(
                Point2D::new(panel.start_point[0], panel.start_point[1]),
                Point2D::new(panel.end_point[0], panel.end_point[1]),
            );
            if axis.length() <= 0.0 {
                return Err(Error::Document(format!("panel {key} has zero length")));
            }
            let room_type = panel.room.as_deref().map(RoomType::parse);
            let apartment = panel.apartment.as_deref().and_then(ApartmentId::parse);
            let node = graph.add_node(
                format!("wall_{key}"),
                NodeData::Wall(WallNode {
                    footprint: None,
                    axis: Some(axis),
                    wall_type: WallType::from_panel_code(&panel.panel_type),
                    thickness: panel.thickness,
                    height: Some(panel.height),
                    room_type: room_type.clone(),
                    apartment: apartment.clone(),
                }),
            );

            let Some(room_type) = room_type else {
                continue;
            };
            let line = Segment::from_line(&axis);
            for (room_node, rt, apt, shape) in &rooms {
                if *rt == room_type
                    && *apt == apartment
                    && shape.distance_to_segment(&line) <= panel.thickness
                {
                    graph.add_edge(node, *room_node, EdgeKind::BelongsTo);
                }
            }
        }

        graph.link_identical_and_aligned();
        graph.connect_cores_to_apartments();
        graph.simplify_identical_chains();
        Ok(graph)
    }
}

fn panel(floor: &Floor, segment: &WallSegment, config: &ExportConfig) -> Panel {
    let room = segment
        .adjacent_rooms()
        .first()
        .and_then(|id| floor.room(*id));
    let thickness = if segment.width > 0.0 {
        segment.width
    } else {
        config.default_thickness
    };
    let line = segment.line;
    Panel {
        panel_type: segment
            .wall_type()
            .map(|t| t.panel_code().to_string())
            .unwrap_or_default(),
        start_point: [line.start.x, line.start.y, 0.0],
        end_point: [line.end.x, line.end.y, 0.0],
        height: config.panel_height,
        thickness,
        room: room.map(|r| r.room_type.to_string()),
        apartment: room.and_then(|r| r.apartment.as_ref()).map(|a| a.as_str().to_string()),
    }
}
