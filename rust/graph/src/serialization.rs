// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON serialization for floorplan graphs.
//!
//! Nodes are written in insertion order with their typed fields flattened
//! next to a `type` tag; geometry is WKT text. Edges reference node ids, so
//! a snapshot is readable on its own and round-trips to an equal graph.

use serde::{Deserialize, Serialize};

use floorplan_core::{
    line_to_wkt, parse_line, parse_polygon, polygon_to_wkt, ApartmentId, RoomType, SegmentType,
    WallType,
};

use crate::dictionary::Metadata;
use crate::error::{Error, Result};
use crate::graph::{FloorplanGraph, NodeData, RoomNode, SegmentNode, WallNode};
use crate::keys::EdgeKind;

/// Serializable representation of a whole graph.
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: String,
    #[serde(flatten)]
    pub data: NodeFields,
    #[serde(default, skip_serializing_if = "is_empty")]
    pub meta: Metadata,
}

fn is_empty(meta: &Metadata) -> bool {
    meta.is_empty()
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeFields {
    Apartment {
        name: String,
    },
    Room {
        room_type: RoomType,
        apartment: Option<ApartmentId>,
        geometry: String,
        #[serde(default)]
        matched: bool,
    },
    Wall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        footprint: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        axis: Option<String>,
        wall_type: Option<WallType>,
        thickness: f64,
        #[serde(default)]
        height: Option<f64>,
        #[serde(default)]
        room_type: Option<RoomType>,
        #[serde(default)]
        apartment: Option<ApartmentId>,
    },
    Segment {
        geometry: String,
        width: f64,
        wall_type: Option<WallType>,
        #[serde(default)]
        segment_type: Option<SegmentType>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_length: Option<f64>,
}

impl From<&NodeData> for NodeFields {
    fn from(data: &NodeData) -> Self {
        match data {
            NodeData::Apartment { name } => NodeFields::Apartment { name: name.clone() },
            NodeData::Room(r) => NodeFields::Room {
                room_type: r.room_type.clone(),
                apartment: r.apartment.clone(),
                geometry: polygon_to_wkt(&r.polygon),
                matched: r.matched,
            },
            NodeData::Wall(w) => NodeFields::Wall {
                footprint: w.footprint.as_ref().map(polygon_to_wkt),
                axis: w.axis.as_ref().map(line_to_wkt),
                wall_type: w.wall_type,
                thickness: w.thickness,
                height: w.height,
                room_type: w.room_type.clone(),
                apartment: w.apartment.clone(),
            },
            NodeData::Segment(s) => NodeFields::Segment {
                geometry: line_to_wkt(&s.line),
                width: s.width,
                wall_type: s.wall_type,
                segment_type: s.segment_type,
            },
        }
    }
}

impl TryFrom<NodeFields> for NodeData {
    type Error = Error;

    fn try_from(fields: NodeFields) -> Result<Self> {
        Ok(match fields {
            NodeFields::Apartment { name } => NodeData::Apartment { name },
            NodeFields::Room {
                room_type,
                apartment,
                geometry,
                matched,
            } => NodeData::Room(RoomNode {
                room_type,
                apartment,
                polygon: parse_polygon(&geometry)?,
                matched,
            }),
            NodeFields::Wall {
                footprint,
                axis,
                wall_type,
                thickness,
                height,
                room_type,
                apartment,
            } => NodeData::Wall(WallNode {
                footprint: footprint.as_deref().map(parse_polygon).transpose()?,
                axis: axis.as_deref().map(parse_line).transpose()?,
                wall_type,
                thickness,
                height,
                room_type,
                apartment,
            }),
            NodeFields::Segment {
                geometry,
                width,
                wall_type,
                segment_type,
            } => NodeData::Segment(SegmentNode {
                line: parse_line(&geometry)?,
                width,
                wall_type,
                segment_type,
            }),
        })
    }
}

impl FloorplanGraph {
    /// Serializes the graph to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        let snapshot = self.to_snapshot();
        serde_json::to_string_pretty(&snapshot).map_err(|e| Error::Snapshot(e.to_string()))
    }

    /// Deserializes a graph from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: GraphSnapshot =
            serde_json::from_str(json).map_err(|e| Error::Snapshot(e.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    /// Creates a serializable snapshot of the graph.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .nodes()
            .map(|(_, n)| NodeSnapshot {
                id: n.id.clone(),
                data: NodeFields::from(&n.data),
                meta: n.meta.clone(),
            })
            .collect();

        let mut edges: Vec<EdgeSnapshot> = self
            .edges()
            .filter_map(|(_, e)| {
                Some(EdgeSnapshot {
                    source: self.node(e.a)?.id.clone(),
                    target: self.node(e.b)?.id.clone(),
                    kind: e.kind,
                    shared_length: e.shared_length,
                })
            })
            .collect();
        edges.sort_by(|x, y| (&x.source, &x.target).cmp(&(&y.source, &y.target)));

        GraphSnapshot { nodes, edges }
    }

    /// Rebuilds a graph from a snapshot.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let mut graph = FloorplanGraph::new();
        for node in snapshot.nodes {
            if graph.key(&node.id).is_some() {
                return Err(Error::Snapshot(format!("duplicate node id '{}'", node.id)));
            }
            let key = graph.add_node(node.id, NodeData::try_from(node.data)?);
            if let Some(n) = graph.node_mut(key) {
                n.meta = node.meta;
            }
        }
        for edge in snapshot.edges {
            let a = graph
                .key(&edge.source)
                .ok_or_else(|| Error::UnknownNode(edge.source.clone()))?;
            let b = graph
                .key(&edge.target)
                .ok_or_else(|| Error::UnknownNode(edge.target.clone()))?;
            if graph.insert_edge(a, b, edge.kind, edge.shared_length).is_none() {
                return Err(Error::Snapshot(format!("self-loop on '{}'", edge.source)));
            }
        }
        Ok(graph)
    }
}
