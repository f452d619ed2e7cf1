// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based floorplan graph.
//!
//! The [`FloorplanGraph`] owns every node and edge in slot maps with stable,
//! generational keys. It is a simple undirected graph: one edge per
//! unordered node pair, no self-loops. Adding an edge between an already
//! connected pair replaces that edge's kind and payload.
//!
//! Nodes are tagged variants ([`NodeData`]) carrying only their own typed
//! fields. Node ids are unique strings (`room_3`, `segment_12`, ...) that
//! survive serialization; keys do not.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use floorplan_core::{ApartmentId, Line2D, Polygon2D, RoomType, SegmentType, WallType};

use crate::dictionary::Metadata;
use crate::keys::{EdgeKey, EdgeKind, NodeKey, NodeKind};

/// Data stored for a room node.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomNode {
    pub room_type: RoomType,
    pub apartment: Option<ApartmentId>,
    pub polygon: Polygon2D,
    /// Set on rooms that are part of an accepted module match.
    pub matched: bool,
}

/// Data stored for a wall node: a structural polygon or an exported panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WallNode {
    pub footprint: Option<Polygon2D>,
    pub axis: Option<Line2D>,
    pub wall_type: Option<WallType>,
    pub thickness: f64,
    pub height: Option<f64>,
    /// Room type and apartment a panel was drawn for
    pub room_type: Option<RoomType>,
    pub apartment: Option<ApartmentId>,
}

/// Data stored for a wall segment or room boundary segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentNode {
    pub line: Line2D,
    pub width: f64,
    pub wall_type: Option<WallType>,
    pub segment_type: Option<SegmentType>,
}

/// Node payload. The variant is fixed when the node is created.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Apartment { name: String },
    Room(RoomNode),
    Wall(WallNode),
    Segment(SegmentNode),
}

impl NodeData {
    pub fn apartment(name: impl Into<String>) -> Self {
        NodeData::Apartment { name: name.into() }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Apartment { .. } => NodeKind::Apartment,
            NodeData::Room(_) => NodeKind::Room,
            NodeData::Wall(_) => NodeKind::Wall,
            NodeData::Segment(_) => NodeKind::Segment,
        }
    }

    pub fn as_room(&self) -> Option<&RoomNode> {
        match self {
            NodeData::Room(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_wall(&self) -> Option<&WallNode> {
        match self {
            NodeData::Wall(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_segment(&self) -> Option<&SegmentNode> {
        match self {
            NodeData::Segment(s) => Some(s),
            _ => None,
        }
    }

    /// Line geometry: a segment's line or a wall's axis.
    pub fn line(&self) -> Option<Line2D> {
        match self {
            NodeData::Segment(s) => Some(s.line),
            NodeData::Wall(w) => w.axis,
            _ => None,
        }
    }

    /// Area geometry: a room's polygon or a wall's footprint.
    pub fn polygon(&self) -> Option<&Polygon2D> {
        match self {
            NodeData::Room(r) => Some(&r.polygon),
            NodeData::Wall(w) => w.footprint.as_ref(),
            _ => None,
        }
    }
}

/// A graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub data: NodeData,
    pub meta: Metadata,
}

impl Node {
    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }
}

/// An undirected edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub a: NodeKey,
    pub b: NodeKey,
    pub kind: EdgeKind,
    /// Shared boundary length for proximity-derived edges
    pub shared_length: Option<f64>,
}

impl Edge {
    /// The endpoint opposite to `key`, if `key` is an endpoint.
    pub fn other(&self, key: NodeKey) -> Option<NodeKey> {
        if self.a == key {
            Some(self.b)
        } else if self.b == key {
            Some(self.a)
        } else {
            None
        }
    }
}

#[inline]
fn pair(a: NodeKey, b: NodeKey) -> (NodeKey, NodeKey) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Typed floorplan graph.
///
/// # Example
///
/// ```
/// use floorplan_graph::{EdgeKind, FloorplanGraph, NodeData};
///
/// let mut graph = FloorplanGraph::new();
/// let a = graph.add_node("apartment_1", NodeData::apartment("1"));
/// let b = graph.add_node("apartment_2", NodeData::apartment("2"));
/// graph.add_edge(a, b, EdgeKind::Adjacent);
///
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FloorplanGraph {
    pub(crate) nodes: SlotMap<NodeKey, Node>,
    pub(crate) edges: SlotMap<EdgeKey, Edge>,

    // Node → incident edges, in insertion order
    pub(crate) incident: FxHashMap<NodeKey, Vec<EdgeKey>>,
    // Unordered node pair → edge
    pub(crate) pairs: FxHashMap<(NodeKey, NodeKey), EdgeKey>,
    pub(crate) ids: FxHashMap<String, NodeKey>,
}

impl FloorplanGraph {
    /// Creates a new, empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, or returns the existing node with the same id.
    ///
    /// An existing node's data is replaced only when the variant matches.
    pub fn add_node(&mut self, id: impl Into<String>, data: NodeData) -> NodeKey {
        let id = id.into();
        if let Some(&key) = self.ids.get(&id) {
            if let Some(node) = self.nodes.get_mut(key) {
                if node.kind() == data.kind() {
                    node.data = data;
                } else {
                    tracing::warn!(node = %id, kind = %data.kind(), "Node id already used by another kind");
                }
            }
            return key;
        }
        let key = self.nodes.insert(Node {
            id: id.clone(),
            data,
            meta: Metadata::default(),
        });
        self.ids.insert(id, key);
        key
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Key of the node with the given id.
    pub fn key(&self, id: &str) -> Option<NodeKey> {
        self.ids.get(id).copied()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.key(id).and_then(|k| self.nodes.get(k))
    }

    /// Adds an undirected edge. Returns `None` for self-loops or unknown keys.
    pub fn add_edge(&mut self, a: NodeKey, b: NodeKey, kind: EdgeKind) -> Option<EdgeKey> {
        self.insert_edge(a, b, kind, None)
    }

    /// Adds an undirected edge carrying a shared boundary length.
    pub fn add_weighted_edge(
        &mut self,
        a: NodeKey,
        b: NodeKey,
        kind: EdgeKind,
        shared_length: f64,
    ) -> Option<EdgeKey> {
        self.insert_edge(a, b, kind, Some(shared_length))
    }

    pub(crate) fn insert_edge(
        &mut self,
        a: NodeKey,
        b: NodeKey,
        kind: EdgeKind,
        shared_length: Option<f64>,
    ) -> Option<EdgeKey> {
        if a == b || !self.nodes.contains_key(a) || !self.nodes.contains_key(b) {
            return None;
        }
        if let Some(&ek) = self.pairs.get(&pair(a, b)) {
            if let Some(edge) = self.edges.get_mut(ek) {
                edge.kind = kind;
                edge.shared_length = shared_length;
            }
            return Some(ek);
        }
        let ek = self.edges.insert(Edge {
            a,
            b,
            kind,
            shared_length,
        });
        self.pairs.insert(pair(a, b), ek);
        self.incident.entry(a).or_default().push(ek);
        self.incident.entry(b).or_default().push(ek);
        Some(ek)
    }

    /// Removes the edge between `a` and `b`, if any.
    pub fn remove_edge(&mut self, a: NodeKey, b: NodeKey) -> Option<Edge> {
        let ek = self.pairs.remove(&pair(a, b))?;
        for k in [a, b] {
            if let Some(list) = self.incident.get_mut(&k) {
                list.retain(|e| *e != ek);
            }
        }
        self.edges.remove(ek)
    }

    pub fn edge_between(&self, a: NodeKey, b: NodeKey) -> Option<&Edge> {
        self.pairs.get(&pair(a, b)).and_then(|ek| self.edges.get(*ek))
    }

    pub fn has_edge(&self, a: NodeKey, b: NodeKey) -> bool {
        self.pairs.contains_key(&pair(a, b))
    }

    /// Edges touching `key`, in insertion order.
    pub fn incident_edges(&self, key: NodeKey) -> impl Iterator<Item = &Edge> + '_ {
        self.incident
            .get(&key)
            .into_iter()
            .flatten()
            .filter_map(move |ek| self.edges.get(*ek))
    }

    /// Neighbours of `key`, in edge insertion order.
    pub fn neighbors(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        self.incident_edges(key).filter_map(move |e| e.other(key))
    }

    /// Neighbours reached over edges of `kind`.
    pub fn neighbors_via(&self, key: NodeKey, kind: EdgeKind) -> impl Iterator<Item = NodeKey> + '_ {
        self.incident_edges(key)
            .filter(move |e| e.kind == kind)
            .filter_map(move |e| e.other(key))
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> + '_ {
        self.nodes.iter()
    }

    /// Keys of all nodes of one kind, in insertion order.
    pub fn keys_of(&self, kind: NodeKind) -> Vec<NodeKey> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.kind() == kind)
            .map(|(k, _)| k)
            .collect()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &Edge)> + '_ {
        self.edges.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Marks a room node as part of an accepted match.
    pub fn mark_matched(&mut self, key: NodeKey) {
        if let Some(Node {
            data: NodeData::Room(room),
            ..
        }) = self.nodes.get_mut(key)
        {
            room.matched = true;
        }
    }

    /// Graph induced by `keep`: those nodes and every edge between them.
    pub fn induced_subgraph(&self, keep: &FxHashSet<NodeKey>) -> FloorplanGraph {
        let mut sub = FloorplanGraph::new();
        let mut map = FxHashMap::default();
        for (k, node) in self.nodes.iter().filter(|(k, _)| keep.contains(k)) {
            let nk = sub.add_node(node.id.clone(), node.data.clone());
            if let Some(copy) = sub.nodes.get_mut(nk) {
                copy.meta = node.meta.clone();
            }
            map.insert(k, nk);
        }
        for (_, edge) in self.edges.iter() {
            if let (Some(&a), Some(&b)) = (map.get(&edge.a), map.get(&edge.b)) {
                sub.insert_edge(a, b, edge.kind, edge.shared_length);
            }
        }
        sub
    }

    /// Canonical edge listing: endpoint ids ordered within each edge, edges
    /// sorted. Independent of insertion order and keys.
    pub fn edge_list(&self) -> Vec<(String, String, EdgeKind)> {
        let mut list: Vec<_> = self
            .edges
            .values()
            .filter_map(|e| {
                let a = &self.nodes.get(e.a)?.id;
                let b = &self.nodes.get(e.b)?.id;
                let (a, b) = if a <= b { (a, b) } else { (b, a) };
                Some((a.clone(), b.clone(), e.kind))
            })
            .collect();
        list.sort();
        list
    }

    fn edge_payloads(&self) -> Vec<((String, String, EdgeKind), Option<f64>)> {
        let mut list: Vec<_> = self
            .edges
            .values()
            .filter_map(|e| {
                let a = &self.nodes.get(e.a)?.id;
                let b = &self.nodes.get(e.b)?.id;
                let (a, b) = if a <= b { (a, b) } else { (b, a) };
                Some(((a.clone(), b.clone(), e.kind), e.shared_length))
            })
            .collect();
        list.sort_by(|x, y| x.0.cmp(&y.0));
        list
    }
}

/// Graphs are equal when they have the same nodes (by id, with equal data
/// and metadata) and the same edges with equal payloads.
impl PartialEq for FloorplanGraph {
    fn eq(&self, other: &Self) -> bool {
        self.node_count() == other.node_count()
            && self
                .nodes
                .values()
                .all(|n| other.node_by_id(&n.id) == Some(n))
            && self.edge_payloads() == other.edge_payloads()
    }
}
