// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Breadth-first traversal with explicit expansion policies.
//!
//! A [`TraversalPolicy`] decides, per reached node, whether the search keeps
//! expanding through it, and per edge whether it may be walked at all. The
//! core-to-apartment discovery is the BFS under [`StopAtApartments`].

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::graph::{Edge, FloorplanGraph, Node, NodeData};
use crate::keys::{EdgeKind, NodeKey, NodeKind};

/// What the search does after reaching a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Enqueue the node's neighbours.
    Expand,
    /// Record the node but do not search past it.
    Stop,
}

/// Rules for a breadth-first search.
pub trait TraversalPolicy {
    /// Whether the search may walk `edge`.
    fn follow(&self, _edge: &Edge) -> bool {
        true
    }

    /// Whether the search expands through a reached node. Never asked for
    /// the start node, which always expands.
    fn expansion(&self, node: &Node) -> Expansion;
}

/// Expands through everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl TraversalPolicy for Unbounded {
    fn expansion(&self, _node: &Node) -> Expansion {
        Expansion::Expand
    }
}

/// Stops at apartment nodes and ignores existing core links, so repeated
/// discovery sees the same graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopAtApartments;

impl TraversalPolicy for StopAtApartments {
    fn follow(&self, edge: &Edge) -> bool {
        edge.kind != EdgeKind::CoreToApartment
    }

    fn expansion(&self, node: &Node) -> Expansion {
        match node.kind() {
            NodeKind::Apartment => Expansion::Stop,
            _ => Expansion::Expand,
        }
    }
}

impl FloorplanGraph {
    /// Nodes reachable from `start` under `policy`, in visit order
    /// (`start` first).
    pub fn bfs<P: TraversalPolicy>(&self, start: NodeKey, policy: &P) -> Vec<NodeKey> {
        if !self.nodes.contains_key(start) {
            return Vec::new();
        }
        let mut order = Vec::new();
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::new();

        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            order.push(current);
            if current != start {
                let Some(node) = self.nodes.get(current) else {
                    continue;
                };
                if policy.expansion(node) == Expansion::Stop {
                    continue;
                }
            }
            for edge in self.incident_edges(current) {
                if !policy.follow(edge) {
                    continue;
                }
                if let Some(next) = edge.other(current) {
                    if visited.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        order
    }

    /// Links every core room to each apartment its BFS reaches first.
    ///
    /// Core rooms carry no apartment, so only whole-floor graphs hold them;
    /// per-apartment mining graphs have nothing to link.
    ///
    /// Returns the number of `core_to_apartment` edges added.
    pub fn connect_cores_to_apartments(&mut self) -> usize {
        let cores: Vec<NodeKey> = self
            .nodes
            .iter()
            .filter(|(_, n)| matches!(&n.data, NodeData::Room(r) if r.room_type.is_core()))
            .map(|(k, _)| k)
            .collect();

        let mut added = 0;
        for core in cores {
            let reached: Vec<NodeKey> = self
                .bfs(core, &StopAtApartments)
                .into_iter()
                .filter(|k| {
                    self.nodes
                        .get(*k)
                        .is_some_and(|n| n.kind() == NodeKind::Apartment)
                })
                .collect();
            for apartment in reached {
                if self.has_edge(core, apartment) {
                    continue;
                }
                if self.add_edge(core, apartment, EdgeKind::CoreToApartment).is_some() {
                    added += 1;
                }
            }
        }
        if added > 0 {
            tracing::debug!(edges = added, "Linked cores to apartments");
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{RoomNode, WallNode};
    use floorplan_core::{Polygon2D, RoomType};

    fn room(room_type: RoomType) -> NodeData {
        NodeData::Room(RoomNode {
            room_type,
            apartment: None,
            polygon: Polygon2D::rectangle(0.0, 0.0, 1.0, 1.0),
            matched: false,
        })
    }

    /// core - wall_1 - wall_2 - room_b - apt_1 - room_c - wall_3 - apt_2
    fn corridor_graph() -> FloorplanGraph {
        let mut g = FloorplanGraph::new();
        let core = g.add_node("room_core", room(RoomType::Core));
        let w1 = g.add_node("wall_1", NodeData::Wall(WallNode::default()));
        let w2 = g.add_node("wall_2", NodeData::Wall(WallNode::default()));
        let rb = g.add_node("room_b", room(RoomType::Bedroom));
        let a1 = g.add_node("apartment_1", NodeData::apartment("1"));
        let rc = g.add_node("room_c", room(RoomType::Kitchen));
        let w3 = g.add_node("wall_3", NodeData::Wall(WallNode::default()));
        let a2 = g.add_node("apartment_2", NodeData::apartment("2"));
        g.add_edge(core, w1, EdgeKind::BelongsTo);
        g.add_edge(w1, w2, EdgeKind::Identical);
        g.add_edge(w2, rb, EdgeKind::BelongsTo);
        g.add_edge(rb, a1, EdgeKind::BelongsTo);
        g.add_edge(a1, rc, EdgeKind::BelongsTo);
        g.add_edge(rc, w3, EdgeKind::BelongsTo);
        g.add_edge(w3, a2, EdgeKind::BelongsTo);
        g
    }

    #[test]
    fn bfs_unbounded_reaches_everything() {
        let g = corridor_graph();
        let core = g.key("room_core").unwrap();
        assert_eq!(g.bfs(core, &Unbounded).len(), 8);
    }

    #[test]
    fn bfs_stops_at_apartments() {
        let g = corridor_graph();
        let core = g.key("room_core").unwrap();
        let ids: Vec<_> = g
            .bfs(core, &StopAtApartments)
            .into_iter()
            .map(|k| g.node(k).unwrap().id.clone())
            .collect();
        assert_eq!(ids, vec!["room_core", "wall_1", "wall_2", "room_b", "apartment_1"]);
    }

    #[test]
    fn cores_link_to_first_apartment_reached() {
        let mut g = corridor_graph();
        assert_eq!(g.connect_cores_to_apartments(), 1);
        let core = g.key("room_core").unwrap();
        let a1 = g.key("apartment_1").unwrap();
        assert_eq!(
            g.edge_between(core, a1).map(|e| e.kind),
            Some(EdgeKind::CoreToApartment)
        );

        // the new edge is not walked, so a second pass adds nothing
        assert_eq!(g.connect_cores_to_apartments(), 0);
    }

    #[test]
    fn core_reaches_several_apartments() {
        let mut g = FloorplanGraph::new();
        let core = g.add_node("room_core", room(RoomType::Core));
        for i in 0..3 {
            let w = g.add_node(format!("wall_{i}"), NodeData::Wall(WallNode::default()));
            let a = g.add_node(format!("apartment_{i}"), NodeData::apartment(i.to_string()));
            g.add_edge(core, w, EdgeKind::BelongsTo);
            g.add_edge(w, a, EdgeKind::BelongsTo);
        }
        assert_eq!(g.connect_cores_to_apartments(), 3);
    }
}
