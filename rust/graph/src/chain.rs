// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identical-wall chain simplification.
//!
//! A duplicated wall drawn once from each side shows up as two nodes joined
//! by an `identical` edge, both attached to the same two rooms: a diamond.
//! The transform drops the cross attachments so the pair reads
//! `room_a - A - B - room_b`.

use std::collections::BTreeSet;

use crate::graph::FloorplanGraph;
use crate::keys::{EdgeKind, NodeKey, NodeKind};

impl FloorplanGraph {
    /// Room ids attached to `key` through attachment edges, ordered by id.
    fn attached_rooms(&self, key: NodeKey) -> BTreeSet<(String, NodeKey)> {
        self.incident_edges(key)
            .filter(|e| e.kind.is_attachment())
            .filter_map(|e| e.other(key))
            .filter_map(|k| {
                let node = self.nodes.get(k)?;
                (node.kind() == NodeKind::Room).then(|| (node.id.clone(), k))
            })
            .collect()
    }

    /// Rewrites identical pairs attached to exactly the same two rooms into
    /// chains. The lower-id node of a pair keeps the lower-id room.
    ///
    /// Idempotent: a rewritten pair no longer shares its rooms. Returns the
    /// number of attachment edges removed.
    pub fn simplify_identical_chains(&mut self) -> usize {
        let mut pairs: Vec<(String, NodeKey, String, NodeKey)> = self
            .edges
            .values()
            .filter(|e| e.kind == EdgeKind::Identical)
            .filter_map(|e| {
                let a = self.nodes.get(e.a)?;
                let b = self.nodes.get(e.b)?;
                Some(if a.id <= b.id {
                    (a.id.clone(), e.a, b.id.clone(), e.b)
                } else {
                    (b.id.clone(), e.b, a.id.clone(), e.a)
                })
            })
            .collect();
        pairs.sort();

        let mut removed = 0;
        for (_, first, _, second) in pairs {
            let rooms_first = self.attached_rooms(first);
            if rooms_first.len() != 2 || rooms_first != self.attached_rooms(second) {
                continue;
            }
            let mut rooms = rooms_first.into_iter().map(|(_, k)| k);
            let (Some(room_a), Some(room_b)) = (rooms.next(), rooms.next()) else {
                continue;
            };

            for (wall, room) in [(second, room_a), (first, room_b)] {
                let attached = self
                    .edge_between(wall, room)
                    .is_some_and(|e| e.kind.is_attachment());
                if attached && self.remove_edge(wall, room).is_some() {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            tracing::debug!(edges = removed, "Simplified identical wall chains");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeData, RoomNode, WallNode};
    use floorplan_core::{Polygon2D, RoomType};

    fn room(room_type: RoomType) -> NodeData {
        NodeData::Room(RoomNode {
            room_type,
            apartment: None,
            polygon: Polygon2D::rectangle(0.0, 0.0, 1.0, 1.0),
            matched: false,
        })
    }

    fn diamond() -> FloorplanGraph {
        let mut g = FloorplanGraph::new();
        let bath = g.add_node("room_1", room(RoomType::Bathroom));
        let kitchen = g.add_node("room_2", room(RoomType::Kitchen));
        let a = g.add_node("wall_a", NodeData::Wall(WallNode::default()));
        let b = g.add_node("wall_b", NodeData::Wall(WallNode::default()));
        for w in [a, b] {
            g.add_edge(w, bath, EdgeKind::BelongsTo);
            g.add_edge(w, kitchen, EdgeKind::BelongsTo);
        }
        g.add_edge(a, b, EdgeKind::Identical);
        g
    }

    #[test]
    fn diamond_becomes_chain() {
        let mut g = diamond();
        assert_eq!(g.simplify_identical_chains(), 2);

        let edges: Vec<_> = g
            .edge_list()
            .into_iter()
            .map(|(a, b, k)| format!("{a}-{b}:{k}"))
            .collect();
        assert_eq!(
            edges,
            vec![
                "room_1-wall_a:belongs_to",
                "room_2-wall_b:belongs_to",
                "wall_a-wall_b:identical",
            ]
        );
    }

    #[test]
    fn simplification_is_idempotent() {
        let mut g = diamond();
        g.simplify_identical_chains();
        let once = g.edge_list();
        assert_eq!(g.simplify_identical_chains(), 0);
        assert_eq!(g.edge_list(), once);
    }

    #[test]
    fn pairs_with_different_rooms_are_left_alone() {
        let mut g = diamond();
        let b = g.key("wall_b").unwrap();
        let third = g.add_node("room_3", room(RoomType::Bedroom));
        g.add_edge(b, third, EdgeKind::BelongsTo);

        let before = g.edge_list();
        assert_eq!(g.simplify_identical_chains(), 0);
        assert_eq!(g.edge_list(), before);
    }
}
