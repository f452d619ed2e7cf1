// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pattern occurrences inside one apartment graph.

use std::collections::BTreeSet;

use floorplan_graph::{FloorplanGraph, NodeKey};

use crate::mining::pattern::Pattern;
use crate::mining::transactions::room_projection;

/// One occurrence of a pattern: `rooms[i]` is the room matched to pattern
/// vertex `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub rooms: Vec<NodeKey>,
}

/// Occurrences of `pattern` among the rooms of `graph`.
///
/// Matching is non-induced: extra room-room edges between matched rooms do
/// not prevent a match. Automorphic mappings onto the same rooms are
/// reported once.
pub fn find_matches(graph: &FloorplanGraph, pattern: &Pattern) -> Vec<Match> {
    let (host, keys) = room_projection(graph);
    let mut seen: BTreeSet<Vec<NodeKey>> = BTreeSet::new();
    pattern
        .graph
        .monomorphisms(&host, None)
        .into_iter()
        .filter_map(|mapping| {
            let rooms: Vec<NodeKey> = mapping.iter().map(|&h| keys[h]).collect();
            let mut set = rooms.clone();
            set.sort();
            seen.insert(set).then_some(Match { rooms })
        })
        .collect()
}

/// True when `graph` contains `pattern` at least once.
pub fn contains(graph: &FloorplanGraph, pattern: &Pattern) -> bool {
    let (host, _) = room_projection(graph);
    pattern.graph.is_monomorphic_to(&host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_core::{Polygon2D, RoomType};
    use floorplan_graph::{EdgeKind, NodeData, RoomNode};

    fn room(room_type: RoomType) -> NodeData {
        NodeData::Room(RoomNode {
            room_type,
            apartment: None,
            polygon: Polygon2D::rectangle(0.0, 0.0, 1.0, 1.0),
            matched: false,
        })
    }

    #[test]
    fn matches_are_deduplicated_by_room_set() {
        let mut g = FloorplanGraph::new();
        let a = g.add_node("room_1", room(RoomType::Bedroom));
        let b = g.add_node("room_2", room(RoomType::Bedroom));
        let c = g.add_node("room_3", room(RoomType::Bathroom));
        g.add_edge(a, b, EdgeKind::RoomRoom);
        g.add_edge(b, c, EdgeKind::RoomRoom);
        g.add_edge(a, c, EdgeKind::Aligned);

        let two_beds = Pattern::parse("v 0 bedroom v 1 bedroom e 0 1 1");
        assert_eq!(find_matches(&g, &two_beds).len(), 1);

        let bath_bed = Pattern::parse("v 0 Bathroom v 1 bedroom e 0 1 1");
        let found = find_matches(&g, &bath_bed);
        // the aligned edge is not a room-room adjacency
        assert_eq!(found, vec![Match { rooms: vec![c, b] }]);
        assert!(contains(&g, &bath_bed));

        let kitchen = Pattern::parse("v 0 kitchen v 1 bedroom e 0 1 1");
        assert!(find_matches(&g, &kitchen).is_empty());
        assert!(!contains(&g, &kitchen));
    }
}
