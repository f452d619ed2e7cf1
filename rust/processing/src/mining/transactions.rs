// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mining transactions: the room-adjacency projection of every corpus graph,
//! and its gSpan text form.
//!
//! ```text
//! t # 0
//! v 0 bathroom
//! v 1 bedroom
//! e 0 1 1
//! t # -1
//! ```

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use floorplan_graph::{EdgeKind, FloorplanGraph, LabeledGraph, NodeKey};

use crate::error::{Error, Result};
use crate::mining::pattern::ROOM_EDGE_LABEL;

/// Rooms labelled by normalized room type, joined by their `room-room`
/// edges. Returns the projection and the room key of every projected node.
pub fn room_projection(graph: &FloorplanGraph) -> (LabeledGraph, Vec<NodeKey>) {
    graph.project(
        |node| node.data.as_room().map(|r| r.room_type.normalized_label()),
        |edge| (edge.kind == EdgeKind::RoomRoom).then(|| ROOM_EDGE_LABEL.to_string()),
    )
}

/// Projection restricted to rooms that have at least one room-room edge.
fn connected_rooms(graph: &FloorplanGraph) -> LabeledGraph {
    let (full, _) = room_projection(graph);
    let mut out = LabeledGraph::new();
    let mut index = vec![usize::MAX; full.node_count()];
    for node in 0..full.node_count() {
        if full.degree(node) > 0 {
            index[node] = out.add_node(full.label(node));
        }
    }
    for (u, v, label) in full.edges() {
        out.add_edge(index[u], index[v], label);
    }
    out
}

/// Transaction database handed to a miner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transactions {
    graphs: Vec<(String, LabeledGraph)>,
}

impl Transactions {
    /// Transactions of a corpus; graphs without room-room edges are left out.
    pub fn from_corpus(corpus: &[(String, FloorplanGraph)]) -> Self {
        let graphs = corpus
            .iter()
            .filter_map(|(id, graph)| {
                let projected = connected_rooms(graph);
                (projected.edge_count() > 0).then(|| (id.clone(), projected))
            })
            .collect();
        Self { graphs }
    }

    pub fn push(&mut self, graph_id: impl Into<String>, graph: LabeledGraph) {
        self.graphs.push((graph_id.into(), graph));
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn graphs(&self) -> impl Iterator<Item = &LabeledGraph> + '_ {
        self.graphs.iter().map(|(_, g)| g)
    }

    pub fn graph_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.graphs.iter().map(|(id, _)| id.as_str())
    }

    /// gSpan text. Transactions are numbered in order; the graph ids are
    /// not part of the format.
    pub fn to_gspan(&self) -> String {
        let mut out = String::new();
        for (i, (_, graph)) in self.graphs.iter().enumerate() {
            let _ = writeln!(out, "t # {i}");
            for node in 0..graph.node_count() {
                let _ = writeln!(out, "v {node} {}", graph.label(node));
            }
            for (u, v, label) in graph.edges() {
                let _ = writeln!(out, "e {u} {v} {label}");
            }
        }
        out.push_str("t # -1\n");
        out
    }

    /// Reads gSpan text. Transactions are named by their number.
    pub fn from_gspan(text: &str) -> Result<Self> {
        let malformed = |line_no: usize, line: &str| {
            Error::MiningUnavailable(format!("malformed transaction line {}: {line:?}", line_no + 1))
        };

        let mut out = Self::default();
        let mut current: Option<(String, LabeledGraph)> = None;
        for (line_no, line) in text.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [] => {}
                ["t", "#", id] => {
                    if let Some((gid, graph)) = current.take() {
                        out.graphs.push((gid, graph));
                    }
                    if *id == "-1" {
                        break;
                    }
                    current = Some((id.to_string(), LabeledGraph::new()));
                }
                ["v", id, label] => {
                    let (_, graph) = current.as_mut().ok_or_else(|| malformed(line_no, line))?;
                    let expected = graph.node_count().to_string();
                    if *id != expected {
                        return Err(malformed(line_no, line));
                    }
                    graph.add_node(*label);
                }
                ["e", u, v, label] => {
                    let (_, graph) = current.as_mut().ok_or_else(|| malformed(line_no, line))?;
                    let u: usize = u.parse().map_err(|_| malformed(line_no, line))?;
                    let v: usize = v.parse().map_err(|_| malformed(line_no, line))?;
                    if u >= graph.node_count() || v >= graph.node_count() {
                        return Err(malformed(line_no, line));
                    }
                    graph.add_edge(u, v, *label);
                }
                _ => return Err(malformed(line_no, line)),
            }
        }
        if let Some((gid, graph)) = current {
            out.graphs.push((gid, graph));
        }
        Ok(out)
    }

    /// Writes the gSpan text to `path`, replacing any previous file at once.
    pub fn write(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.to_gspan().as_bytes())
    }
}

/// Writes `bytes` to a temporary file next to `path` and renames it into
/// place.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_core::{Polygon2D, RoomType};
    use floorplan_graph::{NodeData, RoomNode};

    fn room(room_type: RoomType) -> NodeData {
        NodeData::Room(RoomNode {
            room_type,
            apartment: None,
            polygon: Polygon2D::rectangle(0.0, 0.0, 1.0, 1.0),
            matched: false,
        })
    }

    fn apartment() -> FloorplanGraph {
        let mut g = FloorplanGraph::new();
        let bath = g.add_node("room_1", room(RoomType::Bathroom));
        let bed = g.add_node("room_2", room(RoomType::Bedroom));
        let store = g.add_node("room_3", room(RoomType::Other("walk in".into())));
        let apt = g.add_node("apartment_A", NodeData::apartment("A"));
        g.add_weighted_edge(bath, bed, EdgeKind::RoomRoom, 2.0);
        g.add_edge(bed, store, EdgeKind::Aligned);
        g.add_edge(bath, apt, EdgeKind::BelongsTo);
        g
    }

    #[test]
    fn projection_keeps_rooms_and_room_edges() {
        let (p, keys) = room_projection(&apartment());
        assert_eq!(p.node_count(), 3);
        assert_eq!(keys.len(), 3);
        assert_eq!(p.edges(), vec![(0, 1, "1")]);
        assert_eq!(p.label(2), "walk_in");
    }

    #[test]
    fn gspan_text() {
        let corpus = vec![
            ("g1".to_string(), apartment()),
            ("empty".to_string(), FloorplanGraph::new()),
        ];
        let tx = Transactions::from_corpus(&corpus);
        assert_eq!(tx.len(), 1);
        assert_eq!(
            tx.to_gspan(),
            "t # 0\nv 0 bathroom\nv 1 bedroom\ne 0 1 1\nt # -1\n"
        );

        let back = Transactions::from_gspan(&tx.to_gspan()).unwrap();
        assert_eq!(back.graph_ids().collect::<Vec<_>>(), vec!["0"]);
        assert_eq!(back.graphs().next(), tx.graphs().next());
    }

    #[test]
    fn malformed_gspan_is_unavailable() {
        for text in ["v 0 bathroom\n", "t # 0\nv 1 bathroom\n", "t # 0\nv 0 a\ne 0 3 1\n", "t # 0\nx\n"] {
            assert!(matches!(
                Transactions::from_gspan(text),
                Err(Error::MiningUnavailable(_))
            ));
        }
    }

    #[test]
    fn write_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("transactions.txt");
        let mut tx = Transactions::default();
        let mut g = LabeledGraph::new();
        g.add_node("kitchen");
        tx.push("g", g);
        tx.write(&path).unwrap();
        tx.write(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), tx.to_gspan());
    }
}
