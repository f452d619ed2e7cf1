// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pattern descriptions.
//!
//! A description is the gSpan vertex/edge listing of a pattern on one line:
//! `v 0 bathroom v 1 bedroom e 0 1 1`. Unknown tokens are skipped when
//! reading, so descriptions with extra decoration still parse.

use rustc_hash::FxHashMap;

use floorplan_core::normalize_label;
use floorplan_graph::LabeledGraph;

/// Label of every room-room edge in transactions and patterns.
pub const ROOM_EDGE_LABEL: &str = "1";

/// A mined room-adjacency pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub description: String,
    pub graph: LabeledGraph,
}

impl Pattern {
    /// Parses a description. Labels are normalized and every edge gets the
    /// room-room label; edges naming an undeclared vertex are dropped.
    pub fn parse(description: &str) -> Self {
        let mut graph = LabeledGraph::new();
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();
        let mut edges: Vec<(&str, &str)> = Vec::new();

        let tokens: Vec<&str> = description.split_whitespace().collect();
        let mut i = 0;
        while i < tokens.len() {
            match tokens[i] {
                "v" if i + 2 < tokens.len() => {
                    let id = tokens[i + 1];
                    if !index.contains_key(id) {
                        index.insert(id, graph.add_node(normalize_label(tokens[i + 2])));
                    }
                    i += 3;
                }
                "e" if i + 3 < tokens.len() => {
                    edges.push((tokens[i + 1], tokens[i + 2]));
                    i += 4;
                }
                _ => i += 1,
            }
        }

        for (u, v) in edges {
            match (index.get(u), index.get(v)) {
                (Some(&a), Some(&b)) => {
                    graph.add_edge(a, b, ROOM_EDGE_LABEL);
                }
                _ => tracing::warn!(pattern = %description, from = u, to = v, "Pattern edge names an unknown vertex"),
            }
        }

        Self {
            description: description.trim().to_string(),
            graph,
        }
    }

    pub fn from_graph(graph: LabeledGraph) -> Self {
        Self {
            description: describe(&graph),
            graph,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Line-per-entry form used to compare descriptions.
    pub fn normalized(&self) -> String {
        normalize_dfs(&self.description)
    }

    /// Description of the canonical form. Equal for isomorphic patterns,
    /// whatever their vertex order or label casing.
    pub fn canonical_key(&self) -> String {
        describe(&canonical_form(&self.graph))
    }
}

/// One-line description of a labeled graph, vertices then edges.
pub fn describe(graph: &LabeledGraph) -> String {
    let mut parts: Vec<String> = (0..graph.node_count())
        .map(|i| format!("v {i} {}", graph.label(i)))
        .collect();
    parts.extend(
        graph
            .edges()
            .into_iter()
            .map(|(u, v, label)| format!("e {u} {v} {label}")),
    );
    parts.join(" ")
}

/// Rewrites a description as `v <id> <label>` / `e <u> <v> <label>` lines,
/// dropping everything else.
pub fn normalize_dfs(description: &str) -> String {
    let tokens: Vec<&str> = description.split_whitespace().collect();
    let mut lines = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "v" if i + 2 < tokens.len() => {
                lines.push(format!("v {} {}", tokens[i + 1], tokens[i + 2]));
                i += 3;
            }
            "e" if i + 3 < tokens.len() => {
                lines.push(format!("e {} {} {}", tokens[i + 1], tokens[i + 2], tokens[i + 3]));
                i += 4;
            }
            _ => i += 1,
        }
    }
    lines.join("\n")
}

/// Canonical relabeling of a small labeled graph.
///
/// Vertices are ordered by label; among the orders that agree on labels,
/// the one with the lexicographically smallest edge list wins. Isomorphic
/// graphs get identical results.
pub fn canonical_form(graph: &LabeledGraph) -> LabeledGraph {
    let n = graph.node_count();
    let mut labels: Vec<&str> = (0..n).map(|i| graph.label(i)).collect();
    labels.sort_unstable();

    let mut best: Option<Vec<(usize, usize, String)>> = None;
    let mut order = Vec::with_capacity(n);
    let mut used = vec![false; n];
    search_orders(graph, &labels, &mut order, &mut used, &mut best);

    let mut out = LabeledGraph::new();
    for label in &labels {
        out.add_node(*label);
    }
    if let Some(edges) = best {
        for (u, v, label) in edges {
            out.add_edge(u, v, label);
        }
    }
    out
}

fn edges_under(graph: &LabeledGraph, order: &[usize]) -> Vec<(usize, usize, String)> {
    let mut position = vec![0; order.len()];
    for (pos, &node) in order.iter().enumerate() {
        position[node] = pos;
    }
    let mut edges: Vec<(usize, usize, String)> = graph
        .edges()
        .into_iter()
        .map(|(u, v, l)| {
            let (a, b) = (position[u], position[v]);
            (a.min(b), a.max(b), l.to_string())
        })
        .collect();
    edges.sort();
    edges
}

fn search_orders(
    graph: &LabeledGraph,
    labels: &[&str],
    order: &mut Vec<usize>,
    used: &mut [bool],
    best: &mut Option<Vec<(usize, usize, String)>>,
) {
    let depth = order.len();
    if depth == labels.len() {
        let edges = edges_under(graph, order);
        if best.as_ref().map_or(true, |b| edges < *b) {
            *best = Some(edges);
        }
        return;
    }
    for node in 0..graph.node_count() {
        if used[node] || graph.label(node) != labels[depth] {
            continue;
        }
        used[node] = true;
        order.push(node);
        search_orders(graph, labels, order, used, best);
        order.pop();
        used[node] = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_key_ignores_vertex_order_and_case() {
        let a = Pattern::parse("v 0 bathroom v 1 bedroom e 0 1 1");
        let b = Pattern::parse("v 0 Bedroom\nv 1 BATHROOM\ne 1 0 1");
        assert_eq!(a.canonical_key(), b.canonical_key());
        assert_ne!(a.normalized(), b.normalized());

        let c = Pattern::parse("v 0 bathroom v 1 kitchen e 0 1 1");
        assert_ne!(a.canonical_key(), c.canonical_key());
    }

    #[test]
    fn parse_description() {
        let p = Pattern::parse("v 0 Bathroom v 1 bedroom e 0 1 1");
        assert_eq!(p.node_count(), 2);
        assert_eq!(p.graph.label(0), "bathroom");
        assert_eq!(p.graph.edge_label(0, 1), Some(ROOM_EDGE_LABEL));
    }

    #[test]
    fn parse_skips_noise_and_unknown_vertices() {
        let p = Pattern::parse("t # 3 v 4 kitchen x v 7 dining e 4 7 1 e 4 9 1 e");
        assert_eq!(p.node_count(), 2);
        assert_eq!(p.graph.edge_count(), 1);
    }

    #[test]
    fn normalize_keeps_vertex_and_edge_entries() {
        let raw = "  v 0 bathroom   v 1 bedroom\n e 0 1 1  support 4 ";
        assert_eq!(normalize_dfs(raw), "v 0 bathroom\nv 1 bedroom\ne 0 1 1");
        assert_eq!(normalize_dfs(raw), normalize_dfs("v 0 bathroom v 1 bedroom e 0 1 1"));
    }

    #[test]
    fn describe_round_trips_through_parse() {
        let p = Pattern::parse("v 0 bathroom v 1 bedroom v 2 corridor e 0 1 1 e 1 2 1");
        let again = Pattern::parse(&describe(&p.graph));
        assert_eq!(again.graph, p.graph);
    }

    #[test]
    fn canonical_form_ignores_vertex_order() {
        let a = Pattern::parse("v 0 corridor v 1 bedroom v 2 bathroom e 0 1 1 e 0 2 1").graph;
        let b = Pattern::parse("v 0 bathroom v 1 corridor v 2 bedroom e 1 2 1 e 0 1 1").graph;
        assert_eq!(canonical_form(&a), canonical_form(&b));
        assert_eq!(canonical_form(&a).label(0), "bathroom");

        // same labels, different structure
        let c = Pattern::parse("v 0 corridor v 1 bedroom v 2 bathroom e 0 1 1 e 1 2 1").graph;
        assert_ne!(canonical_form(&a), canonical_form(&c));
    }
}
