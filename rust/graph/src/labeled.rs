// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Small labeled graphs and subgraph monomorphism.
//!
//! Mined patterns, room-adjacency projections and module segment graphs are
//! all [`LabeledGraph`]s: dense `usize` node indices, string node labels and
//! string edge labels.

use rustc_hash::FxHashMap;

use crate::graph::{Edge, FloorplanGraph, Node};
use crate::keys::NodeKey;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledGraph {
    labels: Vec<String>,
    // node → (neighbour, edge label), sorted by neighbour
    adjacency: Vec<Vec<(usize, String)>>,
    edge_count: usize,
}

impl LabeledGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, label: impl Into<String>) -> usize {
        self.labels.push(label.into());
        self.adjacency.push(Vec::new());
        self.labels.len() - 1
    }

    /// Adds an undirected labeled edge. Self-loops, unknown nodes and
    /// repeated pairs are ignored (returns `false`).
    pub fn add_edge(&mut self, u: usize, v: usize, label: impl Into<String>) -> bool {
        if u == v || u >= self.labels.len() || v >= self.labels.len() || self.has_edge(u, v) {
            return false;
        }
        let label = label.into();
        for (from, to) in [(u, v), (v, u)] {
            let list = &mut self.adjacency[from];
            let at = list.partition_point(|(n, _)| *n < to);
            list.insert(at, (to, label.clone()));
        }
        self.edge_count += 1;
        true
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn label(&self, node: usize) -> &str {
        self.labels.get(node).map(String::as_str).unwrap_or("")
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.adjacency
            .get(node)
            .into_iter()
            .flatten()
            .map(|(n, l)| (*n, l.as_str()))
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency.get(node).map_or(0, Vec::len)
    }

    pub fn edge_label(&self, u: usize, v: usize) -> Option<&str> {
        let list = self.adjacency.get(u)?;
        list.binary_search_by_key(&v, |(n, _)| *n)
            .ok()
            .map(|i| list[i].1.as_str())
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.edge_label(u, v).is_some()
    }

    /// Edges as `(u, v, label)` with `u < v`, sorted.
    pub fn edges(&self) -> Vec<(usize, usize, &str)> {
        let mut out = Vec::with_capacity(self.edge_count);
        for (u, list) in self.adjacency.iter().enumerate() {
            for (v, l) in list {
                if u < *v {
                    out.push((u, *v, l.as_str()));
                }
            }
        }
        out
    }

    /// Order in which pattern nodes are assigned: each next node is the
    /// unplaced one with the most already-placed neighbours, then the
    /// highest degree. Keeps the search connected and prunes early.
    fn search_order(&self) -> Vec<usize> {
        let n = self.node_count();
        let mut placed = vec![false; n];
        let mut order = Vec::with_capacity(n);
        while order.len() < n {
            let next = (0..n)
                .filter(|&i| !placed[i])
                .max_by_key(|&i| {
                    let linked = self.neighbors(i).filter(|(j, _)| placed[*j]).count();
                    (linked, self.degree(i), std::cmp::Reverse(i))
                });
            let Some(next) = next else { break };
            placed[next] = true;
            order.push(next);
        }
        order
    }

    /// All injective mappings of `self`'s nodes into `host` that preserve
    /// node labels and map every edge onto a host edge with the same label.
    /// Extra host edges are allowed (non-induced matching).
    ///
    /// `mapping[i]` is the host node of pattern node `i`. Stops after
    /// `limit` mappings when given.
    pub fn monomorphisms(&self, host: &LabeledGraph, limit: Option<usize>) -> Vec<Vec<usize>> {
        let mut found = Vec::new();
        if self.node_count() == 0 || self.node_count() > host.node_count() {
            return found;
        }
        let order = self.search_order();
        let mut mapping = vec![usize::MAX; self.node_count()];
        let mut used = vec![false; host.node_count()];
        self.extend(host, &order, 0, &mut mapping, &mut used, limit, &mut found);
        found
    }

    /// True when `self` has at least one monomorphism into `host`.
    pub fn is_monomorphic_to(&self, host: &LabeledGraph) -> bool {
        !self.monomorphisms(host, Some(1)).is_empty()
    }

    #[allow(clippy::too_many_arguments)]
    fn extend(
        &self,
        host: &LabeledGraph,
        order: &[usize],
        depth: usize,
        mapping: &mut [usize],
        used: &mut [bool],
        limit: Option<usize>,
        found: &mut Vec<Vec<usize>>,
    ) {
        if limit.is_some_and(|l| found.len() >= l) {
            return;
        }
        let Some(&p) = order.get(depth) else {
            found.push(mapping.to_vec());
            return;
        };

        for h in 0..host.node_count() {
            if used[h] || host.labels[h] != self.labels[p] || host.degree(h) < self.degree(p) {
                continue;
            }
            let consistent = self.neighbors(p).all(|(q, label)| {
                let hq = mapping[q];
                hq == usize::MAX || host.edge_label(h, hq) == Some(label)
            });
            if !consistent {
                continue;
            }
            mapping[p] = h;
            used[h] = true;
            self.extend(host, order, depth + 1, mapping, used, limit, found);
            used[h] = false;
            mapping[p] = usize::MAX;
            if limit.is_some_and(|l| found.len() >= l) {
                return;
            }
        }
    }
}

impl FloorplanGraph {
    /// Projects the nodes accepted by `label` and the edges accepted by
    /// `edge_label` into a [`LabeledGraph`].
    ///
    /// Returns the projection and, per projected index, the original key.
    pub fn project<N, E>(&self, label: N, edge_label: E) -> (LabeledGraph, Vec<NodeKey>)
    where
        N: Fn(&Node) -> Option<String>,
        E: Fn(&Edge) -> Option<String>,
    {
        let mut graph = LabeledGraph::new();
        let mut keys = Vec::new();
        let mut index = FxHashMap::default();
        for (k, node) in self.nodes() {
            if let Some(l) = label(node) {
                index.insert(k, graph.add_node(l));
                keys.push(k);
            }
        }
        for (_, edge) in self.edges() {
            if let (Some(&u), Some(&v)) = (index.get(&edge.a), index.get(&edge.b)) {
                if let Some(l) = edge_label(edge) {
                    graph.add_edge(u, v, l);
                }
            }
        }
        (graph, keys)
    }
}
