// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frequent subgraph mining.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use floorplan_graph::LabeledGraph;

use crate::error::{Error, Result};
use crate::mining::pattern::{canonical_form, describe};
use crate::mining::transactions::Transactions;

/// A frequent pattern and the number of transactions containing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinedPattern {
    pub description: String,
    pub support: usize,
}

/// A frequent-subgraph miner.
///
/// Support counts transactions that contain the pattern at least once.
/// Node labels and edge labels must match exactly.
pub trait FrequentSubgraphMiner: Send + Sync {
    fn name(&self) -> &str;

    fn mine(&self, transactions: &Transactions, min_support: usize) -> Result<Vec<MinedPattern>>;
}

/// Reference miner: enumerates every connected edge-induced subgraph with
/// at most `max_vertices` vertices in every transaction.
///
/// Exhaustive, so only practical for the small vertex counts modules have.
#[derive(Debug, Clone, Copy)]
pub struct SubgraphEnumerationMiner {
    pub max_vertices: usize,
}

type EdgeSet = SmallVec<[usize; 8]>;

impl SubgraphEnumerationMiner {
    pub fn new(max_vertices: usize) -> Self {
        Self { max_vertices }
    }

    /// Canonical descriptions of every connected subgraph of `graph` within
    /// the vertex bound.
    fn patterns_of(&self, graph: &LabeledGraph) -> FxHashSet<String> {
        let edges = graph.edges();
        let mut found = FxHashSet::default();
        let mut seen: FxHashSet<EdgeSet> = FxHashSet::default();
        let mut stack: Vec<EdgeSet> = (0..edges.len()).map(|e| SmallVec::from_slice(&[e])).collect();

        while let Some(set) = stack.pop() {
            if !seen.insert(set.clone()) {
                continue;
            }
            let mut vertices: SmallVec<[usize; 8]> = SmallVec::new();
            for &e in &set {
                let (u, v, _) = edges[e];
                for n in [u, v] {
                    if !vertices.contains(&n) {
                        vertices.push(n);
                    }
                }
            }
            found.insert(describe(&canonical_form(&subgraph(graph, &edges, &set, &vertices))));

            for (e, (u, v, _)) in edges.iter().enumerate() {
                if set.contains(&e) {
                    continue;
                }
                let has_u = vertices.contains(u);
                let has_v = vertices.contains(v);
                if !has_u && !has_v {
                    continue;
                }
                if !(has_u && has_v) && vertices.len() >= self.max_vertices {
                    continue;
                }
                let mut next = set.clone();
                let at = next.partition_point(|&x| x < e);
                next.insert(at, e);
                if !seen.contains(&next) {
                    stack.push(next);
                }
            }
        }
        found
    }
}

fn subgraph(
    graph: &LabeledGraph,
    edges: &[(usize, usize, &str)],
    set: &[usize],
    vertices: &[usize],
) -> LabeledGraph {
    let mut out = LabeledGraph::new();
    let index: FxHashMap<usize, usize> = vertices
        .iter()
        .map(|&v| (v, out.add_node(graph.label(v))))
        .collect();
    for &e in set {
        let (u, v, label) = edges[e];
        out.add_edge(index[&u], index[&v], label);
    }
    out
}

impl FrequentSubgraphMiner for SubgraphEnumerationMiner {
    fn name(&self) -> &str {
        "subgraph-enumeration"
    }

    fn mine(&self, transactions: &Transactions, min_support: usize) -> Result<Vec<MinedPattern>> {
        if self.max_vertices < 2 {
            return Err(Error::MiningUnavailable(format!(
                "vertex bound {} admits no edge patterns",
                self.max_vertices
            )));
        }

        let per_graph: Vec<FxHashSet<String>> = transactions
            .graphs()
            .collect::<Vec<_>>()
            .par_iter()
            .map(|g| self.patterns_of(g))
            .collect();

        let mut support: FxHashMap<String, usize> = FxHashMap::default();
        for patterns in per_graph {
            for p in patterns {
                *support.entry(p).or_default() += 1;
            }
        }

        let mut mined: Vec<MinedPattern> = support
            .into_iter()
            .filter(|(_, s)| *s >= min_support)
            .map(|(description, support)| MinedPattern {
                description,
                support,
            })
            .collect();
        mined.sort_by(|a, b| b.support.cmp(&a.support).then_with(|| a.description.cmp(&b.description)));

        tracing::debug!(
            miner = self.name(),
            transactions = transactions.len(),
            patterns = mined.len(),
            "Mining complete"
        );
        Ok(mined)
    }
}
