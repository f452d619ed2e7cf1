// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Weisfeiler-Lehman graph signatures.
//!
//! Each round relabels every node with the hash of its own label and the
//! sorted multiset of `edge label + neighbour label` strings. The signature
//! hashes the sorted label histogram of every round, so it depends on
//! structure and labels only, never on node order or ids.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::labeled::LabeledGraph;

/// Default number of refinement rounds.
pub const DEFAULT_ITERATIONS: usize = 3;

fn digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    // 16 bytes is plenty for intermediate labels
    hex::encode(&hasher.finalize()[..16])
}

fn refine(graph: &LabeledGraph, labels: &[String]) -> Vec<String> {
    (0..graph.node_count())
        .map(|node| {
            let mut around: Vec<String> = graph
                .neighbors(node)
                .map(|(n, edge)| format!("{edge}{}", labels[n]))
                .collect();
            around.sort_unstable();
            digest(&format!("{}({})", labels[node], around.join(",")))
        })
        .collect()
}

/// Weisfeiler-Lehman signature of `graph` as a hex string.
pub fn wl_hash(graph: &LabeledGraph, iterations: usize) -> String {
    let mut labels: Vec<String> = graph.labels().to_vec();
    let mut histogram = String::new();

    for _ in 0..iterations.max(1) {
        labels = refine(graph, &labels);
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for l in &labels {
            *counts.entry(l.as_str()).or_default() += 1;
        }
        for (label, count) in counts {
            histogram.push_str(label);
            histogram.push(':');
            histogram.push_str(&count.to_string());
            histogram.push(';');
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(histogram.as_bytes());
    hex::encode(hasher.finalize())
}
