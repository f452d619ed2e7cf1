// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Open metadata attached to graph nodes.
//!
//! Typed node fields live on [`NodeData`](crate::graph::NodeData); this map
//! only carries pass-through display attributes such as a panel type or a
//! drawing position.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::graph::FloorplanGraph;
use crate::keys::NodeKey;

/// A typed metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetaValue {
    Int(i64),
    Double(f64),
    Text(String),
    Bool(bool),
}

/// Metadata map attached to a node.
pub type Metadata = FxHashMap<String, MetaValue>;

impl MetaValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Double(v) => Some(*v),
            MetaValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl FloorplanGraph {
    /// Sets one metadata entry on a node. Unknown keys are ignored.
    pub fn set_meta(&mut self, key: NodeKey, name: impl Into<String>, value: MetaValue) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.meta.insert(name.into(), value);
        }
    }

    /// Returns a metadata entry of a node, if any.
    pub fn meta(&self, key: NodeKey, name: &str) -> Option<&MetaValue> {
        self.nodes.get(key).and_then(|n| n.meta.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeData;

    #[test]
    fn set_and_get_meta() {
        let mut graph = FloorplanGraph::new();
        let k = graph.add_node("apartment_A1", NodeData::apartment("A1"));

        graph.set_meta(k, "panel_type", MetaValue::Text("WAL_01_CNI_REN".into()));
        graph.set_meta(k, "x", MetaValue::Double(1.5));

        assert_eq!(
            graph.meta(k, "panel_type").and_then(MetaValue::as_str),
            Some("WAL_01_CNI_REN")
        );
        assert_eq!(graph.meta(k, "x").and_then(MetaValue::as_f64), Some(1.5));
        assert!(graph.meta(k, "y").is_none());
    }

    #[test]
    fn int_reads_as_float() {
        assert_eq!(MetaValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(MetaValue::Bool(true).as_f64(), None);
    }
}
