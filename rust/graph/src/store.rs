// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persisted graph corpus using cacache.
//!
//! Each graph is stored as its JSON snapshot under `graph/<id>`. cacache
//! writes content to a temporary file and publishes it by rename before the
//! index entry is appended, so readers never see a partially written graph.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::graph::FloorplanGraph;

const KEY_PREFIX: &str = "graph/";

/// Content-addressable on-disk graph store.
#[derive(Debug, Clone)]
pub struct GraphStore {
    dir: PathBuf,
}

fn persistence(graph_id: &str, e: impl std::fmt::Display) -> Error {
    Error::Persistence {
        graph_id: graph_id.to_string(),
        message: e.to_string(),
    }
}

impl GraphStore {
    /// Opens (and creates) a store in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| persistence("*", e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key(graph_id: &str) -> String {
        format!("{KEY_PREFIX}{graph_id}")
    }

    /// Stores a graph, replacing any previous graph with the same id.
    pub fn store(&self, graph_id: &str, graph: &FloorplanGraph) -> Result<()> {
        let json = graph.to_json()?;
        cacache::write_sync(&self.dir, Self::key(graph_id), json.as_bytes())
            .map_err(|e| persistence(graph_id, e))?;
        tracing::debug!(
            graph = %graph_id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            size = json.len(),
            "Stored graph"
        );
        Ok(())
    }

    /// Loads a graph, or `None` when no graph has that id.
    pub fn get(&self, graph_id: &str) -> Result<Option<FloorplanGraph>> {
        match cacache::read_sync(&self.dir, Self::key(graph_id)) {
            Ok(data) => {
                let json = String::from_utf8(data).map_err(|e| persistence(graph_id, e))?;
                FloorplanGraph::from_json(&json)
                    .map(Some)
                    .map_err(|e| persistence(graph_id, e))
            }
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(e) => Err(persistence(graph_id, e)),
        }
    }

    /// Loads a graph that must exist.
    pub fn load(&self, graph_id: &str) -> Result<FloorplanGraph> {
        self.get(graph_id)?
            .ok_or_else(|| persistence(graph_id, "graph not found"))
    }

    pub fn contains(&self, graph_id: &str) -> bool {
        matches!(
            cacache::metadata_sync(&self.dir, Self::key(graph_id)),
            Ok(Some(_))
        )
    }

    /// Ids of all stored graphs, sorted.
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let mut ids = BTreeSet::new();
        for entry in cacache::list_sync(&self.dir) {
            let entry = match entry {
                Ok(entry) => entry,
                // no index yet: nothing was ever written
                Err(cacache::Error::IoError(e, _)) if e.kind() == std::io::ErrorKind::NotFound => {
                    break
                }
                Err(e) => return Err(persistence("*", e)),
            };
            if let Some(id) = entry.key.strip_prefix(KEY_PREFIX) {
                ids.insert(id.to_string());
            }
        }
        Ok(ids.into_iter().collect())
    }

    /// Loads every stored graph, sorted by id.
    ///
    /// A graph that fails to load is logged and skipped; it does not affect
    /// the others.
    pub fn load_all(&self) -> Result<Vec<(String, FloorplanGraph)>> {
        let mut graphs = Vec::new();
        for id in self.list_ids()? {
            match self.get(&id) {
                Ok(Some(graph)) => graphs.push((id, graph)),
                Ok(None) => {}
                Err(e) => tracing::warn!(graph = %id, error = %e, "Skipping unreadable graph"),
            }
        }
        Ok(graphs)
    }

    pub fn remove(&self, graph_id: &str) -> Result<()> {
        cacache::remove_sync(&self.dir, Self::key(graph_id)).map_err(|e| persistence(graph_id, e))
    }

    /// Removes every stored graph.
    pub fn clear(&self) -> Result<()> {
        cacache::clear_sync(&self.dir).map_err(|e| persistence("*", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeData;
    use crate::keys::EdgeKind;

    fn graph(n: usize) -> FloorplanGraph {
        let mut g = FloorplanGraph::new();
        let mut prev = None;
        for i in 0..n {
            let k = g.add_node(format!("apartment_{i}"), NodeData::apartment(i.to_string()));
            if let Some(p) = prev {
                g.add_edge(p, k, EdgeKind::Adjacent);
            }
            prev = Some(k);
        }
        g
    }

    #[test]
    fn store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::open(dir.path()).unwrap();

        store.store("floor1_A", &graph(3)).unwrap();
        store.store("floor1_B", &graph(2)).unwrap();

        assert_eq!(store.list_ids().unwrap(), vec!["floor1_A", "floor1_B"]);
        assert_eq!(store.load("floor1_A").unwrap(), graph(3));
        assert!(store.contains("floor1_B"));
        assert!(store.get("nope").unwrap().is_none());
        assert!(matches!(
            store.load("nope"),
            Err(Error::Persistence { graph_id, .. }) if graph_id == "nope"
        ));
    }

    #[test]
    fn overwrite_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::open(dir.path()).unwrap();

        store.store("g", &graph(2)).unwrap();
        store.store("g", &graph(4)).unwrap();
        assert_eq!(store.load("g").unwrap().node_count(), 4);
        assert_eq!(store.load_all().unwrap().len(), 1);

        store.clear().unwrap();
        assert!(store.list_ids().unwrap().is_empty());
    }
}
