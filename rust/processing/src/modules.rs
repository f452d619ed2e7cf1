// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persisted enriched modules.
//!
//! One cacache entry per accepted match, keyed `module/<gid>_<uuid>`, holding
//! the module record next to the enriched graph snapshot. Grouping and combo
//! queries read the store back, so they work across runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use floorplan_graph::{FloorplanGraph, GraphSnapshot};

use crate::enrich::ModuleEnricher;
use crate::error::{Error, Result};
use crate::mining::Pattern;

const KEY_PREFIX: &str = "module/";

/// Flat description of one accepted match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub pattern: String,
    pub gid: String,
    pub support: usize,
    /// Matched room node ids
    pub rooms: Vec<String>,
    /// Sorted room types of the matched rooms
    pub combo: Vec<String>,
    /// Store entry name, `<gid>_<uuid>`
    pub file: String,
    pub hash: String,
}

impl ModuleRecord {
    /// Room types joined with `+`, e.g. `Bathroom+Bedroom`.
    pub fn combo_label(&self) -> String {
        self.combo.join("+")
    }
}

#[derive(Serialize, Deserialize)]
struct ModuleDocument {
    record: ModuleRecord,
    graph: GraphSnapshot,
}

/// Modules sharing one signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleGroup {
    pub hash: String,
    pub files: Vec<String>,
}

impl ModuleGroup {
    pub fn size(&self) -> usize {
        self.files.len()
    }
}

/// Number of stored matches with one room-type combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboCount {
    pub combo: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct ModuleStore {
    dir: PathBuf,
}

impl ModuleStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| Error::persistence("*", e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fresh entry name for a module of graph `gid`.
    pub fn file_name(gid: &str) -> String {
        format!("{gid}_{}", uuid::Uuid::new_v4())
    }

    /// Stores a module under `record.file`.
    pub fn store(&self, record: &ModuleRecord, graph: &FloorplanGraph) -> Result<()> {
        let doc = ModuleDocument {
            record: record.clone(),
            graph: graph.to_snapshot(),
        };
        write_entry(&self.dir, record, &serde_json::to_vec(&doc)?)
    }

    /// Replaces every stored module with `modules`.
    ///
    /// Entries are written to a staging directory next to the store and
    /// swapped in once all of them are on disk. On error the previous
    /// modules stay in place.
    pub fn replace_all(&self, modules: &[(ModuleRecord, FloorplanGraph)]) -> Result<()> {
        self.replace_with(modules, write_entry)
    }

    fn replace_with(
        &self,
        modules: &[(ModuleRecord, FloorplanGraph)],
        mut write: impl FnMut(&Path, &ModuleRecord, &[u8]) -> Result<()>,
    ) -> Result<()> {
        let parent = match self.dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let staging = tempfile::Builder::new()
            .prefix(".modules-staging-")
            .tempdir_in(parent)
            .map_err(|e| Error::persistence("*", e))?;
        for (record, graph) in modules {
            let doc = ModuleDocument {
                record: record.clone(),
                graph: graph.to_snapshot(),
            };
            write(staging.path(), record, &serde_json::to_vec(&doc)?)?;
        }

        let retired = parent.join(format!(".modules-retired-{}", uuid::Uuid::new_v4()));
        let retired = match std::fs::rename(&self.dir, &retired) {
            Ok(()) => Some(retired),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(Error::persistence("*", e)),
        };
        if let Err(e) = std::fs::rename(staging.path(), &self.dir) {
            if let Some(retired) = &retired {
                if let Err(restore) = std::fs::rename(retired, &self.dir) {
                    tracing::error!(
                        dir = %self.dir.display(),
                        error = %restore,
                        "Could not restore the previous modules"
                    );
                }
            }
            return Err(Error::persistence("*", e));
        }
        if let Some(retired) = retired {
            if let Err(e) = std::fs::remove_dir_all(&retired) {
                tracing::warn!(dir = %retired.display(), error = %e, "Could not remove retired modules");
            }
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in cacache::list_sync(&self.dir) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(cacache::Error::IoError(e, _)) if e.kind() == std::io::ErrorKind::NotFound => {
                    break
                }
                Err(e) => return Err(Error::persistence("*", e)),
            };
            if entry.key.starts_with(KEY_PREFIX) {
                keys.push(entry.key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn read(&self, key: &str) -> Result<ModuleDocument> {
        let data = cacache::read_sync(&self.dir, key).map_err(|e| Error::persistence(key, e))?;
        serde_json::from_slice(&data).map_err(|e| Error::persistence(key, e))
    }

    /// Every stored module with its graph, sorted by entry name. Unreadable
    /// entries are logged and skipped.
    pub fn load_all(&self) -> Result<Vec<(ModuleRecord, FloorplanGraph)>> {
        let mut modules = Vec::new();
        for key in self.keys()? {
            let loaded = self.read(&key).and_then(|doc| {
                let graph = FloorplanGraph::from_snapshot(doc.graph)?;
                Ok((doc.record, graph))
            });
            match loaded {
                Ok(module) => modules.push(module),
                Err(e) => tracing::warn!(module = %key, error = %e, "Skipping unreadable module"),
            }
        }
        Ok(modules)
    }

    /// Every stored record, without graphs.
    pub fn records(&self) -> Result<Vec<ModuleRecord>> {
        let mut records = Vec::new();
        for key in self.keys()? {
            match self.read(&key) {
                Ok(doc) => records.push(doc.record),
                Err(e) => tracing::warn!(module = %key, error = %e, "Skipping unreadable module"),
            }
        }
        Ok(records)
    }

    pub fn clear(&self) -> Result<()> {
        cacache::clear_sync(&self.dir).map_err(|e| Error::persistence("*", e))
    }

    /// Partitions the stored modules by signature, recomputed from their
    /// graphs. Largest groups first.
    pub fn group(&self, enricher: &ModuleEnricher<'_>) -> Result<Vec<ModuleGroup>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (record, graph) in self.load_all()? {
            groups.entry(enricher.signature(&graph)).or_default().push(record.file);
        }
        let mut groups: Vec<ModuleGroup> = groups
            .into_iter()
            .map(|(hash, files)| ModuleGroup { hash, files })
            .collect();
        groups.sort_by(|a, b| b.size().cmp(&a.size()).then_with(|| a.hash.cmp(&b.hash)));
        Ok(groups)
    }

    /// Room-type combinations of the stored matches of `pattern`, optionally
    /// restricted to some graphs. Most frequent first.
    pub fn combos(&self, pattern: &str, gids: Option<&[String]>) -> Result<Vec<ComboCount>> {
        let wanted = Pattern::parse(pattern).canonical_key();
        let mut counts: BTreeMap<Vec<String>, usize> = BTreeMap::new();
        for record in self.records()? {
            if Pattern::parse(&record.pattern).canonical_key() != wanted {
                continue;
            }
            if gids.is_some_and(|ids| !ids.iter().any(|g| *g == record.gid)) {
                continue;
            }
            *counts.entry(record.combo).or_default() += 1;
        }
        if counts.is_empty() {
            return Err(Error::NotFound(format!("no stored matches for pattern {wanted:?}")));
        }
        let mut combos: Vec<ComboCount> = counts
            .into_iter()
            .map(|(combo, count)| ComboCount { combo, count })
            .collect();
        combos.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.combo.cmp(&b.combo)));
        Ok(combos)
    }
}

fn write_entry(dir: &Path, record: &ModuleRecord, json: &[u8]) -> Result<()> {
    cacache::write_sync(dir, format!("{KEY_PREFIX}{}", record.file), json)
        .map_err(|e| Error::persistence(&record.file, e))?;
    Ok(())
}
