// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline entry points.
//!
//! [`Engine`] owns the graph corpus and the module store for one
//! configuration. Every stage reads and writes through them; nothing is kept
//! in memory between calls.

use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use floorplan_core::{
    floors_from_records, ApartmentId, Config, Floor, FloorRecord, MiningParams, WallSegment,
};
use floorplan_geometry::Polygon;
use floorplan_graph::{FloorplanGraph, GraphBuilder, GraphStore};

use crate::classify::{ClassificationReport, WallTypeClassifier};
use crate::constraints::{MatchMetrics, SpatialConstraintFilter};
use crate::enrich::ModuleEnricher;
use crate::error::{Error, Result};
use crate::export::PanelDocument;
use crate::extract::GeometryExtractor;
use crate::mining::transactions::write_atomic;
use crate::mining::{
    find_matches, FrequentSubgraphMiner, MinedPattern, Pattern, SubgraphEnumerationMiner,
    Transactions,
};
use crate::modules::{ComboCount, ModuleGroup, ModuleRecord, ModuleStore};

/// Audit table of every evaluated match.
pub const METRICS_FILE: &str = "pattern_metrics.json";
/// gSpan transactions handed to the miner.
pub const TRANSACTIONS_FILE: &str = "transactions.txt";

/// Id of the stored graph of one apartment.
pub fn graph_id(floor: &Floor, apartment: &ApartmentId) -> String {
    format!("{}_{}", floor.id, apartment)
}

/// Result of [`Engine::ingest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub floors: usize,
    pub stored: Vec<String>,
    /// Graph id and error message of every graph that could not be stored
    pub failures: Vec<(String, String)>,
}

/// Result of [`Engine::mine`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiningReport {
    pub patterns: Vec<MinedPattern>,
    pub metrics: Vec<MatchMetrics>,
    pub modules: Vec<ModuleRecord>,
    pub groups: Vec<ModuleGroup>,
}

#[derive(Default)]
struct GraphEvaluation {
    metrics: Vec<MatchMetrics>,
    modules: Vec<(ModuleRecord, FloorplanGraph)>,
}

pub struct Engine {
    config: Config,
    graphs: GraphStore,
    modules: ModuleStore,
    miner: Option<Box<dyn FrequentSubgraphMiner>>,
    pool: Option<rayon::ThreadPool>,
}

impl Engine {
    /// Opens the stores named by `config.store`.
    pub fn new(config: Config) -> Result<Self> {
        let graphs = GraphStore::open(&config.store.graph_dir)?;
        let modules = ModuleStore::open(&config.store.module_dir)?;
        let workers = config.store.worker_count();
        let pool = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                tracing::warn!(workers, error = %e, "Falling back to the global thread pool");
                None
            }
        };
        Ok(Self {
            config,
            graphs,
            modules,
            miner: None,
            pool,
        })
    }

    /// Replaces the built-in miner.
    pub fn with_miner(mut self, miner: Box<dyn FrequentSubgraphMiner>) -> Self {
        self.miner = Some(miner);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn graph_store(&self) -> &GraphStore {
        &self.graphs
    }

    pub fn module_store(&self) -> &ModuleStore {
        &self.modules
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn output_path(&self, name: &str) -> PathBuf {
        self.config.store.output_dir.join(name)
    }

    /// Wall segments of a floor, each with its wall type.
    pub fn extract_and_classify(&self, floor: &Floor) -> (Vec<WallSegment>, ClassificationReport) {
        let mut segments = GeometryExtractor::new(&self.config.extraction).extract(floor);
        let report = WallTypeClassifier::new(floor, self.config.extraction.shaft_clearance)
            .classify(&mut segments);
        tracing::debug!(
            floor = %floor.id,
            rooms = floor.rooms.len(),
            segments = segments.len(),
            by_rule = ?report.by_rule,
            "Classified floor"
        );
        (segments, report)
    }

    /// Apartment graph, or the whole-floor overlay when `apartment` is `None`.
    pub fn build_graph(
        &self,
        floor: &Floor,
        segments: &[WallSegment],
        apartment: Option<&ApartmentId>,
    ) -> FloorplanGraph {
        let builder = GraphBuilder::new(floor, segments, &self.config.apartment_graph);
        match apartment {
            Some(apartment) => builder.apartment(apartment),
            None => builder.floor_overlay(),
        }
    }

    /// Panel/space document of a floor.
    pub fn export_floor(&self, floor: &Floor) -> PanelDocument {
        let (segments, _) = self.extract_and_classify(floor);
        PanelDocument::from_floor(floor, &segments, &self.config.export)
    }

    pub fn store_graph(&self, graph_id: &str, graph: &FloorplanGraph) -> Result<()> {
        Ok(self.graphs.store(graph_id, graph)?)
    }

    pub fn load_graph(&self, graph_id: &str) -> Result<FloorplanGraph> {
        Ok(self.graphs.load(graph_id)?)
    }

    pub fn list_graph_ids(&self) -> Result<Vec<String>> {
        Ok(self.graphs.list_ids()?)
    }

    fn ingest_floor(&self, floor: &Floor) -> Vec<(String, Result<()>)> {
        let (segments, _) = self.extract_and_classify(floor);
        floor
            .apartment_ids()
            .iter()
            .map(|apartment| {
                let id = graph_id(floor, apartment);
                let graph = self.build_graph(floor, &segments, Some(apartment));
                let stored = self.store_graph(&id, &graph);
                (id, stored)
            })
            .collect()
    }

    /// Extracts, classifies, builds and stores one graph per apartment of
    /// every floor. A graph that fails to store is reported, not fatal.
    pub fn ingest(&self, records: &[FloorRecord]) -> IngestSummary {
        let start = Instant::now();
        let floors = floors_from_records(records);
        let results: Vec<(String, Result<()>)> = self.install(|| {
            floors
                .par_iter()
                .flat_map_iter(|floor| self.ingest_floor(floor))
                .collect()
        });

        let mut summary = IngestSummary {
            floors: floors.len(),
            ..Default::default()
        };
        for (id, result) in results {
            match result {
                Ok(()) => summary.stored.push(id),
                Err(e) => {
                    tracing::warn!(graph = %id, error = %e, "Failed to store graph");
                    summary.failures.push((id, e.to_string()));
                }
            }
        }
        tracing::info!(
            floors = summary.floors,
            stored = summary.stored.len(),
            failures = summary.failures.len(),
            time_ms = start.elapsed().as_millis(),
            "Ingest complete"
        );
        summary
    }

    /// Mines the stored corpus, evaluates every match, and replaces the
    /// module store with the accepted modules.
    ///
    /// Nothing is committed when mining itself fails.
    pub fn mine(&self, params: &MiningParams) -> Result<MiningReport> {
        params.validate()?;
        let start = Instant::now();

        let corpus = self
            .graphs
            .load_all()
            .map_err(|e| Error::MiningUnavailable(format!("cannot read graph corpus: {e}")))?;
        if corpus.is_empty() {
            return Err(Error::MiningUnavailable("graph corpus is empty".into()));
        }
        let transactions = Transactions::from_corpus(&corpus);
        if transactions.is_empty() {
            return Err(Error::MiningUnavailable(
                "no graph in the corpus has room adjacencies".into(),
            ));
        }

        let builtin;
        let miner: &dyn FrequentSubgraphMiner = match &self.miner {
            Some(miner) => miner.as_ref(),
            None => {
                builtin = SubgraphEnumerationMiner::new(params.vertex_count.max(2));
                &builtin
            }
        };
        let mined = self.install(|| miner.mine(&transactions, params.min_support)).map_err(|e| match e {
            Error::MiningUnavailable(_) => e,
            other => Error::MiningUnavailable(other.to_string()),
        })?;
        let mine_time = start.elapsed();

        let patterns: Vec<(MinedPattern, Pattern)> = mined
            .into_iter()
            .map(|m| {
                let parsed = Pattern::parse(&m.description);
                (m, parsed)
            })
            .filter(|(_, p)| p.node_count() == params.vertex_count)
            .collect();
        tracing::info!(
            miner = miner.name(),
            transactions = transactions.len(),
            patterns = patterns.len(),
            mine_time_ms = mine_time.as_millis(),
            "Mining complete"
        );

        let filter = SpatialConstraintFilter::new(params);
        let enricher = ModuleEnricher::new(&self.config.enrich);
        let jobs: Vec<(&MinedPattern, &Pattern, &str, &FloorplanGraph)> = patterns
            .iter()
            .flat_map(|(m, p)| corpus.iter().map(move |(gid, g)| (m, p, gid.as_str(), g)))
            .collect();
        let evaluations: Vec<GraphEvaluation> = self.install(|| {
            jobs.par_iter()
                .map(|(m, p, gid, g)| evaluate_graph(&filter, &enricher, m, p, gid, g))
                .collect()
        });

        // single writer from here on
        let mut report = MiningReport {
            patterns: patterns.into_iter().map(|(m, _)| m).collect(),
            ..Default::default()
        };
        let mut accepted = Vec::new();
        for evaluation in evaluations {
            report.metrics.extend(evaluation.metrics);
            accepted.extend(evaluation.modules);
        }

        self.modules.replace_all(&accepted)?;
        transactions.write(&self.output_path(TRANSACTIONS_FILE))?;
        write_atomic(
            &self.output_path(METRICS_FILE),
            &serde_json::to_vec_pretty(&report.metrics)?,
        )?;

        report.modules = accepted.into_iter().map(|(record, _)| record).collect();
        report.groups = group_records(&report.modules);
        tracing::info!(
            patterns = report.patterns.len(),
            evaluated = report.metrics.len(),
            accepted = report.modules.len(),
            groups = report.groups.len(),
            time_ms = start.elapsed().as_millis(),
            "Module extraction complete"
        );
        Ok(report)
    }

    /// Stored modules grouped by signature.
    pub fn group_modules(&self) -> Result<Vec<ModuleGroup>> {
        let start = Instant::now();
        let groups = self.modules.group(&ModuleEnricher::new(&self.config.enrich))?;
        tracing::info!(
            groups = groups.len(),
            modules = groups.iter().map(ModuleGroup::size).sum::<usize>(),
            time_ms = start.elapsed().as_millis(),
            "Grouping complete"
        );
        Ok(groups)
    }

    /// Room-type combinations of the stored matches of `pattern`.
    pub fn query_combos(&self, pattern: &str, gids: Option<&[String]>) -> Result<Vec<ComboCount>> {
        self.modules.combos(pattern, gids)
    }
}

fn evaluate_graph(
    filter: &SpatialConstraintFilter,
    enricher: &ModuleEnricher<'_>,
    mined: &MinedPattern,
    pattern: &Pattern,
    gid: &str,
    graph: &FloorplanGraph,
) -> GraphEvaluation {
    let mut out = GraphEvaluation::default();
    for m in find_matches(graph, pattern) {
        let rooms: Vec<_> = m
            .rooms
            .iter()
            .filter_map(|k| graph.node(*k)?.data.as_room())
            .collect();
        let polygons: Vec<Polygon> = rooms.iter().map(|r| Polygon::from(&r.polygon)).collect();

        let check = match filter.evaluate(&polygons) {
            Ok(check) => check,
            Err(e) => {
                tracing::debug!(graph = %gid, error = %e, "Discarding match");
                continue;
            }
        };
        out.metrics.push(MatchMetrics {
            gid: gid.to_string(),
            pattern: mined.description.clone(),
            support: mined.support,
            ratio: check.ratio,
            width: check.width,
            violation: check.violation,
        });
        if !check.accepted {
            tracing::debug!(
                graph = %gid,
                ratio = check.ratio,
                width = check.width,
                nested_only = check.nested_only,
                "Match rejected"
            );
            continue;
        }

        let module = match enricher.enrich(graph, &m.rooms) {
            Ok(module) => module,
            Err(e) => {
                tracing::warn!(graph = %gid, error = %e, "Failed to enrich match");
                continue;
            }
        };
        let mut combo: Vec<String> = rooms.iter().map(|r| r.room_type.as_str().to_string()).collect();
        combo.sort();
        let record = ModuleRecord {
            pattern: mined.description.clone(),
            gid: gid.to_string(),
            support: mined.support,
            rooms: module.rooms,
            combo,
            file: ModuleStore::file_name(gid),
            hash: module.signature,
        };
        out.modules.push((record, module.graph));
    }
    out
}

/// Groups records by their stored signature, largest groups first.
fn group_records(records: &[ModuleRecord]) -> Vec<ModuleGroup> {
    let mut groups: std::collections::BTreeMap<&str, Vec<String>> = Default::default();
    for r in records {
        groups.entry(r.hash.as_str()).or_default().push(r.file.clone());
    }
    let mut groups: Vec<ModuleGroup> = groups
        .into_iter()
        .map(|(hash, files)| ModuleGroup {
            hash: hash.to_string(),
            files,
        })
        .collect();
    groups.sort_by(|a, b| b.size().cmp(&a.size()).then_with(|| a.hash.cmp(&b.hash)));
    groups
}
