// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mining, filtering and module bookkeeping through the engine.

use approx::assert_relative_eq;

use floorplan_core::{parse_records, Config, MiningParams, Polygon2D, RoomType};
use floorplan_graph::{EdgeKind, FloorplanGraph, NodeData, RoomNode};
use floorplan_processing::mining::{normalize_dfs, Transactions};
use floorplan_processing::{
    Engine, Error, FrequentSubgraphMiner, MinedPattern, Result, METRICS_FILE, TRANSACTIONS_FILE,
};

const BATH_BED: &str = "v 0 bathroom v 1 bedroom e 0 1 1";

fn engine(dir: &tempfile::TempDir) -> Engine {
    let mut config = Config::default();
    config.store.graph_dir = dir.path().join("graphs");
    config.store.module_dir = dir.path().join("modules");
    config.store.output_dir = dir.path().join("output");
    config.store.workers = 2;
    Engine::new(config).unwrap()
}

fn params(min_support: usize, max_width: f64) -> MiningParams {
    MiningParams {
        min_support,
        max_width,
        ratio_threshold: 0.3,
        vertex_count: 2,
    }
}

fn room(room_type: RoomType, rect: (f64, f64, f64, f64)) -> NodeData {
    NodeData::Room(RoomNode {
        room_type,
        apartment: None,
        polygon: Polygon2D::rectangle(rect.0, rect.1, rect.2, rect.3),
        matched: false,
    })
}

/// Two adjacent rooms joined by a room-room edge.
fn pair(a: (RoomType, (f64, f64, f64, f64)), b: (RoomType, (f64, f64, f64, f64))) -> FloorplanGraph {
    let mut g = FloorplanGraph::new();
    let ka = g.add_node("room_1", room(a.0, a.1));
    let kb = g.add_node("room_2", room(b.0, b.1));
    g.add_weighted_edge(ka, kb, EdgeKind::RoomRoom, 3.0);
    g
}

fn bath_bed() -> FloorplanGraph {
    pair(
        (RoomType::Bathroom, (0.0, 0.0, 2.0, 3.0)),
        (RoomType::Bedroom, (2.0, 0.0, 5.0, 3.0)),
    )
}

fn kitchen_living() -> FloorplanGraph {
    pair(
        (RoomType::Kitchen, (0.0, 0.0, 3.0, 3.0)),
        (RoomType::Livingroom, (3.0, 0.0, 7.0, 3.0)),
    )
}

fn store_corpus(engine: &Engine, with_pattern: usize, total: usize) {
    for i in 0..total {
        let g = if i < with_pattern {
            bath_bed()
        } else {
            kitchen_living()
        };
        engine.store_graph(&format!("f{i}_A"), &g).unwrap();
    }
}

fn support_of(patterns: &[MinedPattern], description: &str) -> Option<usize> {
    let wanted = normalize_dfs(description);
    patterns
        .iter()
        .find(|p| normalize_dfs(&p.description) == wanted)
        .map(|p| p.support)
}

#[test]
fn pattern_needs_minimum_support() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);
    store_corpus(&engine, 3, 10);

    let report = engine.mine(&params(3, 4.0)).unwrap();
    assert_eq!(support_of(&report.patterns, BATH_BED), Some(3));
    assert_eq!(
        support_of(&report.patterns, "v 0 kitchen v 1 livingroom e 0 1 1"),
        Some(7)
    );
    // one accepted module per bathroom/bedroom graph
    let bath_modules: Vec<_> = report
        .modules
        .iter()
        .filter(|m| normalize_dfs(&m.pattern) == normalize_dfs(BATH_BED))
        .collect();
    assert_eq!(bath_modules.len(), 3);
    assert!(bath_modules.iter().all(|m| m.support == 3));
    assert!(dir.path().join("output").join(TRANSACTIONS_FILE).exists());

    let dir = tempfile::tempdir().unwrap();
    let engine = self::engine(&dir);
    store_corpus(&engine, 2, 10);
    let report = engine.mine(&params(3, 4.0)).unwrap();
    assert_eq!(support_of(&report.patterns, BATH_BED), None);
}

#[test]
fn l_shaped_match_is_recorded_but_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);
    let g = pair(
        (RoomType::Bathroom, (0.0, 0.0, 2.0, 1.0)),
        (RoomType::Bedroom, (0.0, 1.0, 1.0, 2.0)),
    );
    engine.store_graph("f1_A", &g).unwrap();

    let report = engine.mine(&params(1, 5.0)).unwrap();
    assert_eq!(report.metrics.len(), 1);
    let row = &report.metrics[0];
    assert_eq!(row.gid, "f1_A");
    assert_eq!(row.support, 1);
    assert_relative_eq!(row.ratio, 0.5, epsilon = 1e-9);
    assert_relative_eq!(row.violation, 0.2, epsilon = 1e-9);
    assert!(report.modules.is_empty());
    assert!(report.groups.is_empty());

    let metrics = std::fs::read(dir.path().join("output").join(METRICS_FILE)).unwrap();
    let rows: serde_json::Value = serde_json::from_slice(&metrics).unwrap();
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert!(engine.module_store().records().unwrap().is_empty());
}

#[test]
fn empty_corpus_cannot_be_mined() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);
    assert!(matches!(
        engine.mine(&params(1, 5.0)),
        Err(Error::MiningUnavailable(_))
    ));

    let mut bad = params(1, 5.0);
    bad.min_support = 0;
    assert!(engine.mine(&bad).is_err());
}

fn row(apartment: &str, entity: &str, subtype: &str, roomtype: &str, rect: (f64, f64, f64, f64)) -> String {
    let (x0, y0, x1, y1) = rect;
    format!(
        r#"{{"floor_id":1,"apartment_id":"{apartment}","entity_type":"{entity}","entity_subtype":"{subtype}","roomtype":"{roomtype}","geom":"POLYGON (({x0} {y0}, {x1} {y0}, {x1} {y1}, {x0} {y1}, {x0} {y0}))"}}"#
    )
}

#[test]
fn records_to_grouped_modules() {
    let lines = [
        row("A", "area", "ROOM", "Bathroom", (0.0, 0.1, 4.0, 3.0)),
        row("A", "area", "ROOM", "Bedroom", (4.2, 0.1, 8.0, 3.0)),
        row("B", "area", "ROOM", "Kitchen", (0.0, -3.0, 8.0, -0.1)),
        row("nan", "separator", "WALL", "Structure", (0.0, -0.1, 8.0, 0.1)),
        row("nan", "separator", "WALL", "Structure", (4.0, 0.1, 4.2, 3.0)),
    ];
    let records = parse_records(&lines.join("\n")).unwrap();
    assert_eq!(records.len(), 5);

    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);
    let summary = engine.ingest(&records);
    assert_eq!(summary.floors, 1);
    assert!(summary.failures.is_empty());
    let mut stored = summary.stored.clone();
    stored.sort();
    assert_eq!(stored, vec!["1_A", "1_B"]);
    assert_eq!(engine.list_graph_ids().unwrap(), vec!["1_A", "1_B"]);

    let report = engine.mine(&params(1, 4.0)).unwrap();
    assert_eq!(support_of(&report.patterns, BATH_BED), Some(1));
    assert_eq!(report.modules.len(), 1);
    let module = &report.modules[0];
    assert_eq!(module.gid, "1_A");
    assert_eq!(module.combo_label(), "Bathroom+Bedroom");
    assert!(module.file.starts_with("1_A_"));

    let groups = engine.group_modules().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files, vec![module.file.clone()]);
    assert_eq!(groups[0].hash, module.hash);

    let combos = engine.query_combos(BATH_BED, None).unwrap();
    assert_eq!(combos.len(), 1);
    assert_eq!(combos[0].combo, vec!["Bathroom", "Bedroom"]);
    assert_eq!(combos[0].count, 1);
}

/// Returns one fixed pattern regardless of the transactions.
struct FixedMiner(&'static str);

impl FrequentSubgraphMiner for FixedMiner {
    fn name(&self) -> &str {
        "fixed"
    }

    fn mine(&self, transactions: &Transactions, _min_support: usize) -> Result<Vec<MinedPattern>> {
        Ok(vec![MinedPattern {
            description: self.0.to_string(),
            support: transactions.len(),
        }])
    }
}

struct FailingMiner;

impl FrequentSubgraphMiner for FailingMiner {
    fn name(&self) -> &str {
        "failing"
    }

    fn mine(&self, _transactions: &Transactions, _min_support: usize) -> Result<Vec<MinedPattern>> {
        Err(Error::NotFound("miner binary".into()))
    }
}

#[test]
fn failed_mining_leaves_modules_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir).with_miner(Box::new(FixedMiner(BATH_BED)));
    store_corpus(&engine, 2, 2);

    let report = engine.mine(&params(1, 4.0)).unwrap();
    assert_eq!(report.patterns.len(), 1);
    assert_eq!(report.modules.len(), 2);
    // both graphs are identical modules
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].size(), 2);

    let transactions_path = dir.path().join("output").join(TRANSACTIONS_FILE);
    let transactions = std::fs::read_to_string(&transactions_path).unwrap();
    // two transactions and the terminator
    assert_eq!(transactions.matches("t #").count(), 3);

    let failing = self::engine(&dir).with_miner(Box::new(FailingMiner));
    failing.store_graph("f9_A", &kitchen_living()).unwrap();
    assert!(matches!(
        failing.mine(&params(1, 4.0)),
        Err(Error::MiningUnavailable(_))
    ));
    assert_eq!(failing.module_store().records().unwrap().len(), 2);
    assert_eq!(std::fs::read_to_string(&transactions_path).unwrap(), transactions);
}
