// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extraction, classification and graph building on small floors.

use approx::assert_relative_eq;

use floorplan_core::{
    ApartmentId, Config, ExtractionConfig, Floor, Line2D, Point2D, Polygon2D, Room, RoomId,
    RoomType, Structure, WallType,
};
use floorplan_geometry::Segment;
use floorplan_graph::{room_node_id, segment_node_id, EdgeKind};
use floorplan_processing::{Engine, GeometryExtractor, WallTypeClassifier};

fn room(id: u32, room_type: RoomType, apartment: &str, rect: (f64, f64, f64, f64)) -> Room {
    Room {
        id: RoomId(id),
        polygon: Polygon2D::rectangle(rect.0, rect.1, rect.2, rect.3),
        room_type,
        apartment: ApartmentId::parse(apartment),
    }
}

fn wall(rect: (f64, f64, f64, f64)) -> Structure {
    Structure::Polygon(Polygon2D::rectangle(rect.0, rect.1, rect.2, rect.3))
}

fn engine(dir: &tempfile::TempDir) -> Engine {
    let mut config = Config::default();
    config.store.graph_dir = dir.path().join("graphs");
    config.store.module_dir = dir.path().join("modules");
    config.store.output_dir = dir.path().join("output");
    config.store.workers = 2;
    Engine::new(config).unwrap()
}

/// Apartment A (bathroom, bedroom) above apartment B (kitchen), one
/// horizontal partition and one vertical partition between A's rooms.
fn two_apartments() -> Floor {
    let mut floor = Floor::new("F1");
    floor.rooms = vec![
        room(1, RoomType::Bathroom, "A", (0.0, 0.1, 4.0, 3.0)),
        room(2, RoomType::Bedroom, "A", (4.2, 0.1, 8.0, 3.0)),
        room(3, RoomType::Kitchen, "B", (0.0, -3.0, 8.0, -0.1)),
    ];
    floor.structures = vec![wall((0.0, -0.1, 8.0, 0.1)), wall((4.0, 0.1, 4.2, 3.0))];
    floor
}

#[test]
fn duplicated_wall_becomes_a_chain() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);

    let mut floor = Floor::new("F1");
    floor.rooms = vec![
        room(1, RoomType::Bathroom, "A", (0.0, 0.1, 5.0, 3.0)),
        room(2, RoomType::Kitchen, "A", (0.0, -3.0, 5.0, -0.1)),
    ];
    floor.structures = vec![wall((0.0, -0.1, 5.0, 0.1)), wall((0.0, -0.1, 5.0, 0.1))];

    let (segments, report) = engine.extract_and_classify(&floor);
    assert_eq!(segments.len(), 2);
    assert!(segments.iter().all(|s| s.wall_type() == Some(WallType::T4)));
    assert_eq!(report.count("bath_dry_room"), 2);

    let apartment = ApartmentId::parse("A").unwrap();
    let graph = engine.build_graph(&floor, &segments, Some(&apartment));
    let key = |id: String| graph.key(&id).unwrap();
    let (bath, kitchen) = (key(room_node_id(RoomId(1))), key(room_node_id(RoomId(2))));
    let (s1, s2) = (key(segment_node_id(1)), key(segment_node_id(2)));

    assert_eq!(graph.edge_between(s1, s2).map(|e| e.kind), Some(EdgeKind::Identical));
    assert_eq!(graph.edge_between(bath, s1).map(|e| e.kind), Some(EdgeKind::RoomSegment));
    assert_eq!(graph.edge_between(s2, kitchen).map(|e| e.kind), Some(EdgeKind::RoomSegment));
    assert!(!graph.has_edge(bath, s2));
    assert!(!graph.has_edge(kitchen, s1));

    // running the transform again changes nothing
    let mut again = graph.clone();
    assert_eq!(again.simplify_identical_chains(), 0);
    assert_eq!(again.edge_list(), graph.edge_list());
}

#[test]
fn isolated_segment_is_exterior_unless_near_a_shaft() {
    let mut floor = Floor::new("F1");
    floor.structures = vec![wall((0.0, -0.1, 5.0, 0.1))];
    let config = ExtractionConfig::default();

    let mut segments = GeometryExtractor::new(&config).extract(&floor);
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].rooms, (None, None));
    WallTypeClassifier::new(&floor, config.shaft_clearance).classify(&mut segments);
    assert_eq!(segments[0].wall_type(), Some(WallType::T2b));

    floor.shafts = vec![Polygon2D::rectangle(2.0, 0.1, 3.0, 1.0)];
    let mut segments = GeometryExtractor::new(&config).extract(&floor);
    WallTypeClassifier::new(&floor, config.shaft_clearance).classify(&mut segments);
    assert_eq!(segments[0].wall_type(), Some(WallType::T2a));
}

#[test]
fn stair_rule_wins_over_later_rules() {
    let mut floor = Floor::new("F1");
    floor.rooms = vec![
        room(1, RoomType::Stair, "A", (0.0, 0.1, 5.0, 3.0)),
        room(2, RoomType::Storeroom, "A", (0.0, -3.0, 5.0, -0.1)),
        room(3, RoomType::Stair, "", (10.0, 0.1, 15.0, 3.0)),
        room(4, RoomType::Bedroom, "B", (10.0, -3.0, 15.0, -0.1)),
    ];
    floor.structures = vec![wall((0.0, -0.1, 5.0, 0.1)), wall((10.0, -0.1, 15.0, 0.1))];
    let config = ExtractionConfig::default();
    let mut segments = GeometryExtractor::new(&config).extract(&floor);
    assert_eq!(segments.len(), 2);

    let report = WallTypeClassifier::new(&floor, config.shaft_clearance).classify(&mut segments);
    // same apartment (default rule) and different apartments (division rule)
    // both lose to the stair rule
    assert!(segments.iter().all(|s| s.wall_type() == Some(WallType::T1)));
    assert_eq!(report.count("stair"), 2);
    assert_eq!(report.total(), 2);
}

#[test]
fn splitting_conserves_length() {
    let config = ExtractionConfig::default();
    let extractor = GeometryExtractor::new(&config);
    let line = |len: f64| {
        Segment::from_line(&Line2D::new(Point2D::new(0.0, 0.0), Point2D::new(len, 0.0)))
            .extend(config.extension)
    };

    for len in [3.0, 0.05] {
        let extended = line(len);
        let (kept, discarded) = extractor.split(&extended, &[]);
        let total: f64 = kept.iter().map(Segment::length).sum::<f64>() + discarded;
        assert_relative_eq!(total, extended.length(), epsilon = 1e-9);
    }
    // the short line is entirely below the minimum length
    assert!(extractor.split(&line(0.05), &[]).0.is_empty());
}

#[test]
fn every_segment_is_typed_and_attached() {
    let floor = two_apartments();
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);

    let (segments, report) = engine.extract_and_classify(&floor);
    assert_eq!(segments.len(), 3);
    assert_eq!(report.total(), 3);
    assert!(segments.iter().all(|s| s.wall_type().is_some()));
    assert_eq!(
        segments.iter().filter(|s| s.wall_type() == Some(WallType::T3)).count(),
        2
    );
    assert_eq!(
        segments.iter().filter(|s| s.wall_type() == Some(WallType::T4)).count(),
        1
    );

    let overlay = engine.build_graph(&floor, &segments, None);
    for segment in &segments {
        let s = overlay.key(&segment_node_id(segment.id)).unwrap();
        for r in segment.adjacent_rooms() {
            let room = overlay.key(&room_node_id(r)).unwrap();
            assert_eq!(
                overlay.edge_between(room, s).map(|e| e.kind),
                Some(EdgeKind::RoomSegment),
                "room {r} and segment {}",
                segment.id
            );
        }
    }
}

#[test]
fn stored_graph_round_trips() {
    let floor = two_apartments();
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);

    let (segments, _) = engine.extract_and_classify(&floor);
    let apartment = ApartmentId::parse("A").unwrap();
    let graph = engine.build_graph(&floor, &segments, Some(&apartment));
    assert!(graph.key("apartment_A").is_some());

    engine.store_graph("F1_A", &graph).unwrap();
    assert_eq!(engine.list_graph_ids().unwrap(), vec!["F1_A"]);
    let loaded = engine.load_graph("F1_A").unwrap();
    assert_eq!(loaded, graph);
    assert_eq!(loaded.edge_list(), graph.edge_list());
    assert!(engine.load_graph("F1_B").is_err());
}
