// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module enrichment.
//!
//! An accepted match is cut out of its apartment graph together with its
//! direct neighbours. Every room boundary edge becomes a segment node typed
//! `wall` or `opening`. The boundary pieces of the matched rooms hash into a
//! signature shared by structurally identical modules.

use std::f64::consts::{FRAC_PI_2, PI};

use rustc_hash::FxHashSet;

use floorplan_core::{EnrichConfig, SegmentType};
use floorplan_geometry::{union_polygons, Point2, Polygon, Segment};
use floorplan_graph::{wl_hash, EdgeKind, FloorplanGraph, NodeData, NodeKey, NodeKind, SegmentNode};

use crate::error::{Error, Result};

/// Rooms smaller than this are not cut into boundary segments.
const MIN_ROOM_AREA: f64 = 1e-6;

/// Endpoint rounding used to detect shared corners (8 decimal places).
const ENDPOINT_SCALE: f64 = 1e8;

/// An enriched match.
#[derive(Debug, Clone)]
pub struct EnrichedModule {
    pub graph: FloorplanGraph,
    /// Ids of the matched room nodes
    pub rooms: Vec<String>,
    pub signature: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ModuleEnricher<'a> {
    config: &'a EnrichConfig,
}

impl<'a> ModuleEnricher<'a> {
    pub fn new(config: &'a EnrichConfig) -> Self {
        Self { config }
    }

    /// Enriches the match formed by `rooms` inside `graph`.
    pub fn enrich(&self, graph: &FloorplanGraph, rooms: &[NodeKey]) -> Result<EnrichedModule> {
        let mut keep: FxHashSet<NodeKey> = FxHashSet::default();
        let mut ids = Vec::with_capacity(rooms.len());
        for &room in rooms {
            let node = graph
                .node(room)
                .filter(|n| n.kind() == NodeKind::Room)
                .ok_or_else(|| Error::MatchEvaluation("match refers to a missing room".into()))?;
            ids.push(node.id.clone());
            keep.insert(room);
            keep.extend(graph.neighbors(room));
        }

        let mut module = graph.induced_subgraph(&keep);
        let segments = self.add_boundary_segments(&mut module);
        let (adjacent, double) = self.link_wall_segments(&mut module, &segments);

        for id in &ids {
            if let Some(key) = module.key(id) {
                module.mark_matched(key);
            }
        }
        let signature = self.signature(&module);

        tracing::debug!(
            rooms = ids.len(),
            segments = segments.len(),
            adjacent,
            double,
            signature = %&signature[..12.min(signature.len())],
            "Enriched module"
        );
        Ok(EnrichedModule {
            graph: module,
            rooms: ids,
            signature,
        })
    }

    /// Adds `{room}_seg_{i}` nodes for every outer edge of every room in the
    /// graph. Returns the new segment keys.
    fn add_boundary_segments(&self, graph: &mut FloorplanGraph) -> Vec<NodeKey> {
        let mut pending: Vec<(NodeKey, String, Segment, SegmentType)> = Vec::new();
        for room in graph.keys_of(NodeKind::Room) {
            let Some(node) = graph.node(room) else {
                continue;
            };
            let Some(data) = node.data.as_room() else {
                continue;
            };
            let polygon = Polygon::from(&data.polygon);
            if !polygon.is_valid() || polygon.area() < MIN_ROOM_AREA {
                tracing::warn!(room = %node.id, "Skipping degenerate room boundary");
                continue;
            }

            let footprints: Vec<Polygon> = graph
                .neighbors_via(room, EdgeKind::RoomWall)
                .filter_map(|w| graph.node(w)?.data.as_wall()?.footprint.as_ref().map(Polygon::from))
                .collect();
            let walls = union_polygons(&footprints);

            for (i, edge) in polygon.outer_edges().into_iter().enumerate() {
                let kind = self.segment_type(&edge, &walls);
                pending.push((room, format!("{}_seg_{i}", node.id), edge, kind));
            }
        }

        let mut created = Vec::with_capacity(pending.len());
        for (room, id, edge, kind) in pending {
            if graph.key(&id).is_some() {
                continue;
            }
            let key = graph.add_node(
                id,
                NodeData::Segment(SegmentNode {
                    line: edge.to_line(),
                    width: 0.0,
                    wall_type: None,
                    segment_type: Some(kind),
                }),
            );
            graph.add_edge(room, key, EdgeKind::RoomSegment);
            created.push(key);
        }
        created
    }

    /// Classifies one boundary edge by sampling both sides of it against
    /// the room's wall footprints.
    pub fn segment_type(&self, edge: &Segment, walls: &[Polygon]) -> SegmentType {
        if edge.length() <= self.config.min_open_length {
            return SegmentType::Wall;
        }
        let Some(normal) = edge.normal() else {
            return SegmentType::Wall;
        };
        let d = self.config.sample_distance();
        let inside = self
            .config
            .sample_positions
            .iter()
            .flat_map(|&t| {
                let p = edge.point_at(t);
                [p + normal * d, p - normal * d]
            })
            .filter(|p| walls.iter().any(|w| w.contains(p)))
            .count();
        if inside <= 1 {
            SegmentType::Opening
        } else {
            SegmentType::Wall
        }
    }

    /// Links wall-typed segments: `adjacent` on a shared corner, otherwise
    /// `double_segment` when they face each other across a wall.
    fn link_wall_segments(&self, graph: &mut FloorplanGraph, segments: &[NodeKey]) -> (usize, usize) {
        let walls: Vec<(NodeKey, Segment)> = segments
            .iter()
            .filter_map(|&k| {
                let s = graph.node(k)?.data.as_segment()?;
                (s.segment_type == Some(SegmentType::Wall)).then(|| (k, Segment::from_line(&s.line)))
            })
            .collect();

        let mut adjacent = 0;
        let mut double = 0;
        for (i, (ka, a)) in walls.iter().enumerate() {
            for (kb, b) in &walls[i + 1..] {
                if shares_endpoint(a, b) {
                    graph.add_edge(*ka, *kb, EdgeKind::Adjacent);
                    adjacent += 1;
                } else if self.is_double(a, b) {
                    graph.add_edge(*ka, *kb, EdgeKind::DoubleSegment);
                    double += 1;
                }
            }
        }
        (adjacent, double)
    }

    /// True when `b` runs near-parallel to `a` within the distance threshold
    /// and covers enough of the shorter piece.
    pub fn is_double(&self, a: &Segment, b: &Segment) -> bool {
        let diff = ((a.angle() - b.angle() + FRAC_PI_2).rem_euclid(PI) - FRAC_PI_2).abs();
        if diff > self.config.double_angle_deg.to_radians() {
            return false;
        }
        if a.distance_to_segment(b) > self.config.double_distance {
            return false;
        }

        let len_a = a.length();
        let shorter = len_a.min(b.length());
        if len_a <= 0.0 || shorter <= 0.0 {
            return false;
        }
        let ta = a.project(&b.start) * len_a;
        let tb = a.project(&b.end) * len_a;
        let overlap = (ta.max(tb).min(len_a) - ta.min(tb).max(0.0)).max(0.0);
        overlap / shorter >= self.config.double_overlap_ratio
    }

    /// Signature of the boundary segments of the matched rooms, keyed on
    /// their wall/opening type and linked by `adjacent`/`double_segment`.
    pub fn signature(&self, graph: &FloorplanGraph) -> String {
        let boundary: FxHashSet<&str> = graph
            .nodes()
            .filter(|(_, n)| n.data.as_room().is_some_and(|r| r.matched))
            .flat_map(|(k, _)| graph.neighbors_via(k, EdgeKind::RoomSegment))
            .filter_map(|k| graph.node(k))
            .filter(|n| n.data.as_segment().is_some_and(|s| s.segment_type.is_some()))
            .map(|n| n.id.as_str())
            .collect();

        let (labeled, _) = graph.project(
            |node| {
                if !boundary.contains(node.id.as_str()) {
                    return None;
                }
                node.data
                    .as_segment()
                    .and_then(|s| s.segment_type)
                    .map(|t| t.as_str().to_string())
            },
            |edge| {
                matches!(edge.kind, EdgeKind::Adjacent | EdgeKind::DoubleSegment)
                    .then(|| edge.kind.as_str().to_string())
            },
        );
        wl_hash(&labeled, self.config.signature_iterations)
    }
}

fn rounded(p: &Point2<f64>) -> (i64, i64) {
    ((p.x * ENDPOINT_SCALE).round() as i64, (p.y * ENDPOINT_SCALE).round() as i64)
}

fn shares_endpoint(a: &Segment, b: &Segment) -> bool {
    let ends = [rounded(&b.start), rounded(&b.end)];
    ends.contains(&rounded(&a.start)) || ends.contains(&rounded(&a.end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_core::{Line2D, Point2D, Polygon2D, RoomType};
    use floorplan_graph::{RoomNode, WallNode};

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment::from_line(&Line2D::new(Point2D::new(x0, y0), Point2D::new(x1, y1)))
    }

    fn room(graph: &mut FloorplanGraph, id: &str, rect: (f64, f64, f64, f64)) -> NodeKey {
        graph.add_node(
            id,
            NodeData::Room(RoomNode {
                room_type: RoomType::Bedroom,
                apartment: None,
                polygon: Polygon2D::rectangle(rect.0, rect.1, rect.2, rect.3),
                matched: false,
            }),
        )
    }

    fn wall(graph: &mut FloorplanGraph, id: &str, rect: (f64, f64, f64, f64)) -> NodeKey {
        graph.add_node(
            id,
            NodeData::Wall(WallNode {
                footprint: Some(Polygon2D::rectangle(rect.0, rect.1, rect.2, rect.3)),
                thickness: 0.2,
                ..Default::default()
            }),
        )
    }

    /// Two rooms on either side of a 0.2 partition.
    fn pair(a_id: &str, b_id: &str, dx: f64) -> (FloorplanGraph, Vec<NodeKey>) {
        let mut g = FloorplanGraph::new();
        let a = room(&mut g, a_id, (dx, 0.0, dx + 2.0, 3.0));
        let b = room(&mut g, b_id, (dx + 2.2, 0.0, dx + 4.0, 3.0));
        let w = wall(&mut g, "wall_0", (dx + 2.0, 0.0, dx + 2.2, 3.0));
        g.add_weighted_edge(a, b, EdgeKind::RoomRoom, 3.0);
        g.add_weighted_edge(a, w, EdgeKind::RoomWall, 3.0);
        g.add_weighted_edge(b, w, EdgeKind::RoomWall, 3.0);
        (g, vec![a, b])
    }

    fn segment_type_of(graph: &FloorplanGraph, id: &str) -> Option<SegmentType> {
        graph.node_by_id(id)?.data.as_segment()?.segment_type
    }

    #[test]
    fn walls_and_openings_from_sampling() {
        let config = EnrichConfig::default();
        let enricher = ModuleEnricher::new(&config);
        let strip = Polygon::from(&Polygon2D::rectangle(0.0, -0.1, 4.0, 0.1));

        let along = seg(0.0, 0.0, 4.0, 0.0);
        assert_eq!(enricher.segment_type(&along, std::slice::from_ref(&strip)), SegmentType::Wall);

        let across = seg(4.0, 0.0, 4.0, 3.0);
        assert_eq!(enricher.segment_type(&across, std::slice::from_ref(&strip)), SegmentType::Opening);
        // no walls at all
        assert_eq!(enricher.segment_type(&along, &[]), SegmentType::Opening);

        let short = seg(0.0, 5.0, 0.8, 5.0);
        assert_eq!(enricher.segment_type(&short, &[]), SegmentType::Wall);
    }

    #[test]
    fn double_segment_thresholds() {
        let config = EnrichConfig::default();
        let enricher = ModuleEnricher::new(&config);
        let a = seg(0.0, 0.0, 3.0, 0.0);
        // reversed direction still counts as parallel
        assert!(enricher.is_double(&a, &seg(2.5, 0.3, 1.0, 0.3)));
        assert!(!enricher.is_double(&a, &seg(0.0, 0.5, 3.0, 0.5)));
        assert!(!enricher.is_double(&a, &seg(0.0, 0.3, 3.0, 1.3)));
        // only 0.2 of the shorter piece overlaps
        assert!(!enricher.is_double(&a, &seg(2.8, 0.3, 3.8, 0.3)));
    }

    #[test]
    fn enrich_marks_rooms_and_links_double_segments() {
        let config = EnrichConfig::default();
        let (graph, rooms) = pair("room_1", "room_2", 0.0);
        let module = ModuleEnricher::new(&config).enrich(&graph, &rooms).unwrap();
        let g = &module.graph;

        assert_eq!(module.rooms, vec!["room_1".to_string(), "room_2".to_string()]);
        for id in ["room_1", "room_2"] {
            assert!(g.node_by_id(id).and_then(|n| n.data.as_room()).is_some_and(|r| r.matched));
        }

        // the partition faces are walls, the rest open
        assert_eq!(segment_type_of(g, "room_1_seg_1"), Some(SegmentType::Wall));
        assert_eq!(segment_type_of(g, "room_2_seg_3"), Some(SegmentType::Wall));
        assert_eq!(segment_type_of(g, "room_1_seg_0"), Some(SegmentType::Opening));
        assert_eq!(segment_type_of(g, "room_2_seg_2"), Some(SegmentType::Opening));

        let a = g.key("room_1_seg_1").unwrap();
        let b = g.key("room_2_seg_3").unwrap();
        assert_eq!(g.edge_between(a, b).map(|e| e.kind), Some(EdgeKind::DoubleSegment));
        let room_a = g.key("room_1").unwrap();
        assert_eq!(g.edge_between(room_a, a).map(|e| e.kind), Some(EdgeKind::RoomSegment));
    }

    #[test]
    fn corner_walls_are_adjacent() {
        let config = EnrichConfig::default();
        let mut g = FloorplanGraph::new();
        let r = room(&mut g, "room_1", (0.0, 0.0, 4.0, 3.0));
        let bottom = wall(&mut g, "wall_0", (0.0, -0.1, 4.0, 0.1));
        let left = wall(&mut g, "wall_1", (-0.1, 0.0, 0.1, 3.0));
        g.add_edge(r, bottom, EdgeKind::RoomWall);
        g.add_edge(r, left, EdgeKind::RoomWall);

        let module = ModuleEnricher::new(&config).enrich(&g, &[r]).unwrap();
        let m = &module.graph;
        assert_eq!(segment_type_of(m, "room_1_seg_0"), Some(SegmentType::Wall));
        assert_eq!(segment_type_of(m, "room_1_seg_3"), Some(SegmentType::Wall));
        assert_eq!(segment_type_of(m, "room_1_seg_1"), Some(SegmentType::Opening));

        let a = m.key("room_1_seg_0").unwrap();
        let b = m.key("room_1_seg_3").unwrap();
        assert_eq!(m.edge_between(a, b).map(|e| e.kind), Some(EdgeKind::Adjacent));
    }

    #[test]
    fn signature_ignores_ids_but_not_segment_types() {
        let config = EnrichConfig::default();
        let enricher = ModuleEnricher::new(&config);

        let (g1, r1) = pair("room_1", "room_2", 0.0);
        let (g2, r2) = pair("room_7", "room_9", 10.0);
        let m1 = enricher.enrich(&g1, &r1).unwrap();
        let m2 = enricher.enrich(&g2, &r2).unwrap();
        assert_eq!(m1.signature, m2.signature);
        assert_eq!(enricher.signature(&m1.graph), m1.signature);

        let mut changed = m1.graph.clone();
        let key = changed.key("room_1_seg_0").unwrap();
        if let Some(NodeData::Segment(s)) = changed.node_mut(key).map(|n| &mut n.data) {
            s.segment_type = Some(SegmentType::Wall);
        }
        assert_ne!(enricher.signature(&changed), m1.signature);
    }

    #[test]
    fn non_room_match_is_rejected() {
        let config = EnrichConfig::default();
        let mut g = FloorplanGraph::new();
        let w = wall(&mut g, "wall_0", (0.0, 0.0, 1.0, 1.0));
        assert!(matches!(
            ModuleEnricher::new(&config).enrich(&g, &[w]),
            Err(Error::MatchEvaluation(_))
        ));
    }
}
