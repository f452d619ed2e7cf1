// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Graph construction from a classified floor.
//!
//! [`GraphBuilder`] produces either a whole-floor overlay (every room and
//! segment, with drawing positions, for inspection) or the per-apartment
//! graph that forms the mining corpus. Both share the same node ids, so an
//! apartment graph is recognisably a piece of its floor overlay.

use rustc_hash::FxHashMap;

use floorplan_core::{
    ApartmentGraphConfig, ApartmentId, Floor, Polygon2D, Room, RoomId, Structure, WallSegment,
};
use floorplan_geometry::{
    intersection_area, min_rotated_rect, wall_centerline, Polygon, Segment, ShapeFit, Vector2,
};

use crate::dictionary::MetaValue;
use crate::graph::{FloorplanGraph, NodeData, RoomNode, SegmentNode, WallNode};
use crate::keys::{EdgeKind, NodeKey, NodeKind};

/// Lateral and overlap tolerance for `aligned`, and contact tolerance for
/// touching walls.
pub const ALIGN_TOLERANCE: f64 = 1e-6;

pub fn room_node_id(id: RoomId) -> String {
    format!("room_{id}")
}

pub fn segment_node_id(id: usize) -> String {
    format!("segment_{id}")
}

pub fn wall_node_id(index: usize) -> String {
    format!("wall_{index}")
}

/// Apartment node id; whitespace in the apartment label is dropped.
pub fn apartment_node_id(apartment: &ApartmentId) -> String {
    let compact: String = apartment.as_str().split_whitespace().collect();
    format!("apartment_{compact}")
}

/// True when `b` lies on `a`'s line and their extents overlap by more than
/// the tolerance.
pub fn collinear_overlap(a: &Segment, b: &Segment) -> bool {
    let (Some(u), Some(v)) = (a.direction(), b.direction()) else {
        return false;
    };
    if (u.x * v.y - u.y * v.x).abs() > ALIGN_TOLERANCE {
        return false;
    }
    let n = Vector2::new(-u.y, u.x);
    let off_start = (b.start - a.start).dot(&n);
    let off_end = (b.end - a.start).dot(&n);
    if off_start.abs() > ALIGN_TOLERANCE || off_end.abs() > ALIGN_TOLERANCE {
        return false;
    }
    let s0 = (b.start - a.start).dot(&u);
    let s1 = (b.end - a.start).dot(&u);
    let overlap = s0.max(s1).min(a.length()) - s0.min(s1).max(0.0);
    overlap > ALIGN_TOLERANCE
}

impl FloorplanGraph {
    /// Adds `identical` edges between same-kind line nodes with the same
    /// endpoints, and `aligned` edges between collinear overlapping ones.
    /// Pairs that are already connected are left alone.
    ///
    /// Returns `(identical, aligned)` edge counts.
    pub fn link_identical_and_aligned(&mut self) -> (usize, usize) {
        let lines: Vec<(NodeKey, NodeKind, Segment)> = self
            .nodes()
            .filter_map(|(k, n)| Some((k, n.kind(), Segment::from_line(&n.data.line()?))))
            .collect();

        let (mut identical, mut aligned) = (0, 0);
        for (i, (ka, kind_a, a)) in lines.iter().enumerate() {
            for (kb, kind_b, b) in &lines[i + 1..] {
                if kind_a != kind_b || self.has_edge(*ka, *kb) {
                    continue;
                }
                let same = a.to_line().same_endpoints(&b.to_line());
                if same {
                    self.add_edge(*ka, *kb, EdgeKind::Identical);
                    identical += 1;
                } else if collinear_overlap(a, b) {
                    self.add_edge(*ka, *kb, EdgeKind::Aligned);
                    aligned += 1;
                }
            }
        }
        (identical, aligned)
    }
}

/// Replace a room polygon by its minimum rotated rectangle when it is
/// already nearly rectangular.
pub fn rectify_room(polygon: &Polygon2D, config: &ApartmentGraphConfig) -> Polygon2D {
    let p = Polygon::from(polygon);
    match ShapeFit::of(std::slice::from_ref(&p)) {
        Ok(fit)
            if fit.ratio < config.rectify_max_ratio
                && fit.rect.area() > 0.0
                && p.area() / fit.rect.area() > config.rectify_min_area_ratio =>
        {
            fit.rect.to_polygon().to_record()
        }
        _ => polygon.clone(),
    }
}

/// Length of shared boundary between two rooms: the smaller of the two
/// directed "boundary within `d`" lengths.
pub fn shared_boundary(a: &Polygon, b: &Polygon, d: f64) -> f64 {
    a.boundary_length_near(b, d).min(b.boundary_length_near(a, d))
}

fn touching(a: &Polygon, b: &Polygon) -> bool {
    if intersection_area(a, b) > 0.0 {
        return true;
    }
    a.boundary()
        .iter()
        .any(|e| b.distance_to_segment(e) <= ALIGN_TOLERANCE)
}

/// Builds graphs for one classified floor.
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'a> {
    floor: &'a Floor,
    segments: &'a [WallSegment],
    config: &'a ApartmentGraphConfig,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        floor: &'a Floor,
        segments: &'a [WallSegment],
        config: &'a ApartmentGraphConfig,
    ) -> Self {
        Self {
            floor,
            segments,
            config,
        }
    }

    /// Whole-floor graph: every room, apartment and segment. Room nodes
    /// carry their centroid as `x`/`y` metadata.
    pub fn floor_overlay(&self) -> FloorplanGraph {
        let mut graph = FloorplanGraph::new();
        let mut rooms = FxHashMap::default();
        for room in &self.floor.rooms {
            if let Some(key) = self.add_room(&mut graph, room, room.polygon.clone()) {
                let centroid = graph
                    .node(key)
                    .and_then(|n| n.data.polygon())
                    .map(|p| Polygon::from(p).centroid());
                if let Some(c) = centroid {
                    graph.set_meta(key, "x", MetaValue::Double(c.x));
                    graph.set_meta(key, "y", MetaValue::Double(c.y));
                }
                rooms.insert(room.id, key);
            }
        }
        self.add_segments(&mut graph, &rooms, true);
        self.finish(&mut graph);
        graph.connect_cores_to_apartments();
        tracing::debug!(
            floor = %self.floor.id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built floor overlay"
        );
        graph
    }

    /// Mining graph for one apartment.
    pub fn apartment(&self, apartment: &ApartmentId) -> FloorplanGraph {
        let mut graph = FloorplanGraph::new();
        let mut rooms = FxHashMap::default();
        let mut polygons: Vec<(NodeKey, Polygon)> = Vec::new();

        for room in self.floor.rooms_of(apartment) {
            let polygon = if self.config.rectify_rooms {
                rectify_room(&room.polygon, self.config)
            } else {
                room.polygon.clone()
            };
            if let Some(key) = self.add_room(&mut graph, room, polygon.clone()) {
                rooms.insert(room.id, key);
                polygons.push((key, Polygon::from(&polygon)));
            }
        }

        let d = self.config.proximity;
        let min_shared = self.config.min_shared_length;
        for (i, (ka, pa)) in polygons.iter().enumerate() {
            for (kb, pb) in &polygons[i + 1..] {
                let shared = shared_boundary(pa, pb, d);
                if shared >= min_shared {
                    graph.add_weighted_edge(*ka, *kb, EdgeKind::RoomRoom, shared);
                }
            }
        }

        self.add_walls(&mut graph, &polygons);
        self.add_segments(&mut graph, &rooms, false);
        self.finish(&mut graph);
        tracing::debug!(
            floor = %self.floor.id,
            apartment = %apartment,
            rooms = rooms.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built apartment graph"
        );
        graph
    }

    fn add_room(&self, graph: &mut FloorplanGraph, room: &Room, polygon: Polygon2D) -> Option<NodeKey> {
        let p = Polygon::from(&polygon);
        if !p.is_valid() || p.area() <= 0.0 {
            tracing::warn!(floor = %self.floor.id, room = %room.id, "Skipping room with degenerate polygon");
            return None;
        }
        let key = graph.add_node(
            room_node_id(room.id),
            NodeData::Room(RoomNode {
                room_type: room.room_type.clone(),
                apartment: room.apartment.clone(),
                polygon,
                matched: false,
            }),
        );
        if let Some(apartment) = &room.apartment {
            let apt = graph.add_node(
                apartment_node_id(apartment),
                NodeData::apartment(apartment.as_str()),
            );
            graph.add_edge(key, apt, EdgeKind::BelongsTo);
        }
        Some(key)
    }

    /// Structural polygons near the rooms, with `room-wall` and `wall-wall`
    /// edges.
    fn add_walls(&self, graph: &mut FloorplanGraph, rooms: &[(NodeKey, Polygon)]) {
        let d = self.config.proximity;
        let min_shared = self.config.min_shared_length;
        let mut walls: Vec<(NodeKey, Polygon)> = Vec::new();

        for (index, structure) in self.floor.structures.iter().enumerate() {
            let Structure::Polygon(footprint) = structure else {
                continue;
            };
            let wall = Polygon::from(footprint);
            let mut key = None;
            for (room_key, room) in rooms {
                let shared = room.boundary_length_near(&wall, d);
                if shared < min_shared {
                    continue;
                }
                let wk = *key.get_or_insert_with(|| {
                    graph.add_node(
                        wall_node_id(index),
                        NodeData::Wall(WallNode {
                            footprint: Some(footprint.clone()),
                            axis: wall_centerline(&wall).ok().map(|s| s.to_line()),
                            thickness: min_rotated_rect(&wall.outer)
                                .map(|r| r.short_side())
                                .unwrap_or(0.0),
                            ..Default::default()
                        }),
                    )
                });
                graph.add_weighted_edge(*room_key, wk, EdgeKind::RoomWall, shared);
            }
            if let Some(k) = key {
                walls.push((k, wall));
            }
        }

        for (i, (ka, pa)) in walls.iter().enumerate() {
            for (kb, pb) in &walls[i + 1..] {
                if touching(pa, pb) {
                    let shared = pa.boundary_length_near(pb, ALIGN_TOLERANCE);
                    graph.add_weighted_edge(*ka, *kb, EdgeKind::WallWall, shared);
                }
            }
        }
    }

    /// Segment nodes with `room-segment` edges to every adjacent room in the
    /// graph. Unattached segments are kept only when `keep_unattached`.
    fn add_segments(
        &self,
        graph: &mut FloorplanGraph,
        rooms: &FxHashMap<RoomId, NodeKey>,
        keep_unattached: bool,
    ) {
        for segment in self.segments {
            let attached: Vec<NodeKey> = segment
                .adjacent_rooms()
                .iter()
                .filter_map(|r| rooms.get(r).copied())
                .collect();
            if attached.is_empty() && !keep_unattached {
                continue;
            }
            let key = graph.add_node(
                segment_node_id(segment.id),
                NodeData::Segment(SegmentNode {
                    line: segment.line,
                    width: segment.width,
                    wall_type: segment.wall_type(),
                    segment_type: None,
                }),
            );
            for room in attached {
                graph.add_edge(room, key, EdgeKind::RoomSegment);
            }
        }
    }

    fn finish(&self, graph: &mut FloorplanGraph) {
        graph.link_identical_and_aligned();
        if self.config.simplify_chains {
            graph.simplify_identical_chains();
        }
    }
}
