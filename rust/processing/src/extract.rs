// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall segment extraction.
//!
//! Every structural polygon is reduced to its centerline (bare structural
//! lines are used as they are). Centerlines are extended at both ends so T,
//! L and X junctions actually cross, split at the crossings, and each
//! surviving piece is measured across its parent polygon and probed on both
//! sides for the room it separates.

use floorplan_core::{ExtractionConfig, Floor, RoomId, Structure, WallSegment};
use floorplan_geometry::{
    perpendicular_width, split_at_points, wall_centerline, Point2, Polygon, Segment, Vector2,
};

/// Extended centerline of one structure.
#[derive(Debug, Clone)]
pub struct Centerline {
    /// Index into `Floor::structures`
    pub structure: usize,
    pub line: Segment,
    /// Parent footprint, `None` for bare lines
    pub parent: Option<Polygon>,
}

/// Room polygon prepared for probing.
#[derive(Debug, Clone)]
pub(crate) struct ProbeTarget {
    pub id: RoomId,
    pub polygon: Polygon,
    pub centroid: Point2<f64>,
}

pub(crate) fn probe_targets(floor: &Floor) -> Vec<ProbeTarget> {
    floor
        .rooms
        .iter()
        .filter_map(|room| {
            let polygon = Polygon::from(&room.polygon);
            if !polygon.is_valid() {
                tracing::warn!(floor = %floor.id, room = %room.id, "Room polygon is not probeable");
                return None;
            }
            Some(ProbeTarget {
                id: room.id,
                centroid: polygon.centroid(),
                polygon,
            })
        })
        .collect()
}

/// Room hit by a probe point: among rooms within `buffer` of `p`, the one
/// with the nearest centroid, then the lower id.
pub(crate) fn probe_hit(targets: &[ProbeTarget], p: &Point2<f64>, buffer: f64) -> Option<RoomId> {
    targets
        .iter()
        .filter(|t| t.polygon.distance_to_point(p) <= buffer)
        .min_by(|a, b| {
            let da = (a.centroid - p).norm();
            let db = (b.centroid - p).norm();
            da.total_cmp(&db).then(a.id.cmp(&b.id))
        })
        .map(|t| t.id)
}

/// Derives wall segments from a floor's structures.
#[derive(Debug, Clone, Copy)]
pub struct GeometryExtractor<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> GeometryExtractor<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extended centerlines, in structure order. Degenerate footprints are
    /// skipped with a warning.
    pub fn centerlines(&self, floor: &Floor) -> Vec<Centerline> {
        let mut out = Vec::with_capacity(floor.structures.len());
        for (index, structure) in floor.structures.iter().enumerate() {
            let (line, parent) = match structure {
                Structure::Polygon(footprint) => {
                    let polygon = Polygon::from(footprint);
                    if !polygon.is_valid() {
                        tracing::warn!(floor = %floor.id, structure = index, "Skipping degenerate wall polygon");
                        continue;
                    }
                    match wall_centerline(&polygon) {
                        Ok(line) => (line, Some(polygon)),
                        Err(e) => {
                            tracing::warn!(floor = %floor.id, structure = index, error = %e, "Skipping wall without centerline");
                            continue;
                        }
                    }
                }
                Structure::Line(line) => (Segment::from_line(line), None),
            };
            if line.direction().is_none() {
                tracing::warn!(floor = %floor.id, structure = index, "Skipping zero-length wall");
                continue;
            }
            out.push(Centerline {
                structure: index,
                line: line.extend(self.config.extension),
                parent,
            });
        }
        out
    }

    /// Point crossings per centerline. Lines shorter than the minimum length
    /// take part in no crossing; collinear overlaps are not crossings.
    pub fn crossings(&self, lines: &[Centerline]) -> Vec<Vec<Point2<f64>>> {
        let min = self.config.min_segment_length;
        let mut points = vec![Vec::new(); lines.len()];
        for i in 0..lines.len() {
            if lines[i].line.length() < min {
                continue;
            }
            for j in i + 1..lines.len() {
                if lines[j].line.length() < min {
                    continue;
                }
                if let Some(p) = lines[i].line.intersection(&lines[j].line) {
                    points[i].push(p);
                    points[j].push(p);
                }
            }
        }
        points
    }

    /// Splits `line` at `points` and returns the surviving pieces together
    /// with the total length of the discarded ones. Pieces shorter than the
    /// minimum length are discarded.
    pub fn split(&self, line: &Segment, points: &[Point2<f64>]) -> (Vec<Segment>, f64) {
        let min = self.config.min_segment_length;
        let mut discarded = 0.0;
        let kept = split_at_points(line, points, self.config.split_epsilon)
            .into_iter()
            .filter(|piece| {
                let keep = piece.length() >= min;
                if !keep {
                    discarded += piece.length();
                }
                keep
            })
            .collect();
        (kept, discarded)
    }

    /// Wall segments of `floor`, numbered from 1 in structure order. The
    /// returned segments are untyped.
    pub fn extract(&self, floor: &Floor) -> Vec<WallSegment> {
        let lines = self.centerlines(floor);
        let crossings = self.crossings(&lines);
        let targets = probe_targets(floor);

        let mut segments = Vec::new();
        for (centerline, points) in lines.iter().zip(&crossings) {
            let (pieces, _) = self.split(&centerline.line, points);
            for piece in pieces {
                let width = centerline
                    .parent
                    .as_ref()
                    .map_or(0.0, |parent| perpendicular_width(&piece, parent));
                let mut segment =
                    WallSegment::new(segments.len() + 1, piece.to_line(), width, centerline.structure);
                segment.rooms = self.probe(&piece, &targets);
                segments.push(segment);
            }
        }

        tracing::debug!(
            floor = %floor.id,
            centerlines = lines.len(),
            crossings = crossings.iter().map(Vec::len).sum::<usize>() / 2,
            segments = segments.len(),
            "Extracted wall segments"
        );
        segments
    }

    /// Rooms on the left `(-uy, ux)` and right `(uy, -ux)` of the piece.
    fn probe(
        &self,
        piece: &Segment,
        targets: &[ProbeTarget],
    ) -> (Option<RoomId>, Option<RoomId>) {
        let Some(u) = piece.direction() else {
            return (None, None);
        };
        let mid = piece.midpoint();
        let offset = self.config.probe_offset;
        let buffer = self.config.probe_buffer;
        let left = mid + Vector2::new(-u.y, u.x) * offset;
        let right = mid + Vector2::new(u.y, -u.x) * offset;
        (
            probe_hit(targets, &left, buffer),
            probe_hit(targets, &right, buffer),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use floorplan_core::{ApartmentId, Line2D, Point2D, Polygon2D, Room, RoomType};

    fn room(id: u32, room_type: RoomType, rect: (f64, f64, f64, f64)) -> Room {
        Room {
            id: RoomId(id),
            polygon: Polygon2D::rectangle(rect.0, rect.1, rect.2, rect.3),
            room_type,
            apartment: ApartmentId::parse("A"),
        }
    }

    fn single_wall_floor() -> Floor {
        let mut floor = Floor::new("F1");
        floor.rooms = vec![
            room(1, RoomType::Bathroom, (0.0, 0.1, 5.0, 3.0)),
            room(2, RoomType::Kitchen, (0.0, -3.0, 5.0, -0.1)),
        ];
        floor.structures = vec![Structure::Polygon(Polygon2D::rectangle(0.0, -0.1, 5.0, 0.1))];
        floor
    }

    #[test]
    fn single_wall_is_one_extended_segment() {
        let config = ExtractionConfig::default();
        let segments = GeometryExtractor::new(&config).extract(&single_wall_floor());

        assert_eq!(segments.len(), 1);
        let s = &segments[0];
        assert_eq!(s.id, 1);
        assert_relative_eq!(s.length(), 5.4, epsilon = 1e-9);
        assert_relative_eq!(s.width, 0.2, epsilon = 1e-9);
        let mut rooms = s.adjacent_rooms().to_vec();
        rooms.sort();
        assert_eq!(rooms, vec![RoomId(1), RoomId(2)]);
        assert!(s.wall_type().is_none());
    }

    #[test]
    fn crossing_walls_are_split() {
        let mut floor = Floor::new("F1");
        floor.structures = vec![
            Structure::Polygon(Polygon2D::rectangle(0.0, -0.1, 6.0, 0.1)),
            Structure::Polygon(Polygon2D::rectangle(2.9, -3.0, 3.1, 3.0)),
        ];
        let config = ExtractionConfig::default();
        let extractor = GeometryExtractor::new(&config);
        let lines = extractor.centerlines(&floor);
        let crossings = extractor.crossings(&lines);
        assert_eq!(crossings[0].len(), 1);
        assert_eq!(crossings[1].len(), 1);

        let segments = extractor.extract(&floor);
        assert_eq!(segments.len(), 4);
        assert!(segments.iter().all(|s| s.rooms == (None, None)));
        let total: f64 = segments.iter().map(WallSegment::length).sum();
        assert_relative_eq!(total, 6.4 + 6.4 - 4.0 * 1e-6, epsilon = 1e-9);
    }

    #[test]
    fn minimum_length_is_inclusive() {
        let config = ExtractionConfig::default();
        let extractor = GeometryExtractor::new(&config);
        let min = config.min_segment_length;
        let line = |x0: f64, y0: f64, x1: f64, y1: f64| {
            Segment::from_line(&Line2D::new(Point2D::new(x0, y0), Point2D::new(x1, y1)))
        };

        let exact = line(0.0, 0.0, min, 0.0);
        let (kept, discarded) = extractor.split(&exact, &[]);
        assert_eq!(kept.len(), 1);
        assert_eq!(discarded, 0.0);

        let lines = [
            Centerline { structure: 0, line: exact, parent: None },
            Centerline { structure: 1, line: line(min / 2.0, -1.0, min / 2.0, 1.0), parent: None },
        ];
        let crossings = extractor.crossings(&lines);
        assert_eq!(crossings[0].len(), 1);
        assert_eq!(crossings[1].len(), 1);

        let short = [
            Centerline { structure: 0, line: line(0.0, 0.0, min * 0.9, 0.0), parent: None },
            Centerline { structure: 1, line: line(min / 2.0, -1.0, min / 2.0, 1.0), parent: None },
        ];
        assert!(extractor.crossings(&short).iter().all(Vec::is_empty));
    }

    #[test]
    fn split_conserves_length() {
        let config = ExtractionConfig::default();
        let extractor = GeometryExtractor::new(&config);
        let line = Segment::new(Point2::new(0.0, 0.0), Point2::new(5.4, 0.0));

        let (kept, discarded) = extractor.split(&line, &[]);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(discarded, 0.0);

        // a crossing 0.3 from the start leaves a short piece that is dropped
        let (kept, discarded) = extractor.split(&line, &[Point2::new(0.3, 0.0)]);
        assert_eq!(kept.len(), 1);
        let kept_len: f64 = kept.iter().map(Segment::length).sum();
        assert_relative_eq!(kept_len + discarded, 5.4, epsilon = 1e-12);
        assert_relative_eq!(discarded, 0.3 + 1e-6, epsilon = 1e-12);
    }

    #[test]
    fn bare_lines_have_no_width() {
        let mut floor = Floor::new("F1");
        floor.structures = vec![Structure::Line(Line2D::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 4.0),
        ))];
        let config = ExtractionConfig::default();
        let segments = GeometryExtractor::new(&config).extract(&floor);
        assert_eq!(segments.len(), 1);
        assert_relative_eq!(segments[0].width, 0.0);
        assert_relative_eq!(segments[0].length(), 4.4, epsilon = 1e-9);
    }

    #[test]
    fn short_and_degenerate_structures() {
        let mut floor = Floor::new("F1");
        floor.structures = vec![
            // collapses to a line
            Structure::Polygon(Polygon2D::new(vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 0.0),
                Point2D::new(2.0, 0.0),
            ])),
            // 0.05 long, still 0.45 after extension
            Structure::Line(Line2D::new(Point2D::new(0.0, 1.0), Point2D::new(0.05, 1.0))),
        ];
        let config = ExtractionConfig::default();
        assert!(GeometryExtractor::new(&config).extract(&floor).is_empty());
        assert!(GeometryExtractor::new(&config).extract(&Floor::new("empty")).is_empty());
    }

    #[test]
    fn probe_prefers_nearest_centroid() {
        // two overlapping rooms both contain the probe point
        let floor = {
            let mut f = Floor::new("F1");
            f.rooms = vec![
                room(1, RoomType::Livingroom, (0.0, 0.0, 10.0, 10.0)),
                room(2, RoomType::Storeroom, (0.0, 0.0, 2.0, 2.0)),
            ];
            f
        };
        let targets = probe_targets(&floor);
        assert_eq!(probe_hit(&targets, &Point2::new(1.0, 1.0), 0.02), Some(RoomId(2)));
        assert_eq!(probe_hit(&targets, &Point2::new(8.0, 8.0), 0.02), Some(RoomId(1)));
        // just outside, within the buffer
        assert_eq!(probe_hit(&targets, &Point2::new(10.01, 5.0), 0.02), Some(RoomId(1)));
        assert_eq!(probe_hit(&targets, &Point2::new(10.5, 5.0), 0.02), None);
    }
}
