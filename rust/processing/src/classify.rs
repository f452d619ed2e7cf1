// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall type rule cascade.
//!
//! Rules live in one ordered table, [`RULES`]. The first rule that returns a
//! type wins; predicates overlap, so the order is part of the ruleset. A
//! segment that no rule claims falls through to [`DEFAULT_TYPE`].

use serde::Serialize;
use smallvec::SmallVec;

use floorplan_core::{Floor, Room, RoomType, WallSegment, WallType};
use floorplan_geometry::{Polygon, Segment};

/// Bumped whenever a rule, its order or its output changes.
pub const RULESET_VERSION: u32 = 1;

/// Catch-all interior partition type.
pub const DEFAULT_TYPE: WallType = WallType::T6;

/// Everything a rule may look at for one segment.
pub struct RuleInput<'a> {
    pub segment: &'a WallSegment,
    /// Rooms on the probed sides, one entry per side that hit a room
    pub sides: SmallVec<[&'a Room; 2]>,
    pub shafts: &'a [Polygon],
    pub shaft_clearance: f64,
}

impl RuleInput<'_> {
    fn has_type(&self, room_type: &RoomType) -> bool {
        self.sides.iter().any(|r| &r.room_type == room_type)
    }
}

pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&RuleInput<'_>) -> Option<WallType>,
}

/// The ruleset, in precedence order.
pub static RULES: [Rule; 5] = [
    Rule {
        name: "stair",
        apply: stair_partition,
    },
    Rule {
        name: "boundary",
        apply: boundary,
    },
    Rule {
        name: "apartment_division",
        apply: apartment_division,
    },
    Rule {
        name: "bath_dry_room",
        apply: bath_dry_room,
    },
    Rule {
        name: "bath_wet_room",
        apply: bath_wet_room,
    },
];

/// A stair on either side, or a corridor that belongs to no apartment.
fn stair_partition(input: &RuleInput<'_>) -> Option<WallType> {
    input
        .sides
        .iter()
        .any(|r| {
            r.room_type == RoomType::Stair
                || (r.room_type == RoomType::Corridor && r.apartment.is_none())
        })
        .then_some(WallType::T1)
}

/// At most one side touches a room: shaft boundary or envelope.
fn boundary(input: &RuleInput<'_>) -> Option<WallType> {
    if input.sides.len() > 1 {
        return None;
    }
    let line = Segment::from_line(&input.segment.line);
    let at_shaft = input
        .shafts
        .iter()
        .any(|shaft| shaft.distance_to_segment(&line) <= input.shaft_clearance);
    Some(if at_shaft { WallType::T2a } else { WallType::T2b })
}

/// Two rooms of different apartments. Two unassigned rooms count as the same
/// apartment.
fn apartment_division(input: &RuleInput<'_>) -> Option<WallType> {
    match input.sides.as_slice() {
        [a, b] if a.apartment != b.apartment => Some(WallType::T3),
        _ => None,
    }
}

fn bath_dry_room(input: &RuleInput<'_>) -> Option<WallType> {
    (input.has_type(&RoomType::Bathroom)
        && (input.has_type(&RoomType::Kitchen) || input.has_type(&RoomType::Bedroom)))
    .then_some(WallType::T4)
}

fn bath_wet_room(input: &RuleInput<'_>) -> Option<WallType> {
    (input.has_type(&RoomType::Bathroom)
        && (input.has_type(&RoomType::Corridor) || input.has_type(&RoomType::Livingroom)))
    .then_some(WallType::T5)
}

/// Per-rule tally of one classification run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub ruleset_version: u32,
    /// `(rule name, segments typed by it)` in precedence order, the default
    /// last
    pub by_rule: Vec<(&'static str, usize)>,
}

impl ClassificationReport {
    fn new() -> Self {
        let mut by_rule: Vec<(&'static str, usize)> = RULES.iter().map(|r| (r.name, 0)).collect();
        by_rule.push(("default", 0));
        Self {
            ruleset_version: RULESET_VERSION,
            by_rule,
        }
    }

    pub fn count(&self, rule: &str) -> usize {
        self.by_rule
            .iter()
            .find(|(name, _)| *name == rule)
            .map_or(0, |(_, n)| *n)
    }

    pub fn total(&self) -> usize {
        self.by_rule.iter().map(|(_, n)| n).sum()
    }
}

/// Applies [`RULES`] to the segments of one floor.
pub struct WallTypeClassifier<'a> {
    floor: &'a Floor,
    shafts: Vec<Polygon>,
    shaft_clearance: f64,
}

impl<'a> WallTypeClassifier<'a> {
    pub fn new(floor: &'a Floor, shaft_clearance: f64) -> Self {
        Self {
            floor,
            shafts: floor.shafts.iter().map(Polygon::from).collect(),
            shaft_clearance,
        }
    }

    /// Type of one segment and the index of the rule that decided it
    /// (`RULES.len()` for the default).
    pub fn decide(&self, segment: &WallSegment) -> (WallType, usize) {
        let sides: SmallVec<[&Room; 2]> = [segment.rooms.0, segment.rooms.1]
            .into_iter()
            .flatten()
            .filter_map(|id| self.floor.room(id))
            .collect();
        let input = RuleInput {
            segment,
            sides,
            shafts: &self.shafts,
            shaft_clearance: self.shaft_clearance,
        };
        RULES
            .iter()
            .enumerate()
            .find_map(|(i, rule)| (rule.apply)(&input).map(|t| (t, i)))
            .unwrap_or((DEFAULT_TYPE, RULES.len()))
    }

    /// Types every untyped segment. Segments that already carry a type are
    /// left alone and not counted.
    pub fn classify(&self, segments: &mut [WallSegment]) -> ClassificationReport {
        let mut report = ClassificationReport::new();
        for segment in segments.iter_mut() {
            if segment.wall_type().is_some() {
                continue;
            }
            let (wall_type, rule) = self.decide(segment);
            segment.assign_type(wall_type);
            report.by_rule[rule].1 += 1;
        }
        tracing::debug!(
            floor = %self.floor.id,
            ruleset = RULESET_VERSION,
            segments = report.total(),
            rules = ?report.by_rule,
            "Classified wall segments"
        );
        report
    }
}
