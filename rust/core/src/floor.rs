// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor model
//!
//! A [`Floor`] is the read-only view of one floor's dataset rows: rooms,
//! shafts and structural walls. Unusable rows are skipped with a warning so a
//! single bad polygon never costs the rest of the floor.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dataset::{ApartmentId, FloorRecord, RecordKind};
use crate::error::{Error, Result};
use crate::geom::{Geometry, Line2D, Polygon2D};
use crate::room_type::RoomType;
use crate::wkt::parse_wkt;

/// Room identifier, 1-based in row order within a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub polygon: Polygon2D,
    pub room_type: RoomType,
    pub apartment: Option<ApartmentId>,
}

/// Structural wall geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Structure {
    Polygon(Polygon2D),
    Line(Line2D),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub id: String,
    pub rooms: Vec<Room>,
    pub shafts: Vec<Polygon2D>,
    pub structures: Vec<Structure>,
}

impl Floor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Build a floor from its rows, in row order.
    pub fn from_records<'a, I>(id: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = &'a FloorRecord>,
    {
        let mut floor = Self::new(id);
        for (idx, record) in records.into_iter().enumerate() {
            if let Err(e) = floor.push_record(record) {
                tracing::warn!(
                    floor = %floor.id,
                    record = idx,
                    error = %e,
                    "Skipping unusable record"
                );
            }
        }
        tracing::debug!(
            floor = %floor.id,
            rooms = floor.rooms.len(),
            shafts = floor.shafts.len(),
            structures = floor.structures.len(),
            "Built floor"
        );
        floor
    }

    fn push_record(&mut self, record: &FloorRecord) -> Result<()> {
        let kind = record.kind();
        if kind == RecordKind::Ignored {
            return Ok(());
        }

        let geometry = parse_wkt(&record.geom)?;
        match kind {
            RecordKind::Room => {
                let polygon = largest_polygon(&geometry)?;
                let room_type = RoomType::parse(record.roomtype.as_deref().unwrap_or(""));
                let id = RoomId(self.rooms.len() as u32 + 1);
                self.rooms.push(Room {
                    id,
                    polygon,
                    room_type,
                    apartment: record.apartment_id.clone(),
                });
            }
            RecordKind::Shaft => {
                for polygon in geometry.polygons() {
                    self.shafts.push(checked_polygon(polygon)?);
                }
            }
            RecordKind::Structure => {
                let polygons = geometry.polygons();
                let lines = geometry.lines();
                if polygons.is_empty() && lines.is_empty() {
                    return Err(Error::UnsupportedGeometry(format!(
                        "structure must be polygonal or lineal, found {}",
                        geometry.type_name()
                    )));
                }
                for polygon in polygons {
                    self.structures.push(Structure::Polygon(checked_polygon(polygon)?));
                }
                for points in lines {
                    for pair in points.windows(2) {
                        let line = Line2D::new(pair[0], pair[1]);
                        if line.length() > 0.0 {
                            self.structures.push(Structure::Line(line));
                        }
                    }
                }
            }
            RecordKind::Ignored => {}
        }
        Ok(())
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        // ids are dense and 1-based
        self.rooms
            .get((id.0 as usize).wrapping_sub(1))
            .filter(|r| r.id == id)
    }

    /// Distinct apartment ids in first-appearance order.
    pub fn apartment_ids(&self) -> Vec<ApartmentId> {
        let mut seen = FxHashMap::default();
        let mut out = Vec::new();
        for room in &self.rooms {
            if let Some(apt) = &room.apartment {
                if seen.insert(apt.clone(), ()).is_none() {
                    out.push(apt.clone());
                }
            }
        }
        out
    }

    pub fn rooms_of<'a>(&'a self, apartment: &'a ApartmentId) -> impl Iterator<Item = &'a Room> {
        self.rooms
            .iter()
            .filter(move |r| r.apartment.as_ref() == Some(apartment))
    }
}

fn checked_polygon(polygon: Polygon2D) -> Result<Polygon2D> {
    if polygon.outer.len() < 3 || polygon.area() <= 0.0 {
        return Err(Error::Degenerate(format!(
            "polygon with {} vertices and zero area",
            polygon.outer.len()
        )));
    }
    Ok(polygon)
}

/// Rooms keep only their largest polygonal part.
fn largest_polygon(geometry: &Geometry) -> Result<Polygon2D> {
    let largest = geometry
        .polygons()
        .into_iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()));
    match largest {
        Some(p) => checked_polygon(p),
        None => Err(Error::UnsupportedGeometry(format!(
            "room must be polygonal, found {}",
            geometry.type_name()
        ))),
    }
}

/// Group dataset rows by floor id, preserving first-appearance order.
pub fn floors_from_records(records: &[FloorRecord]) -> Vec<Floor> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut groups: Vec<(&str, Vec<&FloorRecord>)> = Vec::new();
    for record in records {
        let slot = *index.entry(record.floor_id.as_str()).or_insert_with(|| {
            groups.push((record.floor_id.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(record);
    }
    groups
        .into_iter()
        .map(|(id, rows)| Floor::from_records(id, rows))
        .collect()
}
