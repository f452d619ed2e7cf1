// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Floorplan Core
//!
//! Data model for floorplan module mining, with a WKT reader built on
//! [nom](https://docs.rs/nom).
//!
//! ## Overview
//!
//! - **Dataset**: per-floor JSON rows with WKT geometry
//! - **Floor model**: rooms, shafts and structural walls of one floor
//! - **Vocabulary**: room types, wall types and boundary segment types
//! - **Configuration**: every tunable threshold of the pipeline
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use floorplan_core::{floors_from_records, load_records};
//!
//! let records = load_records(Path::new("floors.json"))?;
//! for floor in floors_from_records(&records) {
//!     println!("Floor {}: {} rooms", floor.id, floor.rooms.len());
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod floor;
pub mod geom;
pub mod room_type;
pub mod wall;
pub mod wkt;

pub use config::{
    ApartmentGraphConfig, Config, EnrichConfig, ExportConfig, ExtractionConfig, MiningParams,
    StoreConfig,
};
pub use dataset::{load_records, parse_records, ApartmentId, FloorRecord, RecordKind};
pub use error::{Error, Result};
pub use floor::{floors_from_records, Floor, Room, RoomId, Structure};
pub use geom::{Geometry, Line2D, Point2D, Polygon2D};
pub use room_type::{normalize_label, RoomType};
pub use wall::{SegmentType, WallSegment, WallType};
pub use wkt::{line_to_wkt, parse_line, parse_polygon, parse_wkt, polygon_to_wkt, to_wkt};
