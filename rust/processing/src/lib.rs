// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Floorplan Processing
//!
//! The floorplan-to-module pipeline:
//!
//! 1. [`GeometryExtractor`] turns structural polygons and lines into split,
//!    measured wall segments with the rooms on either side
//! 2. [`WallTypeClassifier`] types every segment with an ordered rule table
//! 3. apartment graphs are built and stored (see `floorplan-graph`)
//! 4. the corpus is mined for recurring room-adjacency patterns
//! 5. [`SpatialConstraintFilter`] keeps matches that form compact rectangles
//! 6. [`ModuleEnricher`] cuts accepted matches into wall/opening segments and
//!    signs them so identical modules group together
//!
//! [`Engine`] runs the stages against the configured stores.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use floorplan_core::{load_records, Config, MiningParams};
//! use floorplan_processing::Engine;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::new(Config::from_env()?)?;
//! let records = load_records(std::path::Path::new("floors.json"))?;
//! engine.ingest(&records);
//!
//! let report = engine.mine(&MiningParams {
//!     min_support: 3,
//!     max_width: 6.0,
//!     ratio_threshold: 0.3,
//!     vertex_count: 2,
//! })?;
//! println!("{} modules", report.modules.len());
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod constraints;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod export;
pub mod extract;
pub mod mining;
pub mod modules;

pub use classify::{ClassificationReport, Rule, WallTypeClassifier, RULES, RULESET_VERSION};
pub use constraints::{no_partial_overlap, MatchMetrics, ShapeCheck, SpatialConstraintFilter};
pub use engine::{graph_id, Engine, IngestSummary, MiningReport, METRICS_FILE, TRANSACTIONS_FILE};
pub use enrich::{EnrichedModule, ModuleEnricher};
pub use error::{Error, Result};
pub use export::{Panel, PanelDocument, Space};
pub use extract::GeometryExtractor;
pub use mining::{
    find_matches, FrequentSubgraphMiner, Match, MinedPattern, Pattern, SubgraphEnumerationMiner,
    Transactions,
};
pub use modules::{ComboCount, ModuleGroup, ModuleRecord, ModuleStore};
