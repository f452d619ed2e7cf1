// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration
//!
//! Every geometric threshold of the pipeline lives here. All structs load from
//! partial JSON: missing fields keep their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Wall centerline extraction and room probing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Distance each centerline is extended at both ends
    pub extension: f64,
    /// Half-width of the gap cut around each intersection point
    pub split_epsilon: f64,
    /// Pieces shorter than this are discarded
    pub min_segment_length: f64,
    /// Perpendicular offset of the room probes from the segment midpoint
    pub probe_offset: f64,
    /// Tolerance added around room polygons when probing
    pub probe_buffer: f64,
    /// Clearance around shafts for the shaft-boundary rule
    pub shaft_clearance: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            extension: 0.2,
            split_epsilon: 1e-6,
            min_segment_length: 0.5,
            probe_offset: 0.3,
            probe_buffer: 0.02,
            shaft_clearance: 0.12,
        }
    }
}

/// Per-apartment mining graph construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApartmentGraphConfig {
    /// Boundaries closer than this count as touching
    pub proximity: f64,
    /// Room-room links need at least this much shared boundary
    pub min_shared_length: f64,
    /// Replace near-rectangular rooms by their minimum rotated rectangle
    pub rectify_rooms: bool,
    pub rectify_max_ratio: f64,
    pub rectify_min_area_ratio: f64,
    /// Collapse identical-wall diamonds into chains
    pub simplify_chains: bool,
}

impl Default for ApartmentGraphConfig {
    fn default() -> Self {
        Self {
            proximity: 0.6,
            min_shared_length: 0.1,
            rectify_rooms: true,
            rectify_max_ratio: 0.4,
            rectify_min_area_ratio: 0.7,
            simplify_chains: true,
        }
    }
}

/// Module enrichment (wall/opening boundary pieces).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Nominal wall width; samples sit half of it inside the room
    pub wall_width: f64,
    /// Edges this long or shorter are always walls
    pub min_open_length: f64,
    /// Sample positions along an edge, as fractions of its length
    pub sample_positions: Vec<f64>,
    pub double_angle_deg: f64,
    pub double_distance: f64,
    pub double_overlap_ratio: f64,
    /// Weisfeiler-Lehman refinement rounds
    pub signature_iterations: usize,
}

impl EnrichConfig {
    #[inline]
    pub fn sample_distance(&self) -> f64 {
        self.wall_width / 2.0
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            wall_width: 0.06,
            min_open_length: 1.0,
            sample_positions: vec![0.1, 0.5, 0.9],
            double_angle_deg: 10.0,
            double_distance: 0.4,
            double_overlap_ratio: 0.3,
            signature_iterations: 3,
        }
    }
}

/// Panel/space JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub panel_height: f64,
    /// Thickness for segments without a measured width
    pub default_thickness: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            panel_height: 3.0,
            default_thickness: 0.2,
        }
    }
}

/// On-disk locations and parallelism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub graph_dir: PathBuf,
    pub module_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Worker threads for ingest and match evaluation (0 = all cores)
    pub workers: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            graph_dir: PathBuf::from("data/graphs"),
            module_dir: PathBuf::from("data/modules"),
            output_dir: PathBuf::from("data/output"),
            workers: 0,
        }
    }
}

impl StoreConfig {
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extraction: ExtractionConfig,
    pub apartment_graph: ApartmentGraphConfig,
    pub enrich: EnrichConfig,
    pub export: ExportConfig,
    pub store: StoreConfig,
}

impl Config {
    /// Defaults with store paths and workers taken from the environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Apply `FLOORPLAN_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("FLOORPLAN_GRAPH_DIR") {
            self.store.graph_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("FLOORPLAN_MODULE_DIR") {
            self.store.module_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("FLOORPLAN_OUTPUT_DIR") {
            self.store.output_dir = PathBuf::from(dir);
        }
        if let Some(workers) = lookup("FLOORPLAN_WORKERS") {
            self.store.workers = workers.trim().parse().map_err(|_| {
                Error::Config(format!("FLOORPLAN_WORKERS must be an integer, got {:?}", workers))
            })?;
        }
        Ok(())
    }
}

/// Per-call mining parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningParams {
    pub min_support: usize,
    /// Maximum short side of the module's bounding rectangle
    pub max_width: f64,
    /// Maximum shape-irregularity ratio
    pub ratio_threshold: f64,
    /// Patterns must have exactly this many rooms
    pub vertex_count: usize,
}

impl MiningParams {
    pub fn validate(&self) -> Result<()> {
        if self.min_support < 1 {
            return Err(Error::Config("min_support must be at least 1".into()));
        }
        if !(self.max_width > 0.0) {
            return Err(Error::Config(format!(
                "max_width must be positive, got {}",
                self.max_width
            )));
        }
        if !(0.0..=1.0).contains(&self.ratio_threshold) {
            return Err(Error::Config(format!(
                "ratio_threshold must be within [0, 1], got {}",
                self.ratio_threshold
            )));
        }
        if self.vertex_count < 1 {
            return Err(Error::Config("vertex_count must be at least 1".into()));
        }
        Ok(())
    }
}
