// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The mining stage could not run; nothing from the run is committed.
    #[error("Mining unavailable: {0}")]
    MiningUnavailable(String),

    /// One match has degenerate geometry and is discarded.
    #[error("Match evaluation failed: {0}")]
    MatchEvaluation(String),

    #[error("Module store error for '{key}': {message}")]
    Persistence { key: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid panel document: {0}")]
    Document(String),

    #[error(transparent)]
    Core(#[from] floorplan_core::Error),

    #[error(transparent)]
    Geometry(#[from] floorplan_geometry::Error),

    #[error(transparent)]
    Graph(#[from] floorplan_graph::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn persistence(key: impl Into<String>, e: impl std::fmt::Display) -> Self {
        Error::Persistence {
            key: key.into(),
            message: e.to_string(),
        }
    }
}
