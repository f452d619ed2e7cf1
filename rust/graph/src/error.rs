// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for graph operations.

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, serializing or storing graphs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A graph could not be read from or written to the store.
    #[error("graph '{graph_id}': {message}")]
    Persistence { graph_id: String, message: String },

    /// A snapshot could not be serialized or deserialized.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// An edge or lookup referenced a node id that is not in the graph.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// Geometry or record error from the data model.
    #[error(transparent)]
    Core(#[from] floorplan_core::Error),
}
