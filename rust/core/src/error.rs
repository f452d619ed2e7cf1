// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for dataset parsing and configuration.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading floor datasets.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed WKT text. `offset` is the byte position where parsing stopped.
    #[error("WKT parse error at byte {offset}: {message}")]
    Wkt { offset: usize, message: String },

    /// Parsed geometry has a type the caller cannot use here.
    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    /// Empty, self-collapsed or otherwise unusable geometry.
    #[error("Degenerate geometry: {0}")]
    Degenerate(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
