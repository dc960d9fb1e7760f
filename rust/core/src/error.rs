// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for document decoding and normalization.

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding or normalizing a CityJSON document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document is not valid JSON or does not match the CityJSON layout.
    #[error("invalid CityJSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// The `transform` member cannot be applied.
    #[error("invalid transform: {0}")]
    InvalidTransform(String),

    /// A boundary references a vertex past the end of its coordinate table.
    #[error("vertex {index} out of range (table has {len} vertices)")]
    VertexOutOfRange { index: usize, len: usize },
}
