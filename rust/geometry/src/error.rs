// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug)]
pub enum Error {
    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Vertex {index} out of range (table has {len} vertices)")]
    VertexOutOfRange { index: usize, len: usize },

    #[error("Geometry instance references template {template}, document has {count}")]
    TemplateOutOfRange { template: usize, count: usize },

    #[error("Geometry instance has no anchor vertex")]
    MissingAnchor,

    #[error("Core error: {0}")]
    Core(#[from] cityjson_lite_core::Error),
}
