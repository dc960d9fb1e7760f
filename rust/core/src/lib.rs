// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # CityJSON-Lite Core
//!
//! Typed model of CityJSON 1.0 / 1.1 documents, decoded with
//! [serde](https://docs.rs/serde).
//!
//! ## Overview
//!
//! - **Document model**: `CityObjects` in document order, shared `vertices`,
//!   optional `transform`, `appearance` and `geometry-templates`
//! - **Geometry**: a closed enum keyed on the `type` tag, with per-kind
//!   boundary types (Shell = list of Surface, Surface = list of Ring,
//!   Ring = list of VertexId)
//! - **Normalization**: vertex decompression and f64 model bounds
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cityjson_lite_core::{CityJsonDocument, Geometry};
//!
//! let mut doc = CityJsonDocument::from_json(&content)?;
//! doc.apply_transform()?;
//!
//! for (id, object) in &doc.city_objects {
//!     for geometry in &object.geometry {
//!         println!("{} {} lod={:?}", id, geometry.type_name(), geometry.lod());
//!     }
//! }
//! ```

pub mod bounds;
pub mod document;
pub mod error;
pub mod geometry;

pub use bounds::ModelBounds;
pub use document::{
    Appearance, CityJsonDocument, CityObject, Coordinate, GeometryTemplates, Material, Metadata,
    Texture, Transform,
};
pub use error::{Error, Result};
pub use geometry::{
    Geometry, GeometryInstance, LineString, MaterialTheme, MaterialValues, MultiLineStringGeometry,
    MultiPointGeometry, MultiSolidGeometry, MultiSolidValues, MultiSurfaceGeometry, Ring,
    SemanticSurface, Semantics, Shell, ShellAppearance, ShellValues, SolidGeometry, SolidValues,
    Surface, TextureRing, TextureSurface, TextureTheme, VertexId,
};
