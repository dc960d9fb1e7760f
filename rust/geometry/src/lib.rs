// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CityJSON-Lite Geometry Processing
//!
//! Turns CityJSON geometries into flat, renderer-ready attribute arrays using
//! earcutr triangulation and nalgebra for transformations.
//!
//! - [`GeometryData`]: parallel per-vertex arrays for one primitive kind
//! - [`Interner`]: shared name-to-code tables (object types, surfaces, LoDs)
//! - [`TriangleParser`], [`LineParser`], [`PointParser`]: boundary walkers
//! - [`Instancer`]: geometry templates and their instances

pub mod error;
pub mod geometry_data;
pub mod instancer;
pub mod interner;
pub mod parsers;
pub mod shift;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector3};

pub use error::{Error, Result};
pub use geometry_data::{
    FaceAttributes, GeometryData, GeometryDataSnapshot, GeometryType, TextureArrays,
    TextureValue, MATERIAL_SENTINEL, TEXTURE_SENTINEL,
};
pub use instancer::{
    InstanceSet, InstancedTemplate, Instancer, MaterializedInstance, SharedTemplate,
    TemplateGeometry,
};
pub use interner::{InternTables, Interner, DEFAULT_OBJECT_COLORS, DEFAULT_SURFACE_COLORS};
pub use parsers::{
    default_parsers, GeometryParser, GeometrySource, LineParser, PointParser, TriangleParser,
    VertexTables,
};
pub use shift::CoordinateShift;
pub use triangulation::{newell_normal, triangulate_ring_set};
