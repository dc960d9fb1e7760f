// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry parsers
//!
//! One parser per output primitive kind. Each walks the boundaries of the
//! geometry kinds it handles and appends rows to its own [`GeometryData`]:
//!
//! - `triangle`: MultiSurface, CompositeSurface, Solid, MultiSolid, CompositeSolid
//! - `line`: MultiLineString
//! - `point`: MultiPoint
//!
//! GeometryInstance and unknown geometry types are handled by no parser.

mod line;
mod point;
mod triangle;


pub use line::LineParser;
pub use point::PointParser;
pub use triangle::TriangleParser;

use crate::geometry_data::{FaceAttributes, GeometryData, GeometryType};
use crate::interner::Interner;
use cityjson_lite_core::{CityJsonDocument, Coordinate, Geometry};

/// Identity of the object a geometry belongs to.
///
/// Template geometries have no owning object: every field is -1 / `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometrySource<'a> {
    pub object_index: i32,
    pub object_type: Option<&'a str>,
    pub geometry_index: i32,
}

impl<'a> GeometrySource<'a> {
    pub fn new(object_index: usize, object_type: &'a str, geometry_index: usize) -> Self {
        Self {
            object_index: object_index as i32,
            object_type: Some(object_type),
            geometry_index: geometry_index as i32,
        }
    }

    /// Source of a template geometry.
    pub fn template() -> Self {
        Self {
            object_index: -1,
            object_type: None,
            geometry_index: -1,
        }
    }
}

/// Coordinate tables a geometry's vertex ids resolve against.
#[derive(Debug, Clone, Copy)]
pub struct VertexTables<'a> {
    pub vertices: &'a [Coordinate],
    pub uvs: &'a [[f64; 2]],
}

impl<'a> VertexTables<'a> {
    /// World `vertices` of `doc` (see [`CityJsonDocument::world_vertices`])
    /// and its texture UVs.
    pub fn document(doc: &'a CityJsonDocument, vertices: &'a [Coordinate]) -> Self {
        Self {
            vertices,
            uvs: doc.texture_vertices(),
        }
    }

    /// Template vertices and texture UVs.
    pub fn templates(doc: &'a CityJsonDocument) -> Self {
        Self {
            vertices: doc.template_vertices(),
            uvs: doc.texture_vertices(),
        }
    }

    /// True if `id` resolves to a coordinate.
    #[inline]
    pub fn contains(&self, id: u32) -> bool {
        (id as usize) < self.vertices.len()
    }
}

/// Geometry parser trait
/// Each parser produces one primitive kind
pub trait GeometryParser: Send {
    /// Primitive kind of the rows this parser emits
    fn geometry_type(&self) -> GeometryType;

    /// Whether this parser consumes the given geometry kind
    fn handles(&self, geometry: &Geometry) -> bool;

    /// Append the rows of one geometry. Geometries this parser does not
    /// handle are ignored; malformed parts are skipped.
    fn parse_geometry(
        &mut self,
        geometry: &Geometry,
        source: &GeometrySource<'_>,
        tables: &VertexTables<'_>,
        interner: &mut Interner,
    );

    fn data(&self) -> &GeometryData;

    fn data_mut(&mut self) -> &mut GeometryData;

    /// Number of pending rows
    fn count(&self) -> usize {
        self.data().count()
    }

    /// Move the pending rows out
    fn take(&mut self) -> GeometryData {
        self.data_mut().take()
    }

    /// Drop the pending rows
    fn clean(&mut self) {
        self.data_mut().clean()
    }
}

/// One parser of every kind, in flush order.
pub fn default_parsers() -> Vec<Box<dyn GeometryParser>> {
    vec![
        Box::new(TriangleParser::new()),
        Box::new(LineParser::new()),
        Box::new(PointParser::new()),
    ]
}

/// Codes shared by every face of one geometry.
pub(crate) fn geometry_face(
    geometry: &Geometry,
    source: &GeometrySource<'_>,
    interner: &mut Interner,
) -> FaceAttributes {
    let object_type = source
        .object_type
        .map_or(-1, |name| interner.intern_object_type(name));
    let lod_index = interner.intern_lod(geometry.lod());

    FaceAttributes {
        object_index: source.object_index,
        object_type,
        semantic_surface: -1,
        geometry_index: source.geometry_index,
        boundary_index: -1,
        lod_index,
    }
}
