// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-vertex attribute accumulator
//!
//! A [`GeometryData`] holds one output chunk of one primitive kind as parallel
//! arrays. Row `i` of every array describes the `i`-th emitted vertex; there is
//! no index buffer, so every corner of a triangle or segment is stored with the
//! attributes of its face.
//!
//! Material and texture themes are sparse: a theme array only grows when a row
//! carries a value for it, and is back-filled with a sentinel first. Snapshots
//! pad every theme to [`GeometryData::count`].

use crate::error::{Error, Result};
use crate::shift::CoordinateShift;
use cityjson_lite_core::{Coordinate, VertexId};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Material index stored for rows without a value in a theme.
pub const MATERIAL_SENTINEL: i32 = -1;

/// Texture value stored for rows without a value in a theme.
pub const TEXTURE_SENTINEL: TextureValue = TextureValue {
    index: -1,
    uv: [0.0, 0.0],
};

/// Primitive kind of a [`GeometryData`], serialized as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GeometryType {
    Points = 0,
    Lines = 1,
    Triangles = 2,
}

impl GeometryType {
    /// Number of rows per primitive.
    #[inline]
    pub fn vertices_per_primitive(self) -> usize {
        match self {
            GeometryType::Points => 1,
            GeometryType::Lines => 2,
            GeometryType::Triangles => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GeometryType::Points => "points",
            GeometryType::Lines => "lines",
            GeometryType::Triangles => "triangles",
        }
    }
}

impl Serialize for GeometryType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Attributes shared by every row of one face (triangle, segment or point).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceAttributes {
    pub object_index: i32,
    pub object_type: i32,
    pub semantic_surface: i32,
    pub geometry_index: i32,
    pub boundary_index: i32,
    pub lod_index: i32,
}

impl Default for FaceAttributes {
    fn default() -> Self {
        Self {
            object_index: -1,
            object_type: -1,
            semantic_surface: -1,
            geometry_index: -1,
            boundary_index: -1,
            lod_index: -1,
        }
    }
}

/// Texture reference of one row: texture index plus UV coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureValue {
    pub index: i32,
    pub uv: [f32; 2],
}

/// Column pair of one texture theme.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextureArrays {
    pub index: Vec<i32>,
    pub uvs: Vec<[f32; 2]>,
}

impl TextureArrays {
    fn resize(&mut self, len: usize) {
        self.index.resize(len, TEXTURE_SENTINEL.index);
        self.uvs.resize(len, TEXTURE_SENTINEL.uv);
    }

    fn push(&mut self, value: TextureValue) {
        self.index.push(value.index);
        self.uvs.push(value.uv);
    }
}

/// Immutable, fully padded view of a [`GeometryData`] as sent to renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryDataSnapshot {
    pub geometry_type: GeometryType,
    pub object_ids: Vec<i32>,
    pub object_type: Vec<i32>,
    pub semantic_surfaces: Vec<i32>,
    pub geometry_ids: Vec<i32>,
    pub boundary_ids: Vec<i32>,
    pub lod_ids: Vec<i32>,
    pub materials: IndexMap<String, Vec<i32>>,
    pub textures: IndexMap<String, TextureArrays>,
}

impl GeometryDataSnapshot {
    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.object_ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.object_ids.is_empty()
    }
}

/// Parallel per-vertex attribute arrays for one primitive kind.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryData {
    geometry_type: GeometryType,
    vertex_ids: Vec<VertexId>,
    object_ids: Vec<i32>,
    object_type: Vec<i32>,
    semantic_surfaces: Vec<i32>,
    geometry_ids: Vec<i32>,
    boundary_ids: Vec<i32>,
    lod_ids: Vec<i32>,
    materials: IndexMap<String, Vec<i32>>,
    textures: IndexMap<String, TextureArrays>,
}

impl GeometryData {
    pub fn new(geometry_type: GeometryType) -> Self {
        Self {
            geometry_type,
            vertex_ids: Vec::new(),
            object_ids: Vec::new(),
            object_type: Vec::new(),
            semantic_surfaces: Vec::new(),
            geometry_ids: Vec::new(),
            boundary_ids: Vec::new(),
            lod_ids: Vec::new(),
            materials: IndexMap::new(),
            textures: IndexMap::new(),
        }
    }

    #[inline]
    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    /// Number of rows.
    #[inline]
    pub fn count(&self) -> usize {
        self.vertex_ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertex_ids.is_empty()
    }

    /// Append one row.
    ///
    /// `materials` and `textures` list only the themes that have a value for
    /// this row; every other theme is padded with its sentinel later.
    pub fn add_vertex(
        &mut self,
        vertex_id: VertexId,
        face: &FaceAttributes,
        materials: &[(&str, i32)],
        textures: &[(&str, TextureValue)],
    ) {
        self.vertex_ids.push(vertex_id);
        self.object_ids.push(face.object_index);
        self.object_type.push(face.object_type);
        self.semantic_surfaces.push(face.semantic_surface);
        self.geometry_ids.push(face.geometry_index);
        self.boundary_ids.push(face.boundary_index);
        self.lod_ids.push(face.lod_index);

        let row = self.count() - 1;

        for &(theme, value) in materials {
            let idx = match self.materials.get_index_of(theme) {
                Some(idx) => idx,
                None => self.materials.insert_full(theme.to_owned(), Vec::new()).0,
            };
            let column = &mut self.materials[idx];
            column.resize(row, MATERIAL_SENTINEL);
            column.push(value);
        }

        for &(theme, value) in textures {
            let idx = match self.textures.get_index_of(theme) {
                Some(idx) => idx,
                None => {
                    self.textures
                        .insert_full(theme.to_owned(), TextureArrays::default())
                        .0
                }
            };
            let column = &mut self.textures[idx];
            column.resize(row);
            column.push(value);
        }
    }

    pub fn vertex_ids(&self) -> &[VertexId] {
        &self.vertex_ids
    }

    pub fn object_ids(&self) -> &[i32] {
        &self.object_ids
    }

    pub fn object_type(&self) -> &[i32] {
        &self.object_type
    }

    pub fn semantic_surfaces(&self) -> &[i32] {
        &self.semantic_surfaces
    }

    pub fn geometry_ids(&self) -> &[i32] {
        &self.geometry_ids
    }

    pub fn boundary_ids(&self) -> &[i32] {
        &self.boundary_ids
    }

    pub fn lod_ids(&self) -> &[i32] {
        &self.lod_ids
    }

    /// Material columns. May be shorter than [`count`](Self::count) until
    /// the data is snapshotted.
    pub fn materials(&self) -> &IndexMap<String, Vec<i32>> {
        &self.materials
    }

    /// Texture columns. Same padding rules as [`materials`](Self::materials).
    pub fn textures(&self) -> &IndexMap<String, TextureArrays> {
        &self.textures
    }

    /// Dereference every row against a coordinate table into packed x,y,z.
    pub fn get_vertices(&self, vertices: &[Coordinate]) -> Result<Vec<f32>> {
        self.get_vertices_with_shift(vertices, &CoordinateShift::default())
    }

    /// Dereference every row, subtracting `shift` in f64 before the f32 cast.
    pub fn get_vertices_with_shift(
        &self,
        vertices: &[Coordinate],
        shift: &CoordinateShift,
    ) -> Result<Vec<f32>> {
        let mut buffer = Vec::with_capacity(self.vertex_ids.len() * 3);
        for &id in &self.vertex_ids {
            let v = vertices
                .get(id as usize)
                .ok_or(Error::VertexOutOfRange {
                    index: id as usize,
                    len: vertices.len(),
                })?;
            buffer.extend_from_slice(&shift.apply(v));
        }
        Ok(buffer)
    }

    /// Overwrite the object index of every row.
    pub fn set_object_id(&mut self, object_index: i32) {
        self.object_ids.fill(object_index);
    }

    /// Overwrite the object type code of every row.
    pub fn set_object_type(&mut self, object_type: i32) {
        self.object_type.fill(object_type);
    }

    /// Overwrite the geometry index of every row.
    pub fn set_geometry_idx(&mut self, geometry_index: i32) {
        self.geometry_ids.fill(geometry_index);
    }

    /// Pad every theme column to `count()`.
    fn complete_themes(&mut self) {
        let len = self.count();
        for column in self.materials.values_mut() {
            column.resize(len, MATERIAL_SENTINEL);
        }
        for column in self.textures.values_mut() {
            column.resize(len);
        }
    }

    /// Padded snapshot; the accumulator keeps its rows.
    pub fn to_object(&mut self) -> GeometryDataSnapshot {
        self.complete_themes();
        GeometryDataSnapshot {
            geometry_type: self.geometry_type,
            object_ids: self.object_ids.clone(),
            object_type: self.object_type.clone(),
            semantic_surfaces: self.semantic_surfaces.clone(),
            geometry_ids: self.geometry_ids.clone(),
            boundary_ids: self.boundary_ids.clone(),
            lod_ids: self.lod_ids.clone(),
            materials: self.materials.clone(),
            textures: self.textures.clone(),
        }
    }

    /// Padded snapshot that consumes the accumulator.
    pub fn into_object(mut self) -> GeometryDataSnapshot {
        self.complete_themes();
        GeometryDataSnapshot {
            geometry_type: self.geometry_type,
            object_ids: self.object_ids,
            object_type: self.object_type,
            semantic_surfaces: self.semantic_surfaces,
            geometry_ids: self.geometry_ids,
            boundary_ids: self.boundary_ids,
            lod_ids: self.lod_ids,
            materials: self.materials,
            textures: self.textures,
        }
    }

    /// Drop all rows and themes, keeping the kind.
    pub fn clean(&mut self) {
        self.vertex_ids.clear();
        self.object_ids.clear();
        self.object_type.clear();
        self.semantic_surfaces.clear();
        self.geometry_ids.clear();
        self.boundary_ids.clear();
        self.lod_ids.clear();
        self.materials.clear();
        self.textures.clear();
    }

    /// Move the rows out, leaving an empty accumulator of the same kind.
    pub fn take(&mut self) -> GeometryData {
        let kind = self.geometry_type;
        std::mem::replace(self, GeometryData::new(kind))
    }
}
