// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surface-based geometries to triangle rows.

use super::{geometry_face, GeometryParser, GeometrySource, VertexTables};
use crate::geometry_data::{FaceAttributes, GeometryData, GeometryType};
use crate::interner::Interner;
use crate::triangulation::triangulate_ring_set;
use cityjson_lite_core::{Geometry, Shell, ShellAppearance, VertexId};
use smallvec::SmallVec;

/// Triangle parser
/// Handles MultiSurface, CompositeSurface, Solid, MultiSolid and CompositeSolid
pub struct TriangleParser {
    data: GeometryData,
}

impl TriangleParser {
    pub fn new() -> Self {
        Self {
            data: GeometryData::new(GeometryType::Triangles),
        }
    }

    /// Triangulate every surface of one shell.
    ///
    /// `face` carries the per-geometry codes; the boundary index and semantic
    /// surface code are filled in per surface.
    pub fn parse_shell(
        &mut self,
        shell: &Shell,
        appearance: &ShellAppearance<'_>,
        face: FaceAttributes,
        tables: &VertexTables<'_>,
        interner: &mut Interner,
    ) {
        let mut boundary: SmallVec<[VertexId; 16]> = SmallVec::new();
        let mut holes: SmallVec<[usize; 4]> = SmallVec::new();
        // Source ring index of each ring kept in `boundary`
        let mut rings: SmallVec<[usize; 4]> = SmallVec::new();

        for (i, surface) in shell.iter().enumerate() {
            let semantic_surface =
                interner.intern_surface_type(i, appearance.semantics, appearance.surfaces);

            let outer = surface.first().map_or(0, Vec::len);
            if outer < 3 {
                tracing::debug!(
                    surface = i,
                    vertices = outer,
                    "skipping degenerate surface"
                );
                continue;
            }

            boundary.clear();
            holes.clear();
            rings.clear();
            for (r, ring) in surface.iter().enumerate() {
                if r > 0 {
                    if ring.len() < 3 {
                        tracing::debug!(
                            surface = i,
                            ring = r,
                            vertices = ring.len(),
                            "skipping degenerate hole"
                        );
                        continue;
                    }
                    holes.push(boundary.len());
                }
                rings.push(r);
                boundary.extend_from_slice(ring);
            }

            let triangles = match triangulate_ring_set(&boundary, &holes, tables.vertices) {
                Ok(triangles) => triangles,
                Err(e) => {
                    tracing::debug!(surface = i, error = %e, "skipping untriangulable surface");
                    continue;
                }
            };

            let materials = Interner::extract_theme_values(&appearance.materials, i);
            let face = FaceAttributes {
                semantic_surface,
                boundary_index: i as i32,
                ..face
            };

            for &corner in &triangles {
                let textures = if appearance.textures.is_empty() {
                    SmallVec::new()
                } else {
                    Interner::extract_texture_uv(
                        i,
                        corner,
                        &holes,
                        &rings,
                        &appearance.textures,
                        tables.uvs,
                    )
                };
                self.data
                    .add_vertex(boundary[corner], &face, &materials, &textures);
            }
        }
    }
}

impl Default for TriangleParser {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryParser for TriangleParser {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::Triangles
    }

    fn handles(&self, geometry: &Geometry) -> bool {
        geometry.is_surface_based()
    }

    fn parse_geometry(
        &mut self,
        geometry: &Geometry,
        source: &GeometrySource<'_>,
        tables: &VertexTables<'_>,
        interner: &mut Interner,
    ) {
        if !self.handles(geometry) {
            return;
        }

        let face = geometry_face(geometry, source, interner);

        match geometry {
            Geometry::MultiSurface(g) | Geometry::CompositeSurface(g) => {
                let (shell, appearance) = g.shell();
                self.parse_shell(shell, &appearance, face, tables, interner);
            }
            Geometry::Solid(g) => {
                for (shell, appearance) in g.shells() {
                    self.parse_shell(shell, &appearance, face, tables, interner);
                }
            }
            Geometry::MultiSolid(g) | Geometry::CompositeSolid(g) => {
                for (shell, appearance) in g.shells() {
                    self.parse_shell(shell, &appearance, face, tables, interner);
                }
            }
            _ => {}
        }
    }

    fn data(&self) -> &GeometryData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut GeometryData {
        &mut self.data
    }
}
