// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MultiPoint to point rows.

use super::{geometry_face, GeometryParser, GeometrySource, VertexTables};
use crate::geometry_data::{FaceAttributes, GeometryData, GeometryType};
use crate::interner::Interner;
use cityjson_lite_core::Geometry;

/// Point parser
/// Emits one row per point; the boundary index is the point's position
pub struct PointParser {
    data: GeometryData,
}

impl PointParser {
    pub fn new() -> Self {
        Self {
            data: GeometryData::new(GeometryType::Points),
        }
    }
}

impl Default for PointParser {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryParser for PointParser {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::Points
    }

    fn handles(&self, geometry: &Geometry) -> bool {
        matches!(geometry, Geometry::MultiPoint(_))
    }

    fn parse_geometry(
        &mut self,
        geometry: &Geometry,
        source: &GeometrySource<'_>,
        tables: &VertexTables<'_>,
        interner: &mut Interner,
    ) {
        let Geometry::MultiPoint(g) = geometry else {
            return;
        };

        let face = geometry_face(geometry, source, interner);
        let (semantics, surfaces) = match &g.semantics {
            Some(s) => (Some(s.values.as_slice()), s.surfaces.as_slice()),
            None => (None, &[][..]),
        };

        for (i, &point) in g.boundaries.iter().enumerate() {
            if !tables.contains(point) {
                tracing::debug!(point = i, vertex = point, "skipping point with unknown vertex");
                continue;
            }

            let face = FaceAttributes {
                semantic_surface: interner.intern_surface_type(i, semantics, surfaces),
                boundary_index: i as i32,
                ..face
            };
            self.data.add_vertex(point, &face, &[], &[]);
        }
    }

    fn data(&self) -> &GeometryData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut GeometryData {
        &mut self.data
    }
}
