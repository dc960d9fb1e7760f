// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MultiLineString to segment rows.

use super::{geometry_face, GeometryParser, GeometrySource, VertexTables};
use crate::geometry_data::{FaceAttributes, GeometryData, GeometryType};
use crate::interner::Interner;
use cityjson_lite_core::Geometry;

/// Line parser
/// Emits each line string of N vertices as N-1 two-row segments
pub struct LineParser {
    data: GeometryData,
}

impl LineParser {
    pub fn new() -> Self {
        Self {
            data: GeometryData::new(GeometryType::Lines),
        }
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryParser for LineParser {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::Lines
    }

    fn handles(&self, geometry: &Geometry) -> bool {
        matches!(geometry, Geometry::MultiLineString(_))
    }

    fn parse_geometry(
        &mut self,
        geometry: &Geometry,
        source: &GeometrySource<'_>,
        tables: &VertexTables<'_>,
        interner: &mut Interner,
    ) {
        let Geometry::MultiLineString(g) = geometry else {
            return;
        };

        let face = geometry_face(geometry, source, interner);
        let (semantics, surfaces) = match &g.semantics {
            Some(s) => (Some(s.values.as_slice()), s.surfaces.as_slice()),
            None => (None, &[][..]),
        };

        for (i, line) in g.boundaries.iter().enumerate() {
            let semantic_surface = interner.intern_surface_type(i, semantics, surfaces);

            if line.len() < 2 {
                tracing::debug!(line = i, vertices = line.len(), "skipping degenerate line string");
                continue;
            }

            let face = FaceAttributes {
                semantic_surface,
                boundary_index: i as i32,
                ..face
            };

            for segment in line.windows(2) {
                if !(tables.contains(segment[0]) && tables.contains(segment[1])) {
                    tracing::debug!(line = i, segment = ?segment, "skipping segment with unknown vertex");
                    continue;
                }
                self.data.add_vertex(segment[0], &face, &[], &[]);
                self.data.add_vertex(segment[1], &face, &[], &[]);
            }
        }
    }

    fn data(&self) -> &GeometryData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut GeometryData {
        &mut self.data
    }
}
