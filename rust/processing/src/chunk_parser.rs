// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Chunked document parsing
//!
//! CityObjects are walked in document order and fed to one parser per
//! primitive kind. Once more than `chunk_size` objects are pending, the rows
//! of each parser are dereferenced into a vertex buffer and handed to the
//! caller as a [`ChunkMessage`]; a final flush marks the last messages
//! `finished`.
//!
//! Chunk boundaries follow object count only, so one very large object still
//! lands in a single chunk.

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::Result;
use cityjson_lite_core::{CityJsonDocument, Coordinate, Geometry};
use cityjson_lite_geometry::{
    default_parsers, CoordinateShift, GeometryDataSnapshot, GeometryParser, GeometrySource,
    InternTables, Interner, VertexTables,
};
use serde::Serialize;

/// One flushed chunk of one primitive kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMessage {
    /// Packed x,y,z positions, one per row of `geometry_data`
    pub vertex_buffer: Vec<f32>,
    pub geometry_data: GeometryDataSnapshot,
    /// Interner tables as of this flush
    #[serde(flatten)]
    pub tables: InternTables,
    pub finished: bool,
}

/// Counters reported by [`ChunkParser::parse`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    pub objects: usize,
    pub geometries: usize,
    pub chunks: usize,
    pub rows: usize,
}

/// Walks a document and emits chunk messages through a callback.
pub struct ChunkParser {
    chunk_size: usize,
    shift: CoordinateShift,
    parsers: Vec<Box<dyn GeometryParser>>,
}

impl ChunkParser {
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// `usize::MAX` keeps the whole document in one chunk.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            shift: CoordinateShift::default(),
            parsers: default_parsers(),
        }
    }

    /// Subtract `shift` from every emitted position.
    pub fn with_shift(mut self, shift: CoordinateShift) -> Self {
        self.shift = shift;
        self
    }

    /// Replace the primitive parsers. Each geometry is offered to every
    /// parser that reports it `handles` it.
    pub fn with_parsers(mut self, parsers: Vec<Box<dyn GeometryParser>>) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Parse every CityObject, calling `on_chunk` for each flushed chunk in
    /// emission order.
    pub fn parse<F>(
        &mut self,
        doc: &CityJsonDocument,
        interner: &mut Interner,
        mut on_chunk: F,
    ) -> Result<ParseSummary>
    where
        F: FnMut(ChunkMessage),
    {
        for parser in self.parsers.iter_mut() {
            parser.clean();
        }

        tracing::info!(
            objects = doc.city_objects.len(),
            vertices = doc.vertices.len(),
            chunk_size = self.chunk_size,
            "parsing city objects"
        );

        // Compressed documents are decompressed here if the caller has not
        // applied the transform
        let vertices = doc.world_vertices()?;
        let tables = VertexTables::document(doc, &vertices);
        let mut summary = ParseSummary::default();
        let mut counter = 0usize;

        for (object_index, (id, object)) in doc.city_objects.iter().enumerate() {
            for (geometry_index, geometry) in object.geometry.iter().enumerate() {
                let source = GeometrySource::new(object_index, &object.object_type, geometry_index);
                let mut handled = false;

                for parser in self.parsers.iter_mut() {
                    if parser.handles(geometry) {
                        parser.parse_geometry(geometry, &source, &tables, interner);
                        handled = true;
                    }
                }

                // Instances are resolved by the Instancer
                if !handled && !matches!(geometry, Geometry::GeometryInstance(_)) {
                    tracing::debug!(
                        object = %id,
                        geometry = geometry_index,
                        geometry_type = geometry.type_name(),
                        "ignoring unsupported geometry"
                    );
                }
                summary.geometries += 1;
            }

            summary.objects += 1;
            counter += 1;
            if counter > self.chunk_size {
                self.flush(&vertices, interner, false, &mut on_chunk, &mut summary)?;
                counter = 0;
            }
        }

        self.flush(&vertices, interner, true, &mut on_chunk, &mut summary)?;

        tracing::info!(
            objects = summary.objects,
            geometries = summary.geometries,
            chunks = summary.chunks,
            rows = summary.rows,
            "finished parsing city objects"
        );

        Ok(summary)
    }

    /// Emit one message per parser with pending rows and reset those parsers.
    fn flush<F>(
        &mut self,
        vertices: &[Coordinate],
        interner: &Interner,
        finished: bool,
        on_chunk: &mut F,
        summary: &mut ParseSummary,
    ) -> Result<()>
    where
        F: FnMut(ChunkMessage),
    {
        let shift = self.shift;

        for parser in self.parsers.iter_mut() {
            if parser.count() == 0 {
                continue;
            }

            let data = parser.take();
            let vertex_buffer = data.get_vertices_with_shift(vertices, &shift)?;
            let geometry_data = data.into_object();

            tracing::debug!(
                kind = geometry_data.geometry_type.as_str(),
                rows = geometry_data.len(),
                finished,
                "flushing chunk"
            );

            summary.chunks += 1;
            summary.rows += geometry_data.len();

            on_chunk(ChunkMessage {
                vertex_buffer,
                geometry_data,
                tables: interner.tables(),
                finished,
            });
        }

        Ok(())
    }
}

impl Default for ChunkParser {
    fn default() -> Self {
        Self::new()
    }
}
