// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Document-level parse session
//!
//! A session owns the interner shared by every parser and by the instancer,
//! and the display frame. The frame is taken from the first loaded document
//! (bounding-box centre in x/y) and reused for every later load, so chunks of
//! all documents of one session share a single local coordinate system.

use crate::chunk_parser::ChunkParser;
use crate::config::ParserConfig;
use crate::error::Result;
use crate::stream::{spawn_parse, ChunkStream};
use cityjson_lite_core::{CityJsonDocument, ModelBounds};
use cityjson_lite_geometry::{
    CoordinateShift, InstancedTemplate, Instancer, InternTables, Interner, Matrix4,
};
use std::sync::{Arc, Mutex, PoisonError};

/// Result of [`ParseSession::load`].
pub struct LoadedDocument {
    /// Chunk messages, produced in the background
    pub chunks: ChunkStream,
    /// Resolved geometry instances, produced before `load` returned
    pub instances: Vec<InstancedTemplate>,
    /// Display frame of the emitted buffers
    pub shift: CoordinateShift,
}

/// Owns the interner and display frame shared by every document loaded
/// through it.
///
/// The interner sits behind a std `Mutex` that the background parse holds
/// until its last chunk is flushed. [`tables`](Self::tables) and
/// [`load`](Self::load) block the calling thread while a previous parse is
/// still running, so async callers should drain the previous
/// [`ChunkStream`] up to `Done` (the lock is released before `Done` is sent)
/// or call them from `spawn_blocking`.
pub struct ParseSession {
    config: ParserConfig,
    interner: Arc<Mutex<Interner>>,
    shift: Option<CoordinateShift>,
}

impl ParseSession {
    pub fn new(config: ParserConfig) -> Result<Self> {
        config.validate()?;
        let interner = config.build_interner();
        Ok(Self {
            config,
            interner: Arc::new(Mutex::new(interner)),
            shift: None,
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Display frame, once a document has been loaded.
    pub fn shift(&self) -> Option<CoordinateShift> {
        self.shift
    }

    /// Matrix taking world coordinates into the session's display frame.
    pub fn display_matrix(&self) -> Matrix4<f64> {
        self.shift.unwrap_or_default().to_matrix()
    }

    /// Copy of the interner tables. Blocks while a parse is running.
    pub fn tables(&self) -> InternTables {
        self.interner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tables()
    }

    /// Decompress the vertices and fix the display frame on first use.
    pub fn prepare(&mut self, doc: &mut CityJsonDocument) -> Result<CoordinateShift> {
        doc.apply_transform()?;

        let shift = *self.shift.get_or_insert_with(|| {
            let bounds = ModelBounds::from_vertices(&doc.vertices);
            let shift = CoordinateShift::from_bounds(&bounds);
            tracing::info!(
                x = shift.x,
                y = shift.y,
                significant = shift.is_significant(),
                "display frame fixed"
            );
            shift
        });

        Ok(shift)
    }

    /// Resolve instances on the caller's thread, then start the chunked
    /// parse in the background. Must be called within a tokio runtime, and
    /// blocks until a previous parse of this session has released the
    /// interner.
    pub fn load(&mut self, mut doc: CityJsonDocument) -> Result<LoadedDocument> {
        let shift = self.prepare(&mut doc)?;

        let instances = {
            let mut interner = self.interner.lock().unwrap_or_else(PoisonError::into_inner);
            Instancer::with_shift(shift).run(&doc, &mut interner)?
        };

        let parser = ChunkParser::with_chunk_size(self.config.chunk_size).with_shift(shift);
        let chunks = spawn_parse(Arc::new(doc), Arc::clone(&self.interner), parser);

        Ok(LoadedDocument {
            chunks,
            instances,
            shift,
        })
    }

    /// [`load`](Self::load) from JSON text.
    pub fn load_json(&mut self, content: &str) -> Result<LoadedDocument> {
        let doc = CityJsonDocument::from_json(content)?;
        self.load(doc)
    }
}
