// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Chunked CityJSON parse pipeline
//!
//! ```rust,ignore
//! use cityjson_lite_processing::{ParseSession, ParserConfig, ParserMessage};
//!
//! let mut session = ParseSession::new(ParserConfig::from_env())?;
//! let mut loaded = session.load_json(&content)?;
//!
//! while let Some(message) = loaded.chunks.recv().await {
//!     match message {
//!         ParserMessage::ChunkLoaded(chunk) => upload(chunk),
//!         ParserMessage::Done => break,
//!     }
//! }
//! ```

pub mod chunk_parser;
pub mod config;
pub mod error;
pub mod session;
pub mod stream;

pub use chunk_parser::{ChunkMessage, ChunkParser, ParseSummary};
pub use config::{ParserConfig, DEFAULT_CHUNK_SIZE};
pub use error::{Error, Result};
pub use session::{LoadedDocument, ParseSession};
pub use stream::{spawn_parse, ChunkStream, ParserMessage};
