// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background parsing with an ordered chunk channel
//!
//! The parse loop runs on tokio's blocking pool and pushes messages into an
//! unbounded channel as chunks are flushed. Each vertex buffer is moved into
//! its message. A successful parse ends with exactly one
//! [`ParserMessage::Done`]; a failed or panicking parse is logged and the
//! channel simply closes.

use crate::chunk_parser::{ChunkMessage, ChunkParser, ParseSummary};
use crate::error::Result;
use cityjson_lite_core::CityJsonDocument;
use cityjson_lite_geometry::Interner;
use futures::Stream;
use serde::Serialize;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Message sent from the background parse to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ParserMessage {
    ChunkLoaded(ChunkMessage),
    Done,
}

/// Receiving end of a background parse.
pub struct ChunkStream {
    rx: mpsc::UnboundedReceiver<ParserMessage>,
    handle: JoinHandle<Result<ParseSummary>>,
}

impl ChunkStream {
    /// Next message, or `None` once the parse has ended.
    pub async fn recv(&mut self) -> Option<ParserMessage> {
        self.rx.recv().await
    }

    /// Wait for the background task and return its summary.
    ///
    /// Messages still queued are discarded.
    pub async fn finish(self) -> Result<ParseSummary> {
        drop(self.rx);
        self.handle.await?
    }
}

impl Stream for ChunkStream {
    type Item = ParserMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Parse `doc` on the blocking pool. Must be called within a tokio runtime.
///
/// The interner stays locked for the duration of the parse and is released
/// before `Done` is sent.
pub fn spawn_parse(
    doc: Arc<CityJsonDocument>,
    interner: Arc<Mutex<Interner>>,
    mut parser: ChunkParser,
) -> ChunkStream {
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::task::spawn_blocking(move || {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut interner = interner.lock().unwrap_or_else(PoisonError::into_inner);
            parser.parse(&doc, &mut interner, |chunk| {
                // A dropped receiver only means nobody is listening any more
                let _ = tx.send(ParserMessage::ChunkLoaded(chunk));
            })
        }));

        match outcome {
            Ok(Ok(summary)) => {
                let _ = tx.send(ParserMessage::Done);
                Ok(summary)
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "background parse failed");
                Err(e)
            }
            Err(panic) => {
                tracing::error!("background parse panicked");
                drop(tx);
                resume_unwind(panic)
            }
        }
    });

    ChunkStream { rx, handle }
}
