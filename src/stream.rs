//! Bridges an upstream chunk producer to an async consumer through a
//! typed-event channel, so the consumer sees every produced chunk, in order,
//! before any failure is raised.

use futures::{ Stream, StreamExt };
use log::error;
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::llm::ChunkStream;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("stream failed: {0}")]
pub struct StreamError(pub String);

/// Protocol between the producer task and the consumer. Completion and
/// failure travel through the channel as variants of their own rather than
/// in-band marker strings.
#[derive(Debug)]
pub enum StreamEvent {
    Chunk(String),
    Failed(String),
    Done,
}

pub type BridgedStream = Pin<Box<dyn Stream<Item = Result<String, StreamError>> + Send>>;

struct ConsumerState {
    rx: mpsc::Receiver<StreamEvent>,
    finished: bool,
}

/// Spawns a producer task that drains `upstream` into a bounded channel and
/// returns the consumer side as a stream. Chunks are yielded in production
/// order; a producer failure surfaces as one final `StreamError` item after
/// every chunk received before it.
pub fn bridge(upstream: ChunkStream) -> BridgedStream {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut upstream = upstream;
        while let Some(item) = upstream.next().await {
            match item {
                Ok(chunk) => {
                    if tx.send(StreamEvent::Chunk(chunk)).await.is_err() {
                        // Consumer went away; stop producing.
                        return;
                    }
                }
                Err(e) => {
                    error!("Upstream streaming error: {}", e);
                    let _ = tx.send(StreamEvent::Failed(e.to_string())).await;
                    break;
                }
            }
        }
        let _ = tx.send(StreamEvent::Done).await;
    });

    let state = ConsumerState { rx, finished: false };
    Box::pin(
        futures::stream::unfold(state, |mut state| async move {
            if state.finished {
                return None;
            }
            match state.rx.recv().await {
                Some(StreamEvent::Chunk(text)) => Some((Ok(text), state)),
                Some(StreamEvent::Failed(reason)) => {
                    state.finished = true;
                    Some((Err(StreamError(reason)), state))
                }
                Some(StreamEvent::Done) | None => None,
            }
        })
    )
}
