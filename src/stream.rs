//! Reply stream - turns a streamed response body into text events
//!
//! The body is read on its own tokio task so the consumer can stop caring
//! about it at any time: cancelling the token (or dropping the handle) ends
//! the read loop at the next await point.

use crate::transport::ChunkStream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Channel capacity between the read task and the consumer
const REPLY_BUFFER: usize = 64;

/// What the consumer sees of a streamed reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    /// Newly decoded text, to be appended to the assistant message
    Chunk(String),
    /// The body ended normally
    Finished,
    /// The body broke off; no further events follow
    Interrupted(String),
}

/// Incremental UTF-8 decoder.
///
/// Holds back an incomplete trailing sequence until the next chunk arrives.
/// Invalid bytes decode to U+FFFD instead of failing the stream.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Truncated sequence at the end: wait for more bytes.
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Flush at end of stream; a dangling partial sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        char::REPLACEMENT_CHARACTER.to_string()
    }
}

/// Consumer side of a reply being read in the background
pub struct ReplyHandle {
    events: mpsc::Receiver<ReplyEvent>,
    cancel: CancellationToken,
}

impl ReplyHandle {
    /// Next event, or `None` once the reader has stopped (after a terminal
    /// event or a cancellation).
    pub async fn next_event(&mut self) -> Option<ReplyEvent> {
        self.events.recv().await
    }

    /// Stop reading the body. Events already buffered are dropped.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.events.close();
        while self.events.try_recv().is_ok() {}
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A token that cancels this reply when triggered from elsewhere
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for ReplyHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the read loop for a streamed body.
pub fn spawn_reply(chunks: ChunkStream) -> ReplyHandle {
    let (tx, rx) = mpsc::channel(REPLY_BUFFER);
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        let mut chunks = chunks;
        let mut decoder = Utf8Decoder::default();
        let mut received = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(bytes = received, "reply stream cancelled");
                    return;
                }
                next = chunks.next() => next,
            };

            let (event, last) = match next {
                Some(Ok(bytes)) => {
                    received += bytes.len();
                    let text = decoder.decode(&bytes);
                    if text.is_empty() {
                        continue;
                    }
                    (ReplyEvent::Chunk(text), false)
                }
                Some(Err(e)) => {
                    debug!(bytes = received, error = %e, "reply stream interrupted");
                    (ReplyEvent::Interrupted(e.to_string()), true)
                }
                None => {
                    debug!(bytes = received, "reply stream finished");
                    (ReplyEvent::Finished, true)
                }
            };

            if last {
                let tail = decoder.finish();
                if !tail.is_empty() && tx.send(ReplyEvent::Chunk(tail)).await.is_err() {
                    return;
                }
            }
            if tx.send(event).await.is_err() || last {
                return;
            }
        }
    });

    ReplyHandle { events: rx, cancel }
}
