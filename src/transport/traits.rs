//! Trait abstraction for the chat backend REST surface

use super::error::TransportResult;
use crate::models::{Message, Session, SessionId};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Raw body chunks of a streamed reply, in arrival order.
///
/// Chunks are undecoded bytes: a multi-byte UTF-8 character may be split
/// across two items. See [`crate::stream::Utf8Decoder`].
pub type ChunkStream = BoxStream<'static, TransportResult<Vec<u8>>>;

/// Every backend operation the client performs.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    // ========================================================================
    // Sessions
    // ========================================================================

    /// `GET /sessions/`
    async fn list_sessions(&self) -> TransportResult<Vec<Session>>;

    /// `POST /sessions/`
    async fn create_session(&self, title: &str) -> TransportResult<Session>;

    /// `PUT /sessions/{id}`
    async fn rename_session(&self, id: &SessionId, title: &str) -> TransportResult<Session>;

    /// `DELETE /sessions/{id}`
    async fn delete_session(&self, id: &SessionId) -> TransportResult<()>;

    // ========================================================================
    // Messages
    // ========================================================================

    /// `GET /msgs/{id}` - full history, oldest first
    async fn history(&self, id: &SessionId) -> TransportResult<Vec<Message>>;

    /// `POST /msgs/{id}` - resolves once response headers arrive; the body
    /// is consumed through the returned stream.
    async fn send_message(
        &self,
        id: &SessionId,
        text: &str,
        model: &str,
    ) -> TransportResult<ChunkStream>;

    // ========================================================================
    // Misc
    // ========================================================================

    /// `GET /` - returns the backend's greeting
    async fn ping(&self) -> TransportResult<String>;
}
