//! In-memory mock implementation of ChatBackend for testing without a server.

use super::error::{TransportError, TransportResult};
use super::traits::{ChatBackend, ChunkStream};
use crate::models::{Message, Session, SessionId};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::RwLock;

/// A backend call as observed by the mock, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    ListSessions,
    CreateSession(String),
    RenameSession(SessionId, String),
    DeleteSession(SessionId),
    History(SessionId),
    SendMessage {
        id: SessionId,
        text: String,
        model: String,
    },
    Ping,
}

/// Canned reply body for the next `send_message`.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Deliver these chunks, then end the stream normally
    Chunks(Vec<Vec<u8>>),
    /// Deliver these chunks, then fail with the given reason
    Interrupted(Vec<Vec<u8>>, String),
}

impl ScriptedReply {
    /// Text chunks, each delivered as one body read
    pub fn text(chunks: &[&str]) -> Self {
        Self::Chunks(chunks.iter().map(|c| c.as_bytes().to_vec()).collect())
    }
}

/// In-memory chat backend.
///
/// Behaves like the real server: sessions get increasing integer ids, sent
/// messages and full replies are appended to the session's history, and
/// unknown ids answer 404. Replies come from a FIFO of [`ScriptedReply`];
/// when it is empty the mock echoes the user text back in one chunk.
///
/// # Example
///
/// ```rust
/// use ollama_chat_client::transport::{ChatBackend, MockBackend};
///
/// # tokio_test::block_on(async {
/// let backend = MockBackend::new();
/// let session = backend.create_session("Notes").await.unwrap();
/// let sessions = backend.list_sessions().await.unwrap();
/// assert_eq!(sessions, vec![session]);
/// # });
/// ```
pub struct MockBackend {
    sessions: RwLock<Vec<Session>>,
    histories: RwLock<HashMap<SessionId, Vec<Message>>>,
    replies: RwLock<VecDeque<ScriptedReply>>,
    calls: RwLock<Vec<BackendCall>>,
    next_id: AtomicI64,
    offline: AtomicBool,
}

impl MockBackend {
    /// Create a new empty mock backend.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(Vec::new()),
            histories: RwLock::new(HashMap::new()),
            replies: RwLock::new(VecDeque::new()),
            calls: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
            offline: AtomicBool::new(false),
        }
    }

    /// Seed a session with a history. Ids are bumped past any numeric seed.
    pub fn with_session(mut self, session: Session, history: Vec<Message>) -> Self {
        if let Ok(n) = session.id.as_str().parse::<i64>() {
            let next = self.next_id.get_mut();
            *next = (*next).max(n + 1);
        }
        self.histories
            .get_mut()
            .insert(session.id.clone(), history);
        self.sessions.get_mut().push(session);
        self
    }

    /// Queue the body for the next `send_message`
    pub async fn push_reply(&self, reply: ScriptedReply) {
        self.replies.write().await.push_back(reply);
    }

    /// When offline every call fails with 503
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Calls made so far, oldest first
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.calls.read().await.clone()
    }

    /// Number of calls made so far
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Server-side history of a session
    pub async fn stored_history(&self, id: &SessionId) -> Vec<Message> {
        self.histories
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    async fn record(&self, call: BackendCall) -> TransportResult<()> {
        self.calls.write().await.push(call);
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                detail: "backend offline".into(),
            });
        }
        Ok(())
    }

    fn not_found() -> TransportError {
        TransportError::Status {
            status: StatusCode::NOT_FOUND,
            detail: "Session not found".into(),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn list_sessions(&self) -> TransportResult<Vec<Session>> {
        self.record(BackendCall::ListSessions).await?;
        Ok(self.sessions.read().await.clone())
    }

    async fn create_session(&self, title: &str) -> TransportResult<Session> {
        self.record(BackendCall::CreateSession(title.to_string()))
            .await?;
        let id = SessionId::from(self.next_id.fetch_add(1, Ordering::SeqCst));
        let session = Session {
            id: id.clone(),
            title: title.to_string(),
        };
        self.sessions.write().await.push(session.clone());
        self.histories.write().await.insert(id, Vec::new());
        Ok(session)
    }

    async fn rename_session(&self, id: &SessionId, title: &str) -> TransportResult<Session> {
        self.record(BackendCall::RenameSession(id.clone(), title.to_string()))
            .await?;
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(Self::not_found)?;
        session.title = title.to_string();
        Ok(session.clone())
    }

    async fn delete_session(&self, id: &SessionId) -> TransportResult<()> {
        self.record(BackendCall::DeleteSession(id.clone())).await?;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| &s.id != id);
        if sessions.len() == before {
            return Err(Self::not_found());
        }
        self.histories.write().await.remove(id);
        Ok(())
    }

    async fn history(&self, id: &SessionId) -> TransportResult<Vec<Message>> {
        self.record(BackendCall::History(id.clone())).await?;
        // Unknown ids yield an empty history, as the real backend does.
        Ok(self.stored_history(id).await)
    }

    async fn send_message(
        &self,
        id: &SessionId,
        text: &str,
        model: &str,
    ) -> TransportResult<ChunkStream> {
        self.record(BackendCall::SendMessage {
            id: id.clone(),
            text: text.to_string(),
            model: model.to_string(),
        })
        .await?;

        let mut histories = self.histories.write().await;
        let history = histories.get_mut(id).ok_or_else(Self::not_found)?;
        history.push(Message::user(text));

        let reply = self
            .replies
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::Chunks(vec![text.as_bytes().to_vec()]));

        let (chunks, failure) = match reply {
            ScriptedReply::Chunks(chunks) => (chunks, None),
            ScriptedReply::Interrupted(chunks, reason) => (chunks, Some(reason)),
        };

        let full: Vec<u8> = chunks.iter().flatten().copied().collect();
        history.push(Message::assistant(String::from_utf8_lossy(&full)));

        let items = chunks
            .into_iter()
            .map(Ok)
            .chain(failure.map(|reason| Err(TransportError::Stream(reason))));
        Ok(futures::stream::iter(items).boxed())
    }

    async fn ping(&self) -> TransportResult<String> {
        self.record(BackendCall::Ping).await?;
        Ok("mock backend up".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let backend = MockBackend::new().with_session(
            Session {
                id: SessionId::from(4),
                title: "seed".into(),
            },
            vec![],
        );
        let created = backend.create_session("next").await.unwrap();
        assert_eq!(created.id, SessionId::from(5));
        assert_eq!(backend.list_sessions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let backend = MockBackend::new();
        let err = backend
            .delete_session(&SessionId::from(9))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_scripted_reply_is_streamed_and_stored() {
        let backend = MockBackend::new();
        let session = backend.create_session("s").await.unwrap();
        backend.push_reply(ScriptedReply::text(&["He", "llo!"])).await;

        let chunks: Vec<Vec<u8>> = backend
            .send_message(&session.id, "hello", "m")
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks, vec![b"He".to_vec(), b"llo!".to_vec()]);

        let stored = backend.stored_history(&session.id).await;
        assert_eq!(stored, vec![Message::user("hello"), Message::assistant("Hello!")]);
    }

    #[tokio::test]
    async fn test_offline_fails_but_records() {
        let backend = MockBackend::new();
        backend.set_offline(true);
        assert!(backend.list_sessions().await.is_err());
        assert_eq!(backend.calls().await, vec![BackendCall::ListSessions]);
    }
}
