//! App - the view binder
//!
//! Owns all client state and wires user intents to backend calls:
//! user action → `App` method → `ChatBackend` → store update → `View`.
//!
//! Every failed request leaves a [`Notice`] on the state (and tells the
//! view) instead of failing silently. The error is also returned so one-shot
//! commands can exit non-zero.

use crate::dialog::{ConfirmRequest, Dialog, PromptRequest};
use crate::models::{Message, MessageStatus, Session, SessionId};
use crate::prefs::{self, PreferenceStore};
use crate::store::{LogSlot, MessageLog, SessionStore};
use crate::stream::{spawn_reply, ReplyEvent, ReplyHandle};
use crate::transport::{ChatBackend, TransportError, TransportResult};
use crate::view::View;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Title offered when creating a session
pub const DEFAULT_SESSION_TITLE: &str = "New chat";

// ============================================================================
// State
// ============================================================================

/// Inline, user-visible report of a failed operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// What the user was trying to do
    pub action: String,
    pub detail: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.detail)
    }
}

/// Everything the view renders
#[derive(Debug, Default)]
pub struct AppState {
    pub sessions: SessionStore,
    pub messages: MessageLog,
    pub selected_model: String,
    /// Pending text of the message input
    pub input: String,
    pub notice: Option<Notice>,
}

/// How a send ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Preconditions not met; nothing was sent
    Skipped,
    Completed,
    /// The stream broke off; partial text kept
    Interrupted,
    /// The user cancelled; partial text kept
    Cancelled,
    /// The log moved on to another session; late chunks were dropped
    Discarded,
}

/// Whether a reply still expects events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyProgress {
    Pending,
    Done(SendOutcome),
}

/// An assistant reply being streamed into the log
pub struct InFlightReply {
    session: SessionId,
    slot: LogSlot,
    handle: ReplyHandle,
}

impl InFlightReply {
    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    pub async fn next_event(&mut self) -> Option<ReplyEvent> {
        self.handle.next_event().await
    }

    /// Token that cancels the reply from another task (e.g. a signal handler)
    pub fn cancel_token(&self) -> CancellationToken {
        self.handle.cancel_token()
    }
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    state: AppState,
    backend: Arc<dyn ChatBackend>,
    dialog: Box<dyn Dialog>,
    view: Box<dyn View>,
    prefs: Box<dyn PreferenceStore>,
}

impl App {
    /// Build the app, restoring the selected model from `prefs` (or
    /// `fallback_model` when none was saved).
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        dialog: Box<dyn Dialog>,
        view: Box<dyn View>,
        prefs: Box<dyn PreferenceStore>,
        fallback_model: &str,
    ) -> Self {
        let selected_model = prefs::load_selected_model(prefs.as_ref(), fallback_model);
        debug!(model = %selected_model, "Restored selected model");
        Self {
            state: AppState {
                selected_model,
                ..AppState::default()
            },
            backend,
            dialog,
            view,
            prefs,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.input = text.into();
    }

    pub fn dismiss_notice(&mut self) {
        self.state.notice = None;
    }

    fn report(&mut self, action: &str, err: &TransportError) {
        warn!(action, error = %err, "Backend request failed");
        let notice = Notice {
            action: action.to_string(),
            detail: err.to_string(),
        };
        self.view.notice(&notice);
        self.state.notice = Some(notice);
    }

    // ========================================================================
    // Model selection
    // ========================================================================

    /// Switch model and persist the choice. Blank names are ignored.
    pub fn select_model(&mut self, model: &str) {
        let model = model.trim();
        if model.is_empty() || model == self.state.selected_model {
            return;
        }
        self.state.selected_model = model.to_string();
        if let Err(e) = self.prefs.set(prefs::SELECTED_MODEL_KEY, model) {
            warn!("Failed to persist selected model: {:#}", e);
            let notice = Notice {
                action: "Save model choice".into(),
                detail: format!("{:#}", e),
            };
            self.view.notice(&notice);
            self.state.notice = Some(notice);
        }
        info!(model, "Selected model");
        self.view.model_changed(model);
    }

    /// Use `model` for the following sends without saving it.
    pub fn override_model(&mut self, model: &str) {
        let model = model.trim();
        if !model.is_empty() {
            self.state.selected_model = model.to_string();
        }
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Re-fetch the session list, replacing the cache wholesale.
    /// On failure the previous cache stays.
    pub async fn list_sessions(&mut self) -> TransportResult<()> {
        match self.backend.list_sessions().await {
            Ok(sessions) => {
                debug!(count = sessions.len(), "Sessions listed");
                self.state.sessions.replace(sessions);
                self.view.sessions_changed(&self.state.sessions);
                Ok(())
            }
            Err(e) => {
                self.report("List chats", &e);
                Err(e)
            }
        }
    }

    /// Ask for a title (pre-filled with [`DEFAULT_SESSION_TITLE`]) and create
    /// the session. Dismissing the prompt does nothing.
    pub async fn prompt_create_session(&mut self) -> TransportResult<Option<Session>> {
        let request = PromptRequest::new("Chat title?").with_default(DEFAULT_SESSION_TITLE);
        match self.dialog.prompt(&request).await {
            Some(title) => self.create_session(&title).await,
            None => Ok(None),
        }
    }

    /// Create a session. Returns `None` without any request when the title
    /// is blank.
    pub async fn create_session(&mut self, title: &str) -> TransportResult<Option<Session>> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(None);
        }
        self.dismiss_notice();

        let session = match self.backend.create_session(title).await {
            Ok(session) => session,
            Err(e) => {
                self.report("Create chat", &e);
                return Err(e);
            }
        };
        info!(session = %session.id, title, "Session created");
        self.list_sessions().await?;
        Ok(Some(session))
    }

    /// Ask for a new title, pre-filled with `old_title`, and rename.
    pub async fn edit_session(
        &mut self,
        id: &SessionId,
        old_title: &str,
    ) -> TransportResult<Option<Session>> {
        let request = PromptRequest::new("Rename chat:").with_default(old_title);
        match self.dialog.prompt(&request).await {
            Some(new_title) => self.rename_session(id, old_title, &new_title).await,
            None => Ok(None),
        }
    }

    /// Rename a session. Blank or unchanged titles send nothing.
    pub async fn rename_session(
        &mut self,
        id: &SessionId,
        old_title: &str,
        new_title: &str,
    ) -> TransportResult<Option<Session>> {
        let new_title = new_title.trim();
        if new_title.is_empty() || new_title == old_title {
            return Ok(None);
        }
        self.dismiss_notice();

        let session = match self.backend.rename_session(id, new_title).await {
            Ok(session) => session,
            Err(e) => {
                self.report("Rename chat", &e);
                return Err(e);
            }
        };
        info!(session = %id, title = new_title, "Session renamed");
        self.list_sessions().await?;
        Ok(Some(session))
    }

    /// Delete after confirmation. Deleting the current session also clears
    /// the selection and the log. Returns whether a delete was issued.
    pub async fn delete_session(&mut self, id: &SessionId) -> TransportResult<bool> {
        if !self.dialog.confirm(&ConfirmRequest::new("Delete chat?")).await {
            return Ok(false);
        }
        self.dismiss_notice();

        if let Err(e) = self.backend.delete_session(id).await {
            self.report("Delete chat", &e);
            return Err(e);
        }
        info!(session = %id, "Session deleted");

        if self.state.sessions.is_current(id) {
            self.state.sessions.clear_selection();
            self.state.messages.clear();
            self.view.log_replaced(&self.state.messages);
        }
        self.list_sessions().await?;
        Ok(true)
    }

    // ========================================================================
    // Messages
    // ========================================================================

    /// Select `id` and replace the log with its full history.
    pub async fn load_session(&mut self, id: &SessionId) -> TransportResult<()> {
        self.dismiss_notice();
        self.state.sessions.select(id.clone());

        let result = self.backend.history(id).await;
        let outcome = match result {
            Ok(history) => {
                debug!(session = %id, count = history.len(), "History loaded");
                self.state.messages.replace(id.clone(), history);
                Ok(())
            }
            Err(e) => {
                // Keep the log tied to the selected session even when empty.
                self.state.messages.replace(id.clone(), Vec::new());
                self.report("Load chat", &e);
                Err(e)
            }
        };

        self.view.log_replaced(&self.state.messages);
        self.view.scroll_to_bottom();
        outcome
    }

    /// Put `text` in the input and submit it, streaming the whole reply.
    pub async fn send_message(&mut self, text: &str) -> TransportResult<SendOutcome> {
        self.set_input(text);
        match self.start_send().await? {
            Some(reply) => Ok(self.drive_reply(reply).await),
            None => Ok(SendOutcome::Skipped),
        }
    }

    /// Submit the input: optimistic user turn, open the reply stream, append
    /// the assistant placeholder.
    ///
    /// Returns `None` without touching anything when the input is blank or no
    /// session is selected.
    pub async fn start_send(&mut self) -> TransportResult<Option<InFlightReply>> {
        let text = self.state.input.trim().to_string();
        let session = match self.state.sessions.current_id() {
            Some(id) if !text.is_empty() => id.clone(),
            _ => return Ok(None),
        };
        self.dismiss_notice();

        self.state.input.clear();
        self.view.input_cleared();

        let user = Message::user(&text);
        self.view.message_appended(&user);
        self.state.messages.push(user);

        let model = self.state.selected_model.clone();
        debug!(session = %session, model = %model, "Sending message");
        let chunks = match self.backend.send_message(&session, &text, &model).await {
            Ok(chunks) => chunks,
            Err(e) => {
                self.report("Send message", &e);
                return Err(e);
            }
        };

        let placeholder = Message::assistant_placeholder();
        self.view.message_appended(&placeholder);
        let slot = self.state.messages.push(placeholder);
        self.view.scroll_to_bottom();

        Ok(Some(InFlightReply {
            session,
            slot,
            handle: spawn_reply(chunks),
        }))
    }

    /// Fold one reply event into the log.
    ///
    /// If the log was replaced since the reply started (session switch or
    /// delete), the reply is cancelled and nothing is written.
    pub fn apply_reply_event(
        &mut self,
        reply: &mut InFlightReply,
        event: Option<ReplyEvent>,
    ) -> ReplyProgress {
        if !self.state.messages.holds(reply.slot) {
            debug!(session = %reply.session, "Dropping reply for a log that moved on");
            reply.handle.cancel();
            return ReplyProgress::Done(SendOutcome::Discarded);
        }

        let (status, outcome) = match event {
            Some(ReplyEvent::Chunk(text)) => {
                self.state.messages.append_chunk(reply.slot, &text);
                self.view.assistant_chunk(&text);
                self.view.scroll_to_bottom();
                return ReplyProgress::Pending;
            }
            Some(ReplyEvent::Finished) => (MessageStatus::Complete, SendOutcome::Completed),
            Some(ReplyEvent::Interrupted(reason)) => {
                self.report("Receive reply", &TransportError::Stream(reason));
                (MessageStatus::Incomplete, SendOutcome::Interrupted)
            }
            // The reader stopped without a terminal event: it was cancelled.
            None => (MessageStatus::Cancelled, SendOutcome::Cancelled),
        };

        self.finish_reply(reply.slot, status);
        ReplyProgress::Done(outcome)
    }

    /// Stop streaming `reply`, keeping whatever text already arrived.
    pub fn cancel_reply(&mut self, reply: &mut InFlightReply) -> SendOutcome {
        reply.handle.cancel();
        if !self.state.messages.holds(reply.slot) {
            return SendOutcome::Discarded;
        }
        info!(session = %reply.session, "Reply cancelled");
        self.finish_reply(reply.slot, MessageStatus::Cancelled);
        SendOutcome::Cancelled
    }

    /// Consume `reply` until it ends.
    pub async fn drive_reply(&mut self, mut reply: InFlightReply) -> SendOutcome {
        loop {
            let event = reply.next_event().await;
            if let ReplyProgress::Done(outcome) = self.apply_reply_event(&mut reply, event) {
                return outcome;
            }
        }
    }

    fn finish_reply(&mut self, slot: LogSlot, status: MessageStatus) {
        self.state.messages.set_status(slot, status);
        if let Some(message) = self.state.messages.get(slot) {
            self.view.assistant_finished(message);
        }
        self.view.scroll_to_bottom();
    }

    // ========================================================================
    // Misc
    // ========================================================================

    pub async fn ping(&mut self) -> TransportResult<String> {
        match self.backend.ping().await {
            Ok(message) => Ok(message),
            Err(e) => {
                self.report("Reach backend", &e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::{DialogAnswer, ScriptedDialog};
    use crate::prefs::MemoryPreferences;
    use crate::test_helpers::*;
    use crate::transport::mock::{BackendCall, ScriptedReply};
    use crate::transport::MockBackend;
    use crate::view::{RecordingView, ViewEvent};

    // ------------------------------------------------------------------------
    // Send preconditions
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_blank_input_sends_nothing() {
        let backend = Arc::new(backend_with(&[(1, "A", vec![Message::user("hi")])]));
        let mut app = app_with(backend.clone(), vec![]);
        app.load_session(&SessionId::from(1)).await.unwrap();
        let calls_before = backend.call_count().await;

        for text in ["", "   ", "\n\t"] {
            let outcome = app.send_message(text).await.unwrap();
            assert_eq!(outcome, SendOutcome::Skipped);
        }

        assert_eq!(backend.call_count().await, calls_before);
        assert_eq!(app.state().messages.messages(), &[Message::user("hi")]);
    }

    #[tokio::test]
    async fn test_no_session_selected_sends_nothing() {
        let backend = Arc::new(MockBackend::new());
        let mut app = app_with(backend.clone(), vec![]);

        let outcome = app.send_message("hello").await.unwrap();
        assert_eq!(outcome, SendOutcome::Skipped);
        assert_eq!(backend.call_count().await, 0);
        assert!(app.state().messages.is_empty());
        // The input is left alone so nothing typed is lost.
        assert_eq!(app.state().input, "hello");
    }

    // ------------------------------------------------------------------------
    // Load + send
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_load_replaces_log_with_history() {
        let a = vec![Message::user("q1"), Message::assistant("a1")];
        let b = vec![Message::user("q2")];
        let backend = Arc::new(backend_with(&[(1, "A", a.clone()), (2, "B", b.clone())]));
        let mut app = app_with(backend, vec![]);

        app.load_session(&SessionId::from(1)).await.unwrap();
        assert_eq!(app.state().messages.messages(), a.as_slice());

        app.load_session(&SessionId::from(2)).await.unwrap();
        assert_eq!(app.state().messages.messages(), b.as_slice());
        assert_eq!(app.state().messages.session_id(), Some(&SessionId::from(2)));
        assert!(app.state().sessions.is_current(&SessionId::from(2)));
    }

    #[tokio::test]
    async fn test_end_to_end_send_streams_reply() {
        let backend = Arc::new(backend_with(&[(1, "A", vec![Message::user("hi")])]));
        backend.push_reply(ScriptedReply::text(&["He", "llo!"])).await;
        let view = RecordingView::new();
        let mut app = app_with_view(backend.clone(), vec![], view.clone());
        app.select_model("modelX");

        app.list_sessions().await.unwrap();
        assert_eq!(app.state().sessions.sessions(), &[session(1, "A")]);

        app.load_session(&SessionId::from(1)).await.unwrap();
        let outcome = app.send_message("  hello ").await.unwrap();

        assert_eq!(outcome, SendOutcome::Completed);
        assert_eq!(
            app.state().messages.messages(),
            &[
                Message::user("hi"),
                Message::user("hello"),
                Message::assistant("Hello!"),
            ]
        );
        assert!(app.state().input.is_empty());
        assert!(backend.calls().await.contains(&BackendCall::SendMessage {
            id: SessionId::from(1),
            text: "hello".into(),
            model: "modelX".into(),
        }));

        let chunks: Vec<ViewEvent> = view
            .events()
            .into_iter()
            .filter(|e| matches!(e, ViewEvent::Chunk(_)))
            .collect();
        assert_eq!(
            chunks,
            vec![ViewEvent::Chunk("He".into()), ViewEvent::Chunk("llo!".into())]
        );
    }

    #[tokio::test]
    async fn test_interrupted_stream_keeps_partial_text() {
        let backend = Arc::new(backend_with(&[(1, "A", vec![])]));
        backend
            .push_reply(ScriptedReply::Interrupted(
                vec![b"Hal".to_vec()],
                "connection reset".into(),
            ))
            .await;
        let mut app = app_with(backend, vec![]);
        app.load_session(&SessionId::from(1)).await.unwrap();

        let outcome = app.send_message("hello").await.unwrap();
        assert_eq!(outcome, SendOutcome::Interrupted);

        let last = app.state().messages.last().unwrap();
        assert_eq!(last.content, "Hal");
        assert_eq!(last.status, MessageStatus::Incomplete);
        assert!(app.state().notice.is_some());
    }

    #[tokio::test]
    async fn test_failed_send_keeps_user_turn_without_placeholder() {
        let backend = Arc::new(backend_with(&[(1, "A", vec![])]));
        let mut app = app_with(backend.clone(), vec![]);
        app.load_session(&SessionId::from(1)).await.unwrap();
        backend.set_offline(true);

        assert!(app.send_message("hello").await.is_err());
        assert_eq!(app.state().messages.messages(), &[Message::user("hello")]);
        assert_eq!(
            app.state().notice.as_ref().map(|n| n.action.as_str()),
            Some("Send message")
        );
    }

    #[tokio::test]
    async fn test_session_switch_discards_stale_reply() {
        let backend = Arc::new(backend_with(&[(1, "A", vec![]), (2, "B", vec![])]));
        backend.push_reply(ScriptedReply::text(&["late ", "text"])).await;
        let mut app = app_with(backend, vec![]);
        app.load_session(&SessionId::from(1)).await.unwrap();

        app.set_input("hello");
        let reply = app.start_send().await.unwrap().unwrap();
        assert_eq!(reply.session_id(), &SessionId::from(1));

        app.load_session(&SessionId::from(2)).await.unwrap();
        let outcome = app.drive_reply(reply).await;

        assert_eq!(outcome, SendOutcome::Discarded);
        assert!(app.state().messages.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_reply_marks_message() {
        let backend = Arc::new(backend_with(&[(1, "A", vec![])]));
        backend.push_reply(ScriptedReply::text(&["par", "tial"])).await;
        let mut app = app_with(backend, vec![]);
        app.load_session(&SessionId::from(1)).await.unwrap();

        app.set_input("hello");
        let mut reply = app.start_send().await.unwrap().unwrap();
        let first = reply.next_event().await;
        assert_eq!(
            app.apply_reply_event(&mut reply, first),
            ReplyProgress::Pending
        );

        assert_eq!(app.cancel_reply(&mut reply), SendOutcome::Cancelled);
        let last = app.state().messages.last().unwrap();
        assert_eq!(last.content, "par");
        assert_eq!(last.status, MessageStatus::Cancelled);
    }

    // ------------------------------------------------------------------------
    // Session CRUD
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_blank_title_is_noop() {
        let backend = Arc::new(MockBackend::new());
        let mut app = app_with(backend.clone(), vec![DialogAnswer::Text("   ".into())]);

        assert_eq!(app.create_session("").await.unwrap(), None);
        assert_eq!(app.prompt_create_session().await.unwrap(), None);
        assert_eq!(backend.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_dismissed_prompt_is_noop() {
        let backend = Arc::new(MockBackend::new());
        let mut app = app_with(backend.clone(), vec![DialogAnswer::Dismiss]);
        assert_eq!(app.prompt_create_session().await.unwrap(), None);
        assert_eq!(backend.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_then_relists() {
        let backend = Arc::new(MockBackend::new());
        let mut app = app_with(backend.clone(), vec![DialogAnswer::Text(" Trip ".into())]);

        let created = app.prompt_create_session().await.unwrap().unwrap();
        assert_eq!(created.title, "Trip");
        assert_eq!(
            backend.calls().await,
            vec![
                BackendCall::CreateSession("Trip".into()),
                BackendCall::ListSessions
            ]
        );
        assert_eq!(app.state().sessions.sessions(), &[created]);
    }

    #[tokio::test]
    async fn test_empty_answer_uses_placeholder_title() {
        use crate::dialog::{ConsoleInput, TerminalDialog};

        let backend = Arc::new(MockBackend::new());
        let input = ConsoleInput::from_reader("\n".as_bytes()).shared();
        let mut app = App::new(
            backend.clone(),
            Box::new(TerminalDialog::new(input)),
            Box::new(RecordingView::new()),
            Box::new(MemoryPreferences::new()),
            prefs::DEFAULT_MODEL,
        );

        let created = app.prompt_create_session().await.unwrap().unwrap();
        assert_eq!(created.title, DEFAULT_SESSION_TITLE);
        assert_eq!(
            backend.calls().await[0],
            BackendCall::CreateSession("New chat".into())
        );
    }

    #[tokio::test]
    async fn test_rename_unchanged_or_blank_is_noop() {
        let backend = Arc::new(backend_with(&[(1, "A", vec![])]));
        let mut app = app_with(
            backend.clone(),
            vec![
                DialogAnswer::Text("A".into()),
                DialogAnswer::Text(" A ".into()),
                DialogAnswer::Text("".into()),
            ],
        );
        let id = SessionId::from(1);
        for _ in 0..3 {
            assert_eq!(app.edit_session(&id, "A").await.unwrap(), None);
        }
        assert_eq!(backend.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_rename_sends_trimmed_title() {
        let backend = Arc::new(backend_with(&[(1, "A", vec![])]));
        let mut app = app_with(backend.clone(), vec![DialogAnswer::Text("  B ".into())]);

        let renamed = app.edit_session(&SessionId::from(1), "A").await.unwrap();
        assert_eq!(renamed, Some(session(1, "B")));
        assert_eq!(
            backend.calls().await,
            vec![
                BackendCall::RenameSession(SessionId::from(1), "B".into()),
                BackendCall::ListSessions
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let backend = Arc::new(backend_with(&[(1, "A", vec![])]));
        let mut app = app_with(backend.clone(), vec![DialogAnswer::Confirm(false)]);
        assert!(!app.delete_session(&SessionId::from(1)).await.unwrap());
        assert_eq!(backend.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_current_clears_selection_and_log() {
        let backend = Arc::new(backend_with(&[(1, "A", vec![Message::user("hi")])]));
        let mut app = app_with(backend, vec![DialogAnswer::Confirm(true)]);
        app.load_session(&SessionId::from(1)).await.unwrap();

        assert!(app.delete_session(&SessionId::from(1)).await.unwrap());
        assert!(app.state().sessions.current_id().is_none());
        assert!(app.state().messages.is_empty());
        assert!(app.state().sessions.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_delete_other_keeps_selection_and_log() {
        let backend = Arc::new(backend_with(&[
            (1, "A", vec![Message::user("hi")]),
            (2, "B", vec![]),
        ]));
        let mut app = app_with(backend, vec![DialogAnswer::Confirm(true)]);
        app.load_session(&SessionId::from(1)).await.unwrap();

        assert!(app.delete_session(&SessionId::from(2)).await.unwrap());
        assert!(app.state().sessions.is_current(&SessionId::from(1)));
        assert_eq!(app.state().messages.messages(), &[Message::user("hi")]);
        assert_eq!(app.state().sessions.sessions(), &[session(1, "A")]);
    }

    #[tokio::test]
    async fn test_list_failure_keeps_cache_and_raises_notice() {
        let backend = Arc::new(backend_with(&[(1, "A", vec![])]));
        let mut app = app_with(backend.clone(), vec![]);
        app.list_sessions().await.unwrap();

        backend.set_offline(true);
        assert!(app.list_sessions().await.is_err());
        assert_eq!(app.state().sessions.sessions(), &[session(1, "A")]);
        let notice = app.state().notice.clone().unwrap();
        assert_eq!(notice.action, "List chats");
        assert!(notice.detail.contains("503"));
    }

    // ------------------------------------------------------------------------
    // Model preference
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_selected_model_survives_restart() {
        let prefs = MemoryPreferences::new();
        let backend: Arc<dyn ChatBackend> = Arc::new(MockBackend::new());

        let make = |store: MemoryPreferences| {
            App::new(
                backend.clone(),
                Box::new(ScriptedDialog::default()),
                Box::new(RecordingView::new()),
                Box::new(store),
                prefs::DEFAULT_MODEL,
            )
        };

        let mut app = make(prefs.clone());
        assert_eq!(app.state().selected_model, "gemma3:1b");
        app.select_model("llama3:8b");
        drop(app);

        let app = make(prefs);
        assert_eq!(app.state().selected_model, "llama3:8b");
    }

    #[tokio::test]
    async fn test_blank_model_is_ignored() {
        let mut app = app_with(Arc::new(MockBackend::new()), vec![]);
        app.select_model("  ");
        assert_eq!(app.state().selected_model, prefs::DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_override_model_is_not_saved() {
        let store = MemoryPreferences::new();
        let mut app = App::new(
            Arc::new(MockBackend::new()),
            Box::new(ScriptedDialog::default()),
            Box::new(RecordingView::new()),
            Box::new(store.clone()),
            prefs::DEFAULT_MODEL,
        );
        app.override_model("qwen2:7b");
        assert_eq!(app.state().selected_model, "qwen2:7b");
        assert!(store.get(prefs::SELECTED_MODEL_KEY).is_none());
    }
}
