//! View that records what it was told, for assertions in tests

use super::View;
use crate::app::Notice;
use crate::models::Message;
use crate::store::{MessageLog, SessionStore};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Sessions(usize),
    LogReplaced(usize),
    Appended(Message),
    Chunk(String),
    Finished(Message),
    Notice(String),
    Model(String),
    InputCleared,
    ScrollToBottom,
}

/// Clones share one event list
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    events: Arc<Mutex<Vec<ViewEvent>>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(&self, event: ViewEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl View for RecordingView {
    fn sessions_changed(&mut self, sessions: &SessionStore) {
        self.push(ViewEvent::Sessions(sessions.sessions().len()));
    }

    fn log_replaced(&mut self, log: &MessageLog) {
        self.push(ViewEvent::LogReplaced(log.len()));
    }

    fn message_appended(&mut self, message: &Message) {
        self.push(ViewEvent::Appended(message.clone()));
    }

    fn assistant_chunk(&mut self, text: &str) {
        self.push(ViewEvent::Chunk(text.to_string()));
    }

    fn assistant_finished(&mut self, message: &Message) {
        self.push(ViewEvent::Finished(message.clone()));
    }

    fn notice(&mut self, notice: &Notice) {
        self.push(ViewEvent::Notice(notice.to_string()));
    }

    fn model_changed(&mut self, model: &str) {
        self.push(ViewEvent::Model(model.to_string()));
    }

    fn input_cleared(&mut self) {
        self.push(ViewEvent::InputCleared);
    }

    fn scroll_to_bottom(&mut self) {
        self.push(ViewEvent::ScrollToBottom);
    }
}
