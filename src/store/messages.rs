//! Message Log

use crate::models::{Message, MessageStatus, SessionId};

/// Address of one message in one incarnation of the log.
///
/// Every wholesale replacement bumps the log's epoch, so a slot taken before
/// a session switch never resolves afterwards, even if the user switched
/// back to the same session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSlot {
    epoch: u64,
    index: usize,
}

/// Messages of the most recently loaded session.
#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    session: Option<SessionId>,
    messages: Vec<Message>,
    epoch: u64,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session this log was loaded for
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Replace the whole log with a session's history
    pub fn replace(&mut self, session: SessionId, messages: Vec<Message>) {
        self.session = Some(session);
        self.messages = messages;
        self.epoch += 1;
    }

    /// Forget the loaded session entirely
    pub fn clear(&mut self) {
        self.session = None;
        self.messages.clear();
        self.epoch += 1;
    }

    pub fn push(&mut self, message: Message) -> LogSlot {
        self.messages.push(message);
        LogSlot {
            epoch: self.epoch,
            index: self.messages.len() - 1,
        }
    }

    /// The message at `slot`, unless the log has been replaced since
    pub fn get(&self, slot: LogSlot) -> Option<&Message> {
        if slot.epoch != self.epoch {
            return None;
        }
        self.messages.get(slot.index)
    }

    fn get_mut(&mut self, slot: LogSlot) -> Option<&mut Message> {
        if slot.epoch != self.epoch {
            return None;
        }
        self.messages.get_mut(slot.index)
    }

    /// True while `slot` still points into the current incarnation
    pub fn holds(&self, slot: LogSlot) -> bool {
        self.get(slot).is_some()
    }

    /// Append streamed text to the message at `slot`. Returns false (and
    /// changes nothing) if the log was replaced in the meantime.
    pub fn append_chunk(&mut self, slot: LogSlot, text: &str) -> bool {
        match self.get_mut(slot) {
            Some(message) => {
                message.content.push_str(text);
                true
            }
            None => false,
        }
    }

    pub fn set_status(&mut self, slot: LogSlot, status: MessageStatus) -> bool {
        match self.get_mut(slot) {
            Some(message) => {
                message.status = status;
                true
            }
            None => false,
        }
    }
}
