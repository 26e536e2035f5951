//! Session Store

use crate::models::{Session, SessionId};

/// Cached session list plus the currently selected session.
///
/// The cache is only ever replaced wholesale from a fresh listing. The
/// selection is a weak reference: it may name a session that disappeared
/// from the latest listing.
#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    sessions: Vec<Session>,
    current: Option<SessionId>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn replace(&mut self, sessions: Vec<Session>) {
        self.sessions = sessions;
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    pub fn current_id(&self) -> Option<&SessionId> {
        self.current.as_ref()
    }

    /// The selected session, if it is still in the cached listing
    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref().and_then(|id| self.get(id))
    }

    pub fn is_current(&self, id: &SessionId) -> bool {
        self.current.as_ref() == Some(id)
    }

    pub fn select(&mut self, id: SessionId) {
        self.current = Some(id);
    }

    pub fn clear_selection(&mut self) {
        self.current = None;
    }
}
