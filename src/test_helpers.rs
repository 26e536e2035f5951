//! Test helper factories and mock app builders
//!
//! Provides convenience functions for seeding a mock backend and wiring an
//! `App` with scripted dialogs and a recording view.
#![allow(dead_code)]

use crate::app::App;
use crate::dialog::{DialogAnswer, ScriptedDialog};
use crate::models::{Message, Session, SessionId};
use crate::prefs::{MemoryPreferences, DEFAULT_MODEL};
use crate::transport::MockBackend;
use crate::view::RecordingView;
use std::sync::Arc;

// ============================================================================
// Factories
// ============================================================================

pub fn session(id: i64, title: &str) -> Session {
    Session {
        id: SessionId::from(id),
        title: title.to_string(),
    }
}

/// Mock backend seeded with `(id, title, history)` triples
pub fn backend_with(seed: &[(i64, &str, Vec<Message>)]) -> MockBackend {
    seed.iter()
        .fold(MockBackend::new(), |backend, (id, title, history)| {
            backend.with_session(session(*id, title), history.clone())
        })
}

// ============================================================================
// App builders
// ============================================================================

/// App over `backend` answering dialogs from `answers`
pub fn app_with(backend: Arc<MockBackend>, answers: Vec<DialogAnswer>) -> App {
    app_with_view(backend, answers, RecordingView::new())
}

/// Same as [`app_with`], keeping a handle on the view's event log
pub fn app_with_view(
    backend: Arc<MockBackend>,
    answers: Vec<DialogAnswer>,
    view: RecordingView,
) -> App {
    App::new(
        backend,
        Box::new(ScriptedDialog::new(answers)),
        Box::new(view),
        Box::new(MemoryPreferences::new()),
        DEFAULT_MODEL,
    )
}
