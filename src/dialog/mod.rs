//! Dialog requests - the app asks, the front end answers
//!
//! Replaces blocking prompt/confirm calls: the app builds a typed request,
//! awaits the answer and never knows how it was collected.

mod scripted;
mod terminal;

pub use scripted::{DialogAnswer, ScriptedDialog};
pub use terminal::{ConsoleInput, SharedInput, TerminalDialog};

use async_trait::async_trait;

/// Ask for a line of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub message: String,
    /// Pre-filled value, returned when the user submits an empty line
    pub default: Option<String>,
}

impl PromptRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Ask a yes/no question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub message: String,
}

impl ConfirmRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait Dialog: Send {
    /// `None` means the user dismissed the prompt
    async fn prompt(&mut self, request: &PromptRequest) -> Option<String>;

    async fn confirm(&mut self, request: &ConfirmRequest) -> bool;
}
