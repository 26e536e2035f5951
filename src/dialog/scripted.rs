//! Pre-recorded dialog answers, for tests and non-interactive commands

use super::{ConfirmRequest, Dialog, PromptRequest};
use async_trait::async_trait;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogAnswer {
    /// Answer a prompt with this text
    Text(String),
    /// Dismiss a prompt
    Dismiss,
    /// Answer a confirmation
    Confirm(bool),
}

/// Dialog that replays queued answers in order.
///
/// An exhausted queue dismisses prompts and declines confirmations, so a
/// missing answer can never trigger a destructive call.
#[derive(Debug, Default)]
pub struct ScriptedDialog {
    answers: VecDeque<DialogAnswer>,
    prompts: Vec<PromptRequest>,
    confirms: Vec<ConfirmRequest>,
}

impl ScriptedDialog {
    pub fn new(answers: impl IntoIterator<Item = DialogAnswer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Prompts shown so far
    pub fn prompts(&self) -> &[PromptRequest] {
        &self.prompts
    }

    /// Confirmations shown so far
    pub fn confirms(&self) -> &[ConfirmRequest] {
        &self.confirms
    }
}

#[async_trait]
impl Dialog for ScriptedDialog {
    async fn prompt(&mut self, request: &PromptRequest) -> Option<String> {
        self.prompts.push(request.clone());
        match self.answers.pop_front() {
            Some(DialogAnswer::Text(text)) => Some(text),
            _ => None,
        }
    }

    async fn confirm(&mut self, request: &ConfirmRequest) -> bool {
        self.confirms.push(request.clone());
        matches!(self.answers.pop_front(), Some(DialogAnswer::Confirm(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_then_declines() {
        let mut dialog = ScriptedDialog::new([
            DialogAnswer::Text("t".into()),
            DialogAnswer::Confirm(true),
        ]);
        assert_eq!(dialog.prompt(&PromptRequest::new("?")).await.as_deref(), Some("t"));
        assert!(dialog.confirm(&ConfirmRequest::new("sure?")).await);
        assert!(!dialog.confirm(&ConfirmRequest::new("again?")).await);
        assert_eq!(dialog.prompt(&PromptRequest::new("?")).await, None);
        assert_eq!(dialog.prompts().len(), 2);
        assert_eq!(dialog.confirms().len(), 2);
    }
}
