//! Line-based dialogs on the controlling terminal

use super::{ConfirmRequest, Dialog, PromptRequest};
use async_trait::async_trait;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::Mutex;
use tracing::warn;

/// Source of input lines (stdin in the binary, a byte slice in tests)
pub struct ConsoleInput {
    lines: Lines<Box<dyn AsyncBufRead + Send + Unpin>>,
}

/// One input shared by the REPL loop and the dialogs it triggers
pub type SharedInput = Arc<Mutex<ConsoleInput>>;

impl ConsoleInput {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }

    pub fn from_reader(reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        let reader: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(reader);
        Self {
            lines: reader.lines(),
        }
    }

    pub fn shared(self) -> SharedInput {
        Arc::new(Mutex::new(self))
    }

    /// `Ok(None)` at end of input
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

/// Prompts written to stdout, answers read from a [`SharedInput`]
pub struct TerminalDialog {
    input: SharedInput,
}

impl TerminalDialog {
    pub fn new(input: SharedInput) -> Self {
        Self { input }
    }

    async fn ask(&self, text: &str) -> Option<String> {
        print!("{} ", text);
        let _ = std::io::stdout().flush();
        match self.input.lock().await.read_line().await {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read answer: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Dialog for TerminalDialog {
    async fn prompt(&mut self, request: &PromptRequest) -> Option<String> {
        let text = match &request.default {
            Some(default) => format!("{} [{}]", request.message, default),
            None => request.message.clone(),
        };
        let line = self.ask(&text).await?;
        if line.trim().is_empty() {
            return request.default.clone().or(Some(line));
        }
        Some(line)
    }

    async fn confirm(&mut self, request: &ConfirmRequest) -> bool {
        let text = format!("{} [y/N]", request.message);
        matches!(
            self.ask(&text).await.map(|a| a.trim().to_lowercase()).as_deref(),
            Some("y" | "yes")
        )
    }
}
