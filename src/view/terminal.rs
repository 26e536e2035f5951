//! Plain-text view for a terminal

use super::View;
use crate::app::Notice;
use crate::models::{Message, MessageStatus, Role};
use crate::store::{MessageLog, SessionStore};
use std::io::Write;

/// Prints the conversation as it changes.
///
/// The terminal keeps its own scrollback, so "scroll to bottom" only needs
/// to flush what has been written.
pub struct TerminalView {
    out: Box<dyn Write + Send>,
}

impl TerminalView {
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    fn label(role: Role) -> &'static str {
        match role {
            Role::User => "you",
            Role::Assistant => "assistant",
        }
    }

    fn status_suffix(status: MessageStatus) -> &'static str {
        match status {
            MessageStatus::Complete | MessageStatus::Streaming => "",
            MessageStatus::Incomplete => " [incomplete]",
            MessageStatus::Cancelled => " [cancelled]",
        }
    }

    fn write_message(&mut self, message: &Message) {
        let _ = writeln!(
            self.out,
            "{}> {}{}",
            Self::label(message.role),
            message.content,
            Self::status_suffix(message.status)
        );
    }
}

impl View for TerminalView {
    fn sessions_changed(&mut self, sessions: &SessionStore) {
        if sessions.sessions().is_empty() {
            let _ = writeln!(self.out, "(no chats yet, /new to create one)");
            return;
        }
        for session in sessions.sessions() {
            let marker = if sessions.is_current(&session.id) {
                '*'
            } else {
                ' '
            };
            let _ = writeln!(self.out, "{} {:>4}  {}", marker, session.id, session.title);
        }
    }

    fn log_replaced(&mut self, log: &MessageLog) {
        match log.session_id() {
            Some(id) => {
                let _ = writeln!(self.out, "--- chat {} ---", id);
            }
            None => {
                let _ = writeln!(self.out, "--- no chat selected ---");
            }
        }
        for message in log.messages() {
            self.write_message(message);
        }
    }

    fn message_appended(&mut self, message: &Message) {
        if message.status == MessageStatus::Streaming {
            // Chunks follow on the same line.
            let _ = write!(self.out, "{}> {}", Self::label(message.role), message.content);
        } else {
            self.write_message(message);
        }
    }

    fn assistant_chunk(&mut self, text: &str) {
        let _ = write!(self.out, "{}", text);
    }

    fn assistant_finished(&mut self, message: &Message) {
        let _ = writeln!(self.out, "{}", Self::status_suffix(message.status));
    }

    fn notice(&mut self, notice: &Notice) {
        let _ = writeln!(self.out, "! {}", notice);
    }

    fn model_changed(&mut self, model: &str) {
        let _ = writeln!(self.out, "model: {}", model);
    }

    fn scroll_to_bottom(&mut self) {
        let _ = self.out.flush();
    }
}
