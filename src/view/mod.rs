//! Rendering side of the app
//!
//! `App` calls into a `View` after every state change; the view decides how
//! much to redraw. Streaming replies are reported chunk by chunk so a
//! terminal can print text as it arrives instead of repainting the log.

mod recording;
mod terminal;

pub use recording::{RecordingView, ViewEvent};
pub use terminal::TerminalView;

use crate::app::Notice;
use crate::models::Message;
use crate::store::{MessageLog, SessionStore};

pub trait View: Send {
    /// The session list or the selection changed
    fn sessions_changed(&mut self, sessions: &SessionStore);

    /// The log was replaced wholesale (session loaded or cleared)
    fn log_replaced(&mut self, log: &MessageLog);

    /// A message was appended (optimistic user turn or assistant placeholder)
    fn message_appended(&mut self, message: &Message);

    /// Text was added to the assistant message being streamed
    fn assistant_chunk(&mut self, text: &str);

    /// The streamed assistant message reached its final state
    fn assistant_finished(&mut self, message: &Message);

    fn notice(&mut self, notice: &Notice);

    fn model_changed(&mut self, _model: &str) {}

    fn input_cleared(&mut self) {}

    /// Keep the newest message in sight
    fn scroll_to_bottom(&mut self);
}
