//! Client-side caches of backend state
//!
//! - `SessionStore` - the session list and the current selection
//! - `MessageLog` - messages of the most recently loaded session

mod messages;
mod sessions;

pub use messages::{LogSlot, MessageLog};
pub use sessions::SessionStore;
