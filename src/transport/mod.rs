//! Transport Client - REST calls to the chat backend
//!
//! `ChatBackend` is the seam: `HttpBackend` talks to a real server over
//! reqwest, `MockBackend` keeps everything in memory for tests.

pub mod client;
pub mod error;
pub mod mock;
pub mod traits;

pub use client::HttpBackend;
pub use error::{TransportError, TransportResult};
pub use mock::MockBackend;
pub use traits::{ChatBackend, ChunkStream};
