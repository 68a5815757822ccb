//! Chat turns: the stream relay and everything it needs.

pub mod extract;
pub mod gate;
pub mod relay;
pub mod service;

pub use extract::{Extracted, SseTextExtractor};
pub use relay::{RelayEnd, RelayOutcome};
pub use service::{ChatService, ChatStream};
