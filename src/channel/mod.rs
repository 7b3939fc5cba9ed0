//! Live progress channels

pub mod dispatch;
pub mod manager;
pub mod progress;
pub mod sse;

pub use manager::{ChannelManager, ChannelUpdate};
pub use progress::ProgressEvent;
pub use sse::{SseDecoder, SseMessage};
