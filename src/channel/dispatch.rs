//! Per-channel dispatch table keyed by SSE event type

use crate::channel::progress::ProgressEvent;
use crate::channel::sse::SseMessage;
use crate::utils::error::{Result, VidloaderError};
use tracing::debug;

pub const PROGRESS_EVENT: &str = "progress";
pub const HEARTBEAT_EVENT: &str = "heartbeat";

/// Maps a payload to the update it carries, if any
type Handler = fn(&str) -> Result<Option<ProgressEvent>>;

const HANDLERS: &[(&str, Handler)] = &[
    (PROGRESS_EVENT, on_progress),
    (HEARTBEAT_EVENT, on_heartbeat),
];

/// Route one message through the table.
///
/// `Ok(None)` means the message carries nothing for the store (heartbeats,
/// unknown types). A malformed progress payload is a `ChannelDecode` error.
pub fn dispatch(message: &SseMessage) -> Result<Option<ProgressEvent>> {
    match HANDLERS.iter().find(|(name, _)| *name == message.event) {
        Some((_, handler)) => handler(&message.data),
        None => {
            debug!("Ignoring unknown channel event type '{}'", message.event);
            Ok(None)
        }
    }
}

fn on_progress(payload: &str) -> Result<Option<ProgressEvent>> {
    serde_json::from_str::<ProgressEvent>(payload)
        .map(Some)
        .map_err(|e| VidloaderError::ChannelDecode(format!("{} (payload: {})", e, payload)))
}

fn on_heartbeat(_payload: &str) -> Result<Option<ProgressEvent>> {
    Ok(None)
}
