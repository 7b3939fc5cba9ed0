//! Progress channel manager: at most one live channel per download id

use crate::channel::dispatch::dispatch;
use crate::channel::progress::ProgressEvent;
use crate::gateway::traits::ProgressSource;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A decoded event on its way from a channel task to the store
#[derive(Debug, Clone)]
pub struct ChannelUpdate {
    pub id: String,
    /// Which opening of the channel produced this update
    pub epoch: u64,
    pub event: ProgressEvent,
}

/// Handle for an open channel. Dropping it closes the channel.
struct ChannelHandle {
    epoch: u64,
    join_handle: JoinHandle<()>,
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.join_handle.abort();
    }
}

/// Owns every open progress channel.
///
/// Each channel is a task that reads the server-push stream, runs messages
/// through the dispatch table and forwards progress events to a single
/// queue drained by the session store.
pub struct ChannelManager {
    source: Arc<dyn ProgressSource>,
    channels: HashMap<String, ChannelHandle>,
    updates_tx: mpsc::Sender<ChannelUpdate>,
    next_epoch: u64,
}

impl ChannelManager {
    pub fn new(source: Arc<dyn ProgressSource>, updates_tx: mpsc::Sender<ChannelUpdate>) -> Self {
        Self {
            source,
            channels: HashMap::new(),
            updates_tx,
            next_epoch: 0,
        }
    }

    /// Open a channel for `id`. Returns false (and does nothing) when one
    /// is already open.
    pub fn open(&mut self, id: &str) -> bool {
        if self.channels.contains_key(id) {
            debug!("Progress channel for {} already open", id);
            return false;
        }

        self.next_epoch += 1;
        let epoch = self.next_epoch;
        let join_handle = tokio::spawn(run_channel(
            Arc::clone(&self.source),
            id.to_string(),
            epoch,
            self.updates_tx.clone(),
        ));

        self.channels
            .insert(id.to_string(), ChannelHandle { epoch, join_handle });
        info!("Opened progress channel for {}", id);
        true
    }

    /// Close the channel for `id`, if any
    pub fn close(&mut self, id: &str) -> bool {
        match self.channels.remove(id) {
            Some(_handle) => {
                info!("Closed progress channel for {}", id);
                true
            }
            None => false,
        }
    }

    pub fn close_all(&mut self) {
        if !self.channels.is_empty() {
            info!("Closing {} progress channel(s)", self.channels.len());
        }
        self.channels.clear();
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.channels.contains_key(id)
    }

    pub fn open_count(&self) -> usize {
        self.channels.len()
    }

    /// Whether an update still belongs to a currently open channel.
    /// Updates queued before a close (or from an earlier opening) fail this.
    pub fn accepts(&self, update: &ChannelUpdate) -> bool {
        self.channels
            .get(&update.id)
            .is_some_and(|handle| handle.epoch == update.epoch)
    }
}

/// Body of one channel task.
///
/// Transport failures end the task quietly: no reconnect, the download just
/// stops updating. Returning drops the stream, which closes the connection.
async fn run_channel(
    source: Arc<dyn ProgressSource>,
    id: String,
    epoch: u64,
    updates_tx: mpsc::Sender<ChannelUpdate>,
) {
    let mut messages = match source.connect(&id).await {
        Ok(messages) => messages,
        Err(e) => {
            debug!("Progress channel for {} could not connect: {}", id, e);
            return;
        }
    };

    while let Some(item) = messages.next().await {
        let message = match item {
            Ok(message) => message,
            Err(e) => {
                debug!("Progress channel for {} dropped: {}", id, e);
                return;
            }
        };

        match dispatch(&message) {
            Ok(Some(event)) => {
                let terminal = event.is_terminal();
                let update = ChannelUpdate {
                    id: id.clone(),
                    epoch,
                    event,
                };
                if updates_tx.send(update).await.is_err() {
                    return;
                }
                if terminal {
                    debug!("Terminal event for {}, closing stream", id);
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Dropping progress event for {}: {}", id, e),
        }
    }

    debug!("Progress channel for {} ended by server", id);
}
