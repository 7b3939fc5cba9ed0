//! Session state store: the single writer for catalog, selection and downloads

use crate::catalog::VideoCatalog;
use crate::channel::manager::{ChannelManager, ChannelUpdate};
use crate::channel::progress::ProgressEvent;
use crate::gateway::traits::{Gateway, ProgressSource};
use crate::session::record::DownloadRecord;
use crate::session::view::{DownloadView, LiveProgress};
use crate::utils::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Holds everything the user is looking at and every download started in
/// this session.
///
/// All mutation goes through the methods below. Progress from open channels
/// arrives on an internal queue and is applied by [`SessionStore::next_update`]
/// or [`SessionStore::drain_updates`], so no other task ever writes here.
pub struct SessionStore {
    gateway: Arc<dyn Gateway>,
    channels: ChannelManager,
    updates_rx: mpsc::Receiver<ChannelUpdate>,

    catalog: Option<VideoCatalog>,
    loading: bool,
    extract_error: Option<String>,
    selected_variant: Option<String>,

    records: HashMap<String, DownloadRecord>,
    order: Vec<String>,
    latest: HashMap<String, LiveProgress>,
}

impl SessionStore {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        source: Arc<dyn ProgressSource>,
        update_buffer: usize,
    ) -> Self {
        let (updates_tx, updates_rx) = mpsc::channel(update_buffer.max(1));
        Self {
            gateway,
            channels: ChannelManager::new(source, updates_tx),
            updates_rx,
            catalog: None,
            loading: false,
            extract_error: None,
            selected_variant: None,
            records: HashMap::new(),
            order: Vec::new(),
            latest: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> Option<&VideoCatalog> {
        self.catalog.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn extract_error(&self) -> Option<&str> {
        self.extract_error.as_deref()
    }

    pub fn selected_variant(&self) -> Option<&str> {
        self.selected_variant.as_deref()
    }

    pub fn record(&self, id: &str) -> Option<&DownloadRecord> {
        self.records.get(id)
    }

    /// Records in the order they were started
    pub fn records(&self) -> impl Iterator<Item = &DownloadRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn latest_event(&self, id: &str) -> Option<&ProgressEvent> {
        self.latest.get(id).map(|live| &live.event)
    }

    pub fn channels(&self) -> &ChannelManager {
        &self.channels
    }

    /// Fetch a catalog for `url`, replacing whatever was shown before
    pub async fn extract(&mut self, url: &str) -> Result<()> {
        self.loading = true;
        self.extract_error = None;
        self.catalog = None;

        let result = self.gateway.extract(url).await;
        self.loading = false;

        match result {
            Ok(catalog) => {
                info!(
                    "Extracted '{}' with {} variant(s)",
                    catalog.title,
                    catalog.variants.len()
                );
                self.catalog = Some(catalog);
                self.selected_variant = None;
                Ok(())
            }
            Err(e) => {
                error!("Extraction failed for {}: {}", url, e);
                self.extract_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn select_variant(&mut self, variant_id: impl Into<String>) {
        self.selected_variant = Some(variant_id.into());
    }

    /// Forget the current catalog, error and selection. Downloads are kept.
    pub fn reset(&mut self) {
        self.catalog = None;
        self.extract_error = None;
        self.selected_variant = None;
    }

    /// Start a download and open its progress channel. Returns the new id.
    pub async fn start(&mut self, url: &str, variant_id: &str) -> Result<String> {
        let record = self.gateway.start_download(url, variant_id).await.map_err(|e| {
            error!("Failed to start download of {}: {}", url, e);
            e
        })?;

        let id = record.id.clone();
        let active = record.status.is_active();
        info!("Started download {} ({})", id, record.status);

        if self.records.insert(id.clone(), record).is_none() {
            self.order.push(id.clone());
        }
        if active {
            self.channels.open(&id);
        }
        Ok(id)
    }

    /// Apply one progress event.
    ///
    /// Events for ids without an open channel are ignored. A terminal event
    /// is folded into the record, which stays authoritative once the
    /// channel is closed.
    pub fn on_progress(&mut self, id: &str, event: ProgressEvent) {
        if !self.channels.is_open(id) {
            debug!("Ignoring progress for {} with no open channel", id);
            return;
        }
        let Some(record) = self.records.get_mut(id) else {
            debug!("Ignoring progress for unknown download {}", id);
            return;
        };

        if !event.is_terminal() {
            self.latest.insert(id.to_string(), LiveProgress::now(event));
            return;
        }

        record.status = event.status;
        record.progress_percent = event.progress_percent;
        if event.filename.is_some() {
            record.filename = event.filename;
        }
        if event.error.is_some() {
            record.error_message = event.error;
        }
        info!("Download {} finished: {}", id, record.status);

        self.latest.remove(id);
        self.channels.close(id);
    }

    /// Wait for the next update from any open channel and apply it.
    /// Returns the id it touched. Updates from closed channels are skipped.
    pub async fn next_update(&mut self) -> Option<String> {
        loop {
            let update = self.updates_rx.recv().await?;
            if let Some(id) = self.apply(update) {
                return Some(id);
            }
        }
    }

    /// Apply every update already queued without waiting. Returns how many
    /// were applied.
    pub fn drain_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates_rx.try_recv() {
            if self.apply(update).is_some() {
                applied += 1;
            }
        }
        applied
    }

    fn apply(&mut self, update: ChannelUpdate) -> Option<String> {
        if !self.channels.accepts(&update) {
            debug!("Discarding update for closed channel {}", update.id);
            return None;
        }
        self.on_progress(&update.id, update.event);
        Some(update.id)
    }

    /// Delete a download on the backend, then drop it locally along with
    /// its channel. On failure nothing local changes.
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.gateway.delete_download(id).await.map_err(|e| {
            error!("Failed to delete download {}: {}", id, e);
            e
        })?;

        self.records.remove(id);
        self.order.retain(|known| known != id);
        self.latest.remove(id);
        self.channels.close(id);
        info!("Deleted download {}", id);
        Ok(())
    }

    pub fn view_of(&self, id: &str) -> Option<DownloadView> {
        let record = self.records.get(id)?;
        Some(DownloadView::merge(record, self.latest.get(id)))
    }

    pub fn views(&self) -> Vec<DownloadView> {
        self.records()
            .map(|record| DownloadView::merge(record, self.latest.get(&record.id)))
            .collect()
    }

    /// Whether any download still has a live channel
    pub fn has_active(&self) -> bool {
        self.channels.open_count() > 0
    }

    /// Close every channel. Called when the owning context goes away.
    pub fn shutdown(&mut self) {
        self.channels.close_all();
        self.latest.clear();
        while self.updates_rx.try_recv().is_ok() {}
    }
}
