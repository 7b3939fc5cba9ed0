//! Persisted download history, reconciled with local deletions

use crate::gateway::traits::Gateway;
use crate::session::record::DownloadRecord;
use crate::session::store::SessionStore;
use crate::utils::error::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Mirrors the backend's download list.
///
/// Entries reflect whatever `list_downloads` last returned, minus anything
/// deleted locally since. Progress is not tracked here.
pub struct HistoryReconciler {
    gateway: Arc<dyn Gateway>,
    entries: Vec<DownloadRecord>,
}

impl HistoryReconciler {
    /// Create the reconciler and run the initial fetch
    pub async fn load(gateway: Arc<dyn Gateway>) -> Self {
        let mut history = Self {
            gateway,
            entries: Vec::new(),
        };
        history.refresh().await;
        history
    }

    /// Entries in server order (newest first)
    pub fn entries(&self) -> &[DownloadRecord] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-fetch the list. A failed fetch keeps the previous entries.
    pub async fn refresh(&mut self) {
        match self.gateway.list_downloads().await {
            Ok(entries) => {
                debug!("History refreshed: {} entries", entries.len());
                self.entries = entries;
            }
            Err(e) => warn!("History fetch failed, keeping stale list: {}", e),
        }
    }

    /// Delete through the session store; drop the entry once that succeeds
    pub async fn delete(&mut self, store: &mut SessionStore, id: &str) -> Result<()> {
        store.delete(id).await?;
        self.entries.retain(|entry| entry.id != id);
        Ok(())
    }
}
