use super::messages::{SessionCommand, SessionEvent};
use crate::gateway::{ApiClient, Gateway, ProgressSource};
use crate::history::HistoryReconciler;
use crate::session::SessionStore;
use crate::utils::config::ClientSettings;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Owns the session store and history, and is the only task that touches
/// them. Commands and channel updates are handled one at a time.
///
/// The actor is the owning context for every progress channel: when it
/// stops (on `Shutdown` or when all command senders are gone) every open
/// channel is closed.
pub struct SessionActor {
    receiver: mpsc::Receiver<SessionCommand>,
    sender: mpsc::Sender<SessionEvent>,

    // Components
    store: SessionStore,
    history: HistoryReconciler,
}

impl SessionActor {
    /// Build an actor talking to the configured HTTP backend
    pub async fn new(
        settings: &ClientSettings,
        receiver: mpsc::Receiver<SessionCommand>,
        sender: mpsc::Sender<SessionEvent>,
    ) -> Result<Self> {
        settings.validate()?;
        let client = Arc::new(ApiClient::new(settings)?);
        Ok(Self::with_backend(
            client.clone(),
            client,
            settings.update_buffer,
            receiver,
            sender,
        )
        .await)
    }

    pub async fn with_backend(
        gateway: Arc<dyn Gateway>,
        source: Arc<dyn ProgressSource>,
        update_buffer: usize,
        receiver: mpsc::Receiver<SessionCommand>,
        sender: mpsc::Sender<SessionEvent>,
    ) -> Self {
        let store = SessionStore::new(Arc::clone(&gateway), source, update_buffer);
        let history = HistoryReconciler::load(gateway).await;

        Self {
            receiver,
            sender,
            store,
            history,
        }
    }

    pub async fn run(mut self) {
        info!("SessionActor started");
        self.publish_history().await;

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd).await,
                },
                Some(id) = self.store.next_update() => {
                    self.handle_progress(&id).await;
                }
            }
        }

        self.store.shutdown();
        info!("SessionActor shut down");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Extract { url } => self.handle_extract(url).await,
            SessionCommand::SelectVariant(id) => self.store.select_variant(id),
            SessionCommand::StartDownload { url, variant_id } => {
                self.handle_start_download(url, variant_id).await;
            }
            SessionCommand::DeleteDownload(id) => self.handle_delete(id).await,
            SessionCommand::RefreshHistory => {
                self.history.refresh().await;
                self.publish_history().await;
            }
            SessionCommand::Reset => self.store.reset(),
            SessionCommand::Shutdown => {}
        }
    }

    async fn handle_extract(&mut self, url: String) {
        let _ = self.sender.send(SessionEvent::ExtractionStarted).await;

        let result = match self.store.extract(&url).await {
            Ok(()) => self
                .store
                .catalog()
                .cloned()
                .ok_or_else(|| "Extraction returned no catalog".to_string()),
            Err(e) => Err(e.to_string()),
        };
        let _ = self
            .sender
            .send(SessionEvent::ExtractionCompleted(result))
            .await;
    }

    async fn handle_start_download(&mut self, url: String, variant_id: Option<String>) {
        let variant_id = match variant_id.or_else(|| self.store.selected_variant().map(String::from)) {
            Some(id) => id,
            None => {
                let _ = self
                    .sender
                    .send(SessionEvent::Error("No format selected".to_string()))
                    .await;
                return;
            }
        };

        match self.store.start(&url, &variant_id).await {
            Ok(id) => {
                if let Some(view) = self.store.view_of(&id) {
                    let _ = self.sender.send(SessionEvent::DownloadStarted(view)).await;
                }
                self.history.refresh().await;
                self.publish_history().await;
            }
            Err(e) => {
                let _ = self.sender.send(SessionEvent::Error(e.to_string())).await;
            }
        }
    }

    async fn handle_delete(&mut self, id: String) {
        match self.history.delete(&mut self.store, &id).await {
            Ok(()) => {
                let _ = self.sender.send(SessionEvent::DownloadDeleted { id }).await;
                self.publish_history().await;
            }
            Err(e) => {
                let _ = self.sender.send(SessionEvent::Error(e.to_string())).await;
            }
        }
    }

    async fn handle_progress(&mut self, id: &str) {
        let Some(view) = self.store.view_of(id) else {
            return;
        };

        if view.status.is_terminal() {
            debug!("Download {} reached {}, refreshing history", id, view.status);
            let _ = self.sender.send(SessionEvent::DownloadFinished(view)).await;
            self.history.refresh().await;
            self.publish_history().await;
        } else {
            let _ = self.sender.send(SessionEvent::DownloadProgress(view)).await;
        }
    }

    async fn publish_history(&self) {
        let entries = self.history.entries().to_vec();
        let _ = self.sender.send(SessionEvent::HistoryUpdated(entries)).await;
    }
}
