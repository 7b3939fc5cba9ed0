//! In-memory backend double shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vidloader::catalog::{Variant, VideoCatalog};
use vidloader::channel::SseMessage;
use vidloader::gateway::{Gateway, MessageStream, ProgressSource};
use vidloader::session::{DownloadRecord, DownloadStatus};
use vidloader::{Result, SessionStore, VidloaderError};

/// Scripted backend: catalogs per URL, queued start results, a deletable
/// id set and one feed per progress channel.
#[derive(Default)]
pub struct MockBackend {
    catalogs: Mutex<HashMap<String, VideoCatalog>>,
    starts: Mutex<VecDeque<std::result::Result<DownloadRecord, String>>>,
    history: Mutex<Option<Vec<DownloadRecord>>>,
    known: Mutex<HashSet<String>>,
    feeds: Mutex<HashMap<String, UnboundedReceiver<Result<SseMessage>>>>,
    connects: Mutex<Vec<String>>,
    list_calls: Mutex<usize>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_catalog(&self, catalog: VideoCatalog) {
        self.catalogs
            .lock()
            .unwrap()
            .insert(catalog.source_url.clone(), catalog);
    }

    pub fn queue_start(&self, record: DownloadRecord) {
        self.starts.lock().unwrap().push_back(Ok(record));
    }

    pub fn queue_start_failure(&self, detail: &str) {
        self.starts.lock().unwrap().push_back(Err(detail.to_string()));
    }

    /// `None` makes `list_downloads` fail
    pub fn set_history(&self, history: Option<Vec<DownloadRecord>>) {
        if let Some(records) = &history {
            let mut known = self.known.lock().unwrap();
            for r in records {
                known.insert(r.id.clone());
            }
        }
        *self.history.lock().unwrap() = history;
    }

    /// Prepare the progress feed the next connect for `id` will read
    pub fn feed(&self, id: &str) -> Feed {
        let (tx, rx) = unbounded();
        self.feeds.lock().unwrap().insert(id.to_string(), rx);
        Feed { tx }
    }

    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    pub fn store(self: &Arc<Self>) -> SessionStore {
        SessionStore::new(self.clone(), self.clone(), 16)
    }
}

#[async_trait]
impl Gateway for MockBackend {
    async fn extract(&self, url: &str) -> Result<VideoCatalog> {
        if url.trim().is_empty() {
            return Err(VidloaderError::InvalidUrl("URL must not be empty".into()));
        }
        self.catalogs
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| VidloaderError::Extraction(format!("Unsupported URL: {}", url)))
    }

    async fn start_download(&self, _url: &str, _variant_id: &str) -> Result<DownloadRecord> {
        match self.starts.lock().unwrap().pop_front() {
            Some(Ok(record)) => {
                self.known.lock().unwrap().insert(record.id.clone());
                Ok(record)
            }
            Some(Err(detail)) => Err(VidloaderError::Start(detail)),
            None => Err(VidloaderError::Start("Download failed to start".into())),
        }
    }

    async fn delete_download(&self, id: &str) -> Result<()> {
        if self.known.lock().unwrap().remove(id) {
            if let Some(history) = self.history.lock().unwrap().as_mut() {
                history.retain(|r| r.id != id);
            }
            Ok(())
        } else {
            Err(VidloaderError::Delete("Download not found".into()))
        }
    }

    async fn list_downloads(&self) -> Result<Vec<DownloadRecord>> {
        *self.list_calls.lock().unwrap() += 1;
        self.history
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| VidloaderError::HistoryFetch("HTTP 503".into()))
    }
}

#[async_trait]
impl ProgressSource for MockBackend {
    async fn connect(&self, id: &str) -> Result<MessageStream> {
        self.connects.lock().unwrap().push(id.to_string());
        match self.feeds.lock().unwrap().remove(id) {
            Some(rx) => Ok(rx.boxed()),
            None => Ok(stream::pending().boxed()),
        }
    }
}

/// Test side of one progress channel
pub struct Feed {
    tx: UnboundedSender<Result<SseMessage>>,
}

impl Feed {
    pub fn progress(&self, json: &str) {
        let _ = self
            .tx
            .unbounded_send(Ok(SseMessage::new("progress", json)));
    }

    pub fn heartbeat(&self) {
        let _ = self.tx.unbounded_send(Ok(SseMessage::new("heartbeat", "")));
    }

    pub fn drop_connection(&self) {
        let _ = self.tx.unbounded_send(Err(VidloaderError::ChannelTransport(
            "connection reset".into(),
        )));
    }

    /// Whether the client side has let go of the stream
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Poll until the client drops the stream, or give up
    pub async fn wait_closed(&self) -> bool {
        for _ in 0..50 {
            if self.is_closed() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

pub fn variant(id: &str, video: bool, audio: bool) -> Variant {
    Variant {
        variant_id: id.to_string(),
        container_ext: if video { "mp4" } else { "m4a" }.to_string(),
        quality_label: id.to_string(),
        approx_size_bytes: Some(1_048_576),
        has_video_track: video,
        has_audio_track: audio,
        note: String::new(),
    }
}

pub fn sample_catalog(url: &str) -> VideoCatalog {
    VideoCatalog {
        source_url: url.to_string(),
        title: "Sample Video".to_string(),
        thumbnail_url: None,
        duration_seconds: Some(60),
        uploader: Some("Uploader".to_string()),
        variants: vec![variant("137", true, false), variant("140", false, true)],
    }
}

pub fn pending(id: &str) -> DownloadRecord {
    DownloadRecord::pending(id, "https://example.com/watch?v=vid123")
}

pub fn finished(id: &str, status: DownloadStatus) -> DownloadRecord {
    let mut record = pending(id);
    record.status = status;
    record.progress_percent = if status == DownloadStatus::Completed { 100.0 } else { 0.0 };
    record
}

/// Wait for the next applied update, failing the test after a second
pub async fn next_update(store: &mut SessionStore) -> String {
    tokio::time::timeout(Duration::from_secs(1), store.next_update())
        .await
        .expect("timed out waiting for a progress update")
        .expect("update queue closed")
}

/// True when no update gets applied within a short window
pub async fn stays_quiet(store: &mut SessionStore) -> bool {
    tokio::time::timeout(Duration::from_millis(100), store.next_update())
        .await
        .is_err()
}
