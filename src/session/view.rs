//! Merged display state for one download

use crate::channel::progress::ProgressEvent;
use crate::session::record::{DownloadRecord, DownloadStatus};
use chrono::{DateTime, Utc};

/// Latest event received on an open channel
#[derive(Debug, Clone, PartialEq)]
pub struct LiveProgress {
    pub event: ProgressEvent,
    pub received_at: DateTime<Utc>,
}

impl LiveProgress {
    pub fn now(event: ProgressEvent) -> Self {
        Self {
            event,
            received_at: Utc::now(),
        }
    }
}

/// Transfer details only a live event carries
#[derive(Debug, Clone, PartialEq)]
pub struct TransferStats {
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub speed_bytes_per_sec: Option<f64>,
    pub eta_seconds: Option<f64>,
    pub received_at: DateTime<Utc>,
}

/// What a download looks like right now: the latest live event when there
/// is one, otherwise the record as persisted. Never a mix of both.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadView {
    pub id: String,
    pub source_url: String,
    pub title: Option<String>,
    pub quality_label: Option<String>,
    pub filesize_bytes: Option<u64>,
    pub status: DownloadStatus,
    pub progress_percent: f64,
    pub filename: Option<String>,
    pub error_message: Option<String>,
    pub transfer: Option<TransferStats>,
}

impl DownloadView {
    pub fn merge(record: &DownloadRecord, live: Option<&LiveProgress>) -> Self {
        let mut view = Self {
            id: record.id.clone(),
            source_url: record.source_url.clone(),
            title: record.title.clone(),
            quality_label: record.quality_label.clone(),
            filesize_bytes: record.filesize_bytes,
            status: record.status,
            progress_percent: record.progress_percent,
            filename: record.filename.clone(),
            error_message: record.error_message.clone(),
            transfer: None,
        };

        if let Some(live) = live {
            let event = &live.event;
            view.status = event.status;
            view.progress_percent = event.progress_percent;
            view.error_message = event.error.clone();
            if event.filename.is_some() {
                view.filename = event.filename.clone();
            }
            view.transfer = Some(TransferStats {
                downloaded_bytes: event.downloaded_bytes,
                total_bytes: event.total_bytes,
                speed_bytes_per_sec: event.speed_bytes_per_sec,
                eta_seconds: event.eta_seconds,
                received_at: live.received_at,
            });
        }

        view
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// A finished file the backend can serve
    pub fn is_saveable(&self) -> bool {
        self.status == DownloadStatus::Completed && self.filename.is_some()
    }
}
