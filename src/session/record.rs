//! Server-side download records

use serde::{Deserialize, Serialize};

/// Download status as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    #[default]
    Pending,
    Downloading,
    Processing,
    Completed,
    Failed,
}

impl DownloadStatus {
    /// Statuses that still expect progress events
    pub fn is_active(self) -> bool {
        matches!(
            self,
            DownloadStatus::Pending | DownloadStatus::Downloading | DownloadStatus::Processing
        )
    }

    /// No further progress events follow these
    pub fn is_terminal(self) -> bool {
        matches!(self, DownloadStatus::Completed | DownloadStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DownloadStatus::Pending => "pending",
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Processing => "processing",
            DownloadStatus::Completed => "completed",
            DownloadStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// The backend's persisted state for one requested download.
///
/// `id` never changes; every other field may be overwritten by a terminal
/// progress event or a history refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub id: String,
    #[serde(rename = "url")]
    pub source_url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "format_id", default)]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub quality_label: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(rename = "filesize", default)]
    pub filesize_bytes: Option<u64>,
    #[serde(default)]
    pub status: DownloadStatus,
    #[serde(rename = "progress", default)]
    pub progress_percent: f64,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl DownloadRecord {
    /// A fresh pending record, as the backend returns it from a start request
    pub fn pending(id: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_url: source_url.into(),
            title: None,
            thumbnail: None,
            variant_id: None,
            quality_label: None,
            filename: None,
            filesize_bytes: None,
            status: DownloadStatus::Pending,
            progress_percent: 0.0,
            error_message: None,
            created_at: None,
            completed_at: None,
        }
    }
}
