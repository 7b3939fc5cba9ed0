use crate::catalog::VideoCatalog;
use crate::session::{DownloadRecord, DownloadView};

/// Commands sent from the front end to the session actor
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Extract {
        url: String,
    },
    SelectVariant(String),
    /// `variant_id: None` uses the current selection
    StartDownload {
        url: String,
        variant_id: Option<String>,
    },
    DeleteDownload(String),
    RefreshHistory,
    Reset,
    // System
    Shutdown,
}

/// Events sent from the session actor to the front end
#[derive(Debug, Clone)]
pub enum SessionEvent {
    // Extraction
    ExtractionStarted,
    ExtractionCompleted(Result<VideoCatalog, String>),

    // Download life-cycle
    DownloadStarted(DownloadView),
    DownloadProgress(DownloadView),
    /// Terminal status reached; the channel is already closed
    DownloadFinished(DownloadView),
    DownloadDeleted {
        id: String,
    },

    HistoryUpdated(Vec<DownloadRecord>),

    /// A request the user made was rejected
    Error(String),
}
