//! Streamed progress events

use crate::session::record::DownloadStatus;
use serde::{Deserialize, Deserializer, Serialize};

/// One live update for a download. Never stored on its own: it is merged
/// against its record for display and dropped once superseded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: DownloadStatus,
    #[serde(rename = "progress", default)]
    pub progress_percent: f64,
    #[serde(default, deserialize_with = "byte_count")]
    pub downloaded_bytes: Option<u64>,
    /// Falls back to the backend's estimate, which may be fractional
    #[serde(default, deserialize_with = "byte_count")]
    pub total_bytes: Option<u64>,
    #[serde(rename = "speed", default)]
    pub speed_bytes_per_sec: Option<f64>,
    #[serde(rename = "eta", default)]
    pub eta_seconds: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ByteCount {
    Whole(u64),
    Fractional(f64),
}

/// Byte counts arrive as integers or, for estimates, as floats. Floats are
/// truncated; negative or non-finite values read as absent.
fn byte_count<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ByteCount>::deserialize(deserializer)? {
        Some(ByteCount::Whole(n)) => Some(n),
        Some(ByteCount::Fractional(f)) if f.is_finite() && f >= 0.0 => Some(f as u64),
        _ => None,
    })
}

impl ProgressEvent {
    pub fn new(status: DownloadStatus, progress_percent: f64) -> Self {
        Self {
            status,
            progress_percent,
            downloaded_bytes: None,
            total_bytes: None,
            speed_bytes_per_sec: None,
            eta_seconds: None,
            error: None,
            filename: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
