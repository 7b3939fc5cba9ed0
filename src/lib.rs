//! Vidloader library

pub mod backend;
pub mod catalog;
pub mod channel;
pub mod gateway;
pub mod history;
pub mod session;
pub mod utils;

// Re-export main types for easier use
pub use backend::{SessionActor, SessionCommand, SessionEvent};
pub use catalog::{Variant, VideoCatalog};
pub use channel::{ChannelManager, ProgressEvent};
pub use gateway::{ApiClient, Endpoints, Gateway, ProgressSource};
pub use history::HistoryReconciler;
pub use session::{DownloadRecord, DownloadStatus, DownloadView, SessionStore};
pub use utils::{ClientSettings, Result, VidloaderError};
