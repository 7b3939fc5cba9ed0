pub mod record;
pub mod store;
pub mod view;

pub use record::{DownloadRecord, DownloadStatus};
pub use store::SessionStore;
pub use view::{DownloadView, LiveProgress, TransferStats};
