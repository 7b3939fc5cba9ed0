use crate::catalog::VideoCatalog;
use crate::channel::sse::SseMessage;
use crate::session::record::DownloadRecord;
use crate::utils::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// The backend's request/response surface.
///
/// This trait isolates the session layer from the transport, so the store
/// can be driven by the HTTP client or by an in-memory double. Every call is
/// single-shot: retry policy belongs to the caller.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch the variant catalog for a video URL
    async fn extract(&self, url: &str) -> Result<VideoCatalog>;

    /// Ask the backend to start downloading `variant_id` of `url`
    async fn start_download(&self, url: &str, variant_id: &str) -> Result<DownloadRecord>;

    async fn delete_download(&self, id: &str) -> Result<()>;

    /// Persisted downloads, newest first
    async fn list_downloads(&self) -> Result<Vec<DownloadRecord>>;
}

/// Stream of raw events from one progress channel.
///
/// Dropping the stream closes the underlying connection.
pub type MessageStream = BoxStream<'static, Result<SseMessage>>;

/// Opens server-push progress channels
#[async_trait]
pub trait ProgressSource: Send + Sync {
    async fn connect(&self, id: &str) -> Result<MessageStream>;
}
