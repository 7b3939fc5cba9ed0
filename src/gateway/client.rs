//! HTTP implementation of the gateway traits

use crate::catalog::VideoCatalog;
use crate::channel::sse::SseDecoder;
use crate::gateway::endpoints::Endpoints;
use crate::gateway::traits::{Gateway, MessageStream, ProgressSource};
use crate::session::record::DownloadRecord;
use crate::utils::config::ClientSettings;
use crate::utils::error::{Result, VidloaderError};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

const EXTRACT_FALLBACK: &str = "Extraction failed";
const START_FALLBACK: &str = "Download failed to start";
const DELETE_FALLBACK: &str = "Failed to delete download";

/// Talks to the extraction backend over HTTP
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    endpoints: Endpoints,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ApiClient {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let client = Client::builder().user_agent(&settings.user_agent).build()?;
        Ok(Self {
            client,
            endpoints: Endpoints::from_settings(settings),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Pull the backend's `detail` message out of a rejected response
    async fn rejection_detail(response: Response, fallback: &str) -> String {
        let status = response.status();
        let body = response.bytes().await.unwrap_or_default();
        let detail = detail_from_body(&body, fallback);
        error!("Backend rejected request ({}): {}", status, detail);
        detail
    }
}

/// `detail` when it is a non-empty string, otherwise the fallback
pub(crate) fn detail_from_body(body: &[u8], fallback: &str) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(serde_json::Value::String(detail)),
        }) if !detail.is_empty() => detail,
        _ => fallback.to_string(),
    }
}

#[async_trait]
impl Gateway for ApiClient {
    async fn extract(&self, url: &str) -> Result<VideoCatalog> {
        if url.trim().is_empty() {
            return Err(VidloaderError::InvalidUrl("URL must not be empty".into()));
        }
        debug!("Extracting catalog for URL: {}", url);

        let response = self
            .client
            .post(self.endpoints.extract())
            .json(&json!({ "url": url }))
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = Self::rejection_detail(response, EXTRACT_FALLBACK).await;
            return Err(VidloaderError::Extraction(detail));
        }

        Ok(response.json::<VideoCatalog>().await?)
    }

    async fn start_download(&self, url: &str, variant_id: &str) -> Result<DownloadRecord> {
        debug!("Starting download of {} (format {})", url, variant_id);

        let response = self
            .client
            .post(self.endpoints.downloads())
            .json(&json!({ "url": url, "format_id": variant_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = Self::rejection_detail(response, START_FALLBACK).await;
            return Err(VidloaderError::Start(detail));
        }

        Ok(response.json::<DownloadRecord>().await?)
    }

    async fn delete_download(&self, id: &str) -> Result<()> {
        let response = self.client.delete(self.endpoints.download(id)).send().await?;

        if !response.status().is_success() {
            let detail = Self::rejection_detail(response, DELETE_FALLBACK).await;
            return Err(VidloaderError::Delete(detail));
        }
        Ok(())
    }

    async fn list_downloads(&self) -> Result<Vec<DownloadRecord>> {
        let response = self.client.get(self.endpoints.downloads()).send().await?;

        if !response.status().is_success() {
            return Err(VidloaderError::HistoryFetch(format!(
                "HTTP {}",
                response.status()
            )));
        }

        Ok(response.json::<Vec<DownloadRecord>>().await?)
    }
}

#[async_trait]
impl ProgressSource for ApiClient {
    async fn connect(&self, id: &str) -> Result<MessageStream> {
        let address = self.endpoints.progress_channel_address(id);
        debug!("Connecting progress channel: {}", address);

        let response = self
            .client
            .get(&address)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| VidloaderError::ChannelTransport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VidloaderError::ChannelTransport(format!(
                "HTTP {} from {}",
                response.status(),
                address
            )));
        }

        let mut decoder = SseDecoder::new();
        let messages = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => decoder.feed(&bytes).into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(VidloaderError::ChannelTransport(e.to_string()))],
            })
            .flat_map(stream::iter)
            .boxed();

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::dispatch::dispatch;
    use crate::channel::sse::SseMessage;
    use crate::session::record::DownloadStatus;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    const SSE_HEAD: &[u8] = b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\n\
cache-control: no-cache\r\nconnection: close\r\n\r\n";

    /// Read one request, body included, and return it as text
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let body_len = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answer a single connection with `parts`, written as separate chunks.
    /// The handle yields the request that was answered.
    async fn serve_once(parts: Vec<Vec<u8>>) -> (ApiClient, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            for part in parts {
                socket.write_all(&part).await.unwrap();
                socket.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            let _ = socket.shutdown().await;
            request
        });

        let settings = ClientSettings {
            base_url: format!("http://{}", addr),
            ..Default::default()
        };
        (ApiClient::new(&settings).unwrap(), server)
    }

    fn reply(status: &str, body: &'static str) -> Vec<u8> {
        format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\
connection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
        .into_bytes()
    }

    #[test]
    fn test_detail_string_is_used() {
        let body = br#"{"detail":"Unsupported URL: https://nope"}"#;
        assert_eq!(
            detail_from_body(body, EXTRACT_FALLBACK),
            "Unsupported URL: https://nope"
        );
    }

    #[test]
    fn test_detail_falls_back() {
        // missing, unparseable, validation-error arrays and empty strings
        for body in [
            &b"{}"[..],
            &b"<html>502</html>"[..],
            &br#"{"detail":[{"loc":["body","url"],"msg":"invalid"}]}"#[..],
            &br#"{"detail":""}"#[..],
            &b""[..],
        ] {
            assert_eq!(detail_from_body(body, START_FALLBACK), START_FALLBACK);
        }
    }

    #[tokio::test]
    async fn test_empty_url_fails_before_any_request() {
        let settings = ClientSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let client = ApiClient::new(&settings).unwrap();
        let err = client.extract("   ").await.unwrap_err();
        assert!(matches!(err, VidloaderError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_progress_stream_decodes_split_crlf_frames() {
        let (client, server) = serve_once(vec![
            SSE_HEAD.to_vec(),
            b": ping - 2024-05-01 10:00:00\r\n\r\nevent: heartbeat\r\ndata: \r\n\r\n".to_vec(),
            b"event: progress\r\ndata: {\"status\":\"downloading\",\"progress\":12.3,".to_vec(),
            b"\"downloaded_bytes\":1024,\"total_bytes\":8325.6,\"speed\":null,\"eta\":null}\r".to_vec(),
            b"\n\r\nevent: progress\r\ndata: {\"status\":\"completed\",\"progress\":100.0,\
\"filename\":\"clip.mp4\"}\r\n\r\n".to_vec(),
        ])
        .await;

        let stream = match client.connect("d1").await {
            Ok(stream) => stream,
            Err(e) => panic!("connect failed: {}", e),
        };
        let messages: Vec<_> = stream.collect().await;
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/downloads/d1/progress "));
        assert!(request.to_ascii_lowercase().contains("accept: text/event-stream"));

        let messages: Vec<_> = messages.into_iter().map(|m| m.unwrap()).collect();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], SseMessage::new("heartbeat", ""));

        let events: Vec<_> = messages
            .iter()
            .filter_map(|m| dispatch(m).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].status, DownloadStatus::Downloading);
        assert_eq!(events[0].progress_percent, 12.3);
        assert_eq!(events[0].total_bytes, Some(8325));
        assert_eq!(events[1].status, DownloadStatus::Completed);
        assert_eq!(events[1].filename.as_deref(), Some("clip.mp4"));
    }

    #[tokio::test]
    async fn test_cut_off_progress_stream_ends_with_transport_error() {
        let (client, _server) = serve_once(vec![
            b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: 4096\r\n\r\n".to_vec(),
            b"event: progress\r\ndata: {\"status\":\"pending\",\"progress\":0}\r\n\r\n".to_vec(),
        ])
        .await;

        let stream = match client.connect("d1").await {
            Ok(stream) => stream,
            Err(e) => panic!("connect failed: {}", e),
        };
        let items: Vec<_> = stream.collect().await;

        assert!(matches!(items.first(), Some(Ok(m)) if m.event == "progress"));
        assert!(matches!(
            items.last(),
            Some(Err(VidloaderError::ChannelTransport(_)))
        ));
    }

    #[tokio::test]
    async fn test_rejected_progress_channel_is_transport_error() {
        let (client, _server) = serve_once(vec![reply(
            "404 Not Found",
            r#"{"detail":"Not Found"}"#,
        )])
        .await;

        match client.connect("missing").await {
            Err(VidloaderError::ChannelTransport(message)) => assert!(message.contains("404")),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("connect should fail"),
        }
    }

    #[tokio::test]
    async fn test_extract_rejection_carries_detail() {
        let (client, server) = serve_once(vec![reply(
            "400 Bad Request",
            r#"{"detail":"Unsupported URL: https://nope.example"}"#,
        )])
        .await;

        let err = client.extract("https://nope.example").await.unwrap_err();
        match err {
            VidloaderError::Extraction(detail) => {
                assert_eq!(detail, "Unsupported URL: https://nope.example")
            }
            other => panic!("unexpected error: {}", other),
        }

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/extract "));
        assert!(request.contains(r#""url":"https://nope.example""#));
    }

    #[tokio::test]
    async fn test_start_rejection_without_string_detail_falls_back() {
        let (client, server) = serve_once(vec![reply(
            "422 Unprocessable Entity",
            r#"{"detail":[{"loc":["body","format_id"],"msg":"field required"}]}"#,
        )])
        .await;

        let err = client.start_download("https://example.com/v", "137").await.unwrap_err();
        match err {
            VidloaderError::Start(detail) => assert_eq!(detail, START_FALLBACK),
            other => panic!("unexpected error: {}", other),
        }

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/downloads "));
        assert!(request.contains(r#""format_id":"137""#));
    }

    #[tokio::test]
    async fn test_delete_rejection_carries_detail() {
        let (client, server) = serve_once(vec![reply(
            "404 Not Found",
            r#"{"detail":"Download not found"}"#,
        )])
        .await;

        let err = client.delete_download("d1").await.unwrap_err();
        match err {
            VidloaderError::Delete(detail) => assert_eq!(detail, "Download not found"),
            other => panic!("unexpected error: {}", other),
        }
        assert!(server.await.unwrap().starts_with("DELETE /api/downloads/d1 "));
    }

    #[tokio::test]
    async fn test_delete_rejection_without_body_falls_back() {
        let (client, _server) = serve_once(vec![reply("500 Internal Server Error", "")]).await;

        let err = client.delete_download("d1").await.unwrap_err();
        assert!(matches!(err, VidloaderError::Delete(ref d) if d == DELETE_FALLBACK));
    }

    #[tokio::test]
    async fn test_history_rejection_is_fetch_error() {
        let (client, _server) = serve_once(vec![reply("503 Service Unavailable", "")]).await;

        let err = client.list_downloads().await.unwrap_err();
        assert!(matches!(err, VidloaderError::HistoryFetch(_)));
    }
}
