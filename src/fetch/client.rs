//! `reqwest`-backed implementation of [`Fetcher`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::{FetchError, FetchedPage, Fetcher, partial_path};
use crate::user_agent;

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// HTTP client for pages and streamed media.
///
/// Created once per process and reused for every cycle so connections are
/// pooled.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    async fn send(&self, url: &str, accept: Option<&str>) -> Result<reqwest::Response, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        let response = request.send().await.map_err(|e| map_send_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    async fn get_text(&self, url: &str) -> Result<FetchedPage, FetchError> {
        debug!("request page");
        let response = self.send(url, Some(HTML_ACCEPT)).await?;
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| map_send_error(url, e))?;
        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }

    #[instrument(level = "debug", skip(self), fields(url = %url))]
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("request body");
        let response = self.send(url, None).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_send_error(url, e))?;
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self), fields(url = %url, dest = %dest.display()))]
    async fn download_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        debug!("starting download");
        let response = self.send(url, None).await?;

        let partial = partial_path(dest);
        let mut file = File::create(&partial)
            .await
            .map_err(|e| FetchError::io(&partial, e))?;

        let stream_result = stream_to_file(&mut file, response, url, &partial).await;
        drop(file);

        let result = match stream_result {
            Ok(bytes_written) => tokio::fs::rename(&partial, dest)
                .await
                .map(|()| bytes_written)
                .map_err(|e| FetchError::io(dest, e)),
            Err(e) => Err(e),
        };

        if result.is_err() {
            debug!(path = %partial.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(&partial).await;
        }

        let bytes_written = result?;
        info!(path = %dest.display(), bytes = bytes_written, "download complete");
        Ok(bytes_written)
    }
}

/// Streams response body to file, returning bytes written.
///
/// Kept separate so the caller can clean up on error.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| map_send_error(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(file_path, e))?;

    Ok(bytes_written)
}

fn map_send_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else {
        FetchError::network(url, error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::{
        should_skip_socket_bound_test, start_mock_server_or_skip,
    };
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[test]
    fn test_invalid_url_is_rejected_before_any_request() {
        let client = HttpClient::new();
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("out.mp4");

        let result = tokio_test::block_on(client.download_to_file("not-a-valid-url", &dest));

        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_get_text_returns_body_and_final_url() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/episode/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/episode/1", mock_server.uri());
        let page = client.get_text(&url).await.unwrap();

        assert_eq!(page.body, "<html>ok</html>");
        assert_eq!(page.url, url);
    }

    #[tokio::test]
    async fn test_get_bytes_returns_body() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/page.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "image/png")
                    .set_body_bytes(b"\x89PNG".to_vec()),
            )
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let body = client
            .get_bytes(&format!("{}/page.png", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(body, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_download_to_file_streams_body() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/media/1.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4 bytes".to_vec()))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let dest = temp_dir.path().join("0001 Episode.mp4");
        let written = client
            .download_to_file(&format!("{}/media/1.mp4", mock_server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(written, 9);
        assert_eq!(std::fs::read(&dest).unwrap(), b"mp4 bytes");
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_download_to_file_http_error_leaves_no_file() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/media/missing.mp4"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let dest = temp_dir.path().join("missing.mp4");
        let result = client
            .download_to_file(&format!("{}/media/missing.mp4", mock_server.uri()), &dest)
            .await;

        match result {
            Err(FetchError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
        assert!(!dest.exists());
    }

    /// Serves one response that declares `declared` body bytes but sends only
    /// `sent`, then either holds the connection open or closes it.
    async fn serve_truncated(declared: usize, sent: usize, hold_open: bool) -> Option<String> {
        if should_skip_socket_bound_test() {
            return None;
        }
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;

            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: {declared}\r\n\r\n"
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&vec![0u8; sent]).await.unwrap();
            socket.flush().await.unwrap();

            if hold_open {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        });

        Some(format!("http://{addr}/media/1.mp4"))
    }

    #[tokio::test]
    async fn test_download_cancelled_mid_stream_leaves_no_artifact() {
        let Some(url) = serve_truncated(100_000, 20_000, true).await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("0001 Romance Dawn (DE_SUB).mp4");

        let client = HttpClient::new();
        let outcome = tokio::time::timeout(
            Duration::from_millis(500),
            client.download_to_file(&url, &dest),
        )
        .await;

        assert!(outcome.is_err(), "download should still be waiting on the body");
        assert!(!dest.exists(), "a cancelled download must not look complete");
    }

    #[tokio::test]
    async fn test_download_truncated_body_removes_partial_file() {
        let Some(url) = serve_truncated(100_000, 20_000, false).await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("0002 Pirate Hunter (DE_SUB).mp4");

        let client = HttpClient::new();
        let result = client.download_to_file(&url, &dest).await;

        assert!(
            matches!(result, Err(FetchError::Network { .. } | FetchError::Timeout { .. })),
            "{result:?}"
        );
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_read_timeout_applies_between_chunks_not_whole_transfer() {
        if should_skip_socket_bound_test() {
            return;
        }
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\n")
                .await
                .unwrap();
            for byte in b"slow" {
                tokio::time::sleep(Duration::from_millis(400)).await;
                socket.write_all(&[*byte]).await.unwrap();
                socket.flush().await.unwrap();
            }
        });
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("0003 Slow (DE_SUB).mp4");

        let client = HttpClient::new_with_timeouts(5, 1);
        let written = client
            .download_to_file(&format!("http://{addr}/media/3.mp4"), &dest)
            .await
            .unwrap();

        assert_eq!(written, 4);
        assert_eq!(std::fs::read(&dest).unwrap(), b"slow");
    }
}
