//! HTTP transport (reqwest streaming body)

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use std::time::Duration;

use super::{initial_capacity, AssetTransport, ProgressSink};
use crate::error::LoadError;

/// Downloads a model over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoadError::Network(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self { client })
    }

    async fn download(
        &self,
        url: &str,
        progress: &mut ProgressSink<'_>,
    ) -> Result<Vec<u8>, LoadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::Network(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Network(format!("{} returned HTTP {}", url, status)));
        }

        let total = response.content_length().unwrap_or(0);
        progress.start(total);

        let mut bytes = Vec::with_capacity(initial_capacity(total));
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| LoadError::Network(format!("download from {} interrupted: {}", url, e)))?;
            bytes.extend_from_slice(&chunk);
            progress.advance(bytes.len() as u64);
        }

        Ok(bytes)
    }
}

impl AssetTransport for HttpTransport {
    fn fetch<'a>(
        &'a self,
        source: &'a str,
        progress: &'a mut ProgressSink<'_>,
    ) -> BoxFuture<'a, Result<Vec<u8>, LoadError>> {
        self.download(source, progress).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_download_reports_content_length() {
        let payload = vec![1u8; 4096];
        let body = payload.clone();
        let base = serve(Router::new().route("/avatar.vrm", get(move || async move { body }))).await;

        let mut seen = Vec::new();
        let bytes = {
            let mut sink = ProgressSink::new(|p| seen.push(p));
            HttpTransport::new(Duration::from_secs(5))
                .unwrap()
                .fetch(&format!("{}/avatar.vrm", base), &mut sink)
                .await
                .unwrap()
        };

        assert_eq!(bytes, payload);
        assert!(seen.iter().all(|p| p.bytes_total == 4096));
        assert_eq!(seen.last().map(|p| p.bytes_loaded), Some(4096));
    }

    #[tokio::test]
    async fn test_bogus_content_length_is_network_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Announces ~70 TB, sends three bytes, hangs up
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 70000000000000\r\n\r\nabc")
                .await;
            let _ = socket.shutdown().await;
        });

        let mut seen = Vec::new();
        let result = {
            let mut sink = ProgressSink::new(|p| seen.push(p));
            HttpTransport::new(Duration::from_secs(5))
                .unwrap()
                .fetch(&format!("http://{}/avatar.vrm", addr), &mut sink)
                .await
        };

        assert!(matches!(result, Err(LoadError::Network(_))));
        assert_eq!(seen.first().map(|p| p.bytes_total), Some(70_000_000_000_000));
    }

    #[tokio::test]
    async fn test_error_status_is_network_error() {
        let base = serve(Router::new().route(
            "/avatar.vrm",
            get(|| async { (StatusCode::NOT_FOUND, "missing") }),
        ))
        .await;

        let mut sink = ProgressSink::new(|_| {});
        let err = HttpTransport::new(Duration::from_secs(5))
            .unwrap()
            .fetch(&format!("{}/avatar.vrm", base), &mut sink)
            .await
            .err()
            .unwrap();
        match err {
            LoadError::Network(msg) => assert!(msg.contains("404")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Bind then drop to get a port with nothing listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut sink = ProgressSink::new(|_| {});
        let err = HttpTransport::new(Duration::from_secs(5))
            .unwrap()
            .fetch(&format!("http://{}/avatar.vrm", addr), &mut sink)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, LoadError::Network(_)));
    }
}
