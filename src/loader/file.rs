//! Filesystem transport

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::io::AsyncReadExt;

use super::{initial_capacity, AssetTransport, ProgressSink};
use crate::error::LoadError;

const CHUNK_SIZE: usize = 64 * 1024;

/// Reads a model from a local path in fixed-size chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTransport;

impl FileTransport {
    pub fn new() -> Self {
        Self
    }

    async fn read(&self, path: &str, progress: &mut ProgressSink<'_>) -> Result<Vec<u8>, LoadError> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| LoadError::Network(format!("cannot open {}: {}", path, e)))?;

        let total = file
            .metadata()
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        progress.start(total);

        let mut bytes = Vec::with_capacity(initial_capacity(total));
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let n = file
                .read(&mut chunk)
                .await
                .map_err(|e| LoadError::Network(format!("read of {} interrupted: {}", path, e)))?;
            if n == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..n]);
            progress.advance(bytes.len() as u64);
        }

        Ok(bytes)
    }
}

impl AssetTransport for FileTransport {
    fn fetch<'a>(
        &'a self,
        source: &'a str,
        progress: &'a mut ProgressSink<'_>,
    ) -> BoxFuture<'a, Result<Vec<u8>, LoadError>> {
        let path = source.strip_prefix("file://").unwrap_or(source);
        self.read(path, progress).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_file_with_known_total() {
        let payload = vec![7u8; CHUNK_SIZE + 100];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&payload).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let mut seen = Vec::new();
        let bytes = {
            let mut sink = ProgressSink::new(|p| seen.push(p));
            FileTransport::new().fetch(&path, &mut sink).await.unwrap()
        };

        assert_eq!(bytes, payload);
        assert_eq!(seen.first().map(|p| p.bytes_loaded), Some(0));
        assert_eq!(seen.last().map(|p| p.bytes_loaded), Some(payload.len() as u64));
        assert!(seen.iter().all(|p| p.bytes_total == payload.len() as u64));
    }

    #[tokio::test]
    async fn test_large_file_reads_past_the_preallocation() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let len = (crate::loader::MAX_PREALLOC + CHUNK_SIZE) as u64;
        file.as_file().set_len(len).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let mut sink = ProgressSink::new(|_| {});
        let bytes = FileTransport::new().fetch(&path, &mut sink).await.unwrap();

        assert_eq!(bytes.len() as u64, len);
        assert_eq!(sink.current().bytes_total, len);
    }

    #[tokio::test]
    async fn test_file_url_prefix() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        let url = format!("file://{}", file.path().display());

        let mut sink = ProgressSink::new(|_| {});
        let bytes = FileTransport::new().fetch(&url, &mut sink).await.unwrap();
        assert_eq!(bytes, b"abc");
    }

    #[tokio::test]
    async fn test_missing_file_is_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.vrm");

        let mut sink = ProgressSink::new(|_| {});
        let err = FileTransport::new()
            .fetch(&path.to_string_lossy(), &mut sink)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, LoadError::Network(_)));
    }
}
