//! Asset loader
//!
//! Fetches a model payload through an [`AssetTransport`], reports progress,
//! and decodes the bytes with a [`ModelDecoder`]. A load can be awaited
//! directly or spawned onto the runtime and polled from the viewer tick.

pub mod file;
pub mod http;

pub use file::FileTransport;
pub use http::HttpTransport;

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::avatar::AvatarModel;
use crate::error::LoadError;

/// Bytes received so far for one in-flight load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadProgress {
    pub bytes_loaded: u64,
    /// Zero when the source did not report a size
    pub bytes_total: u64,
}

impl LoadProgress {
    /// Completion in percent (at most 100), or `None` when the total is unknown.
    pub fn percent(&self) -> Option<f32> {
        if self.bytes_total == 0 {
            None
        } else {
            Some((self.bytes_loaded as f64 / self.bytes_total as f64 * 100.0).min(100.0) as f32)
        }
    }
}

impl std::fmt::Display for LoadProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.percent() {
            Some(p) => write!(f, "{:.1}% loaded", p),
            None => write!(f, "{} bytes loaded", self.bytes_loaded),
        }
    }
}

/// Largest buffer reserved up front from a size the source announced.
pub const MAX_PREALLOC: usize = 16 << 20;

/// Starting capacity for a payload announced as `bytes_total` bytes.
///
/// The announced size is untrusted; past [`MAX_PREALLOC`] the buffer grows
/// as bytes actually arrive.
pub fn initial_capacity(bytes_total: u64) -> usize {
    usize::try_from(bytes_total).map_or(MAX_PREALLOC, |n| n.min(MAX_PREALLOC))
}

/// Progress reporter handed to transports.
///
/// Keeps `bytes_loaded` non-decreasing and `bytes_total` fixed once the
/// transport has announced it.
pub struct ProgressSink<'a> {
    current: LoadProgress,
    started: bool,
    notify: Box<dyn FnMut(LoadProgress) + Send + 'a>,
}

impl<'a> ProgressSink<'a> {
    pub fn new(notify: impl FnMut(LoadProgress) + Send + 'a) -> Self {
        Self {
            current: LoadProgress::default(),
            started: false,
            notify: Box::new(notify),
        }
    }

    /// Announce the payload size (0 if unknown). Only the first call counts.
    pub fn start(&mut self, bytes_total: u64) {
        if self.started {
            return;
        }
        self.started = true;
        self.current.bytes_total = bytes_total;
        (self.notify)(self.current);
    }

    /// Report the cumulative byte count received so far.
    pub fn advance(&mut self, bytes_loaded: u64) {
        if !self.started {
            self.start(0);
        }
        if bytes_loaded <= self.current.bytes_loaded {
            return;
        }
        self.current.bytes_loaded = bytes_loaded;
        (self.notify)(self.current);
    }

    pub fn current(&self) -> LoadProgress {
        self.current
    }
}

/// Turns raw bytes into a model.
pub trait ModelDecoder: Send + Sync + 'static {
    type Model: AvatarModel;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Model, LoadError>;
}

/// Byte source for a model payload.
///
/// Errors are reported as [`LoadError::Network`]; timeouts belong here too.
pub trait AssetTransport: Send + Sync {
    fn fetch<'a>(
        &'a self,
        source: &'a str,
        progress: &'a mut ProgressSink<'_>,
    ) -> BoxFuture<'a, Result<Vec<u8>, LoadError>>;
}

/// Pick the transport for a source location: `http(s)://` goes over HTTP,
/// anything else is read from the filesystem.
pub fn transport_for(
    source: &str,
    timeout: Duration,
) -> Result<Arc<dyn AssetTransport>, LoadError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        Ok(Arc::new(HttpTransport::new(timeout)?))
    } else {
        Ok(Arc::new(FileTransport::new()))
    }
}

/// Notification from a spawned load. `Finished` is always the last event.
pub enum LoadEvent<M> {
    Progress(LoadProgress),
    Finished(Result<M, LoadError>),
}

/// Loads one model from one source.
pub struct AssetLoader<D: ModelDecoder> {
    source: String,
    transport: Arc<dyn AssetTransport>,
    decoder: Arc<D>,
}

impl<D: ModelDecoder> Clone for AssetLoader<D> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            transport: Arc::clone(&self.transport),
            decoder: Arc::clone(&self.decoder),
        }
    }
}

impl<D: ModelDecoder> AssetLoader<D> {
    pub fn new(source: impl Into<String>, transport: Arc<dyn AssetTransport>, decoder: D) -> Self {
        Self {
            source: source.into(),
            transport,
            decoder: Arc::new(decoder),
        }
    }

    /// Loader with the transport chosen from the source scheme.
    pub fn for_source(
        source: impl Into<String>,
        decoder: D,
        timeout: Duration,
    ) -> Result<Self, LoadError> {
        let source = source.into();
        let transport = transport_for(&source, timeout)?;
        Ok(Self::new(source, transport, decoder))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Fetch and decode, calling `on_progress` before the result is returned.
    pub async fn load(
        &self,
        on_progress: impl FnMut(LoadProgress) + Send,
    ) -> Result<D::Model, LoadError> {
        let bytes = {
            let mut sink = ProgressSink::new(on_progress);
            self.transport.fetch(&self.source, &mut sink).await?
        };
        tracing::debug!("Fetched {} bytes from {}", bytes.len(), self.source);

        let model = self.decoder.decode(&bytes)?;
        tracing::info!("Loaded model '{}' from {}", model.name(), self.source);
        Ok(model)
    }

    /// Run the load on the tokio runtime and return a handle to poll.
    pub fn spawn(&self) -> PendingLoad<D::Model> {
        let (tx, rx) = mpsc::unbounded_channel();
        let loader = self.clone();

        let task = tokio::spawn(async move {
            let progress_tx = tx.clone();
            let result = loader
                .load(move |p| {
                    let _ = progress_tx.send(LoadEvent::Progress(p));
                })
                .await;
            // Receiver dropped means the viewer went away
            let _ = tx.send(LoadEvent::Finished(result));
        });

        PendingLoad {
            rx,
            task,
            finished: false,
        }
    }
}

/// Handle to a spawned load.
///
/// Events arrive in order on one channel, so every progress notification is
/// observed before the final result. Dropping the handle aborts the load.
pub struct PendingLoad<M> {
    rx: mpsc::UnboundedReceiver<LoadEvent<M>>,
    task: JoinHandle<()>,
    finished: bool,
}

impl<M> PendingLoad<M> {
    /// Next event if one is queued; never blocks.
    pub fn try_next(&mut self) -> Option<LoadEvent<M>> {
        if self.finished {
            return None;
        }
        match self.rx.try_recv() {
            Ok(event) => Some(self.observe(event)),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => Some(self.lost()),
        }
    }

    /// Wait for the next event. `None` once the result has been delivered.
    pub async fn next(&mut self) -> Option<LoadEvent<M>> {
        if self.finished {
            return None;
        }
        match self.rx.recv().await {
            Some(event) => Some(self.observe(event)),
            None => Some(self.lost()),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn observe(&mut self, event: LoadEvent<M>) -> LoadEvent<M> {
        if matches!(event, LoadEvent::Finished(_)) {
            self.finished = true;
        }
        event
    }

    // The task panicked or was aborted before sending a result
    fn lost(&mut self) -> LoadEvent<M> {
        self.finished = true;
        LoadEvent::Finished(Err(LoadError::Network(
            "load task ended without a result".to_string(),
        )))
    }
}

impl<M> Drop for PendingLoad<M> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
