//! Avatar Viewer - VRM avatar presentation pipeline
//!
//! Loads a VRM/glTF avatar from a URL or file with progress reporting,
//! composes a lit scene, frames the camera on the model, and drives a
//! fixed-step render loop:
//! - Fallback panel on any initialization failure
//! - Expression presets applied through a command channel
//! - Optional HTTP command surface and native window

pub mod avatar;
pub mod config;
pub mod error;
pub mod fallback;
pub mod host;
pub mod loader;
pub mod render_loop;
pub mod scene;
pub mod surface;
pub mod viewer;
pub mod web;

#[cfg(feature = "native-ui")]
pub mod ui;

pub use config::Config;
pub use error::{Result, ViewerError};
pub use viewer::{Viewer, ViewerHandle, ViewerStatus};

use std::sync::Arc;
use tokio::sync::broadcast;

/// Application state shared with the HTTP surface
#[derive(Debug)]
pub struct AppState {
    /// Configuration the viewer was started with
    pub config: Config,
    /// Command and status handle of the running viewer
    pub viewer: ViewerHandle,
    /// Shutdown signal
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(config: Config, viewer: ViewerHandle) -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);
        Arc::new(Self {
            config,
            viewer,
            shutdown_tx,
        })
    }

    /// Subscribe to shutdown signal
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
