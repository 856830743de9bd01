//! HTTP command surface
//!
//! JSON endpoints for expression commands and viewer status, an SSE status
//! stream, and static files (the avatar asset itself, typically).

pub mod api;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::HttpConfig;
use crate::AppState;

/// Web server for the command API
pub struct WebServer {
    app_state: Arc<AppState>,
    config: HttpConfig,
}

impl WebServer {
    pub fn new(app_state: Arc<AppState>, config: &HttpConfig) -> Self {
        Self {
            app_state,
            config: config.clone(),
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        routes::create_router(Arc::clone(&self.app_state), &self.config)
    }

    /// Bind the configured address. Connections queue on the returned
    /// listener until it is served.
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind((self.config.host.as_str(), self.config.port)).await
    }
}
