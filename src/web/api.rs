//! REST API endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

use crate::viewer::ViewerStatus;
use crate::AppState;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

impl ApiResponse<()> {
    pub fn error(message: &str) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
        })
    }

    pub fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            error: None,
        })
    }
}

/// Viewer status as served to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_loaded: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f32>,
    /// Fallback message when the viewer failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&ViewerStatus> for StatusResponse {
    fn from(status: &ViewerStatus) -> Self {
        let mut response = Self {
            status: status.name().to_string(),
            bytes_loaded: None,
            bytes_total: None,
            percent: None,
            message: None,
        };
        match status {
            ViewerStatus::Loading(progress) => {
                response.bytes_loaded = Some(progress.bytes_loaded);
                response.bytes_total = Some(progress.bytes_total);
                response.percent = progress.percent();
            }
            ViewerStatus::Failed(message) => response.message = Some(message.clone()),
            ViewerStatus::Idle | ViewerStatus::Ready => {}
        }
        response
    }
}

/// Get current viewer status
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ApiResponse::success(StatusResponse::from(&state.viewer.status()))
}

/// Set expression request
#[derive(Debug, Deserialize)]
pub struct SetExpressionRequest {
    pub name: String,
}

/// Queue an expression change on the viewer
pub async fn set_expression(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetExpressionRequest>,
) -> impl IntoResponse {
    let name = request.name.trim();
    if name.is_empty() {
        return (StatusCode::BAD_REQUEST, ApiResponse::error("expression name is empty"));
    }

    if state.viewer.update_expression(name) {
        tracing::debug!("Queued expression '{}'", name);
        (StatusCode::ACCEPTED, ApiResponse::ok())
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, ApiResponse::error("viewer is not running"))
    }
}

/// SSE stream of status changes, starting with the current status
pub async fn status_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.viewer.subscribe()).map(|status| Ok(status_to_event(&status)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn status_to_event(status: &ViewerStatus) -> Event {
    let data = serde_json::to_string(&StatusResponse::from(status)).unwrap_or_default();
    Event::default().event("status").data(data)
}
