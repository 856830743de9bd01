//! Route definitions for the command API

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;
use crate::AppState;

use super::api;

/// Create the main router with all routes
pub fn create_router(app_state: Arc<AppState>, config: &HttpConfig) -> Router {
    let cors = if config.cors_enabled {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/api/status", get(api::get_status))
        .route("/api/status/stream", get(api::status_stream))
        .route("/api/expression", post(api::set_expression))
        // Avatar assets
        .nest_service("/static", ServeDir::new(&config.static_dir))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tokio::sync::{mpsc, watch};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::loader::LoadProgress;
    use crate::viewer::{ViewerCommand, ViewerHandle, ViewerStatus};

    struct Fixture {
        router: Router,
        commands: mpsc::UnboundedReceiver<ViewerCommand>,
        status: watch::Sender<ViewerStatus>,
        _static_dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(static_dir.path().join("avatar.vrm"), b"glTF-bytes").unwrap();

        let (command_tx, commands) = mpsc::unbounded_channel();
        let (status, status_rx) = watch::channel(ViewerStatus::Idle);
        let handle = ViewerHandle::new(command_tx, status_rx);

        let mut config = Config::default();
        config.http.static_dir = static_dir.path().to_string_lossy().into_owned();
        let http = config.http.clone();
        let state = AppState::new(config, handle);

        Fixture {
            router: create_router(state, &http),
            commands,
            status,
            _static_dir: static_dir,
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_expression(body: &str) -> Request<Body> {
        Request::post("/api/expression")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_expression_is_forwarded() {
        let mut f = fixture();

        let response = f
            .router
            .clone()
            .oneshot(post_expression(r#"{"name":"ANGRY"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(
            f.commands.try_recv().unwrap(),
            ViewerCommand::SetExpression("ANGRY".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_expression_rejected() {
        let mut f = fixture();

        let response = f.router.clone().oneshot(post_expression(r#"{"name":"  "}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(f.commands.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_expression_after_viewer_gone() {
        let f = fixture();
        drop(f.commands);

        let response = f.router.oneshot(post_expression(r#"{"name":"happy"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_status_reports_progress() {
        let f = fixture();
        f.status.send_replace(ViewerStatus::Loading(LoadProgress {
            bytes_loaded: 50,
            bytes_total: 200,
        }));

        let response = f
            .router
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "loading");
        assert_eq!(json["data"]["bytes_loaded"], 50);
        assert_eq!(json["data"]["percent"], 25.0);
    }

    #[tokio::test]
    async fn test_status_reports_failure_message() {
        let f = fixture();
        f.status
            .send_replace(ViewerStatus::Failed("Failed to load the VRM file: boom".to_string()));

        let response = f
            .router
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "failed");
        assert_eq!(json["data"]["message"], "Failed to load the VRM file: boom");
    }

    #[tokio::test]
    async fn test_static_asset_served() {
        let f = fixture();

        let response = f
            .router
            .oneshot(Request::get("/static/avatar.vrm").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"glTF-bytes");
    }
}
