//! Avatar Viewer - VRM avatar presentation pipeline
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use avatar_viewer::{
    avatar::VrmDecoder,
    config::Config,
    host::HeadlessHost,
    render_loop::FIXED_TIME_STEP,
    surface::SurfaceSize,
    web::WebServer,
    AppState, Viewer, ViewerStatus,
};

/// Avatar Viewer - load a VRM avatar, frame it and keep it rendering
#[derive(Parser, Debug)]
#[command(name = "avatar-viewer", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Avatar URL or file path (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable HTTP server
    #[arg(long)]
    no_http: bool,

    /// HTTP server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Launch native UI window
    #[cfg(feature = "native-ui")]
    #[arg(long)]
    ui: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", avatar_viewer::NAME, avatar_viewer::VERSION);

    let config = load_config(&args)?;

    // Built manually so the main thread stays free for the UI event loop
    let runtime = tokio::runtime::Runtime::new()?;

    let viewer = Viewer::new(config.clone(), VrmDecoder)?;
    let state = AppState::new(config.clone(), viewer.handle());

    // Bound before the viewer starts: the default asset source is served
    // by this same listener.
    if config.http.enabled {
        let web_server = WebServer::new(Arc::clone(&state), &config.http);
        let listener = runtime.block_on(web_server.bind())?;
        info!("HTTP server listening on {}", listener.local_addr()?);

        let http_state = Arc::clone(&state);
        runtime.spawn(async move {
            if let Err(e) = run_http_server(http_state, web_server, listener).await {
                error!("HTTP server error: {}", e);
            }
        });
    }

    // eframe owns the main thread until the window closes
    #[cfg(feature = "native-ui")]
    if args.ui {
        info!("Launching native UI window");

        // Loads are spawned from inside eframe callbacks
        let _guard = runtime.enter();

        if let Err(e) = avatar_viewer::ui::ViewerApp::run(viewer) {
            error!("UI error: {}", e);
        }

        info!("UI window closed, shutting down");
        state.shutdown();
        runtime.shutdown_timeout(Duration::from_secs(3));
        return Ok(());
    }

    let result = runtime.block_on(run_headless(viewer, Arc::clone(&state)));

    state.shutdown();
    runtime.shutdown_timeout(Duration::from_secs(3));

    info!("{} stopped", avatar_viewer::NAME);
    result
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    if let Some(ref model) = args.model {
        config.asset.source = model.clone();
    }
    if args.no_http {
        config.http.enabled = false;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }

    config.validate()?;

    info!("Avatar source: {}", config.asset.source);
    info!(
        "Surface: {} ({}x{})",
        config.viewer.surface_id, config.viewer.width, config.viewer.height
    );
    info!("HTTP server: {}", config.http.enabled);

    Ok(config)
}

/// Drive the viewer against an in-memory surface until a shutdown signal.
async fn run_headless(mut viewer: Viewer<VrmDecoder>, state: Arc<AppState>) -> anyhow::Result<()> {
    let surface = &state.config.viewer;
    let mut host = HeadlessHost::new().with_surface(
        &surface.surface_id,
        SurfaceSize::new(surface.width, surface.height),
    );

    viewer.start(&mut host)?;

    let mut status_rx = viewer.subscribe_status();
    let mut ticker = tokio::time::interval(Duration::from_secs_f32(FIXED_TIME_STEP));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => viewer.tick(),
            Ok(()) = status_rx.changed() => {
                let status = status_rx.borrow_and_update().clone();
                match status {
                    ViewerStatus::Loading(progress) => info!("Loading avatar: {}", progress),
                    ViewerStatus::Ready => {
                        let name = viewer.model().map(|m| m.name.as_str()).unwrap_or_default();
                        info!("Avatar '{}' ready", name);
                    }
                    ViewerStatus::Failed(message) => {
                        warn!("Showing fallback panel: {}", host.canvas().texts().join(" | "));
                        warn!("Viewer failed: {}", message);
                    }
                    ViewerStatus::Idle => {}
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    viewer.teardown();
    info!("Rendered {} frames", viewer.render_loop().frames());
    Ok(())
}

async fn run_http_server(
    state: Arc<AppState>,
    web_server: WebServer,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let mut shutdown_rx = state.subscribe_shutdown();

    axum::serve(listener, web_server.router())
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
