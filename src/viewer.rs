//! Viewer orchestrator
//!
//! Sequences the pipeline: find the surface, compose the base scene, create
//! the renderer, load the model, frame the camera, start the render loop.
//! Every initialization failure after the surface lookup ends on the
//! fallback panel. Commands from other tasks arrive over a channel and are
//! applied at the start of each tick, so [`ViewerState`] has one writer.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::avatar::{set_expression, AvatarModel};
use crate::config::{Config, FallbackConfig};
use crate::error::{LoadError, Result, ViewerError};
use crate::fallback::render_fallback;
use crate::loader::{AssetLoader, AssetTransport, LoadEvent, LoadProgress, ModelDecoder, PendingLoad};
use crate::render_loop::RenderLoop;
use crate::scene::{attach_model, compose_base_scene, frame, Scene};
use crate::surface::{SceneRenderer, Surface, SurfaceHost, SurfaceSize};

/// Command accepted from outside the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerCommand {
    SetExpression(String),
}

/// Coarse pipeline status, published for observers.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerStatus {
    Idle,
    Loading(LoadProgress),
    Ready,
    /// The fallback panel is showing this message
    Failed(String),
}

impl ViewerStatus {
    pub fn name(&self) -> &'static str {
        match self {
            ViewerStatus::Idle => "idle",
            ViewerStatus::Loading(_) => "loading",
            ViewerStatus::Ready => "ready",
            ViewerStatus::Failed(_) => "failed",
        }
    }
}

/// Cloneable, `Send` handle for talking to a viewer from other tasks.
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    commands: mpsc::UnboundedSender<ViewerCommand>,
    status: watch::Receiver<ViewerStatus>,
}

impl ViewerHandle {
    pub fn new(commands: mpsc::UnboundedSender<ViewerCommand>, status: watch::Receiver<ViewerStatus>) -> Self {
        Self { commands, status }
    }

    /// Queue an expression change. Returns `false` if the viewer is gone.
    pub fn update_expression(&self, name: &str) -> bool {
        self.commands
            .send(ViewerCommand::SetExpression(name.to_string()))
            .is_ok()
    }

    pub fn status(&self) -> ViewerStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewerStatus> {
        self.status.clone()
    }
}

/// Everything the pipeline builds for one surface.
pub struct ViewerState<M> {
    pub(crate) surface: Box<dyn Surface>,
    pub(crate) scene: Scene,
    pub(crate) renderer: Option<Box<dyn SceneRenderer<M>>>,
    pub(crate) model: Option<M>,
    /// Set only after `model` is stored, framed and attached
    pub(crate) ready: bool,
    pub(crate) progress: Option<LoadProgress>,
}

impl<M> ViewerState<M> {
    pub fn new(surface: Box<dyn Surface>, scene: Scene) -> Self {
        Self {
            surface,
            scene,
            renderer: None,
            model: None,
            ready: false,
            progress: None,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Latest progress of the model load, if any arrived.
    pub fn progress(&self) -> Option<LoadProgress> {
        self.progress
    }
}

/// The viewer: owns the state, the loop and the in-flight load.
pub struct Viewer<D: ModelDecoder> {
    config: Config,
    loader: AssetLoader<D>,
    state: Option<ViewerState<D::Model>>,
    render_loop: RenderLoop,
    pending: Option<PendingLoad<D::Model>>,
    commands_tx: mpsc::UnboundedSender<ViewerCommand>,
    commands_rx: mpsc::UnboundedReceiver<ViewerCommand>,
    status_tx: watch::Sender<ViewerStatus>,
}

impl<D: ModelDecoder> Viewer<D> {
    /// Viewer loading `config.asset.source` with the matching transport.
    pub fn new(config: Config, decoder: D) -> Result<Self> {
        let loader = AssetLoader::for_source(
            config.asset.source.clone(),
            decoder,
            Duration::from_secs(config.asset.timeout_secs),
        )?;
        Ok(Self::with_loader(config, loader))
    }

    /// Viewer loading through an explicit transport.
    pub fn with_transport(config: Config, transport: Arc<dyn AssetTransport>, decoder: D) -> Self {
        let loader = AssetLoader::new(config.asset.source.clone(), transport, decoder);
        Self::with_loader(config, loader)
    }

    pub fn with_loader(config: Config, loader: AssetLoader<D>) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(ViewerStatus::Idle);

        Self {
            config,
            loader,
            state: None,
            render_loop: RenderLoop::new(),
            pending: None,
            commands_tx,
            commands_rx,
            status_tx,
        }
    }

    /// Run the synchronous part of the pipeline and spawn the model load.
    ///
    /// A missing surface is the only error returned to the caller; later
    /// failures are shown on the fallback panel. Must be called inside a
    /// tokio runtime.
    pub fn start(&mut self, host: &mut dyn SurfaceHost<D::Model>) -> Result<()> {
        if self.pending.is_some() {
            return Err(ViewerError::LoadInFlight);
        }

        let surface_id = self.config.viewer.surface_id.clone();
        let Some(mut surface) = host.find_surface(&surface_id) else {
            tracing::error!("Surface '{}' not found, viewer not started", surface_id);
            self.publish(ViewerStatus::Failed(format!("surface '{}' not found", surface_id)));
            return Err(ViewerError::SurfaceMissing(surface_id));
        };

        let size = surface.size();
        tracing::info!("Starting viewer on '{}' ({}x{})", surface_id, size.width, size.height);

        let scene = compose_base_scene(size, &self.config.scene);

        let renderer = match host.create_renderer(surface.as_ref()) {
            Ok(renderer) => renderer,
            Err(e) => {
                tracing::error!("Renderer initialization failed: {}", e);
                let detail = format!("Failed to initialize the viewer: {}", e);
                show_fallback(surface.as_mut(), &self.config.fallback, &detail);
                self.state = Some(ViewerState::new(surface, scene));
                self.publish(ViewerStatus::Failed(detail));
                return Ok(());
            }
        };

        let mut state = ViewerState::new(surface, scene);
        state.renderer = Some(renderer);
        self.state = Some(state);

        tracing::info!("Loading model from {}", self.loader.source());
        self.pending = Some(self.loader.spawn());
        self.publish(ViewerStatus::Loading(LoadProgress::default()));
        Ok(())
    }

    /// One frame: apply queued commands, collect load events, run the loop.
    pub fn tick(&mut self) {
        while let Ok(command) = self.commands_rx.try_recv() {
            match command {
                ViewerCommand::SetExpression(name) => self.update_expression(&name),
            }
        }

        while let Some(event) = self.pending.as_mut().and_then(|p| p.try_next()) {
            self.handle_load_event(event);
        }

        self.render_loop.tick(self.state.as_mut());
    }

    /// Wait until the in-flight load (if any) has settled.
    pub async fn wait_for_load(&mut self) {
        while let Some(pending) = self.pending.as_mut() {
            match pending.next().await {
                Some(event) => self.handle_load_event(event),
                None => self.pending = None,
            }
        }
    }

    /// Apply an expression to the loaded model. Before the model is ready
    /// this only logs.
    pub fn update_expression(&mut self, name: &str) {
        let Some(model) = self
            .state
            .as_mut()
            .filter(|state| state.ready)
            .and_then(|state| state.model.as_mut())
        else {
            tracing::warn!("Expression '{}' ignored: model not loaded yet", name);
            return;
        };

        match set_expression(model, name) {
            Ok(Some(preset)) => tracing::info!("Expression set: {}", preset),
            Ok(None) => tracing::info!("Unknown expression '{}', cleared all expressions", name),
            Err(e) => tracing::warn!("Expression '{}' not applied: {}", name, e),
        }
    }

    /// The surface changed size.
    pub fn resize(&mut self, size: SurfaceSize) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if size.is_empty() {
            return;
        }
        state.scene.camera.set_aspect(size.aspect());
        if let Some(renderer) = state.renderer.as_mut() {
            renderer.resize(size);
        }
    }

    /// Drop the state and abort any load. The viewer can be started again.
    pub fn teardown(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!("Aborted in-flight model load");
        }
        if self.state.take().is_some() {
            tracing::info!("Viewer torn down");
        }
        self.publish(ViewerStatus::Idle);
    }

    pub fn handle(&self) -> ViewerHandle {
        ViewerHandle::new(self.commands_tx.clone(), self.status_tx.subscribe())
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ViewerStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> ViewerStatus {
        self.status_tx.borrow().clone()
    }

    pub fn state(&self) -> Option<&ViewerState<D::Model>> {
        self.state.as_ref()
    }

    pub fn model(&self) -> Option<&D::Model> {
        self.state.as_ref().and_then(|s| s.model.as_ref())
    }

    pub fn is_ready(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.ready)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn handle_load_event(&mut self, event: LoadEvent<D::Model>) {
        match event {
            LoadEvent::Progress(progress) => {
                tracing::debug!("Model load progress: {}", progress);
                if let Some(state) = self.state.as_mut() {
                    state.progress = Some(progress);
                }
                self.publish(ViewerStatus::Loading(progress));
            }
            LoadEvent::Finished(result) => {
                self.pending = None;
                self.finish_load(result);
            }
        }
    }

    fn finish_load(&mut self, result: std::result::Result<D::Model, LoadError>) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match result {
            Ok(model) => {
                attach_model(&mut state.scene, &model);
                if let Err(e) = frame(&mut state.scene.camera, &model.bounds()) {
                    tracing::warn!("Camera framing skipped: {}", e);
                }
                tracing::info!(
                    "Camera framed at {:?}, looking at {:?}",
                    state.scene.camera.position,
                    state.scene.camera.target
                );

                state.model = Some(model);
                state.ready = true;
                self.render_loop.start();
                self.publish(ViewerStatus::Ready);
            }
            Err(e) => {
                tracing::error!("Model load failed: {}", e);
                let detail = format!("Failed to load the VRM file: {}", e);
                show_fallback(state.surface.as_mut(), &self.config.fallback, &detail);
                self.publish(ViewerStatus::Failed(detail));
            }
        }
    }

    fn publish(&self, status: ViewerStatus) {
        self.status_tx.send_replace(status);
    }
}

fn show_fallback(surface: &mut dyn Surface, config: &FallbackConfig, detail: &str) {
    match surface.context_2d() {
        Some(canvas) => render_fallback(canvas, &config.headline, detail, config),
        None => tracing::error!("No 2D context for the fallback panel: {}", detail),
    }
}
