//! Headless host: a recording 2D canvas and a frame-counting renderer.

use glam::Vec3;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::RenderError;
use crate::scene::{Rgba, Scene};
use crate::surface::{Canvas2d, Font, Rect, SceneRenderer, Surface, SurfaceHost, SurfaceSize, TextAlign};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One recorded 2D drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    Rect {
        rect: Rect,
        color: Rgba,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        font: Font,
        align: TextAlign,
        color: Rgba,
    },
}

/// Shared record of everything drawn on a [`RecordingCanvas`].
#[derive(Debug, Clone, Default)]
pub struct CanvasLog(Arc<Mutex<Vec<CanvasOp>>>);

impl CanvasLog {
    pub fn ops(&self) -> Vec<CanvasOp> {
        lock(&self.0).clone()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.0).is_empty()
    }

    /// Whether any text call contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        lock(&self.0)
            .iter()
            .any(|op| matches!(op, CanvasOp::Text { text, .. } if text.contains(needle)))
    }

    /// All drawn strings, in order.
    pub fn texts(&self) -> Vec<String> {
        lock(&self.0)
            .iter()
            .filter_map(|op| match op {
                CanvasOp::Text { text, .. } => Some(text.clone()),
                CanvasOp::Rect { .. } => None,
            })
            .collect()
    }

    fn push(&self, op: CanvasOp) {
        lock(&self.0).push(op);
    }
}

/// 2D canvas that records draw calls instead of rasterizing them.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    size: SurfaceSize,
    log: CanvasLog,
}

impl RecordingCanvas {
    pub fn new(size: SurfaceSize) -> Self {
        Self::with_log(size, CanvasLog::default())
    }

    pub fn with_log(size: SurfaceSize, log: CanvasLog) -> Self {
        Self { size, log }
    }

    pub fn log(&self) -> CanvasLog {
        self.log.clone()
    }

    pub fn ops(&self) -> Vec<CanvasOp> {
        self.log.ops()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.log.contains_text(needle)
    }
}

impl Canvas2d for RecordingCanvas {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.log.push(CanvasOp::Rect { rect, color });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: Font, align: TextAlign, color: Rgba) {
        self.log.push(CanvasOp::Text {
            text: text.to_string(),
            x,
            y,
            font,
            align,
            color,
        });
    }
}

/// Surface backed by a [`RecordingCanvas`].
pub struct RecordingSurface {
    canvas: RecordingCanvas,
    has_2d: bool,
}

impl RecordingSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self::with_log(size, CanvasLog::default())
    }

    pub fn with_log(size: SurfaceSize, log: CanvasLog) -> Self {
        Self {
            canvas: RecordingCanvas::with_log(size, log),
            has_2d: true,
        }
    }

    /// Surface whose 2D context cannot be obtained.
    pub fn without_2d(size: SurfaceSize) -> Self {
        Self {
            has_2d: false,
            ..Self::new(size)
        }
    }

    pub fn log(&self) -> CanvasLog {
        self.canvas.log()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> SurfaceSize {
        self.canvas.size
    }

    fn context_2d(&mut self) -> Option<&mut dyn Canvas2d> {
        if self.has_2d {
            Some(&mut self.canvas)
        } else {
            None
        }
    }
}

/// Counters collected by a [`CountingRenderer`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderCounts {
    pub frames: u64,
    /// Frames rendered with the model present
    pub frames_with_model: u64,
    pub resizes: u64,
    pub last_size: Option<SurfaceSize>,
    pub last_camera_position: Option<Vec3>,
    pub last_camera_target: Option<Vec3>,
}

/// Shared handle to a renderer's counters.
#[derive(Debug, Clone, Default)]
pub struct RenderStats(Arc<Mutex<RenderCounts>>);

impl RenderStats {
    pub fn snapshot(&self) -> RenderCounts {
        lock(&self.0).clone()
    }
}

/// Renderer that counts frames and remembers the camera it was given.
#[derive(Debug, Clone, Default)]
pub struct CountingRenderer {
    stats: RenderStats,
    fail: bool,
}

impl CountingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer whose every frame fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_stats(stats: RenderStats) -> Self {
        Self { stats, fail: false }
    }

    pub fn stats(&self) -> RenderStats {
        self.stats.clone()
    }
}

impl<M> SceneRenderer<M> for CountingRenderer {
    fn render(&mut self, scene: &Scene, model: Option<&M>) -> Result<(), RenderError> {
        if self.fail {
            return Err(RenderError::Frame("headless renderer set to fail".to_string()));
        }
        let mut counts = lock(&self.stats.0);
        counts.frames += 1;
        if model.is_some() {
            counts.frames_with_model += 1;
        }
        counts.last_camera_position = Some(scene.camera.position);
        counts.last_camera_target = Some(scene.camera.target);
        Ok(())
    }

    fn resize(&mut self, size: SurfaceSize) {
        let mut counts = lock(&self.stats.0);
        counts.resizes += 1;
        counts.last_size = Some(size);
    }
}

/// Host with named in-memory surfaces.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    surfaces: HashMap<String, SurfaceSize>,
    renderer_available: bool,
    canvas: CanvasLog,
    stats: RenderStats,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    /// Host with no surfaces.
    pub fn new() -> Self {
        Self {
            surfaces: HashMap::new(),
            renderer_available: true,
            canvas: CanvasLog::default(),
            stats: RenderStats::default(),
        }
    }

    pub fn with_surface(mut self, element_id: &str, size: SurfaceSize) -> Self {
        self.surfaces.insert(element_id.to_string(), size);
        self
    }

    /// Surfaces from this host have no 3D context.
    pub fn without_renderer(mut self) -> Self {
        self.renderer_available = false;
        self
    }

    /// Everything drawn on this host's 2D canvases.
    pub fn canvas(&self) -> CanvasLog {
        self.canvas.clone()
    }

    /// Counters of the renderers this host created.
    pub fn stats(&self) -> RenderStats {
        self.stats.clone()
    }
}

impl<M: 'static> SurfaceHost<M> for HeadlessHost {
    fn find_surface(&mut self, element_id: &str) -> Option<Box<dyn Surface>> {
        let size = *self.surfaces.get(element_id)?;
        Some(Box::new(RecordingSurface::with_log(size, self.canvas.clone())))
    }

    fn create_renderer(&mut self, surface: &dyn Surface) -> Result<Box<dyn SceneRenderer<M>>, RenderError> {
        if !self.renderer_available {
            return Err(RenderError::Unavailable("headless host has no 3D context".to_string()));
        }
        let mut renderer = CountingRenderer::with_stats(self.stats.clone());
        SceneRenderer::<M>::resize(&mut renderer, surface.size());
        Ok(Box::new(renderer))
    }
}
