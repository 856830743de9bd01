//! Surface host backed by the eframe window.
//!
//! The 2D canvas records into a [`CanvasLog`] that the app paints with the
//! egui painter; the 3D renderer drives a shared [`SceneGpu`].

use std::sync::Arc;

use eframe::egui_wgpu::RenderState;

use crate::avatar::VrmModel;
use crate::error::RenderError;
use crate::host::{CanvasLog, RecordingSurface};
use crate::surface::{SceneRenderer, Surface, SurfaceHost, SurfaceSize};

use super::renderer::{SceneGpu, WgpuSceneRenderer};

pub struct WindowHost {
    surface_id: String,
    size: SurfaceSize,
    render_state: Option<RenderState>,
    canvas: CanvasLog,
    gpu: Option<Arc<SceneGpu>>,
}

impl WindowHost {
    pub fn new(surface_id: &str, size: SurfaceSize, render_state: Option<RenderState>) -> Self {
        Self {
            surface_id: surface_id.to_string(),
            size,
            render_state,
            canvas: CanvasLog::default(),
            gpu: None,
        }
    }

    pub fn canvas(&self) -> CanvasLog {
        self.canvas.clone()
    }

    /// GPU state of the renderer created for this window, if any.
    pub fn gpu(&self) -> Option<Arc<SceneGpu>> {
        self.gpu.clone()
    }
}

impl SurfaceHost<VrmModel> for WindowHost {
    fn find_surface(&mut self, element_id: &str) -> Option<Box<dyn Surface>> {
        if element_id != self.surface_id {
            return None;
        }
        Some(Box::new(RecordingSurface::with_log(
            self.size,
            self.canvas.clone(),
        )))
    }

    fn create_renderer(
        &mut self,
        surface: &dyn Surface,
    ) -> Result<Box<dyn SceneRenderer<VrmModel>>, RenderError> {
        let render_state = self
            .render_state
            .clone()
            .ok_or_else(|| RenderError::Unavailable("wgpu render state not available".to_string()))?;

        let size = surface.size();
        let gpu = Arc::new(SceneGpu::new(
            &render_state.device,
            render_state.target_format,
            size.width,
            size.height,
        ));
        self.gpu = Some(gpu.clone());
        Ok(Box::new(WgpuSceneRenderer::new(gpu, render_state)))
    }
}
