//! egui-wgpu paint callback for the avatar viewport.
//!
//! `prepare()` renders the scene offscreen, `paint()` blits the result into
//! the egui render pass.

use eframe::egui_wgpu;
use eframe::wgpu;
use std::sync::Arc;

use super::renderer::SceneGpu;

pub struct SceneViewportCallback {
    pub gpu: Arc<SceneGpu>,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl egui_wgpu::CallbackTrait for SceneViewportCallback {
    fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        _screen_descriptor: &egui_wgpu::ScreenDescriptor,
        _egui_encoder: &mut wgpu::CommandEncoder,
        _callback_resources: &mut egui_wgpu::CallbackResources,
    ) -> Vec<wgpu::CommandBuffer> {
        self.gpu
            .resize(device, self.viewport_width, self.viewport_height);
        self.gpu.render_offscreen(device, queue);
        Vec::new()
    }

    fn paint(
        &self,
        _info: eframe::egui::PaintCallbackInfo,
        render_pass: &mut wgpu::RenderPass<'static>,
        _callback_resources: &egui_wgpu::CallbackResources,
    ) {
        self.gpu.blit(render_pass);
    }
}
