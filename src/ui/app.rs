//! Native window hosting the viewer.

use std::sync::Arc;

use eframe::egui;

use crate::avatar::{ExpressionPreset, VrmDecoder};
use crate::host::{CanvasLog, CanvasOp};
use crate::scene::Rgba;
use crate::surface::{SurfaceSize, TextAlign};
use crate::viewer::{Viewer, ViewerStatus};

use super::host::WindowHost;
use super::renderer::SceneGpu;
use super::viewport::SceneViewportCallback;

pub struct ViewerApp {
    viewer: Viewer<VrmDecoder>,
    /// Fallback panel drawn by the viewer, painted with egui
    canvas: CanvasLog,
    gpu: Option<Arc<SceneGpu>>,
    viewport_size: SurfaceSize,
}

impl ViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, mut viewer: Viewer<VrmDecoder>) -> Self {
        let config = viewer.config().viewer.clone();
        let size = SurfaceSize::new(config.width, config.height);
        let mut host = WindowHost::new(&config.surface_id, size, cc.wgpu_render_state.clone());

        // Renderer and load failures land on the fallback panel; only a
        // missing surface comes back as an error.
        if let Err(e) = viewer.start(&mut host) {
            tracing::error!("Viewer failed to start: {}", e);
        }

        Self {
            viewer,
            canvas: host.canvas(),
            gpu: host.gpu(),
            viewport_size: size,
        }
    }

    /// Launch the window. Blocks until it is closed.
    pub fn run(viewer: Viewer<VrmDecoder>) -> eframe::Result {
        let (w, h) = {
            let c = &viewer.config().viewer;
            (c.width as f32, c.height as f32)
        };
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_title(crate::NAME)
                .with_inner_size([w, h]),
            ..Default::default()
        };

        eframe::run_native(
            crate::NAME,
            options,
            Box::new(move |cc| Ok(Box::new(Self::new(cc, viewer)))),
        )
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Avatar");
        ui.separator();

        let status = self.viewer.status();
        ui.label(format!("Status: {}", status.name()));
        match &status {
            ViewerStatus::Loading(progress) => {
                ui.label(progress.to_string());
            }
            ViewerStatus::Failed(message) => {
                ui.colored_label(egui::Color32::RED, message);
            }
            ViewerStatus::Idle | ViewerStatus::Ready => {}
        }

        if let Some(model) = self.viewer.model() {
            ui.label(format!("Model: {}", model.name));
        }

        ui.separator();
        ui.label("Expression");
        ui.add_enabled_ui(self.viewer.is_ready(), |ui| {
            for preset in ExpressionPreset::ALL {
                if ui.button(preset.name()).clicked() {
                    self.viewer.update_expression(preset.name());
                }
            }
        });
    }

    fn viewport(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let available_size = ui.available_size();
        let (rect, _response) = ui.allocate_exact_size(available_size, egui::Sense::hover());

        let ppp = ctx.pixels_per_point();
        let size = SurfaceSize::new(
            ((available_size.x * ppp) as u32).max(1),
            ((available_size.y * ppp) as u32).max(1),
        );
        if size != self.viewport_size {
            self.viewport_size = size;
            self.viewer.resize(size);
        }

        if !self.canvas.is_empty() {
            paint_canvas(ui.painter(), rect, &self.canvas);
            return;
        }

        match &self.gpu {
            Some(gpu) if self.viewer.is_ready() => {
                ui.painter().add(eframe::egui_wgpu::Callback::new_paint_callback(
                    rect,
                    SceneViewportCallback {
                        gpu: gpu.clone(),
                        viewport_width: size.width,
                        viewport_height: size.height,
                    },
                ));
            }
            _ => {
                let text = match self.viewer.status() {
                    ViewerStatus::Loading(progress) => format!("Loading... {}", progress),
                    _ => "Loading...".to_string(),
                };
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    text,
                    egui::FontId::proportional(16.0),
                    egui::Color32::WHITE,
                );
            }
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.viewer.tick();

        egui::SidePanel::left("controls").show(ctx, |ui| self.controls(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.viewport(ui, ctx));

        ctx.request_repaint();
    }

    fn on_exit(&mut self) {
        self.viewer.teardown();
    }
}

/// Paint recorded 2D ops, scaled from surface pixels into `rect`.
fn paint_canvas(painter: &egui::Painter, rect: egui::Rect, log: &CanvasLog) {
    let ops = log.ops();
    // The first op is the full-surface fill and fixes the scale.
    let (sw, sh) = match ops.first() {
        Some(CanvasOp::Rect { rect: r, .. }) if r.width > 0.0 && r.height > 0.0 => (r.width, r.height),
        _ => (rect.width(), rect.height()),
    };
    let sx = rect.width() / sw;
    let sy = rect.height() / sh;
    let to_screen = |x: f32, y: f32| egui::pos2(rect.min.x + x * sx, rect.min.y + y * sy);

    for op in ops {
        match op {
            CanvasOp::Rect { rect: r, color } => {
                painter.rect_filled(
                    egui::Rect::from_min_max(to_screen(r.x, r.y), to_screen(r.x + r.width, r.y + r.height)),
                    0.0,
                    color32(color),
                );
            }
            CanvasOp::Text {
                text,
                x,
                y,
                font,
                align,
                color,
            } => {
                let anchor = match align {
                    TextAlign::Left => egui::Align2::LEFT_BOTTOM,
                    TextAlign::Center => egui::Align2::CENTER_BOTTOM,
                    TextAlign::Right => egui::Align2::RIGHT_BOTTOM,
                };
                painter.text(
                    to_screen(x, y),
                    anchor,
                    text,
                    egui::FontId::proportional(font.size_px),
                    color32(color),
                );
            }
        }
    }
}

fn color32(c: Rgba) -> egui::Color32 {
    let [r, g, b, a] = c.to_rgba8();
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}
