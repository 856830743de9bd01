//! Render loop driver
//!
//! One `tick` per display refresh: advance the model by a fixed step, then
//! render the scene through the camera. The tick source belongs to the host
//! (a tokio interval when headless, the egui repaint in a window).

use crate::avatar::AvatarModel;
use crate::viewer::ViewerState;

/// Animation advance per tick, in seconds. Independent of wall-clock time.
pub const FIXED_TIME_STEP: f32 = 1.0 / 60.0;

/// Loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Nothing is drawn by the loop
    Idle,
    /// Surface, scene and camera exist; every tick renders
    Running,
}

/// Per-frame update and render cycle.
#[derive(Debug)]
pub struct RenderLoop {
    phase: LoopPhase,
    frames: u64,
    render_failures: u64,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            phase: LoopPhase::Idle,
            frames: 0,
            render_failures: 0,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == LoopPhase::Running
    }

    /// Enter `Running`. There is no way back to `Idle`.
    pub fn start(&mut self) {
        if self.phase == LoopPhase::Idle {
            tracing::info!("Render loop running");
            self.phase = LoopPhase::Running;
        }
    }

    /// Frames rendered successfully.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn render_failures(&self) -> u64 {
        self.render_failures
    }

    /// Run one cycle. Never panics past this boundary; frame errors are logged
    /// and the next tick proceeds normally.
    pub fn tick<M: AvatarModel>(&mut self, state: Option<&mut ViewerState<M>>) {
        if self.phase == LoopPhase::Idle {
            return;
        }
        let Some(state) = state else {
            return;
        };

        // The model is only touched once the viewer marked it ready
        let model = if state.ready {
            state.model.as_mut().map(|model| {
                model.update(FIXED_TIME_STEP);
                &*model
            })
        } else {
            None
        };

        let Some(renderer) = state.renderer.as_mut() else {
            return;
        };

        match renderer.render(&state.scene, model) {
            Ok(()) => self.frames += 1,
            Err(e) => {
                self.render_failures += 1;
                if self.render_failures == 1 {
                    tracing::warn!("Frame render failed: {}", e);
                } else {
                    tracing::debug!("Frame render failed ({} total): {}", self.render_failures, e);
                }
            }
        }
    }
}
