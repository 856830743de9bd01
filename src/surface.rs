//! Host contracts for the drawable surface.
//!
//! A surface is identified by a stable element id and exposes two drawing
//! paths: a 3D renderer for the live scene and a raw 2D canvas used by the
//! fallback panel. Hosts (headless, native window) implement these traits.

use crate::error::RenderError;
use crate::scene::{Rgba, Scene};

/// Pixel dimensions of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width / height; 1.0 when the height is zero.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Horizontal anchor for text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Font selection for 2D text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    pub size_px: f32,
    pub bold: bool,
}

impl Font {
    pub const fn regular(size_px: f32) -> Self {
        Self {
            size_px,
            bold: false,
        }
    }

    pub const fn bold(size_px: f32) -> Self {
        Self {
            size_px,
            bold: true,
        }
    }
}

/// Axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Raw 2D drawing context of a surface, independent of the 3D pipeline.
pub trait Canvas2d {
    fn size(&self) -> SurfaceSize;

    fn fill_rect(&mut self, rect: Rect, color: Rgba);

    /// Draw `text` with its baseline anchored at `(x, y)`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: Font, align: TextAlign, color: Rgba);
}

/// A drawable region provided by the host.
pub trait Surface {
    fn size(&self) -> SurfaceSize;

    /// The 2D context, or `None` if the host cannot provide one.
    fn context_2d(&mut self) -> Option<&mut dyn Canvas2d>;
}

/// 3D rendering runtime: draws the scene through its camera.
pub trait SceneRenderer<M> {
    /// Render one frame. `model` is `None` until the avatar is ready.
    fn render(&mut self, scene: &Scene, model: Option<&M>) -> Result<(), RenderError>;

    /// Surface dimensions changed.
    fn resize(&mut self, _size: SurfaceSize) {}
}

/// Host environment that owns surfaces and 3D contexts.
pub trait SurfaceHost<M> {
    /// Look up the surface with the given element id.
    fn find_surface(&mut self, element_id: &str) -> Option<Box<dyn Surface>>;

    /// Create a 3D renderer bound to `surface`.
    fn create_renderer(
        &mut self,
        surface: &dyn Surface,
    ) -> Result<Box<dyn SceneRenderer<M>>, RenderError>;
}
