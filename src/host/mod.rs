//! Surface hosts
//!
//! The headless host records 2D drawing and counts 3D frames without a GPU.
//! The windowed host lives in `ui` behind the `native-ui` feature.

pub mod headless;

pub use headless::{CanvasLog, CanvasOp, CountingRenderer, HeadlessHost, RecordingCanvas, RecordingSurface, RenderStats};
