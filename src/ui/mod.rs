//! Native egui window for the viewer.
//!
//! Enabled via `--features native-ui`.

mod app;
mod host;
mod renderer;
mod viewport;

pub use app::ViewerApp;
pub use host::WindowHost;
