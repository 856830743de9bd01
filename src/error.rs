//! Error types for the avatar viewer

use thiserror::Error;

/// Main error type for the avatar viewer
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Surface not found: {0}")]
    SurfaceMissing(String),

    #[error("A model load is already in flight")]
    LoadInFlight,

    #[error("Asset load failed: {0}")]
    Load(#[from] LoadError),

    #[error("Renderer error: {0}")]
    Render(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Asset acquisition and decoding errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// Stream unreachable or interrupted
    #[error("network error: {0}")]
    Network(String),

    /// Bytes do not parse as glTF/GLB
    #[error("format error: {0}")]
    Format(String),

    /// The base mesh decoded but the VRM extension step failed
    #[error("plugin error: {0}")]
    Plugin(String),
}

/// Camera framing errors (non-fatal)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FramingError {
    #[error("model bounds are not finite")]
    NonFiniteBounds,

    #[error("invalid field of view: {0} degrees")]
    InvalidFieldOfView(f32),
}

/// Expression control errors (non-fatal)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("model has no expression support")]
    Unavailable,

    #[error("model does not define expression preset: {0}")]
    MissingPreset(String),
}

/// 3D renderer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The surface has no usable 3D context
    #[error("renderer unavailable: {0}")]
    Unavailable(String),

    /// A single frame failed to render
    #[error("frame render failed: {0}")]
    Frame(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;
