//! Configuration parsing and management for the avatar viewer

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ViewerError};
use crate::scene::Rgba;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub viewer: ViewerConfig,
    pub asset: AssetConfig,
    pub scene: SceneConfig,
    pub fallback: FallbackConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ViewerError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ViewerError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, ViewerError> {
        let paths = [
            PathBuf::from("viewer.toml"),
            PathBuf::from("config/viewer.toml"),
            dirs_path().join("viewer.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ViewerError> {
        if self.viewer.surface_id.trim().is_empty() {
            return Err(invalid("viewer.surface_id", "Surface id must not be empty"));
        }

        if self.viewer.width == 0 || self.viewer.height == 0 {
            return Err(invalid(
                "viewer.width/height",
                "Surface dimensions must be greater than 0",
            ));
        }

        if self.asset.source.trim().is_empty() {
            return Err(invalid("asset.source", "Asset source must not be empty"));
        }

        if self.asset.timeout_secs == 0 {
            return Err(invalid("asset.timeout_secs", "Timeout must be greater than 0"));
        }

        for (field, value) in [
            ("scene.background", &self.scene.background),
            ("fallback.background", &self.fallback.background),
            ("fallback.text_color", &self.fallback.text_color),
        ] {
            if Rgba::from_hex(value).is_none() {
                return Err(invalid(field, &format!("'{}' is not a hex color", value)));
            }
        }

        for (field, value) in [
            ("scene.ambient_intensity", self.scene.ambient_intensity),
            ("scene.directional_intensity", self.scene.directional_intensity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, "Intensity must be a non-negative number"));
            }
        }

        if self.scene.directional_position.iter().all(|v| *v == 0.0) {
            return Err(invalid(
                "scene.directional_position",
                "Light position must not be the origin",
            ));
        }

        if self.http.port == 0 {
            return Err(invalid("http.port", "Port must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ViewerError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Drawable surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Element id of the surface to render into
    pub surface_id: String,
    /// Surface width in pixels
    pub width: u32,
    /// Surface height in pixels
    pub height: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            surface_id: "vrm-canvas".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Model asset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// URL (`http://`, `https://`) or filesystem path of the VRM file
    pub source: String,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            source: "http://localhost:8001/static/avatar.vrm".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Base scene look
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Background fill color (hex)
    pub background: String,
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
    /// Directional light position; the light shines toward the origin
    pub directional_position: [f32; 3],
    /// Camera position before the model is framed
    pub camera_position: [f32; 3],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: "#667eea".to_string(),
            ambient_intensity: 0.6,
            directional_intensity: 0.8,
            directional_position: [1.0, 1.0, 1.0],
            camera_position: [0.0, 1.2, 2.5],
        }
    }
}

/// Error panel text and colors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub headline: String,
    /// Line drawn between the headline and the error detail
    pub secondary: String,
    pub background: String,
    pub text_color: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            headline: "VRM Avatar".to_string(),
            secondary: "An error occurred".to_string(),
            background: "#667eea".to_string(),
            text_color: "#ffffff".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Enable HTTP server
    pub enabled: bool,
    /// HTTP server host
    pub host: String,
    /// HTTP server port
    pub port: u16,
    /// Directory served under `/static`
    pub static_dir: String,
    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8001,
            static_dir: "static".to_string(),
            cors_enabled: true,
        }
    }
}

/// Get the configuration directory path
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("avatar-viewer");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/avatar-viewer");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/avatar-viewer");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("avatar-viewer");
        }
    }

    PathBuf::from(".")
}
