//! Scene composition
//!
//! Builds the base scene (background, lights, camera) for a surface and
//! attaches the loaded avatar's root node once it is available.

pub mod bounds;
pub mod camera;
pub mod color;
pub mod framing;

pub use bounds::Aabb;
pub use camera::{PerspectiveCamera, CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_NEAR};
pub use color::Rgba;
pub use framing::frame;

use glam::{Mat4, Vec3};

use crate::avatar::AvatarModel;
use crate::config::SceneConfig;
use crate::surface::SurfaceSize;

/// Uniform light with no position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Rgba,
    pub intensity: f32,
}

/// Light shining along a fixed direction, independent of camera and model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Rgba,
    pub intensity: f32,
    /// Normalized direction the light travels (from the light towards the origin)
    pub direction: Vec3,
}

impl DirectionalLight {
    /// Light placed at `position` and pointed at the origin.
    pub fn from_position(position: Vec3, color: Rgba, intensity: f32) -> Self {
        let direction = (-position).try_normalize().unwrap_or(Vec3::NEG_Y);
        Self {
            color,
            intensity,
            direction,
        }
    }
}

/// A child of the scene root.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: Mat4,
}

/// The scene graph rendered each frame.
#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Rgba,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub camera: PerspectiveCamera,
    children: Vec<SceneNode>,
    model_node: Option<usize>,
}

impl Scene {
    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    /// The attached avatar's root node, if any.
    pub fn model_node(&self) -> Option<&SceneNode> {
        self.model_node.and_then(|i| self.children.get(i))
    }

    pub fn has_model(&self) -> bool {
        self.model_node.is_some()
    }
}

/// Build the base scene for a surface of the given size.
pub fn compose_base_scene(size: SurfaceSize, config: &SceneConfig) -> Scene {
    let background = Rgba::from_hex(&config.background).unwrap_or_else(|| {
        tracing::warn!("Invalid scene background {:?}, using black", config.background);
        Rgba::BLACK
    });

    let camera = PerspectiveCamera::new(
        CAMERA_FOV_DEGREES,
        size.aspect(),
        CAMERA_NEAR,
        CAMERA_FAR,
        Vec3::from_array(config.camera_position),
    );

    Scene {
        background,
        ambient: AmbientLight {
            color: Rgba::WHITE,
            intensity: config.ambient_intensity,
        },
        directional: DirectionalLight::from_position(
            Vec3::from_array(config.directional_position),
            Rgba::WHITE,
            config.directional_intensity,
        ),
        camera,
        children: Vec::new(),
        model_node: None,
    }
}

/// Add the model's root node under the scene root.
///
/// Must be called at most once per model.
pub fn attach_model<M: AvatarModel + ?Sized>(scene: &mut Scene, model: &M) {
    if scene.has_model() {
        tracing::warn!("Ignoring second attach of model {:?}", model.name());
        return;
    }

    scene.children.push(SceneNode {
        name: model.name().to_string(),
        transform: model.root_transform(),
    });
    scene.model_node = Some(scene.children.len() - 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::testing::StubModel;

    #[test]
    fn test_camera_aspect_matches_surface() {
        let config = SceneConfig::default();
        for (w, h) in [(800, 600), (1, 1), (1920, 1080), (300, 900)] {
            let scene = compose_base_scene(SurfaceSize::new(w, h), &config);
            assert!((scene.camera.aspect - w as f32 / h as f32).abs() < 1e-6);
        }
    }

    #[test]
    fn test_base_scene_contents() {
        let scene = compose_base_scene(SurfaceSize::new(800, 600), &SceneConfig::default());

        assert_eq!(scene.background.to_rgba8(), [0x66, 0x7e, 0xea, 0xff]);
        assert_eq!(scene.ambient.intensity, 0.6);
        assert_eq!(scene.directional.intensity, 0.8);
        let expected_dir = Vec3::new(-1.0, -1.0, -1.0).normalize();
        assert!((scene.directional.direction - expected_dir).length() < 1e-6);

        assert_eq!(scene.camera.fov_degrees, 45.0);
        assert_eq!(scene.camera.near, 0.1);
        assert_eq!(scene.camera.far, 1000.0);
        assert_eq!(scene.camera.position, Vec3::new(0.0, 1.2, 2.5));
        assert!(scene.children().is_empty());
        assert!(!scene.has_model());
    }

    #[test]
    fn test_attach_model_adds_root_node() {
        let mut scene = compose_base_scene(SurfaceSize::new(800, 600), &SceneConfig::default());
        let model = StubModel::new("Alicia");

        attach_model(&mut scene, &model);

        assert_eq!(scene.children().len(), 1);
        assert_eq!(scene.model_node().unwrap().name, "Alicia");
    }

    #[test]
    fn test_second_attach_is_ignored() {
        let mut scene = compose_base_scene(SurfaceSize::new(800, 600), &SceneConfig::default());
        attach_model(&mut scene, &StubModel::new("Alicia"));
        attach_model(&mut scene, &StubModel::new("Other"));

        assert_eq!(scene.children().len(), 1);
        assert_eq!(scene.model_node().unwrap().name, "Alicia");
    }
}
