//! Avatar model module
//!
//! The model handle contract, the expression vocabulary, and the VRM
//! implementation of both.

pub mod expression;
pub mod vrm;

pub use expression::{
    set_expression, ExpressionBind, ExpressionDef, ExpressionManager, ExpressionPreset,
};
pub use vrm::{VrmDecoder, VrmModel};

use glam::Mat4;

use crate::scene::Aabb;

/// A loaded avatar.
///
/// Created by a [`crate::loader::ModelDecoder`], then owned by the viewer.
pub trait AvatarModel: Send + 'static {
    /// Display name (from model metadata when present)
    fn name(&self) -> &str;

    /// Transform of the model root relative to the scene root.
    fn root_transform(&self) -> Mat4 {
        Mat4::IDENTITY
    }

    /// Bounding box of all geometry in scene coordinates.
    fn bounds(&self) -> Aabb;

    /// Expression state, or `None` if the model has no blend-shape data.
    fn expressions(&self) -> Option<&ExpressionManager>;

    fn expressions_mut(&mut self) -> Option<&mut ExpressionManager>;

    /// Advance per-frame animation state by `delta` seconds.
    fn update(&mut self, delta: f32);
}

#[cfg(test)]
pub(crate) mod testing {
    //! Test doubles and in-memory model fixtures.

    use super::*;
    use glam::Vec3;

    /// Minimal model with configurable bounds and expressions.
    pub struct StubModel {
        pub name: String,
        pub bounds: Aabb,
        pub expressions: Option<ExpressionManager>,
        pub updates: Vec<f32>,
    }

    impl StubModel {
        /// Model defining all four vocabulary presets.
        pub fn new(name: &str) -> Self {
            let mut manager = ExpressionManager::new();
            for preset in ExpressionPreset::ALL {
                manager.define(preset.name(), ExpressionDef::default());
            }
            Self::with_manager(name, manager)
        }

        pub fn with_manager(name: &str, manager: ExpressionManager) -> Self {
            Self {
                name: name.to_string(),
                bounds: Aabb::from_center_size(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 2.0, 0.5)),
                expressions: Some(manager),
                updates: Vec::new(),
            }
        }

        pub fn without_expressions(name: &str) -> Self {
            Self {
                expressions: None,
                ..Self::new(name)
            }
        }
    }

    impl AvatarModel for StubModel {
        fn name(&self) -> &str {
            &self.name
        }

        fn bounds(&self) -> Aabb {
            self.bounds
        }

        fn expressions(&self) -> Option<&ExpressionManager> {
            self.expressions.as_ref()
        }

        fn expressions_mut(&mut self) -> Option<&mut ExpressionManager> {
            self.expressions.as_mut()
        }

        fn update(&mut self, delta: f32) {
            self.updates.push(delta);
        }
    }

    /// Build a GLB containing one triangle mesh with two morph targets.
    ///
    /// The triangle's bounds are center (0,1,0), size (1,2,0.5). `extensions`
    /// is inserted verbatim as the root `extensions` object (or omitted).
    pub fn glb_fixture(extensions: Option<serde_json::Value>) -> Vec<u8> {
        let positions: [[f32; 3]; 3] = [[-0.5, 0.0, -0.25], [0.5, 2.0, 0.25], [0.0, 1.0, 0.0]];
        let target_a: [[f32; 3]; 3] = [[0.0, 0.1, 0.0]; 3];
        let target_b: [[f32; 3]; 3] = [[0.0, -0.1, 0.0]; 3];
        let indices: [u16; 3] = [0, 1, 2];

        let mut bin = Vec::new();
        for p in &positions {
            p.iter().for_each(|v| bin.extend_from_slice(&v.to_le_bytes()));
        }
        indices
            .iter()
            .for_each(|i| bin.extend_from_slice(&i.to_le_bytes()));
        bin.extend_from_slice(&[0, 0]);
        for p in target_a.iter().chain(target_b.iter()) {
            p.iter().for_each(|v| bin.extend_from_slice(&v.to_le_bytes()));
        }
        assert_eq!(bin.len(), 116);

        let mut json = serde_json::json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "name": "Face", "mesh": 0 }],
            "meshes": [{
                "name": "Face",
                "primitives": [{
                    "attributes": { "POSITION": 0 },
                    "indices": 1,
                    "targets": [{ "POSITION": 2 }, { "POSITION": 3 }]
                }],
                "extras": { "targetNames": ["Face.Fcl_ALL_Joy", "Face.Fcl_ALL_Sorrow"] }
            }],
            "accessors": [
                {
                    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                    "min": [-0.5, 0.0, -0.25], "max": [0.5, 2.0, 0.25]
                },
                { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
                {
                    "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC3",
                    "min": [0.0, 0.1, 0.0], "max": [0.0, 0.1, 0.0]
                },
                {
                    "bufferView": 3, "componentType": 5126, "count": 3, "type": "VEC3",
                    "min": [0.0, -0.1, 0.0], "max": [0.0, -0.1, 0.0]
                }
            ],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 6 },
                { "buffer": 0, "byteOffset": 44, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 80, "byteLength": 36 }
            ],
            "buffers": [{ "byteLength": 116 }]
        });
        if let Some(ext) = extensions {
            json["extensions"] = ext;
        }

        let mut json_bytes = serde_json::to_vec(&json).unwrap();
        while json_bytes.len() % 4 != 0 {
            json_bytes.push(b' ');
        }

        let total = 12 + 8 + json_bytes.len() + 8 + bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json_bytes);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&bin);
        glb
    }

    /// VRM 1.0 extension block with all four vocabulary presets.
    pub fn vrm1_extension() -> serde_json::Value {
        serde_json::json!({
            "VRMC_vrm": {
                "specVersion": "1.0",
                "meta": { "name": "Fixture" },
                "humanoid": { "humanBones": { "hips": { "node": 0 }, "head": { "node": 0 } } },
                "expressions": {
                    "preset": {
                        "happy": { "morphTargetBinds": [{ "node": 0, "index": 0, "weight": 1.0 }] },
                        "sad": { "morphTargetBinds": [{ "node": 0, "index": 1, "weight": 1.0 }] },
                        "angry": { "morphTargetBinds": [{ "node": 0, "index": 1, "weight": 0.5 }] },
                        "surprised": { "morphTargetBinds": [{ "node": 0, "index": 0, "weight": 0.5 }] },
                        "blink": {
                            "isBinary": true,
                            "morphTargetBinds": [{ "node": 0, "index": 1, "weight": 1.0 }]
                        }
                    }
                }
            }
        })
    }
}
