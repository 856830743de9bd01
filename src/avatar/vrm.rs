//! GLB/VRM model decoding using the `gltf` crate.
//!
//! Extracts mesh geometry, morph target deltas, the node hierarchy, and the
//! VRM metadata, humanoid and expression binds (VRM 1.0 `VRMC_vrm` or VRM 0.x
//! `VRM`) from an in-memory glTF payload.

use glam::{Mat4, Quat, Vec3};
use serde_json::Value;
use std::collections::HashMap;

use super::expression::{ExpressionBind, ExpressionDef, ExpressionManager};
use super::AvatarModel;
use crate::error::LoadError;
use crate::loader::ModelDecoder;
use crate::scene::Aabb;

/// VRM extension generation found in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrmVersion {
    /// `VRM` extension (models face -Z)
    V0,
    /// `VRMC_vrm` extension (models face +Z)
    V1,
}

/// Geometry for a single primitive.
pub struct PrimitiveData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    /// Base color factor from material (RGBA)
    pub base_color: [f32; 4],
    /// morph_deltas[target_idx] = per-vertex position deltas
    pub morph_deltas: Vec<Vec<Vec3>>,
}

/// All primitives of one glTF mesh.
pub struct MeshData {
    pub primitives: Vec<PrimitiveData>,
    /// Morph target names from mesh extras (shared prefix stripped)
    pub morph_target_names: Vec<String>,
    /// Number of morph targets on the first primitive
    pub morph_count: usize,
}

/// A mesh placed in the scene by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshInstance {
    pub mesh: usize,
    pub node: usize,
}

/// A decoded VRM avatar.
pub struct VrmModel {
    pub name: String,
    pub version: VrmVersion,
    pub meshes: Vec<MeshData>,
    /// Node → mesh placements
    pub instances: Vec<MeshInstance>,
    /// Rest-pose world transform of every node
    pub world_transforms: Vec<Mat4>,
    /// VRM humanoid bone name → node index
    pub bone_to_node: HashMap<String, usize>,
    /// Current morph weights, `[mesh][target]`
    pub morph_weights: Vec<Vec<f32>>,
    expressions: Option<ExpressionManager>,
    bounds: Aabb,
    elapsed: f32,
}

impl VrmModel {
    /// Decode a GLB or JSON glTF payload carrying a VRM extension.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let root = raw_json(bytes)?;

        let (document, buffers, _images) = gltf::import_slice(bytes)
            .map_err(|e| LoadError::Format(format!("Failed to decode glTF: {}", e)))?;
        let buf = &buffers;

        // Parent map and rest-pose local transforms
        let node_count = document.nodes().count();
        let mut parents = vec![None; node_count];
        let mut locals = Vec::with_capacity(node_count);
        let mut node_meshes = vec![None; node_count];
        for node in document.nodes() {
            for child in node.children() {
                parents[child.index()] = Some(node.index());
            }
            let (t, r, s) = node.transform().decomposed();
            locals.push(Mat4::from_scale_rotation_translation(
                Vec3::from(s),
                Quat::from_array(r),
                Vec3::from(t),
            ));
            node_meshes[node.index()] = node.mesh().map(|m| m.index());
        }
        let world_transforms = compute_world_transforms(&locals, &parents);

        let instances: Vec<MeshInstance> = node_meshes
            .iter()
            .enumerate()
            .filter_map(|(node, mesh)| mesh.map(|mesh| MeshInstance { mesh, node }))
            .collect();

        // Meshes
        let mut meshes = Vec::new();
        for mesh in document.meshes() {
            let mut primitives = Vec::new();

            for prim in mesh.primitives() {
                let reader = prim.reader(|buffer| Some(&buf[buffer.index()]));

                let positions: Vec<Vec3> = reader
                    .read_positions()
                    .map(|iter| iter.map(Vec3::from).collect())
                    .unwrap_or_default();

                let normals: Vec<Vec3> = reader
                    .read_normals()
                    .map(|iter| iter.map(Vec3::from).collect())
                    .unwrap_or_else(|| vec![Vec3::Y; positions.len()]);

                let indices: Vec<u32> = reader
                    .read_indices()
                    .map(|iter| iter.into_u32().collect())
                    .unwrap_or_else(|| (0..positions.len() as u32).collect());

                let base_color = prim
                    .material()
                    .pbr_metallic_roughness()
                    .base_color_factor();

                // read_morph_targets yields (positions, normals, tangents)
                let morph_deltas: Vec<Vec<Vec3>> = reader
                    .read_morph_targets()
                    .map(|(deltas, _normals, _tangents)| {
                        deltas
                            .map(|iter| iter.map(Vec3::from).collect())
                            .unwrap_or_default()
                    })
                    .collect();

                primitives.push(PrimitiveData {
                    positions,
                    normals,
                    indices,
                    base_color,
                    morph_deltas,
                });
            }

            let morph_count = primitives
                .first()
                .map(|p| p.morph_deltas.len())
                .unwrap_or(0);

            meshes.push(MeshData {
                primitives,
                morph_target_names: parse_morph_target_names(&mesh),
                morph_count,
            });
        }

        let ext = parse_vrm_extension(&root, &node_meshes)?;

        let version = ext.version;
        let root_transform = root_transform_for(version);
        let bounds = compute_bounds(&meshes, &instances, &world_transforms)
            .map(|b| b.transformed(&root_transform))
            .unwrap_or(Aabb::EMPTY);

        let morph_weights = meshes.iter().map(|m| vec![0.0; m.morph_count]).collect();

        let name = ext
            .name
            .or_else(|| document.scenes().next().and_then(|s| s.name().map(String::from)))
            .unwrap_or_else(|| "avatar".to_string());

        tracing::debug!(
            "Decoded VRM {:?}: {} meshes, {} morph targets, {} humanoid bones",
            version,
            meshes.len(),
            meshes.iter().map(|m| m.morph_target_names.len()).sum::<usize>(),
            ext.bones.len()
        );

        Ok(Self {
            name,
            version,
            meshes,
            instances,
            world_transforms,
            bone_to_node: ext.bones,
            morph_weights,
            expressions: ext.expressions,
            bounds,
            elapsed: 0.0,
        })
    }

    /// Seconds of animation time advanced so far.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Base positions of a primitive with the current morph weights applied.
    pub fn morphed_positions(&self, mesh_idx: usize, prim_idx: usize) -> Vec<Vec3> {
        let prim = &self.meshes[mesh_idx].primitives[prim_idx];
        let mut morphed = prim.positions.clone();

        let weights = &self.morph_weights[mesh_idx];
        for (t_idx, &weight) in weights.iter().enumerate() {
            if weight < 0.001 || t_idx >= prim.morph_deltas.len() {
                continue;
            }
            let deltas = &prim.morph_deltas[t_idx];
            if deltas.len() != morphed.len() {
                continue;
            }
            for (pos, delta) in morphed.iter_mut().zip(deltas) {
                *pos += *delta * weight;
            }
        }

        morphed
    }
}

impl AvatarModel for VrmModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn root_transform(&self) -> Mat4 {
        root_transform_for(self.version)
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
        self.elapsed += delta;
        if let Some(manager) = &self.expressions {
            manager.resolve_morph_weights(&mut self.morph_weights);
        }
    }
}

/// Decodes VRM payloads into [`VrmModel`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct VrmDecoder;

impl ModelDecoder for VrmDecoder {
    type Model = VrmModel;

    fn decode(&self, bytes: &[u8]) -> Result<VrmModel, LoadError> {
        VrmModel::from_slice(bytes)
    }
}

/// VRM 0.x models are turned to face +Z like VRM 1.0 models.
fn root_transform_for(version: VrmVersion) -> Mat4 {
    match version {
        VrmVersion::V0 => Mat4::from_rotation_y(std::f32::consts::PI),
        VrmVersion::V1 => Mat4::IDENTITY,
    }
}

/// The glTF JSON document, from a GLB JSON chunk or a plain JSON payload.
fn raw_json(bytes: &[u8]) -> Result<Value, LoadError> {
    if bytes.starts_with(b"glTF") {
        let glb = gltf::Glb::from_slice(bytes)
            .map_err(|e| LoadError::Format(format!("Invalid GLB container: {}", e)))?;
        serde_json::from_slice(&glb.json)
            .map_err(|e| LoadError::Format(format!("JSON parse error: {}", e)))
    } else {
        serde_json::from_slice(bytes)
            .map_err(|e| LoadError::Format(format!("Not a glTF payload: {}", e)))
    }
}

/// World transforms by walking each node's parent chain.
fn compute_world_transforms(locals: &[Mat4], parents: &[Option<usize>]) -> Vec<Mat4> {
    let mut world = vec![Mat4::IDENTITY; locals.len()];
    let mut computed = vec![false; locals.len()];

    for i in 0..locals.len() {
        compute_node(locals, parents, &mut world, &mut computed, i, 0);
    }

    world
}

fn compute_node(
    locals: &[Mat4],
    parents: &[Option<usize>],
    world: &mut [Mat4],
    computed: &mut [bool],
    idx: usize,
    depth: usize,
) {
    if computed[idx] {
        return;
    }

    // A cycle in the parent map would recurse forever; glTF forbids them
    if depth > locals.len() {
        world[idx] = locals[idx];
        computed[idx] = true;
        return;
    }

    if let Some(parent) = parents[idx] {
        compute_node(locals, parents, world, computed, parent, depth + 1);
        world[idx] = world[parent] * locals[idx];
    } else {
        world[idx] = locals[idx];
    }
    computed[idx] = true;
}

fn compute_bounds(
    meshes: &[MeshData],
    instances: &[MeshInstance],
    world: &[Mat4],
) -> Option<Aabb> {
    let points = instances.iter().flat_map(|inst| {
        let transform = world[inst.node];
        meshes[inst.mesh]
            .primitives
            .iter()
            .flat_map(move |p| p.positions.iter().map(move |&v| transform.transform_point3(v)))
    });
    Aabb::from_points(points)
}

/// Parsed VRM extension contents.
struct VrmExtension {
    version: VrmVersion,
    name: Option<String>,
    bones: HashMap<String, usize>,
    expressions: Option<ExpressionManager>,
}

/// Read the VRM extension. Any failure here is a plugin error: the base
/// glTF already decoded.
fn parse_vrm_extension(
    root: &Value,
    node_meshes: &[Option<usize>],
) -> Result<VrmExtension, LoadError> {
    let extensions = root.get("extensions");

    if let Some(vrmc) = extensions.and_then(|e| e.get("VRMC_vrm")) {
        let bones = parse_humanoid_1_0(vrmc, node_meshes.len())?;
        let name = vrmc
            .get("meta")
            .and_then(|m| m.get("name"))
            .and_then(|n| n.as_str())
            .map(String::from);
        let expressions = vrmc
            .get("expressions")
            .map(|e| parse_expressions_1_0(e, node_meshes));

        return Ok(VrmExtension {
            version: VrmVersion::V1,
            name,
            bones,
            expressions,
        });
    }

    if let Some(vrm) = extensions.and_then(|e| e.get("VRM")) {
        let bones = parse_humanoid_0x(vrm, node_meshes.len())?;
        let name = vrm
            .get("meta")
            .and_then(|m| m.get("title"))
            .and_then(|n| n.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from);
        let expressions = vrm
            .get("blendShapeMaster")
            .and_then(|m| m.get("blendShapeGroups"))
            .and_then(|g| g.as_array())
            .map(|groups| parse_expressions_0x(groups));

        return Ok(VrmExtension {
            version: VrmVersion::V0,
            name,
            bones,
            expressions,
        });
    }

    Err(LoadError::Plugin(
        "no VRM extension (VRMC_vrm or VRM) found in model".to_string(),
    ))
}

/// VRM 1.0: `humanoid.humanBones` is an object `{ boneName: { node } }`.
fn parse_humanoid_1_0(vrmc: &Value, node_count: usize) -> Result<HashMap<String, usize>, LoadError> {
    let bones = vrmc
        .get("humanoid")
        .and_then(|h| h.get("humanBones"))
        .and_then(|b| b.as_object())
        .ok_or_else(|| LoadError::Plugin("VRM humanoid definition missing".to_string()))?;

    let mut map = HashMap::new();
    for (name, bone) in bones {
        let node = bone
            .get("node")
            .and_then(|n| n.as_u64())
            .map(|n| n as usize)
            .filter(|&n| n < node_count)
            .ok_or_else(|| LoadError::Plugin(format!("humanoid bone {} has no valid node", name)))?;
        map.insert(name.clone(), node);
    }
    Ok(map)
}

/// VRM 0.x: `humanoid.humanBones` is an array `[{ bone, node }]`.
fn parse_humanoid_0x(vrm: &Value, node_count: usize) -> Result<HashMap<String, usize>, LoadError> {
    let bones = vrm
        .get("humanoid")
        .and_then(|h| h.get("humanBones"))
        .and_then(|b| b.as_array())
        .ok_or_else(|| LoadError::Plugin("VRM humanoid definition missing".to_string()))?;

    let mut map = HashMap::new();
    for bone in bones {
        let (Some(name), Some(node)) = (
            bone.get("bone").and_then(|b| b.as_str()),
            bone.get("node").and_then(|n| n.as_u64()).map(|n| n as usize),
        ) else {
            continue;
        };
        if node >= node_count {
            return Err(LoadError::Plugin(format!(
                "humanoid bone {} references missing node {}",
                name, node
            )));
        }
        map.insert(camel_to_lower(name), node);
    }
    Ok(map)
}

/// VRM 1.0 expression presets and custom expressions.
fn parse_expressions_1_0(expressions: &Value, node_meshes: &[Option<usize>]) -> ExpressionManager {
    let mut manager = ExpressionManager::new();

    for group in ["preset", "custom"] {
        let Some(entries) = expressions.get(group).and_then(|p| p.as_object()) else {
            continue;
        };
        for (name, expr) in entries {
            let binds = expr
                .get("morphTargetBinds")
                .and_then(|b| b.as_array())
                .map(|binds| {
                    binds
                        .iter()
                        .filter_map(|b| {
                            let node = b.get("node").and_then(|n| n.as_u64())? as usize;
                            let mesh = (*node_meshes.get(node)?)?;
                            let index = b.get("index").and_then(|i| i.as_u64())? as usize;
                            let weight =
                                b.get("weight").and_then(|w| w.as_f64()).unwrap_or(1.0) as f32;
                            Some(ExpressionBind {
                                mesh,
                                morph_index: index,
                                weight,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();

            let is_binary = expr
                .get("isBinary")
                .and_then(|b| b.as_bool())
                .unwrap_or(false);

            let canonical = match name.as_str() {
                "happy" => "joy",
                other => other,
            };
            manager.define(canonical, ExpressionDef { binds, is_binary });
        }
    }

    manager
}

/// VRM 0.x blend shape groups.
fn parse_expressions_0x(groups: &[Value]) -> ExpressionManager {
    let mut manager = ExpressionManager::new();

    for group in groups {
        // Prefer presetName (standardized) over name (freeform)
        let raw_name = group
            .get("presetName")
            .and_then(|n| n.as_str())
            .filter(|n| !n.is_empty() && *n != "unknown")
            .or_else(|| group.get("name").and_then(|n| n.as_str()));
        let name = match raw_name {
            Some(n) => n.to_lowercase(),
            None => continue,
        };
        let canonical = match name.as_str() {
            "a" => "aa",
            "i" => "ih",
            "u" => "ou",
            "e" => "ee",
            "o" => "oh",
            "blink_l" => "blinkLeft",
            "blink_r" => "blinkRight",
            "sorrow" => "sad",
            "fun" => "relaxed",
            "lookup" => "lookUp",
            "lookdown" => "lookDown",
            "lookleft" => "lookLeft",
            "lookright" => "lookRight",
            other => other,
        };

        let binds = group
            .get("binds")
            .and_then(|b| b.as_array())
            .map(|binds| {
                binds
                    .iter()
                    .filter_map(|b| {
                        let mesh = b.get("mesh").and_then(|m| m.as_u64())? as usize;
                        let index = b.get("index").and_then(|i| i.as_u64())? as usize;
                        // VRM 0.x uses a 0-100 scale
                        let weight = b
                            .get("weight")
                            .and_then(|w| w.as_f64())
                            .unwrap_or(100.0) as f32
                            / 100.0;
                        Some(ExpressionBind {
                            mesh,
                            morph_index: index,
                            weight,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let is_binary = group
            .get("isBinary")
            .and_then(|b| b.as_bool())
            .unwrap_or(false);

        manager.define(canonical, ExpressionDef { binds, is_binary });
    }

    manager
}

/// Convert VRM 0.x bone names to VRM 1.0 format: "LeftUpperArm" → "leftUpperArm".
fn camel_to_lower(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        if i == 0 {
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Parse morph target names from mesh extras JSON, stripping any shared prefix.
fn parse_morph_target_names(mesh: &gltf::Mesh) -> Vec<String> {
    if let Some(extras) = mesh.extras().as_ref() {
        if let Ok(val) = serde_json::from_str::<Value>(extras.get()) {
            if let Some(names) = val.get("targetNames").and_then(|v| v.as_array()) {
                let raw: Vec<String> = names
                    .iter()
                    .filter_map(|n| n.as_str().map(String::from))
                    .collect();
                return strip_morph_prefixes(raw);
            }
        }
    }
    Vec::new()
}

/// Strip a shared dot-delimited prefix such as `"Face_Blendshape."`.
///
/// Only stripped when every name shares the same `<something>.` prefix.
fn strip_morph_prefixes(names: Vec<String>) -> Vec<String> {
    if names.len() < 2 {
        return names;
    }

    let prefix_len = match names[0].find('.') {
        Some(pos) => pos + 1,
        None => return names,
    };

    let prefix = &names[0][..prefix_len];
    if !names.iter().all(|n| n.starts_with(prefix)) {
        return names;
    }

    names
        .into_iter()
        .map(|n| n[prefix_len..].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::set_expression;
    use crate::avatar::testing::{glb_fixture, vrm1_extension};

    #[test]
    fn test_decode_vrm1_fixture() {
        let model = VrmModel::from_slice(&glb_fixture(Some(vrm1_extension()))).unwrap();

        assert_eq!(model.name, "Fixture");
        assert_eq!(model.version, VrmVersion::V1);
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].morph_count, 2);
        assert_eq!(
            model.meshes[0].morph_target_names,
            vec!["Fcl_ALL_Joy", "Fcl_ALL_Sorrow"]
        );
        assert_eq!(model.bone_to_node.get("hips"), Some(&0));
        assert_eq!(model.root_transform(), Mat4::IDENTITY);

        let bounds = model.bounds();
        assert!((bounds.center() - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
        assert!((bounds.size() - Vec3::new(1.0, 2.0, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_happy_preset_becomes_joy() {
        let model = VrmModel::from_slice(&glb_fixture(Some(vrm1_extension()))).unwrap();
        let manager = model.expressions().unwrap();
        assert!(manager.has("joy"));
        assert!(!manager.has("happy"));
        assert!(manager.has("surprised"));
    }

    #[test]
    fn test_update_resolves_expression_into_morphs() {
        let mut model = VrmModel::from_slice(&glb_fixture(Some(vrm1_extension()))).unwrap();

        set_expression(&mut model, "happy").unwrap();
        model.update(1.0 / 60.0);
        assert_eq!(model.morph_weights[0], vec![1.0, 0.0]);

        let morphed = model.morphed_positions(0, 0);
        assert!((morphed[0] - Vec3::new(-0.5, 0.1, -0.25)).length() < 1e-6);

        set_expression(&mut model, "angry").unwrap();
        model.update(1.0 / 60.0);
        assert_eq!(model.morph_weights[0], vec![0.0, 0.5]);
        assert!((model.elapsed() - 2.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_plain_gltf_is_plugin_error() {
        let err = VrmModel::from_slice(&glb_fixture(None)).err().unwrap();
        assert!(matches!(err, LoadError::Plugin(_)));
    }

    #[test]
    fn test_missing_humanoid_is_plugin_error() {
        let ext = serde_json::json!({ "VRMC_vrm": { "specVersion": "1.0", "meta": {} } });
        let err = VrmModel::from_slice(&glb_fixture(Some(ext))).err().unwrap();
        assert!(matches!(err, LoadError::Plugin(_)));
    }

    #[test]
    fn test_garbage_is_format_error() {
        let err = VrmModel::from_slice(b"not a model at all").err().unwrap();
        assert!(matches!(err, LoadError::Format(_)));

        let mut truncated = glb_fixture(Some(vrm1_extension()));
        truncated.truncate(40);
        let err = VrmModel::from_slice(&truncated).err().unwrap();
        assert!(matches!(err, LoadError::Format(_)));
    }

    #[test]
    fn test_model_without_expression_block() {
        let ext = serde_json::json!({
            "VRMC_vrm": {
                "specVersion": "1.0",
                "humanoid": { "humanBones": { "hips": { "node": 0 } } }
            }
        });
        let mut model = VrmModel::from_slice(&glb_fixture(Some(ext))).unwrap();
        assert!(model.expressions().is_none());
        assert_eq!(model.name, "avatar");
        model.update(1.0 / 60.0);
    }

    #[test]
    fn test_vrm0_model_is_turned_and_mapped() {
        let ext = serde_json::json!({
            "VRM": {
                "meta": { "title": "Legacy" },
                "humanoid": { "humanBones": [{ "bone": "Hips", "node": 0 }] },
                "blendShapeMaster": {
                    "blendShapeGroups": [
                        { "presetName": "joy", "binds": [{ "mesh": 0, "index": 0, "weight": 100 }] },
                        { "presetName": "sorrow", "binds": [{ "mesh": 0, "index": 1, "weight": 50 }] }
                    ]
                }
            }
        });
        let mut model = VrmModel::from_slice(&glb_fixture(Some(ext))).unwrap();

        assert_eq!(model.version, VrmVersion::V0);
        assert_eq!(model.name, "Legacy");
        assert_eq!(model.bone_to_node.get("hips"), Some(&0));

        // Turned half a revolution: z extents flip sign
        let bounds = model.bounds();
        assert!((bounds.min.z + 0.25).abs() < 1e-5);
        assert!((bounds.max.z - 0.25).abs() < 1e-5);

        set_expression(&mut model, "sad").unwrap();
        model.update(1.0 / 60.0);
        assert_eq!(model.morph_weights[0], vec![0.0, 0.5]);
    }

    #[test]
    fn test_strip_morph_prefixes_shared() {
        let names = vec![
            "Face_Blendshape.Fcl_MTH_A".to_string(),
            "Face_Blendshape.Fcl_MTH_I".to_string(),
            "Face_Blendshape.Fcl_EYE_Close".to_string(),
        ];
        let stripped = strip_morph_prefixes(names);
        assert_eq!(stripped, vec!["Fcl_MTH_A", "Fcl_MTH_I", "Fcl_EYE_Close"]);
    }

    #[test]
    fn test_strip_morph_prefixes_mixed() {
        let names = vec![
            "Face_Blendshape.Fcl_MTH_A".to_string(),
            "Other_Mesh.Fcl_MTH_I".to_string(),
        ];
        let stripped = strip_morph_prefixes(names.clone());
        assert_eq!(stripped, names, "Mixed prefixes should not be stripped");
    }

    #[test]
    fn test_world_transforms_follow_parents() {
        let locals = vec![
            Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
            Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)),
        ];
        let parents = vec![None, Some(0)];
        let world = compute_world_transforms(&locals, &parents);
        assert_eq!(world[1].transform_point3(Vec3::ZERO), Vec3::new(2.0, 1.0, 0.0));
    }
}
