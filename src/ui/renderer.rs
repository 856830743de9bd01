//! wgpu rendering pipeline for the viewer scene.
//!
//! Offscreen render-to-texture with depth, one draw call per placed mesh
//! primitive, and per-frame vertex updates carrying the current morph
//! weights. The result is blitted into the egui frame by the viewport
//! callback.

use std::sync::{Arc, Mutex, MutexGuard};

use bytemuck::{Pod, Zeroable};
use eframe::egui_wgpu::RenderState;
use eframe::wgpu;
use eframe::wgpu::util::DeviceExt;
use glam::Mat4;

use crate::avatar::{AvatarModel, VrmModel};
use crate::error::RenderError;
use crate::scene::Scene;
use crate::surface::{SceneRenderer, SurfaceSize};

const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Vertex layout matching the shader.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Uniform buffer layout matching the shader.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// Direction the light travels, w unused
    pub light_dir: [f32; 4],
    /// rgb * intensity
    pub light_color: [f32; 4],
    pub ambient: [f32; 4],
    pub base_color: [f32; 4],
}

/// GPU resources of one mesh primitive placed by one node.
struct DrawCall {
    mesh_idx: usize,
    prim_idx: usize,
    /// Node world transform combined with the model root transform
    model_matrix: Mat4,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    num_indices: u32,
    base_color: [f32; 4],
}

/// Camera and lights captured by the last `render` call.
#[derive(Clone, Copy)]
struct FrameParams {
    view_proj: Mat4,
    light_dir: [f32; 4],
    light_color: [f32; 4],
    ambient: [f32; 4],
    clear: wgpu::Color,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY,
            light_dir: [0.0, -1.0, 0.0, 0.0],
            light_color: [1.0; 4],
            ambient: [0.0, 0.0, 0.0, 1.0],
            clear: wgpu::Color::BLACK,
        }
    }
}

/// Offscreen target, recreated on resize.
struct OffscreenState {
    _color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    blit_bind_group: wgpu::BindGroup,
    size: [u32; 2],
}

/// GPU side of the scene. Shared between the viewer's renderer and the
/// egui paint callback.
pub struct SceneGpu {
    scene_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,
    scene_bind_group_layout: wgpu::BindGroupLayout,
    blit_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    draw_calls: Mutex<Vec<DrawCall>>,
    offscreen: Mutex<OffscreenState>,
    frame: Mutex<FrameParams>,
}

impl SceneGpu {
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("viewer_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("viewer_scene_bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let scene_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("viewer_scene_pl"),
                bind_group_layouts: &[&scene_bind_group_layout],
                push_constant_ranges: &[],
            });

        let scene_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("viewer_scene_pipeline"),
            layout: Some(&scene_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: OFFSCREEN_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                // VRM materials are frequently double-sided
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let blit_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("viewer_blit_bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let blit_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("viewer_blit_pl"),
                bind_group_layouts: &[&blit_bind_group_layout],
                push_constant_ranges: &[],
            });

        let blit_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("viewer_blit_pipeline"),
            layout: Some(&blit_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_blit"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_blit"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("viewer_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let offscreen = create_offscreen(
            device,
            &blit_bind_group_layout,
            &sampler,
            width.max(1),
            height.max(1),
        );

        Self {
            scene_pipeline,
            blit_pipeline,
            scene_bind_group_layout,
            blit_bind_group_layout,
            sampler,
            draw_calls: Mutex::new(Vec::new()),
            offscreen: Mutex::new(offscreen),
            frame: Mutex::new(FrameParams::default()),
        }
    }

    /// Resize the offscreen target if the viewport size changed.
    pub fn resize(&self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        let mut state = lock(&self.offscreen);
        if state.size == [width, height] {
            return;
        }
        *state = create_offscreen(
            device,
            &self.blit_bind_group_layout,
            &self.sampler,
            width,
            height,
        );
    }

    pub fn has_model(&self) -> bool {
        !lock(&self.draw_calls).is_empty()
    }

    /// Create buffers for every placed primitive of `model`.
    fn upload_model(&self, device: &wgpu::Device, model: &VrmModel) {
        let root = model.root_transform();
        let mut draw_calls = Vec::new();

        for instance in &model.instances {
            let model_matrix = root * model.world_transforms[instance.node];
            let mesh = &model.meshes[instance.mesh];

            for (prim_idx, prim) in mesh.primitives.iter().enumerate() {
                if prim.positions.is_empty() || prim.indices.is_empty() {
                    continue;
                }
                let label = format!("{}_{}_{}", instance.node, instance.mesh, prim_idx);

                let vertices = build_vertices(&prim.positions, &prim.normals);
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("viewer_vb_{}", label)),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("viewer_ib_{}", label)),
                    contents: bytemuck::cast_slice(&prim.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

                let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("viewer_ub_{}", label)),
                    size: std::mem::size_of::<Uniforms>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });

                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("viewer_bg_{}", label)),
                    layout: &self.scene_bind_group_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    }],
                });

                draw_calls.push(DrawCall {
                    mesh_idx: instance.mesh,
                    prim_idx,
                    model_matrix,
                    vertex_buffer,
                    index_buffer,
                    uniform_buffer,
                    bind_group,
                    num_indices: prim.indices.len() as u32,
                    base_color: prim.base_color,
                });
            }
        }

        tracing::info!("Uploaded {} draw calls for '{}'", draw_calls.len(), model.name);
        *lock(&self.draw_calls) = draw_calls;
    }

    /// Write morphed positions for every draw call.
    fn update_vertices(&self, queue: &wgpu::Queue, model: &VrmModel) {
        for dc in lock(&self.draw_calls).iter() {
            let positions = model.morphed_positions(dc.mesh_idx, dc.prim_idx);
            let normals = &model.meshes[dc.mesh_idx].primitives[dc.prim_idx].normals;
            let vertices = build_vertices(&positions, normals);
            queue.write_buffer(&dc.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }
    }

    fn set_frame(&self, scene: &Scene) {
        let bg = scene.background;
        let light = scene.directional;
        let ambient = scene.ambient;
        *lock(&self.frame) = FrameParams {
            view_proj: scene.camera.view_proj(),
            light_dir: light.direction.extend(0.0).to_array(),
            light_color: [
                light.color.r * light.intensity,
                light.color.g * light.intensity,
                light.color.b * light.intensity,
                1.0,
            ],
            ambient: [
                ambient.color.r * ambient.intensity,
                ambient.color.g * ambient.intensity,
                ambient.color.b * ambient.intensity,
                1.0,
            ],
            clear: wgpu::Color {
                r: bg.r as f64,
                g: bg.g as f64,
                b: bg.b as f64,
                a: bg.a as f64,
            },
        };
    }

    /// Render the scene offscreen. Called from the paint callback's `prepare`.
    pub fn render_offscreen(&self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let frame = *lock(&self.frame);
        let draw_calls = lock(&self.draw_calls);
        let state = lock(&self.offscreen);

        for dc in draw_calls.iter() {
            let uniforms = Uniforms {
                view_proj: frame.view_proj.to_cols_array_2d(),
                model: dc.model_matrix.to_cols_array_2d(),
                light_dir: frame.light_dir,
                light_color: frame.light_color,
                ambient: frame.ambient,
                base_color: dc.base_color,
            };
            queue.write_buffer(&dc.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("viewer_offscreen_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("viewer_offscreen_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &state.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &state.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.scene_pipeline);
            for dc in draw_calls.iter() {
                pass.set_bind_group(0, &dc.bind_group, &[]);
                pass.set_vertex_buffer(0, dc.vertex_buffer.slice(..));
                pass.set_index_buffer(dc.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..dc.num_indices, 0, 0..1);
            }
        }

        drop(state);
        drop(draw_calls);
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Blit the offscreen texture into the egui render pass.
    pub fn blit(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        let state = lock(&self.offscreen);
        render_pass.set_pipeline(&self.blit_pipeline);
        render_pass.set_bind_group(0, Some(&state.blit_bind_group), &[]);
        drop(state);
        render_pass.draw(0..3, 0..1); // fullscreen triangle
    }
}

/// [`SceneRenderer`] for the window host.
///
/// `render` uploads geometry and captures camera and lights; the GPU pass
/// itself runs when egui paints the viewport.
pub struct WgpuSceneRenderer {
    gpu: Arc<SceneGpu>,
    render_state: RenderState,
}

impl WgpuSceneRenderer {
    pub fn new(gpu: Arc<SceneGpu>, render_state: RenderState) -> Self {
        Self { gpu, render_state }
    }
}

impl SceneRenderer<VrmModel> for WgpuSceneRenderer {
    fn render(&mut self, scene: &Scene, model: Option<&VrmModel>) -> Result<(), RenderError> {
        self.gpu.set_frame(scene);

        if let Some(model) = model {
            if !self.gpu.has_model() {
                self.gpu.upload_model(&self.render_state.device, model);
            }
            self.gpu.update_vertices(&self.render_state.queue, model);
        }
        Ok(())
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.gpu
            .resize(&self.render_state.device, size.width, size.height);
    }
}

fn build_vertices(positions: &[glam::Vec3], normals: &[glam::Vec3]) -> Vec<Vertex> {
    positions
        .iter()
        .zip(normals.iter())
        .map(|(p, n)| Vertex {
            position: p.to_array(),
            normal: n.to_array(),
        })
        .collect()
}

fn create_offscreen(
    device: &wgpu::Device,
    blit_layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    width: u32,
    height: u32,
) -> OffscreenState {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let color_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("viewer_offscreen_color"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OFFSCREEN_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let color_view = color_texture.create_view(&Default::default());

    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("viewer_offscreen_depth"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&Default::default());

    let blit_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("viewer_blit_bg"),
        layout: blit_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&color_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    OffscreenState {
        _color_texture: color_texture,
        color_view,
        _depth_texture: depth_texture,
        depth_view,
        blit_bind_group,
        size: [width, height],
    }
}

