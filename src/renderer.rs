//! Scene object creation and drawing.
//!
//! A [`SceneObject`] owns exactly one uploaded geometry and one material
//! (pipeline plus uniform buffers). Objects are created per visualization
//! request and explicitly disposed before replacement.

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::camera::CameraUniform;
use crate::geometry::{PrimitiveKind, RenderableGeometry};
use crate::gpu::render_context::{COLOR_FORMAT, DEPTH_FORMAT};
use crate::gpu::{RenderContext, RenderTarget};
use crate::material::{cull_mode, ComposedShader, MaterialParams};

/// Interleaved vertex for all representations.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    color: [f32; 3],
}

fn interleave(geometry: &RenderableGeometry) -> Vec<Vertex> {
    let zero = [0.0_f32; 3];
    geometry
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: geometry
                .normals
                .as_ref()
                .and_then(|n| n.get(i))
                .copied()
                .unwrap_or(zero),
            color: geometry.colors.get(i).copied().unwrap_or(zero),
        })
        .collect()
}

/// Shared pipeline scaffolding: bind group layouts reused by every scene
/// object.
pub struct Renderer {
    camera_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
}

impl Renderer {
    /// Create the shared bind group layouts.
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_layout = |label: &str| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            })
        };
        Self {
            camera_layout: uniform_layout("Camera Layout"),
            material_layout: uniform_layout("Material Layout"),
        }
    }

    /// Upload a geometry and build its pipeline from a composed shader.
    #[must_use]
    pub fn create_scene_object(
        &self,
        context: &RenderContext,
        geometry: &RenderableGeometry,
        shader: ComposedShader,
        params: &MaterialParams,
    ) -> SceneObject {
        let device = &context.device;
        let vertices = interleave(geometry);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let (index_buffer, draw_count) = match &geometry.indices {
            Some(indices) => (
                Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Scene Index Buffer"),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                })),
                indices.len() as u32,
            ),
            None => (None, vertices.len() as u32),
        };

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform"),
            contents: bytemuck::bytes_of(&CameraUniform {
                view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Uniform"),
            contents: bytemuck::bytes_of(&params.to_uniform()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &self.camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });
        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout: &self.material_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: material_buffer.as_entire_binding(),
            }],
        });

        let pipeline = self.create_pipeline(device, geometry.kind, shader);

        SceneObject {
            pipeline,
            vertex_buffer,
            index_buffer,
            draw_count,
            camera_buffer,
            camera_bind_group,
            material_buffer,
            material_bind_group,
        }
    }

    fn create_pipeline(
        &self,
        device: &wgpu::Device,
        kind: PrimitiveKind,
        shader: ComposedShader,
    ) -> wgpu::RenderPipeline {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Naga(Cow::Owned(shader.module)),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&self.camera_layout, &self.material_layout],
            push_constant_ranges: &[],
        });

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0, // position
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 12,
                    shader_location: 1, // normal
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 24,
                    shader_location: 2, // color
                },
            ],
        };

        let is_mesh = kind == PrimitiveKind::Triangles;
        let topology = match kind {
            PrimitiveKind::Lines => wgpu::PrimitiveTopology::LineList,
            PrimitiveKind::Triangles => wgpu::PrimitiveTopology::TriangleList,
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                cull_mode: cull_mode(is_mesh),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Clear the target to the background color without drawing anything.
    /// Used while no structure is loaded.
    pub fn clear(&self, context: &RenderContext, target: &RenderTarget, clear_color: [f64; 3]) {
        let mut encoder = context.create_encoder();
        {
            let _render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear_color[0],
                            g: clear_color[1],
                            b: clear_color[2],
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
        }
        context.submit(encoder);
    }

    /// Draw the scene object into the target, clearing first.
    pub fn render(
        &self,
        context: &RenderContext,
        object: &SceneObject,
        camera: &CameraUniform,
        target: &RenderTarget,
        clear_color: [f64; 3],
    ) {
        context
            .queue
            .write_buffer(&object.camera_buffer, 0, bytemuck::bytes_of(camera));

        let mut encoder = context.create_encoder();
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear_color[0],
                            g: clear_color[1],
                            b: clear_color[2],
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            render_pass.set_pipeline(&object.pipeline);
            render_pass.set_bind_group(0, &object.camera_bind_group, &[]);
            render_pass.set_bind_group(1, &object.material_bind_group, &[]);
            render_pass.set_vertex_buffer(0, object.vertex_buffer.slice(..));
            match &object.index_buffer {
                Some(indices) => {
                    render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..object.draw_count, 0, 0..1);
                }
                None => render_pass.draw(0..object.draw_count, 0..1),
            }
        }
        context.submit(encoder);
    }
}

/// One uploaded geometry plus its material state.
pub struct SceneObject {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    draw_count: u32,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    material_buffer: wgpu::Buffer,
    material_bind_group: wgpu::BindGroup,
}

impl SceneObject {
    /// Update the material uniform in place (color-source toggles and
    /// parameter tweaks that do not change the shader variant).
    pub fn write_material(&self, queue: &wgpu::Queue, params: &MaterialParams) {
        queue.write_buffer(&self.material_buffer, 0, bytemuck::bytes_of(&params.to_uniform()));
    }

    /// Eagerly release the GPU buffers. Consumes the object so a disposed
    /// scene object can never be drawn again.
    pub fn dispose(self) {
        self.vertex_buffer.destroy();
        if let Some(indices) = &self.index_buffer {
            indices.destroy();
        }
        self.camera_buffer.destroy();
        self.material_buffer.destroy();
    }
}
