//! Screen-space ribbon pipeline for the lanyard band.

use glam::Mat4;
use holocard_core::RibbonVertex;

use crate::context::{RenderContext, DEPTH_FORMAT};
use crate::ribbon::RibbonGeometry;
use crate::shaders::BAND_WGSL;

/// Longest polyline the band buffers hold.
pub const MAX_POINTS: usize = 1024;
const MAX_VERTICES: usize = MAX_POINTS * 2;
const MAX_INDICES: usize = (MAX_POINTS - 1) * 6;

/// Default band width (px).
pub const DEFAULT_WIDTH_PX: f32 = 6.0;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BandUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Linear RGBA.
    pub color: [f32; 4],
    /// Surface size (px).
    pub resolution: [f32; 2],
    /// Full ribbon width (px).
    pub line_width: f32,
    pub _pad: f32,
}

impl BandUniform {
    pub fn new(color: [f32; 4], line_width: f32) -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            color,
            resolution: [1.0, 1.0],
            line_width,
            _pad: 0.0,
        }
    }
}

pub struct BandPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub num_indices: u32,
    pub uniform: BandUniform,
}

impl BandPipeline {
    pub fn new(ctx: &RenderContext, uniform: BandUniform) -> Self {
        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Band Shader"),
            source: wgpu::ShaderSource::Wgsl(BAND_WGSL.into()),
        });

        let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Band Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<BandUniform>() as u64),
                },
                count: None,
            }],
        });

        let uniform_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Band Uniform Buffer"),
            size: std::mem::size_of::<BandUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        ctx.queue.write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&uniform));

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Band Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Band Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Band Vertex Buffer"),
            size: (MAX_VERTICES * std::mem::size_of::<RibbonVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Band Index Buffer"),
            size: (MAX_INDICES * std::mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Band Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<RibbonVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        // position
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x3,
                        },
                        // side
                        wgpu::VertexAttribute {
                            offset: 12,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32,
                        },
                        // previous
                        wgpu::VertexAttribute {
                            offset: 16,
                            shader_location: 2,
                            format: wgpu::VertexFormat::Float32x3,
                        },
                        // counter
                        wgpu::VertexAttribute {
                            offset: 28,
                            shader_location: 3,
                            format: wgpu::VertexFormat::Float32,
                        },
                        // next
                        wgpu::VertexAttribute {
                            offset: 32,
                            shader_location: 4,
                            format: wgpu::VertexFormat::Float32x3,
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.format(),
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Side flips with the projected tangent, so both windings occur
                cull_mode: None,
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
        });

        Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            uniform_buffer,
            bind_group,
            num_indices: 0,
            uniform,
        }
    }

    /// Track the surface size so the ribbon keeps its pixel width.
    pub fn set_resolution(&mut self, queue: &wgpu::Queue, width: f32, height: f32) {
        self.uniform.resolution = [width.max(1.0), height.max(1.0)];
        self.write_uniform(queue);
    }

    pub fn update_view_proj(&mut self, queue: &wgpu::Queue, view_proj: Mat4) {
        self.uniform.view_proj = view_proj.to_cols_array_2d();
        self.write_uniform(queue);
    }

    fn write_uniform(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniform));
    }

    /// Upload the ribbon. Returns the number of indices that will be drawn.
    pub fn upload(&mut self, queue: &wgpu::Queue, ribbon: &RibbonGeometry) -> u32 {
        let vertices = ribbon.vertices();
        let indices = ribbon.indices();
        let vcount = vertices.len().min(MAX_VERTICES);
        let icount = indices.len().min(MAX_INDICES);
        if vcount > 0 && icount > 0 {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices[..vcount]));
            queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&indices[..icount]));
        }
        self.num_indices = icount as u32;
        self.num_indices
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.num_indices == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.num_indices, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<BandUniform>(), 96);
    }

    #[test]
    fn test_truncated_upload_stays_in_bounds() {
        // The first MAX_INDICES indices only reference the first MAX_VERTICES vertices
        let points: Vec<glam::Vec3> = (0..MAX_POINTS + 10)
            .map(|i| glam::Vec3::new(i as f32, 0.0, 0.0))
            .collect();
        let mut ribbon = RibbonGeometry::new();
        ribbon.set_points(&points);
        let max = ribbon.indices()[..MAX_INDICES].iter().copied().max().unwrap();
        assert!((max as usize) < MAX_VERTICES);
    }
}
