//! Program objects and lazily created render pipelines
//!
//! A wgpu pipeline bakes in the shader, the vertex layout and the target
//! formats, none of which a bind-style program knows about up front. The cache
//! builds one pipeline per combination the first time it is drawn with and
//! reuses it afterwards.

use std::collections::HashMap;
use std::num::NonZeroU64;

use crate::gfx::backend::{GpuHandle, TextureKind};
use crate::gfx::resources::layout::{ElementType, VertexBufferLayout};
use crate::gfx::shader::reflect::{self, ProgramLayout, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::gfx::shader::ShaderSources;

/// Compiled shader modules plus the binding layouts derived from reflection.
pub(super) struct GpuProgram {
    pub label: String,
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
    pub layout: ProgramLayout,
    /// CPU copy of the uniform block, snapshotted into a buffer per draw.
    pub block: Vec<u8>,
    pub uniform_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
    pub pipeline_layout: wgpu::PipelineLayout,
}

impl GpuProgram {
    pub fn create(device: &wgpu::Device, label: &str, sources: &ShaderSources) -> Result<Self, String> {
        let (_, layout) = reflect::build_program(sources)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} vs", label)),
            source: wgpu::ShaderSource::Wgsl(sources.vertex.as_str().into()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} fs", label)),
            source: wgpu::ShaderSource::Wgsl(sources.fragment.as_str().into()),
        });

        let uniform_entries: Vec<wgpu::BindGroupLayoutEntry> = if layout.block_size > 0 {
            vec![wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(layout.block_size as u64),
                },
                count: None,
            }]
        } else {
            Vec::new()
        };
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} uniforms", label)),
            entries: &uniform_entries,
        });

        let texture_entries: Vec<wgpu::BindGroupLayoutEntry> = layout
            .textures
            .iter()
            .flat_map(|slot| {
                [
                    wgpu::BindGroupLayoutEntry {
                        binding: slot.binding,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: match slot.kind {
                                TextureKind::Texture2D => wgpu::TextureViewDimension::D2,
                                TextureKind::Cube => wgpu::TextureViewDimension::Cube,
                            },
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: slot.binding + 1,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ]
            })
            .collect();
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} textures", label)),
            entries: &texture_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Layout", label)),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(format!("program '{}': {}", label, err));
        }

        Ok(Self {
            label: label.to_string(),
            vertex,
            fragment,
            block: vec![0u8; layout.block_size as usize],
            layout,
            uniform_layout,
            texture_layout,
            pipeline_layout,
        })
    }
}

/// Everything a render pipeline depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct PipelineKey {
    pub program: GpuHandle,
    pub buffers: Vec<(u32, VertexBufferLayout)>,
    pub color: Option<wgpu::TextureFormat>,
    pub depth: Option<wgpu::TextureFormat>,
}

#[derive(Default)]
pub(super) struct PipelineCache {
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        key: &PipelineKey,
        program: &GpuProgram,
    ) -> Result<wgpu::RenderPipeline, String> {
        if let Some(pipeline) = self.pipelines.get(key) {
            return Ok(pipeline.clone());
        }

        let pipeline = create_pipeline(device, key, program)?;
        log::debug!(
            "created pipeline for '{}' ({} cached)",
            program.label,
            self.pipelines.len() + 1
        );
        self.pipelines.insert(key.clone(), pipeline.clone());
        Ok(pipeline)
    }

    /// Drops every pipeline built from a destroyed program.
    pub fn evict_program(&mut self, program: GpuHandle) {
        self.pipelines.retain(|key, _| key.program != program);
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    key: &PipelineKey,
    program: &GpuProgram,
) -> Result<wgpu::RenderPipeline, String> {
    let attributes: Vec<Vec<wgpu::VertexAttribute>> = key
        .buffers
        .iter()
        .map(|(base_slot, layout)| {
            layout
                .iter()
                .enumerate()
                .filter(|(i, _)| program.layout.vertex_inputs.contains(&(base_slot + *i as u32)))
                .map(|(i, element)| wgpu::VertexAttribute {
                    format: vertex_format(element.element_type),
                    offset: element.offset() as u64,
                    shader_location: base_slot + i as u32,
                })
                .collect()
        })
        .collect();

    let vertex_buffers: Vec<wgpu::VertexBufferLayout> = key
        .buffers
        .iter()
        .zip(attributes.iter())
        .map(|((_, layout), attributes)| wgpu::VertexBufferLayout {
            array_stride: layout.stride() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        })
        .collect();

    let color_targets = [key.color.map(|format| wgpu::ColorTargetState {
        format,
        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        write_mask: wgpu::ColorWrites::ALL,
    })];

    let depth_stencil = key.depth.map(|format| wgpu::DepthStencilState {
        format,
        depth_write_enabled: true,
        // LessEqual lets a skybox drawn at the far plane pass against the
        // cleared depth.
        depth_compare: wgpu::CompareFunction::LessEqual,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    });

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&program.label),
        layout: Some(&program.pipeline_layout),
        vertex: wgpu::VertexState {
            module: &program.vertex,
            entry_point: Some(VERTEX_ENTRY),
            buffers: &vertex_buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &program.fragment,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &color_targets,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(format!("pipeline for '{}': {}", program.label, err)),
        None => Ok(pipeline),
    }
}

fn vertex_format(element_type: ElementType) -> wgpu::VertexFormat {
    match element_type {
        ElementType::Float1 => wgpu::VertexFormat::Float32,
        ElementType::Float2 => wgpu::VertexFormat::Float32x2,
        ElementType::Float3 => wgpu::VertexFormat::Float32x3,
        ElementType::Float4 => wgpu::VertexFormat::Float32x4,
        ElementType::Int1 => wgpu::VertexFormat::Sint32,
        ElementType::Int2 => wgpu::VertexFormat::Sint32x2,
        ElementType::Int3 => wgpu::VertexFormat::Sint32x3,
        ElementType::Int4 => wgpu::VertexFormat::Sint32x4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_format_sizes_match_layout() {
        for ty in [
            ElementType::Float1,
            ElementType::Float3,
            ElementType::Int2,
            ElementType::Int4,
        ] {
            assert_eq!(vertex_format(ty).size(), ty.size() as u64);
        }
    }
}
