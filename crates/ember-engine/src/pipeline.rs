//! Render pipeline construction.
//!
//! One pipeline, built once, immutable for the rest of program life. The
//! bind-group interface is fixed: group 0 is the per-frame uniform block
//! (vertex stage), group 1 is a texture + sampler pair (fragment stage,
//! present only for textured pipelines).

use std::mem;

use crate::error::{RenderError, Result};
use crate::mesh::Vertex;
use crate::scene::MvpUniform;
use crate::shader::{BindingCounts, ShaderStage, ShaderStageKind};

/// Everything a pipeline binds at creation.
///
/// Consumes both shader stages; they are owned exclusively by the pipeline
/// being built and may be dropped once it exists.
pub struct PipelineDesc {
    pub vertex: ShaderStage,
    pub fragment: ShaderStage,
    pub topology: wgpu::PrimitiveTopology,
    pub target_format: wgpu::TextureFormat,
    /// Whether group 1 (texture + sampler) is part of the layout.
    pub textured: bool,
}

/// An immutable graphics pipeline plus the bind group layouts the renderer
/// needs to create matching bind groups.
pub struct Pipeline {
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: Option<wgpu::BindGroupLayout>,
}

impl Pipeline {
    /// Builds the pipeline, or fails with [`RenderError::PipelineCreation`].
    ///
    /// The stages' declared binding counts are checked against what this
    /// layout actually binds before any device work: a mismatch between
    /// declaration and use renders silently wrong otherwise.
    pub fn build(device: &wgpu::Device, desc: PipelineDesc) -> Result<Self> {
        check_stage_kinds(&desc)?;
        check_binding_counts(desc.vertex.counts, desc.fragment.counts, desc.textured)?;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ember uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(
                        mem::size_of::<MvpUniform>() as u64
                    ),
                },
                count: None,
            }],
        });

        let texture_layout = desc.textured.then(|| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("ember texture bgl"),
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
            })
        });

        let mut bind_group_layouts = vec![&uniform_layout];
        if let Some(layout) = texture_layout.as_ref() {
            bind_group_layouts.push(layout);
        }

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ember pipeline layout"),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        // Device-side rejection (format/stage incompatibility) is caught by
        // the validation scope and surfaced as a startup-fatal error.
        let error_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ember pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &desc.vertex.module,
                entry_point: Some(desc.vertex.entry_point),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &desc.fragment.module,
                entry_point: Some(desc.fragment.entry_point),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: desc.target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: desc.topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(error_scope.pop()) {
            return Err(RenderError::PipelineCreation {
                message: err.to_string(),
            });
        }

        Ok(Self {
            pipeline,
            uniform_layout,
            texture_layout,
        })
    }

    /// Layout for the group-0 uniform bind group.
    pub fn uniform_layout(&self) -> &wgpu::BindGroupLayout {
        &self.uniform_layout
    }

    /// Layout for the group-1 texture bind group, if the pipeline has one.
    pub fn texture_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.texture_layout.as_ref()
    }

    /// Binds the pipeline for the current render pass.
    pub fn bind(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_pipeline(&self.pipeline);
    }
}

fn check_stage_kinds(desc: &PipelineDesc) -> Result<()> {
    if desc.vertex.kind != ShaderStageKind::Vertex || desc.fragment.kind != ShaderStageKind::Fragment
    {
        return Err(RenderError::PipelineCreation {
            message: format!(
                "stage mismatch: got {:?} for vertex slot, {:?} for fragment slot",
                desc.vertex.kind, desc.fragment.kind
            ),
        });
    }
    Ok(())
}

/// Compares declared binding counts with what this pipeline layout binds.
///
/// The layout binds exactly one uniform buffer to the vertex stage and, when
/// textured, one sampler (with its texture) to the fragment stage.
fn check_binding_counts(
    vertex: BindingCounts,
    fragment: BindingCounts,
    textured: bool,
) -> Result<()> {
    let expected_vertex = BindingCounts::default().with_uniform_buffers(1);
    let expected_fragment = if textured {
        BindingCounts::default().with_samplers(1)
    } else {
        BindingCounts::default()
    };

    if vertex != expected_vertex {
        return Err(RenderError::PipelineCreation {
            message: format!(
                "vertex stage declares {vertex:?} but the layout binds {expected_vertex:?}"
            ),
        });
    }
    if fragment != expected_fragment {
        return Err(RenderError::PipelineCreation {
            message: format!(
                "fragment stage declares {fragment:?} but the layout binds {expected_fragment:?}"
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_counts_pass() {
        let vertex = BindingCounts::default().with_uniform_buffers(1);
        assert!(check_binding_counts(vertex, BindingCounts::default(), false).is_ok());
        assert!(
            check_binding_counts(vertex, BindingCounts::default().with_samplers(1), true).is_ok()
        );
    }

    #[test]
    fn undeclared_uniform_buffer_fails() {
        let err = check_binding_counts(BindingCounts::default(), BindingCounts::default(), false);
        assert!(matches!(err, Err(RenderError::PipelineCreation { .. })));
    }

    #[test]
    fn textured_layout_requires_declared_sampler() {
        let vertex = BindingCounts::default().with_uniform_buffers(1);
        let err = check_binding_counts(vertex, BindingCounts::default(), true);
        assert!(matches!(err, Err(RenderError::PipelineCreation { .. })));
    }

    #[test]
    fn surplus_declared_sampler_fails_untextured() {
        let vertex = BindingCounts::default().with_uniform_buffers(1);
        let fragment = BindingCounts::default().with_samplers(1);
        let err = check_binding_counts(vertex, fragment, false);
        assert!(matches!(err, Err(RenderError::PipelineCreation { .. })));
    }
}
