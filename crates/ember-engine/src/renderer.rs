//! Per-frame orchestration.
//!
//! Each frame cycles the same sequence: acquire a recording context and the
//! next presentable image (the blocking frame-pacing point), open a render
//! pass that clears to opaque white, advance the animation, push the fresh
//! mvp, bind pipeline + buffers (+ texture), issue the single draw, end the
//! pass, submit, present. Exactly one recording context is live at a time,
//! and every device resource bound here became read-only when its upload
//! pass completed, so the loop runs without synchronization.

use crate::device::Gpu;
use crate::error::{RenderError, Result};
use crate::mesh::Mesh;
use crate::pipeline::Pipeline;
use crate::scene::{FrameState, MvpUniform};
use crate::texture::Texture2d;
use crate::time::FrameTime;

/// Clear color for every frame: opaque white.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 1.0,
    b: 1.0,
    a: 1.0,
};

/// The render context: pipeline, mesh, per-frame uniform storage, and
/// animation state, threaded explicitly through the frame loop.
pub struct Renderer {
    pipeline: Pipeline,
    mesh: Mesh,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group: Option<wgpu::BindGroup>,
    state: FrameState,
}

impl Renderer {
    /// Assembles the render context from already-uploaded resources.
    ///
    /// A textured pipeline requires a texture and vice versa; the mismatch
    /// is caught here, before the first frame.
    pub fn new(
        gpu: &Gpu<'_>,
        pipeline: Pipeline,
        mesh: Mesh,
        texture: Option<&Texture2d>,
    ) -> Result<Self> {
        let device = gpu.device();

        let texture_bind_group = match (pipeline.texture_layout(), texture) {
            (Some(layout), Some(texture)) => {
                Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("ember texture bind group"),
                    layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&texture.sampler),
                        },
                    ],
                }))
            }
            (None, None) => None,
            (Some(_), None) => {
                return Err(RenderError::PipelineCreation {
                    message: "textured pipeline assembled without a texture".to_string(),
                });
            }
            (None, Some(_)) => {
                return Err(RenderError::PipelineCreation {
                    message: "texture supplied to an untextured pipeline".to_string(),
                });
            }
        };

        // The uniform block is transient per-draw data: 64 bytes, written
        // fresh every frame, never aliased across frames.
        let error_scope = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ember mvp uniform"),
            size: std::mem::size_of::<MvpUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        if let Some(err) = pollster::block_on(error_scope.pop()) {
            return Err(RenderError::Allocation {
                what: format!("mvp uniform buffer: {err}"),
            });
        }

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ember uniform bind group"),
            layout: pipeline.uniform_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            pipeline,
            mesh,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group,
            state: FrameState::new(gpu.aspect_ratio()),
        })
    }

    /// Renders and presents one frame.
    ///
    /// Acquisition and submission failures are fatal; the caller terminates
    /// the loop rather than continuing with unsubmitted frame state.
    pub fn render_frame(&mut self, gpu: &Gpu<'_>, time: FrameTime) -> Result<()> {
        // Idle → Recording. Blocks here until an image is available.
        let mut frame = gpu.begin_frame()?;

        self.state.advance(time.dt);
        let mvp = self.state.mvp();

        // Ordered before the submit below, so the draw reads this frame's
        // matrix, not the previous one's.
        gpu.queue()
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&mvp));

        // Recording → RenderPassOpen. Scoped so the pass ends before the
        // encoder is moved into submit().
        {
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ember frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            self.pipeline.bind(&mut rpass);
            rpass.set_bind_group(0, &self.uniform_bind_group, &[]);
            if let Some(bind_group) = &self.texture_bind_group {
                rpass.set_bind_group(1, bind_group, &[]);
            }
            self.mesh.draw(&mut rpass);
        }

        // RenderPassOpen → Submitted → Idle.
        gpu.submit(frame);
        Ok(())
    }
}
