//! One-shot copy pass.

use crate::error::{RenderError, Result};

/// A scoped, one-shot recording context for host→device copies.
///
/// Open with [`begin`](Self::begin), record uploads, then close and submit
/// the whole pass as a unit with [`submit`](Self::submit). `submit` consumes
/// the pass, so uploads cannot be recorded after submission, and a pass
/// cannot be submitted twice.
pub struct CopyPass {
    encoder: wgpu::CommandEncoder,
}

impl CopyPass {
    /// Opens a copy pass on a fresh command encoder.
    pub fn begin(device: &wgpu::Device) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("ember copy pass"),
        });
        Self { encoder }
    }

    /// Records an upload of `size` bytes from a staging sub-region into a
    /// device buffer.
    ///
    /// Offsets and size must be `COPY_BUFFER_ALIGNMENT`-aligned; staging
    /// offsets produced by [`StagingBuffer::write`](super::StagingBuffer::write)
    /// already are, and the recorded size is padded to alignment here (the
    /// destination buffer is created with the same padding).
    pub fn upload_to_buffer(
        &mut self,
        src: &wgpu::Buffer,
        src_offset: u64,
        dst: &wgpu::Buffer,
        dst_offset: u64,
        size: u64,
    ) {
        let size = wgpu::util::align_to(size, wgpu::COPY_BUFFER_ALIGNMENT);
        self.encoder
            .copy_buffer_to_buffer(src, src_offset, dst, dst_offset, size);
    }

    /// Records an upload from a row-padded staging sub-region into a 2D
    /// texture.
    ///
    /// `bytes_per_row` is the padded row pitch in the staging buffer and
    /// must be a multiple of `COPY_BYTES_PER_ROW_ALIGNMENT`.
    pub fn upload_to_texture(
        &mut self,
        src: &wgpu::Buffer,
        src_offset: u64,
        bytes_per_row: u32,
        dst: &wgpu::Texture,
        extent: wgpu::Extent3d,
    ) {
        self.encoder.copy_buffer_to_texture(
            wgpu::TexelCopyBufferInfo {
                buffer: src,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: src_offset,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: None,
                },
            },
            wgpu::TexelCopyTextureInfo {
                texture: dst,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            extent,
        );
    }

    /// Closes the pass, submits it as a single unit of work, and blocks
    /// until the submission is known to have completed.
    ///
    /// The wait is what makes releasing the staging buffer safe: its
    /// host-visible memory may be read asynchronously by the device until
    /// the copy has finished. This happens once at startup per resource, not
    /// per frame.
    pub fn submit(self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<()> {
        let index = queue.submit(std::iter::once(self.encoder.finish()));

        device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(index),
                timeout: None,
            })
            .map_err(|err| RenderError::Submission {
                message: format!("waiting for copy pass completion: {err}"),
            })?;

        Ok(())
    }
}
