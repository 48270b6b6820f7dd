//! Sampled 2D textures.
//!
//! Consumes a flat RGBA8 byte buffer plus dimensions (decoding is a
//! collaborator's job) and uploads it through the same staging + copy-pass
//! protocol as buffers, with rows padded to wgpu's copy row alignment.

use crate::error::{RenderError, Result};
use crate::transfer::{CopyPass, StagingBuffer};

const BYTES_PER_PIXEL: u32 = 4;

/// Device-local sampled texture with its view and sampler.
///
/// Read-only after upload, like every device resource in this engine.
pub struct Texture2d {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture2d {
    /// Uploads `pixels` (tightly packed RGBA8, `width * height * 4` bytes)
    /// into a new device-local texture via one completed copy pass.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL as usize;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(RenderError::Allocation {
                what: format!(
                    "texture of {width}x{height}: got {} bytes, expected {expected}",
                    pixels.len()
                ),
            });
        }

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let error_scope = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ember texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        if let Some(err) = pollster::block_on(error_scope.pop()) {
            return Err(RenderError::Allocation {
                what: format!("texture of {width}x{height}: {err}"),
            });
        }

        // Buffer→texture copies require the row pitch in the source buffer
        // to be 256-byte aligned, so rows are restaged individually.
        let unpadded_row = width * BYTES_PER_PIXEL;
        let padded_row = wgpu::util::align_to(unpadded_row, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

        let mut staging = StagingBuffer::new(device, padded_row as u64 * height as u64)?;
        for y in 0..height as usize {
            let row = &pixels[y * unpadded_row as usize..][..unpadded_row as usize];
            staging.write_at(y as u64 * padded_row as u64, row)?;
        }
        let src = staging.finish();

        let mut pass = CopyPass::begin(device);
        pass.upload_to_texture(&src, 0, padded_row, &texture, extent);
        pass.submit(device, queue)?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ember sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_padding_reaches_copy_alignment() {
        // A 100-pixel row is 400 bytes; copies require 256-byte pitch.
        let padded = wgpu::util::align_to(100 * BYTES_PER_PIXEL, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        assert_eq!(padded, 512);
        assert_eq!(padded % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);
    }

    #[test]
    fn aligned_rows_are_left_unpadded() {
        // 64 pixels * 4 bytes = 256, already aligned.
        let padded = wgpu::util::align_to(64 * BYTES_PER_PIXEL, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        assert_eq!(padded, 256);
    }
}
