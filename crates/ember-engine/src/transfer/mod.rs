//! Host → device uploads.
//!
//! Device-local buffers and textures in this engine are never written
//! directly. Every upload follows the same protocol:
//!
//! 1. allocate a [`StagingBuffer`] sized to the whole batch, mapped
//! 2. copy host bytes into it at sub-offsets
//! 3. unmap ([`StagingBuffer::finish`]) — mapping and device consumption
//!    must never overlap in time
//! 4. open a [`CopyPass`], record one upload per (sub-region → destination)
//! 5. submit the pass as a single unit and block until it completes
//!
//! Only after step 5 may the staging buffer be released and the destination
//! resources be read by draws. Uploads recorded within one pass are visible
//! to all later submissions; uploads in separate passes have no mutual
//! ordering unless serialized by the completed wait.

mod copy_pass;
mod staging;

pub use copy_pass::CopyPass;
pub use staging::StagingBuffer;

pub(crate) use staging::batch_layout;

use crate::error::{RenderError, Result};

/// Creates a device-local buffer and populates it through one copy pass.
///
/// Convenience for the single-destination case; batched uploads (e.g. a
/// vertex + index pair) compose [`StagingBuffer`] and [`CopyPass`] directly
/// so the batch shares one staging region and one submission.
pub fn upload_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    usage: wgpu::BufferUsages,
    bytes: &[u8],
) -> Result<wgpu::Buffer> {
    let dst = create_device_buffer(device, label, usage, bytes.len() as u64)?;

    let mut staging = StagingBuffer::new(device, bytes.len() as u64)?;
    let offset = staging.write(bytes)?;
    let src = staging.finish();

    let mut pass = CopyPass::begin(device);
    pass.upload_to_buffer(&src, offset, &dst, 0, bytes.len() as u64);
    pass.submit(device, queue)?;

    Ok(dst)
}

/// Creates an empty device-local buffer that will be filled by a copy pass.
///
/// Size is rounded up to `COPY_BUFFER_ALIGNMENT` so any trailing partial
/// word of the upload has a valid destination.
pub fn create_device_buffer(
    device: &wgpu::Device,
    label: &str,
    usage: wgpu::BufferUsages,
    size: u64,
) -> Result<wgpu::Buffer> {
    if size == 0 {
        return Err(RenderError::Allocation {
            what: format!("{label} (zero-size buffer)"),
        });
    }

    let error_scope = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: wgpu::util::align_to(size, wgpu::COPY_BUFFER_ALIGNMENT),
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    if let Some(err) = pollster::block_on(error_scope.pop()) {
        return Err(RenderError::Allocation {
            what: format!("{label}: {err}"),
        });
    }

    Ok(buffer)
}
