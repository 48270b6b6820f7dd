//! Host-visible staging memory.

use crate::error::{RenderError, Result};

/// A fixed-size, host-visible staging region with a write cursor.
///
/// Lifetime contract: created mapped, written, then unmapped exactly once
/// via [`finish`](Self::finish), consumed by exactly one copy pass, and
/// released only after that pass's submission has completed. The type makes
/// the first half of that contract structural: writing is only possible
/// before `finish`, and `finish` consumes the value.
pub struct StagingBuffer {
    buffer: wgpu::Buffer,
    size: u64,
    cursor: u64,
}

impl StagingBuffer {
    /// Allocates a mapped staging region of at least `size` bytes.
    ///
    /// The actual allocation is rounded up to `COPY_BUFFER_ALIGNMENT`.
    /// Allocation failure is fatal; there is no partial-upload recovery.
    pub fn new(device: &wgpu::Device, size: u64) -> Result<Self> {
        if size == 0 {
            return Err(RenderError::Allocation {
                what: "zero-size staging buffer".to_string(),
            });
        }

        let padded = wgpu::util::align_to(size, wgpu::COPY_BUFFER_ALIGNMENT);

        let error_scope = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ember staging buffer"),
            size: padded,
            usage: wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: true,
        });
        if let Some(err) = pollster::block_on(error_scope.pop()) {
            return Err(RenderError::Allocation {
                what: format!("staging buffer of {padded} bytes: {err}"),
            });
        }

        Ok(Self {
            buffer,
            size: padded,
            cursor: 0,
        })
    }

    /// Copies `bytes` into the region at the current cursor and returns the
    /// sub-offset at which they were placed.
    ///
    /// The cursor advances past the write, rounded up to copy alignment, so
    /// every returned offset is a valid copy source offset.
    pub fn write(&mut self, bytes: &[u8]) -> Result<u64> {
        let offset = self.cursor;
        let end = offset + bytes.len() as u64;
        if end > self.size {
            return Err(RenderError::Allocation {
                what: format!(
                    "staging write of {} bytes at offset {offset} exceeds region of {} bytes",
                    bytes.len(),
                    self.size
                ),
            });
        }

        self.buffer
            .slice(..)
            .get_mapped_range_mut()[offset as usize..end as usize]
            .copy_from_slice(bytes);

        self.cursor = wgpu::util::align_to(end, wgpu::COPY_BUFFER_ALIGNMENT);
        Ok(offset)
    }

    /// Copies `bytes` at an explicit sub-offset, for layouts with padding
    /// between ranges (row-padded texture uploads).
    ///
    /// Does not move the cursor backwards; the cursor ends at least at the
    /// aligned end of this write.
    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        let end = offset + bytes.len() as u64;
        if end > self.size {
            return Err(RenderError::Allocation {
                what: format!(
                    "staging write of {} bytes at offset {offset} exceeds region of {} bytes",
                    bytes.len(),
                    self.size
                ),
            });
        }

        self.buffer
            .slice(..)
            .get_mapped_range_mut()[offset as usize..end as usize]
            .copy_from_slice(bytes);

        let aligned_end = wgpu::util::align_to(end, wgpu::COPY_BUFFER_ALIGNMENT);
        self.cursor = self.cursor.max(aligned_end);
        Ok(())
    }

    /// Unmaps the region and yields the underlying buffer for copy-pass
    /// consumption. After this point the host may no longer write.
    pub fn finish(self) -> wgpu::Buffer {
        self.buffer.unmap();
        self.buffer
    }
}

/// Computes the aligned sub-offsets for a batch of ranges sharing one
/// staging region, plus the total region size.
///
/// Mirrors the cursor behavior of [`StagingBuffer::write`]: each range
/// starts at the aligned end of the previous one.
pub(crate) fn batch_layout(lengths: &[u64]) -> (Vec<u64>, u64) {
    let mut offsets = Vec::with_capacity(lengths.len());
    let mut cursor = 0u64;
    for &len in lengths {
        offsets.push(cursor);
        cursor = wgpu::util::align_to(cursor + len, wgpu::COPY_BUFFER_ALIGNMENT);
    }
    (offsets, cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_layout_packs_aligned() {
        // 3 vertices of 36 bytes, then 6 u32 indices.
        let (offsets, total) = batch_layout(&[108, 24]);
        assert_eq!(offsets, vec![0, 108]);
        assert_eq!(total, 132);
    }

    #[test]
    fn batch_layout_pads_odd_lengths() {
        let (offsets, total) = batch_layout(&[5, 3]);
        assert_eq!(offsets, vec![0, 8]);
        assert_eq!(total, 12);
        for o in offsets {
            assert_eq!(o % wgpu::COPY_BUFFER_ALIGNMENT, 0);
        }
    }

    #[test]
    fn batch_layout_empty() {
        let (offsets, total) = batch_layout(&[]);
        assert!(offsets.is_empty());
        assert_eq!(total, 0);
    }
}
