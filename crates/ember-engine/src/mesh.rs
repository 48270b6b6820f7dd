//! Vertex record ABI and device-local mesh storage.

use bytemuck::{Pod, Zeroable};

use crate::error::{RenderError, Result};
use crate::transfer::{self, CopyPass, StagingBuffer};

/// Host-side vertex record.
///
/// `#[repr(C)]` packed by natural field layout; the declared attribute
/// offsets below are derived with `offset_of!` from this very struct, so the
/// pipeline's vertex-input layout can never silently drift from the bytes
/// actually uploaded.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    /// An untextured vertex; the texture coordinate is zeroed.
    pub const fn colored(position: [f32; 3], color: [f32; 4]) -> Self {
        Self {
            position,
            tex_coord: [0.0; 2],
            color,
        }
    }

    const ATTRS: [wgpu::VertexAttribute; 3] = [
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: std::mem::offset_of!(Vertex, position) as u64,
            shader_location: 0,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: std::mem::offset_of!(Vertex, tex_coord) as u64,
            shader_location: 1,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x4,
            offset: std::mem::offset_of!(Vertex, color) as u64,
            shader_location: 2,
        },
    ];

    /// Per-vertex buffer layout for slot 0.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Device-local vertex (and optionally index) storage.
///
/// Populated through exactly one completed copy pass at construction and
/// read-only afterwards; the frame loop may reference it without
/// synchronization because no writer exists once `upload` returns.
pub struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    index_count: u32,
}

impl Mesh {
    /// Uploads vertices (and optional 32-bit indices) to device-local
    /// buffers through a single staging region and copy pass.
    ///
    /// Empty input is rejected: a zero-primitive draw over undefined buffer
    /// state is not allowed to reach the device.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        vertices: &[Vertex],
        indices: Option<&[u32]>,
    ) -> Result<Self> {
        validate_nonempty(vertices.len(), indices.map(<[u32]>::len))?;

        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let index_bytes: Option<&[u8]> = indices.map(|ix| bytemuck::cast_slice(ix));

        let vertex_buffer = transfer::create_device_buffer(
            device,
            "ember mesh vertices",
            wgpu::BufferUsages::VERTEX,
            vertex_bytes.len() as u64,
        )?;
        let index_buffer = match index_bytes {
            Some(bytes) => Some(transfer::create_device_buffer(
                device,
                "ember mesh indices",
                wgpu::BufferUsages::INDEX,
                bytes.len() as u64,
            )?),
            None => None,
        };

        // One staging region sized to the whole batch, one pass, one wait.
        let lengths: Vec<u64> = std::iter::once(vertex_bytes.len() as u64)
            .chain(index_bytes.map(|b| b.len() as u64))
            .collect();
        let (_, total) = transfer::batch_layout(&lengths);
        let mut staging = StagingBuffer::new(device, total)?;
        let vertex_offset = staging.write(vertex_bytes)?;
        let index_offset = match index_bytes {
            Some(bytes) => Some(staging.write(bytes)?),
            None => None,
        };
        let src = staging.finish();

        let mut pass = CopyPass::begin(device);
        pass.upload_to_buffer(
            &src,
            vertex_offset,
            &vertex_buffer,
            0,
            vertex_bytes.len() as u64,
        );
        if let (Some(dst), Some(offset), Some(bytes)) =
            (index_buffer.as_ref(), index_offset, index_bytes)
        {
            pass.upload_to_buffer(&src, offset, dst, 0, bytes.len() as u64);
        }
        pass.submit(device, queue)?;

        Ok(Self {
            vertex_buffer,
            index_buffer,
            vertex_count: vertices.len() as u32,
            index_count: indices.map_or(0, |ix| ix.len() as u32),
        })
    }

    /// True when the mesh draws through an index buffer.
    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    /// Binds buffers at their declared slots and issues the draw call:
    /// one instance, zero offsets, exactly as constructed.
    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match &self.index_buffer {
            Some(index_buffer) => {
                rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..self.index_count, 0, 0..1);
            }
            None => {
                rpass.draw(0..self.vertex_count, 0..1);
            }
        }
    }
}

/// Rejects empty draw input before any device resource is created.
fn validate_nonempty(vertex_count: usize, index_count: Option<usize>) -> Result<()> {
    if vertex_count == 0 || index_count == Some(0) {
        return Err(RenderError::EmptyMesh);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_vertices_rejected() {
        assert!(matches!(
            validate_nonempty(0, None),
            Err(RenderError::EmptyMesh)
        ));
    }

    #[test]
    fn empty_indices_rejected() {
        assert!(matches!(
            validate_nonempty(4, Some(0)),
            Err(RenderError::EmptyMesh)
        ));
    }

    #[test]
    fn populated_input_accepted() {
        assert!(validate_nonempty(3, None).is_ok());
        assert!(validate_nonempty(4, Some(6)).is_ok());
    }

    // The vertex-input layout handed to the pipeline must match the host
    // record byte-for-byte; a mismatch renders garbage without any error.

    #[test]
    fn stride_matches_record_size() {
        assert_eq!(Vertex::layout().array_stride, 36);
        assert_eq!(std::mem::size_of::<Vertex>(), 36);
    }

    #[test]
    fn attribute_offsets_match_field_layout() {
        let attrs = Vertex::layout().attributes;
        assert_eq!(attrs[0].offset, 0); // position
        assert_eq!(attrs[1].offset, 12); // tex_coord, after 3 floats
        assert_eq!(attrs[2].offset, 20); // color, after 3 + 2 floats
    }

    #[test]
    fn attribute_locations_are_unique_and_ordered() {
        let attrs = Vertex::layout().attributes;
        let locations: Vec<u32> = attrs.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }

    #[test]
    fn colored_vertex_zeroes_tex_coord() {
        let v = Vertex::colored([1.0, 2.0, 3.0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(v.tex_coord, [0.0, 0.0]);
    }

    #[test]
    fn vertex_bytes_round_trip() {
        let v = Vertex {
            position: [1.0, 2.0, 3.0],
            tex_coord: [0.5, 0.25],
            color: [0.0, 1.0, 0.0, 1.0],
        };
        let bytes = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 36);
        assert_eq!(bytemuck::from_bytes::<Vertex>(bytes), &v);
    }
}
