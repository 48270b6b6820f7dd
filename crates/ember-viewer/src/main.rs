//! Demo binary: a rotating mesh against a white clear.
//!
//! Default mode uploads the classic 3-vertex triangle and draws it
//! non-indexed. `--quad` uploads a 4-vertex quad with 6 indices and a
//! procedural checkerboard texture, drawn indexed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use ember_engine::core::{App, AppControl, FrameCtx};
use ember_engine::device::{Gpu, GpuInit};
use ember_engine::logging::init_logging;
use ember_engine::mesh::{Mesh, Vertex};
use ember_engine::pipeline::{Pipeline, PipelineDesc};
use ember_engine::renderer::Renderer;
use ember_engine::shader::{BindingCounts, ShaderStage, ShaderStageKind};
use ember_engine::texture::Texture2d;
use ember_engine::window::{Runtime, RuntimeConfig};

const CHECKER_SIZE: u32 = 256;

fn main() -> Result<()> {
    init_logging();

    let textured = std::env::args().any(|a| a == "--quad");

    let config = RuntimeConfig {
        title: "ember viewer".to_string(),
        ..Default::default()
    };

    let viewer = Runtime::run(config, GpuInit::default(), Viewer::new(textured))
        .context("viewer terminated abnormally")?;

    // A fatal setup or frame error must reach the shell as a nonzero exit
    // code, not be flattened into a clean loop shutdown.
    viewer.into_result()
}

struct Viewer {
    textured: bool,
    // Built lazily on the first frame; the device does not exist before the
    // runtime opens the window.
    renderer: Option<Renderer>,
    error: Option<anyhow::Error>,
}

impl Viewer {
    fn new(textured: bool) -> Self {
        Self {
            textured,
            renderer: None,
            error: None,
        }
    }

    /// Records a fatal error and directs the runtime to quit.
    fn fail(&mut self, err: anyhow::Error) -> AppControl {
        log::error!("{err:#}");
        self.error = Some(err);
        AppControl::Exit
    }

    /// `Ok` after a normal quit; the recorded fatal error otherwise.
    fn into_result(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl App for Viewer {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.error.is_some() {
            return AppControl::Exit;
        }

        if self.renderer.is_none() {
            // Startup failure blocks entry to the frame loop.
            match build_scene(ctx.gpu, self.textured) {
                Ok(renderer) => self.renderer = Some(renderer),
                Err(e) => return self.fail(e.context("scene setup failed")),
            }
        }

        let Some(renderer) = self.renderer.as_mut() else {
            return AppControl::Exit;
        };

        match renderer.render_frame(ctx.gpu, ctx.time) {
            Ok(()) => AppControl::Continue,
            Err(e) => self.fail(anyhow::Error::new(e).context("frame failed")),
        }
    }
}

/// Loads shaders, uploads the mesh (and texture), and builds the pipeline.
///
/// Every failure here is fatal before the first frame is drawn.
fn build_scene(gpu: &Gpu<'_>, textured: bool) -> Result<Renderer> {
    let device = gpu.device();
    let queue = gpu.queue();

    let vertex = ShaderStage::load(
        device,
        shader_path("shape.vert.wgsl"),
        ShaderStageKind::Vertex,
        BindingCounts::default().with_uniform_buffers(1),
    )?;

    let (fragment_file, fragment_counts) = if textured {
        ("textured.frag.wgsl", BindingCounts::default().with_samplers(1))
    } else {
        ("flat.frag.wgsl", BindingCounts::default())
    };
    let fragment = ShaderStage::load(
        device,
        shader_path(fragment_file),
        ShaderStageKind::Fragment,
        fragment_counts,
    )?;

    let pipeline = Pipeline::build(
        device,
        PipelineDesc {
            vertex,
            fragment,
            topology: wgpu::PrimitiveTopology::TriangleList,
            target_format: gpu.surface_format(),
            textured,
        },
    )?;

    let (mesh, texture) = if textured {
        let mesh = Mesh::upload(device, queue, &quad_vertices(), Some(&QUAD_INDICES[..]))?;
        let pixels = checkerboard(CHECKER_SIZE);
        let texture = Texture2d::upload(device, queue, &pixels, CHECKER_SIZE, CHECKER_SIZE)?;
        (mesh, Some(texture))
    } else {
        (
            Mesh::upload(device, queue, &triangle_vertices(), None)?,
            None,
        )
    };

    log::info!(
        "scene ready: {} mode, {} draw",
        if textured { "quad" } else { "triangle" },
        if mesh.is_indexed() { "indexed" } else { "non-indexed" },
    );

    Ok(Renderer::new(gpu, pipeline, mesh, texture.as_ref())?)
}

/// Shader blobs live next to the crate, resolved at build time.
fn shader_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders").join(name)
}

fn triangle_vertices() -> [Vertex; 3] {
    [
        Vertex::colored([-1.0, -1.0, 0.0], [1.0, 0.0, 0.0, 1.0]),
        Vertex::colored([1.0, -1.0, 0.0], [0.0, 1.0, 0.0, 1.0]),
        Vertex::colored([0.0, 1.0, 0.0], [0.0, 0.0, 1.0, 1.0]),
    ]
}

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

// A different tint per corner, so the checkerboard shows the color
// interpolating across the face rather than a flat modulate.
fn quad_vertices() -> [Vertex; 4] {
    [
        Vertex {
            position: [-1.0, -1.0, 0.0],
            tex_coord: [0.0, 1.0],
            color: [1.0, 0.0, 0.0, 1.0],
        },
        Vertex {
            position: [1.0, -1.0, 0.0],
            tex_coord: [1.0, 1.0],
            color: [0.0, 1.0, 0.0, 1.0],
        },
        Vertex {
            position: [-1.0, 1.0, 0.0],
            tex_coord: [0.0, 0.0],
            color: [0.0, 0.0, 1.0, 1.0],
        },
        Vertex {
            position: [1.0, 1.0, 0.0],
            tex_coord: [1.0, 0.0],
            color: [1.0, 1.0, 1.0, 1.0],
        },
    ]
}

/// Flat RGBA8 checkerboard, 32-pixel cells.
fn checkerboard(size: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let cell = ((x / 32) + (y / 32)) % 2 == 0;
            let v = if cell { 0xe0 } else { 0x40 };
            pixels.extend_from_slice(&[v, v, v, 0xff]);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── exit status ───────────────────────────────────────────────────────

    #[test]
    fn recorded_failure_surfaces_as_error() {
        let mut viewer = Viewer::new(false);
        assert_eq!(viewer.fail(anyhow::anyhow!("boom")), AppControl::Exit);
        assert!(viewer.into_result().is_err());
    }

    #[test]
    fn clean_shutdown_yields_ok() {
        assert!(Viewer::new(false).into_result().is_ok());
    }

    // ── demo geometry ─────────────────────────────────────────────────────

    #[test]
    fn quad_corners_carry_distinct_colors() {
        let vertices = quad_vertices();
        for i in 0..vertices.len() {
            for j in (i + 1)..vertices.len() {
                assert_ne!(vertices[i].color, vertices[j].color);
            }
        }
    }

    #[test]
    fn quad_indices_cover_all_corners() {
        for corner in 0..4 {
            assert!(QUAD_INDICES.contains(&corner));
        }
    }
}
