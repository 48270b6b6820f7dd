//! Shader loading.
//!
//! Shaders arrive as opaque blobs on disk — either WGSL text or a
//! pre-compiled SPIR-V binary — together with a declared resource-binding
//! signature. The loader reads the blob, checks that this build can consume
//! its encoding, registers it with the device, and drops the raw bytes on
//! every exit path. All failures are startup-fatal configuration errors.

use std::path::Path;

use crate::error::{RenderError, Result};

/// SPIR-V magic number (first word of every module).
const SPIRV_MAGIC: [u8; 4] = 0x0723_0203_u32.to_le_bytes();

/// Pipeline stage a shader is registered for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
}

impl ShaderStageKind {
    /// Entry point name the blob must export.
    ///
    /// SPIR-V blobs follow the `main` convention; WGSL modules use
    /// stage-suffixed names so both stages can live in one file.
    fn entry_point(self, format: ShaderFormat) -> &'static str {
        match (format, self) {
            (ShaderFormat::SpirV, _) => "main",
            (ShaderFormat::Wgsl, ShaderStageKind::Vertex) => "vs_main",
            (ShaderFormat::Wgsl, ShaderStageKind::Fragment) => "fs_main",
        }
    }
}

/// Declared resource-binding signature of a shader stage.
///
/// Named fields rather than positional counts: a silent transposition of two
/// bare integers here produces wrong bindings at draw time with no error,
/// so this is deliberately the most rigorously typed surface of the engine.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct BindingCounts {
    pub samplers: u32,
    pub uniform_buffers: u32,
    pub storage_buffers: u32,
    pub storage_textures: u32,
}

impl BindingCounts {
    pub fn with_samplers(mut self, n: u32) -> Self {
        self.samplers = n;
        self
    }

    pub fn with_uniform_buffers(mut self, n: u32) -> Self {
        self.uniform_buffers = n;
        self
    }

    pub fn with_storage_buffers(mut self, n: u32) -> Self {
        self.storage_buffers = n;
        self
    }

    pub fn with_storage_textures(mut self, n: u32) -> Self {
        self.storage_textures = n;
        self
    }
}

/// Encoding of a shader blob.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderFormat {
    Wgsl,
    SpirV,
}

impl ShaderFormat {
    /// Detects the blob encoding by content.
    ///
    /// SPIR-V is identified by its magic word (either byte order); anything
    /// else that is valid UTF-8 is treated as WGSL text.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= 4 && bytes.len() % 4 == 0 {
            let magic: [u8; 4] = bytes[0..4].try_into().ok()?;
            let mut reversed = magic;
            reversed.reverse();
            if magic == SPIRV_MAGIC || reversed == SPIRV_MAGIC {
                return Some(Self::SpirV);
            }
        }

        if std::str::from_utf8(bytes).is_ok() {
            return Some(Self::Wgsl);
        }

        None
    }

    /// Whether this build of the engine can hand the encoding to the device.
    pub fn supported(self) -> bool {
        match self {
            Self::Wgsl => true,
            Self::SpirV => cfg!(feature = "spirv"),
        }
    }
}

/// A compiled shader stage, ready to be consumed by pipeline construction.
///
/// Immutable after registration. The pipeline takes ownership; once the
/// pipeline is built the stage (and its module) may be dropped.
pub struct ShaderStage {
    pub(crate) module: wgpu::ShaderModule,
    pub kind: ShaderStageKind,
    pub counts: BindingCounts,
    pub entry_point: &'static str,
}

impl ShaderStage {
    /// Loads a shader blob from `path` and registers it with the device.
    ///
    /// Failure modes:
    /// - missing file → [`RenderError::ShaderNotFound`]
    /// - unreadable or zero-length file → [`RenderError::ShaderRead`]
    /// - encoding neither WGSL nor consumable SPIR-V →
    ///   [`RenderError::ShaderUnsupported`]
    /// - device rejects the module → [`RenderError::ShaderCompile`]
    pub fn load(
        device: &wgpu::Device,
        path: impl AsRef<Path>,
        kind: ShaderStageKind,
        counts: BindingCounts,
    ) -> Result<Self> {
        let path = path.as_ref();
        let bytes = read_shader_bytes(path)?;

        let format = ShaderFormat::detect(&bytes).ok_or_else(|| {
            RenderError::ShaderUnsupported {
                path: path.to_owned(),
            }
        })?;
        if !format.supported() {
            return Err(RenderError::ShaderUnsupported {
                path: path.to_owned(),
            });
        }

        let source = match format {
            ShaderFormat::Wgsl => wgpu::ShaderSource::Wgsl(String::from_utf8_lossy(&bytes)),
            #[cfg(feature = "spirv")]
            ShaderFormat::SpirV => wgpu::util::make_spirv(&bytes),
            #[cfg(not(feature = "spirv"))]
            ShaderFormat::SpirV => {
                return Err(RenderError::ShaderUnsupported {
                    path: path.to_owned(),
                });
            }
        };

        // Validation errors from module creation surface through an error
        // scope; without one they would fire the uncaptured-error hook long
        // after this call returns.
        let error_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: path.to_str(),
            source,
        });
        if let Some(err) = pollster::block_on(error_scope.pop()) {
            return Err(RenderError::ShaderCompile {
                path: path.to_owned(),
                message: err.to_string(),
            });
        }

        log::debug!("loaded {kind:?} shader from {} ({format:?})", path.display());

        Ok(Self {
            module,
            kind,
            counts,
            entry_point: kind.entry_point(format),
        })
    }
}

/// Reads the raw shader bytes, mapping I/O failures onto the error taxonomy.
fn read_shader_bytes(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            RenderError::ShaderNotFound {
                path: path.to_owned(),
            }
        } else {
            RenderError::ShaderRead {
                path: path.to_owned(),
                source,
            }
        }
    })?;

    if bytes.is_empty() {
        return Err(RenderError::ShaderRead {
            path: path.to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "file is empty"),
        });
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("ember-shader-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    // ── format detection ──────────────────────────────────────────────────

    #[test]
    fn detects_spirv_little_endian() {
        let blob = [0x03, 0x02, 0x23, 0x07, 0, 0, 1, 0];
        assert_eq!(ShaderFormat::detect(&blob), Some(ShaderFormat::SpirV));
    }

    #[test]
    fn detects_spirv_big_endian() {
        let blob = [0x07, 0x23, 0x02, 0x03, 0, 1, 0, 0];
        assert_eq!(ShaderFormat::detect(&blob), Some(ShaderFormat::SpirV));
    }

    #[test]
    fn detects_wgsl_text() {
        let src = b"@vertex fn vs_main() {}";
        assert_eq!(ShaderFormat::detect(src), Some(ShaderFormat::Wgsl));
    }

    #[test]
    fn rejects_binary_garbage() {
        // Not SPIR-V, not UTF-8.
        let blob = [0xff, 0xfe, 0x00, 0x81, 0xff];
        assert_eq!(ShaderFormat::detect(&blob), None);
    }

    #[test]
    fn spirv_requires_word_alignment() {
        // Magic present but truncated to a non-multiple of four: treated as
        // undetectable, not as SPIR-V.
        let blob = [0x03, 0x02, 0x23, 0x07, 0xff];
        assert_eq!(ShaderFormat::detect(&blob), None);
    }

    // ── entry points ──────────────────────────────────────────────────────

    #[test]
    fn entry_points_per_format() {
        use ShaderStageKind::*;
        assert_eq!(Vertex.entry_point(ShaderFormat::SpirV), "main");
        assert_eq!(Fragment.entry_point(ShaderFormat::SpirV), "main");
        assert_eq!(Vertex.entry_point(ShaderFormat::Wgsl), "vs_main");
        assert_eq!(Fragment.entry_point(ShaderFormat::Wgsl), "fs_main");
    }

    // ── file reading ──────────────────────────────────────────────────────

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join("ember-shader-definitely-missing.wgsl");
        match read_shader_bytes(&path) {
            Err(RenderError::ShaderNotFound { path: p }) => assert_eq!(p, path),
            other => panic!("expected ShaderNotFound, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_is_read_error() {
        let path = temp_file("empty.wgsl", b"");
        let result = read_shader_bytes(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(RenderError::ShaderRead { .. })));
    }

    #[test]
    fn readable_file_round_trips() {
        let path = temp_file("ok.wgsl", b"fn noop() {}");
        let result = read_shader_bytes(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(result.unwrap(), b"fn noop() {}");
    }

    // ── binding counts ────────────────────────────────────────────────────

    #[test]
    fn binding_counts_default_to_zero() {
        assert_eq!(BindingCounts::default(), BindingCounts {
            samplers: 0,
            uniform_buffers: 0,
            storage_buffers: 0,
            storage_textures: 0,
        });
    }

    #[test]
    fn binding_counts_builders_compose() {
        let counts = BindingCounts::default()
            .with_uniform_buffers(1)
            .with_samplers(2);
        assert_eq!(counts.uniform_buffers, 1);
        assert_eq!(counts.samplers, 2);
        assert_eq!(counts.storage_buffers, 0);
    }
}
