//! Engine error taxonomy.
//!
//! Everything here is fatal by design: the engine is a batch-startup /
//! steady-loop system with no retry, backoff, or degraded mode. Callers are
//! expected to propagate with `?` and let the application abort before the
//! frame loop starts (startup errors) or terminate cleanly (frame errors).

use std::path::PathBuf;

use thiserror::Error;

/// Fatal engine error.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Shader file does not exist.
    #[error("shader file not found: {path}")]
    ShaderNotFound { path: PathBuf },

    /// Shader file exists but could not be read, or was empty.
    #[error("failed to read shader file {path}: {source}")]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Shader blob is in an encoding this device/build cannot consume.
    #[error("unsupported shader encoding in {path}")]
    ShaderUnsupported { path: PathBuf },

    /// Device rejected the shader module.
    #[error("device rejected shader {path}: {message}")]
    ShaderCompile { path: PathBuf, message: String },

    /// Device rejected the pipeline description, or the description was
    /// internally inconsistent (declared bindings vs. actual bindings).
    #[error("pipeline creation failed: {message}")]
    PipelineCreation { message: String },

    /// Buffer, texture, or staging-region allocation failed.
    #[error("allocation failed for {what}")]
    Allocation { what: String },

    /// A submitted unit of work could not be confirmed complete.
    #[error("submission failed: {message}")]
    Submission { message: String },

    /// Could not acquire the next presentable surface texture.
    #[error("surface acquisition failed: {source}")]
    SurfaceAcquire {
        #[from]
        source: wgpu::SurfaceError,
    },

    /// A draw was requested with no vertices (or an empty index list).
    #[error("mesh has no vertices or indices to draw")]
    EmptyMesh,
}

pub type Result<T> = std::result::Result<T, RenderError>;
