//! Ember engine crate.
//!
//! A minimal GPU rendering harness built on wgpu: a device bound to a window,
//! explicit staging-buffer uploads through one-shot copy passes, a single
//! immutable render pipeline, and a per-frame loop with one frame in flight.
//!
//! The upload/submission protocol is the load-bearing part: device-local
//! buffers and textures are written only through [`transfer`], and a copy
//! pass must complete before anything it wrote is read by a draw.

pub mod core;
pub mod device;
pub mod error;
pub mod logging;
pub mod mesh;
pub mod pipeline;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod texture;
pub mod time;
pub mod transfer;
pub mod window;
