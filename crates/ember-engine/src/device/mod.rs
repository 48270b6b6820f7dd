//! GPU device + surface management.
//!
//! Responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering
//!
//! Surface acquisition failure is fatal here; this harness has no
//! device-loss or resize *recovery*, only a plain reconfigure on resize.

mod gpu;

pub use gpu::{Gpu, GpuFrame, GpuInit};
