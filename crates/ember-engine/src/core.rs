//! Engine-facing application contract.
//!
//! The runtime owns the platform loop; applications implement [`App`] and
//! receive a per-frame context with the GPU handles and frame timing.

use crate::device::Gpu;
use crate::time::FrameTime;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Per-frame context passed to [`App::on_frame`].
///
/// Lifetimes: `'a` is the callback invocation, `'w` the window borrow
/// carried by [`Gpu`].
pub struct FrameCtx<'a, 'w> {
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
}

/// Application contract implemented by binaries.
pub trait App {
    /// Called once per rendered frame. Returning [`AppControl::Exit`] sets
    /// the runtime's termination flag, checked at the top of each iteration.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
