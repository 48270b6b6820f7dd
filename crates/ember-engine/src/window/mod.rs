//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single Window, and wires them to the
//! GPU layer. Event handling here is deliberately thin: close/Escape set the
//! quit flag, resize reconfigures the surface, redraw drives one frame.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
