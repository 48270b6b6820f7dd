//! Per-frame animation state and the uniform ABI.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// The bit-exact uniform contract with the shader binaries: one 4×4
/// column-major float matrix (64 bytes) at group 0, binding 0, vertex stage.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MvpUniform {
    pub mvp: [[f32; 4]; 4],
}

/// Default rotation speed: 90° per second.
pub const ROTATION_SPEED: f32 = std::f32::consts::FRAC_PI_2;

/// Animation state owned by the frame loop.
///
/// The projection is computed once from the window aspect ratio; the model
/// matrix is recomputed from the accumulated rotation every `advance`.
/// `advance(0.0)` leaves the state (and thus `mvp()`) bit-identical, so an
/// identical frame sequence with zero elapsed time is idempotent.
#[derive(Debug, Clone)]
pub struct FrameState {
    projection: Mat4,
    model: Mat4,
    rotation: f32,
    rotation_speed: f32,
}

impl FrameState {
    /// Creates the state for a window with the given aspect ratio, rotating
    /// at the default speed around the Y axis.
    pub fn new(aspect: f32) -> Self {
        Self::with_rotation_speed(aspect, ROTATION_SPEED)
    }

    /// Creates the state with an explicit rotation speed in radians/second.
    pub fn with_rotation_speed(aspect: f32, rotation_speed: f32) -> Self {
        Self {
            projection: Mat4::perspective_rh(70f32.to_radians(), aspect, 0.1, 10_000.0),
            model: model_matrix(0.0),
            rotation: 0.0,
            rotation_speed,
        }
    }

    /// Advances the animation by `dt` seconds and recomputes the model
    /// matrix.
    pub fn advance(&mut self, dt: f32) {
        self.rotation += self.rotation_speed * dt;
        self.model = model_matrix(self.rotation);
    }

    /// Accumulated rotation in radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// The per-frame uniform block: projection × model.
    pub fn mvp(&self) -> MvpUniform {
        MvpUniform {
            mvp: (self.projection * self.model).to_cols_array_2d(),
        }
    }
}

/// Model transform: pushed back along -Z, spun around Y.
fn model_matrix(rotation: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)) * Mat4::from_rotation_y(rotation)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT_60HZ: f32 = 1.0 / 60.0;

    #[test]
    fn uniform_block_is_64_bytes() {
        assert_eq!(std::mem::size_of::<MvpUniform>(), 64);
    }

    #[test]
    fn uniform_block_is_column_major() {
        let state = FrameState::new(4.0 / 3.0);
        let direct = state.projection * state.model;
        let cols = state.mvp().mvp;
        // glam stores column-major; to_cols_array_2d()[c][r] is column c.
        assert_eq!(direct.col(0).to_array(), cols[0]);
        assert_eq!(direct.col(3).to_array(), cols[3]);
    }

    #[test]
    fn zero_dt_is_idempotent() {
        let mut state = FrameState::new(800.0 / 600.0);
        state.advance(DT_60HZ);
        let before = state.mvp();
        state.advance(0.0);
        let after = state.mvp();
        // Bit-identical, not approximately equal.
        assert_eq!(
            bytemuck::bytes_of(&before),
            bytemuck::bytes_of(&after)
        );
    }

    #[test]
    fn rotation_accumulates_monotonically() {
        // 3 frames of 1/60 s at 90°/s ≈ 4.5° accumulated.
        let mut state = FrameState::new(1.0);
        let mut previous = state.rotation();
        for _ in 0..3 {
            state.advance(DT_60HZ);
            assert!(state.rotation() > previous);
            previous = state.rotation();
        }
        let expected = 4.5f32.to_radians();
        assert!((state.rotation() - expected).abs() < 1e-5);
    }

    #[test]
    fn model_matrix_differs_frame_to_frame() {
        let mut state = FrameState::new(1.0);
        let first = state.mvp();
        state.advance(DT_60HZ);
        let second = state.mvp();
        assert_ne!(first, second);
    }

    #[test]
    fn projection_fixed_after_construction() {
        let mut state = FrameState::new(2.0);
        let before = state.projection;
        state.advance(1.0);
        assert_eq!(before, state.projection);
    }
}
