// Prelude module for target-dependent helpers

pub use core::f32::consts::{SQRT_2, TAU};

/// Uniform sample in `[min, max)`.
#[cfg(target_arch = "wasm32")]
pub fn random_range(min: f32, max: f32) -> f32 {
    fastrand::f32() * (max - min) + min
}

/// Uniform sample in `[min, max)`.
#[cfg(not(target_arch = "wasm32"))]
pub fn random_range(min: f32, max: f32) -> f32 {
    use rand::Rng;
    if max <= min {
        return min;
    }
    let mut rng = rand::rng();
    rng.random_range(min..max)
}
