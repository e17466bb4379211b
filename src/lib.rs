//! Adaptive-tuning additive synthesizer.
//!
//! Voices sit on an equal-division scale above a root pitch and sound a
//! shared harmonic spectrum through a fixed sine oscillator bank. A
//! background ticker keeps the Plomp-Levelt dissonance of the sounding
//! voices current, together with the field over every candidate pitch.

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
pub mod audio;
pub mod dissonance;
pub mod error;
pub mod runtime;
pub mod synth;

pub use error::{CoreError, CoreResult};
