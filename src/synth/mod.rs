pub mod config;
pub mod core;
pub mod frame;
pub mod mapper;
pub mod oscillator;
pub mod prelude;
pub mod scale;
pub mod spectrum;

pub use self::core::Synth;
pub use config::Config;
pub use mapper::{Voice, VoiceMapper};
pub use scale::{Scale, Tuning};
pub use spectrum::{Partial, Spectrum, SpectrumPreset};
