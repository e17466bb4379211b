use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the core-facing setters and the setup paths.
///
/// None of these are fatal: a rejected call leaves the previous state in place
/// and the next valid input recovers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid spectrum: {ratios} ratios vs {amplitudes} amplitudes (need equal, non-zero lengths)")]
    InvalidSpectrum { ratios: usize, amplitudes: usize },

    #[error("spectrum has {len} partials but the oscillator pool holds at most {max}")]
    TooManyPartials { len: usize, max: usize },

    #[error("partial count {count} out of range (1..={max})")]
    PartialCountOutOfRange { count: usize, max: usize },

    #[error("partial {index} must have a positive ratio and a non-negative amplitude")]
    InvalidPartial { index: usize },

    #[error("voice slot {slot} out of range ({max} slots)")]
    VoiceSlotOutOfRange { slot: usize, max: usize },

    #[error("invalid scale: {notes_per_octave} notes per octave over {octaves} octaves (1..=4096 steps)")]
    InvalidScale { notes_per_octave: u32, octaves: u32 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("audio device error: {0}")]
    Audio(String),

    #[error("failed to start dissonance ticker: {0}")]
    Ticker(String),
}
