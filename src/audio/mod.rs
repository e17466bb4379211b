mod cpal_backend;
pub use self::cpal_backend::CpalBackend;

use crate::error::CoreResult;
use crate::runtime::NativeSynth;

/// An output device that owns the audio-side synth while it plays.
pub trait AudioBackend {
    fn start(&mut self, synth: NativeSynth) -> CoreResult<()>;
    fn stop(&mut self);
}
