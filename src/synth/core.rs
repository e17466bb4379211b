use super::config::SynthConfig;
use super::frame::{SpectrumFrame, VoiceFrame, MAX_PARTIAL_SLOTS, MAX_VOICE_SLOTS};
use super::oscillator::SineOscillator;
use tracing::debug;

/// Additive synthesis core: one sine oscillator per (voice slot × partial
/// slot), allocated once and never resized.
///
/// `process` only reads the latest frames; it never allocates, locks or fails.
pub struct Synth {
    oscillators: Vec<SineOscillator>, // Indexed voice * max_partials + partial
    max_voices: usize,
    max_partials: usize,
    sample_rate: f32,
    voices: VoiceFrame,
    spectrum: SpectrumFrame,
}

impl Synth {
    pub fn new(config: &SynthConfig) -> Self {
        let max_voices = config.max_voices.clamp(1, MAX_VOICE_SLOTS);
        let max_partials = config.max_partials.clamp(1, MAX_PARTIAL_SLOTS);
        Self {
            oscillators: vec![SineOscillator::new(); max_voices * max_partials],
            max_voices,
            max_partials,
            sample_rate: config.sample_rate,
            voices: VoiceFrame::silent(),
            spectrum: SpectrumFrame::silent(),
        }
    }

    pub fn set_voice_frame(&mut self, frame: VoiceFrame) {
        self.voices = frame;
    }

    pub fn set_spectrum_frame(&mut self, frame: SpectrumFrame) {
        self.spectrum = frame;
    }

    /// Called from the device setup path, never from the audio callback.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        debug!(sample_rate, "synth sample rate set");
        self.sample_rate = sample_rate;
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn global_level(&self) -> f32 {
        self.spectrum.global_level
    }

    pub fn oscillator(&self, voice: usize, partial: usize) -> Option<&SineOscillator> {
        if voice < self.max_voices && partial < self.max_partials {
            self.oscillators.get(voice * self.max_partials + partial)
        } else {
            None
        }
    }

    /// Renders one block into separate left/right buffers, overwriting them.
    /// Both channels receive the same mono mix.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);
        let frames = left.len().min(right.len());
        self.render(frames, |i, sample| {
            left[i] += sample;
            right[i] += sample;
        });
    }

    /// Renders into an interleaved buffer with `channels` channels per frame.
    pub fn process_interleaved(&mut self, output: &mut [f32], channels: usize) {
        output.fill(0.0);
        if channels == 0 {
            return;
        }
        let frames = output.len() / channels;
        self.render(frames, |i, sample| {
            for out in &mut output[i * channels..(i + 1) * channels] {
                *out += sample;
            }
        });
    }

    fn render(&mut self, frames: usize, mut write: impl FnMut(usize, f32)) {
        let level = self.spectrum.global_level;
        for voice in 0..self.max_voices {
            let voice_frequency = self.voices.frequencies[voice];
            for partial in 0..self.max_partials {
                let oscillator = &mut self.oscillators[voice * self.max_partials + partial];
                let (ratio, amplitude) = if partial < self.spectrum.len {
                    (
                        self.spectrum.ratios[partial],
                        self.spectrum.amplitudes[partial],
                    )
                } else {
                    (0.0, 0.0)
                };
                oscillator.set_frequency(voice_frequency * ratio, self.sample_rate);
                if !oscillator.is_running() {
                    continue;
                }
                let gain = level * amplitude;
                for i in 0..frames {
                    write(i, oscillator.next_sample() * gain);
                }
            }
        }
    }
}
