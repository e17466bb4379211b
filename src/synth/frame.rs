//! Snapshots shared between the UI, the audio callback and the dissonance
//! ticker.
//!
//! Every cross-thread value travels as a whole snapshot through a one-slot
//! mailbox: the writer replaces the pending snapshot, the reader takes the
//! newest one. Audio-bound snapshots are fixed-size `Copy` arrays, so the
//! audio thread never allocates, frees or sees a half-written array.

use super::spectrum::Spectrum;
use crate::error::{CoreError, CoreResult};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Capacity of the oscillator pool, fixed at compile time.
pub const MAX_VOICE_SLOTS: usize = 16;
pub const MAX_PARTIAL_SLOTS: usize = 32;

/// Absolute frequency per voice slot; 0 means silent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceFrame {
    pub frequencies: [f32; MAX_VOICE_SLOTS],
}

impl VoiceFrame {
    pub fn silent() -> Self {
        Self {
            frequencies: [0.0; MAX_VOICE_SLOTS],
        }
    }

    /// Copies up to `MAX_VOICE_SLOTS` frequencies; non-finite or negative
    /// entries are stored as 0.
    pub fn from_frequencies(frequencies: impl IntoIterator<Item = f32>) -> Self {
        let mut frame = Self::silent();
        for (slot, f) in frame.frequencies.iter_mut().zip(frequencies) {
            *slot = if f.is_finite() && f > 0.0 { f } else { 0.0 };
        }
        frame
    }
}

impl Default for VoiceFrame {
    fn default() -> Self {
        Self::silent()
    }
}

/// Spectrum plus the global level derived from it.
///
/// Slots at or past `len` hold ratio 0 and amplitude 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumFrame {
    pub ratios: [f32; MAX_PARTIAL_SLOTS],
    pub amplitudes: [f32; MAX_PARTIAL_SLOTS],
    pub len: usize,
    pub global_level: f32,
}

impl SpectrumFrame {
    pub fn silent() -> Self {
        Self {
            ratios: [0.0; MAX_PARTIAL_SLOTS],
            amplitudes: [0.0; MAX_PARTIAL_SLOTS],
            len: 0,
            global_level: 0.0,
        }
    }

    /// `global_level = target_headroom / (num_voices * sum(amplitudes))`, so
    /// every voice playing every partial in phase peaks at `target_headroom`.
    pub fn new(
        spectrum: &Spectrum,
        max_partials: usize,
        num_voices: usize,
        target_headroom: f32,
    ) -> CoreResult<Self> {
        let max = max_partials.min(MAX_PARTIAL_SLOTS);
        if spectrum.len() > max {
            return Err(CoreError::TooManyPartials {
                len: spectrum.len(),
                max,
            });
        }
        let mut frame = Self::silent();
        for (i, partial) in spectrum.partials().iter().enumerate() {
            frame.ratios[i] = partial.ratio;
            frame.amplitudes[i] = partial.amplitude;
        }
        frame.len = spectrum.len();
        frame.global_level = global_level(spectrum.amplitude_sum(), num_voices, target_headroom);
        Ok(frame)
    }
}

impl Default for SpectrumFrame {
    fn default() -> Self {
        Self::silent()
    }
}

pub fn global_level(amplitude_sum: f32, num_voices: usize, target_headroom: f32) -> f32 {
    let denominator = num_voices as f32 * amplitude_sum;
    if denominator > 0.0 && denominator.is_finite() {
        target_headroom / denominator
    } else {
        0.0
    }
}

/// Writing end of a one-slot mailbox.
pub struct FrameSender<T> {
    tx: Sender<T>,
    // Lets the writer evict a stale, unread snapshot.
    evict: Receiver<T>,
}

/// Reading end of a one-slot mailbox. Holds the last snapshot it received.
pub struct FrameReceiver<T> {
    rx: Receiver<T>,
    latest: T,
}

pub fn frame_channel<T>(initial: T) -> (FrameSender<T>, FrameReceiver<T>) {
    let (tx, rx) = bounded(1);
    (
        FrameSender {
            tx,
            evict: rx.clone(),
        },
        FrameReceiver { rx, latest: initial },
    )
}

impl<T> FrameSender<T> {
    /// Replaces whatever snapshot is still pending. Never blocks.
    pub fn publish(&self, frame: T) {
        let mut frame = frame;
        // Single writer: once the slot is emptied the retry succeeds.
        while let Err(TrySendError::Full(rejected)) = self.tx.try_send(frame) {
            let _ = self.evict.try_recv();
            frame = rejected;
        }
    }
}

impl<T> FrameReceiver<T> {
    /// Takes the pending snapshot, if any. Returns true when it changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(frame) = self.rx.try_recv() {
            self.latest = frame;
            changed = true;
        }
        changed
    }

    pub fn latest(&self) -> &T {
        &self.latest
    }
}
