//! Sethares' parametrisation of the Plomp-Levelt roughness curve.
//!
//! Each pair of partials contributes
//! `min(l_i, l_j) * (exp(-b1 * s * |f_i - f_j|) - exp(-b2 * s * |f_i - f_j|))`
//! with `s = x* / (s1 * min(f_i, f_j) + s2)`; loudness comes from the
//! amplitude via sound pressure level (Sethares, p. 346).

use crate::synth::prelude::SQRT_2;
use crate::synth::spectrum::Spectrum;

pub const X_STAR: f32 = 0.24;
pub const S1: f32 = 0.0207;
pub const S2: f32 = 18.96;
pub const B1: f32 = 3.51;
pub const B2: f32 = 5.75;

/// Reference pressure for the SPL conversion.
const P_REF: f32 = 0.00002;

/// `0.0625 * 2^SPL` with `SPL = 2 * log10((amplitude / √2) / 2e-5)`.
/// Non-positive amplitudes are inaudible and map to 0.
pub fn loudness(amplitude: f32) -> f32 {
    if !(amplitude > 0.0) || !amplitude.is_finite() {
        return 0.0;
    }
    let spl = 2.0 * ((amplitude / SQRT_2) / P_REF).log10();
    0.0625 * 2.0f32.powf(spl)
}

/// Roughness of one pair of partials given their loudness.
#[inline]
pub fn pair_roughness(f_i: f32, l_i: f32, f_j: f32, l_j: f32) -> f32 {
    let l = l_i.min(l_j);
    let s = X_STAR / (S1 * f_i.min(f_j) + S2);
    let f_dif = (f_i - f_j).abs();
    l * ((-B1 * s * f_dif).exp() - (-B2 * s * f_dif).exp())
}

fn is_signal(frequency: f32) -> bool {
    frequency.is_finite() && frequency >= 0.0
}

/// Sensory dissonance of a set of partials, summed once per unordered pair.
///
/// Entries with a negative or non-finite frequency are ignored, as are
/// non-positive amplitudes. Extra entries in the longer array are ignored.
pub fn score(frequencies: &[f32], amplitudes: &[f32]) -> f32 {
    debug_assert_eq!(frequencies.len(), amplitudes.len());
    let set = FrequencySet::from_pairs(frequencies.iter().copied().zip(amplitudes.iter().copied()));
    set.score()
}

/// A frequency set with loudness precomputed, ready for repeated scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencySet {
    frequencies: Vec<f32>,
    loudness: Vec<f32>,
}

impl FrequencySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frequencies: Vec::with_capacity(capacity),
            loudness: Vec::with_capacity(capacity),
        }
    }

    /// Builds the set from (frequency, amplitude) pairs, dropping silent or
    /// invalid entries.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f32, f32)>) -> Self {
        let mut set = Self::new();
        for (frequency, amplitude) in pairs {
            set.push(frequency, loudness(amplitude));
        }
        set
    }

    /// Cross product of voice frequencies and the spectrum.
    pub fn from_voices(voice_frequencies: impl IntoIterator<Item = f32>, spectrum: &Spectrum) -> Self {
        let mut set = Self::with_capacity(spectrum.len());
        let table = LoudnessTable::new(spectrum);
        for f in voice_frequencies {
            set.extend_voice(f, &table);
        }
        set
    }

    /// Adds one partial; ignored when it cannot sound.
    pub fn push(&mut self, frequency: f32, loudness: f32) {
        if is_signal(frequency) && loudness > 0.0 {
            self.frequencies.push(frequency);
            self.loudness.push(loudness);
        }
    }

    /// Adds every partial of one voice. Silent voices add nothing.
    pub fn extend_voice(&mut self, voice_frequency: f32, table: &LoudnessTable) {
        if !(voice_frequency.is_finite() && voice_frequency > 0.0) {
            return;
        }
        for (&ratio, &l) in table.ratios.iter().zip(&table.loudness) {
            self.push(voice_frequency * ratio, l);
        }
    }

    pub fn clear(&mut self) {
        self.frequencies.clear();
        self.loudness.clear();
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Pairwise roughness within the set.
    pub fn score(&self) -> f32 {
        let n = self.frequencies.len();
        let mut d = 0.0;
        for i in 0..n {
            let (f_i, l_i) = (self.frequencies[i], self.loudness[i]);
            for j in (i + 1)..n {
                d += pair_roughness(f_i, l_i, self.frequencies[j], self.loudness[j]);
            }
        }
        d
    }

    /// Roughness of every pair with one partial in `self` and one in `other`.
    pub fn cross_score(&self, other: &FrequencySet) -> f32 {
        let mut d = 0.0;
        for (&f_i, &l_i) in self.frequencies.iter().zip(&self.loudness) {
            for (&f_j, &l_j) in other.frequencies.iter().zip(&other.loudness) {
                d += pair_roughness(f_i, l_i, f_j, l_j);
            }
        }
        d
    }
}

/// Spectrum ratios with their loudness, computed once per spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct LoudnessTable {
    ratios: Vec<f32>,
    loudness: Vec<f32>,
}

impl LoudnessTable {
    pub fn new(spectrum: &Spectrum) -> Self {
        Self {
            ratios: spectrum.ratios(),
            loudness: spectrum.amplitudes().into_iter().map(loudness).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }
}
