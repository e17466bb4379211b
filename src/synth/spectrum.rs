use crate::error::{CoreError, CoreResult};
use crate::synth::prelude::random_range;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One sinusoidal component of the shared timbre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    pub ratio: f32,     // Ratio to the voice frequency
    pub amplitude: f32, // Relative amplitude
}

/// Ordered list of partials shared by every voice.
///
/// Ratios and amplitudes are always co-indexed and non-empty; the only way to
/// build one is through [`Spectrum::new`] or a preset.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    partials: Vec<Partial>,
}

impl Spectrum {
    /// Builds a spectrum from parallel ratio/amplitude arrays.
    pub fn new(ratios: &[f32], amplitudes: &[f32]) -> CoreResult<Self> {
        if ratios.len() != amplitudes.len() || ratios.is_empty() {
            return Err(CoreError::InvalidSpectrum {
                ratios: ratios.len(),
                amplitudes: amplitudes.len(),
            });
        }
        let partials = ratios
            .iter()
            .zip(amplitudes)
            .enumerate()
            .map(|(index, (&ratio, &amplitude))| {
                if !(ratio.is_finite() && ratio > 0.0) || !(amplitude.is_finite() && amplitude >= 0.0)
                {
                    Err(CoreError::InvalidPartial { index })
                } else {
                    Ok(Partial { ratio, amplitude })
                }
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(Self { partials })
    }

    pub fn partials(&self) -> &[Partial] {
        &self.partials
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }

    pub fn ratios(&self) -> Vec<f32> {
        self.partials.iter().map(|p| p.ratio).collect()
    }

    pub fn amplitudes(&self) -> Vec<f32> {
        self.partials.iter().map(|p| p.amplitude).collect()
    }

    pub fn amplitude_sum(&self) -> f32 {
        self.partials.iter().map(|p| p.amplitude).sum()
    }

    pub fn sawtooth(num_partials: usize) -> Self {
        Self::generate(num_partials, |i| (i + 1.0, 1.0 / (i + 1.0)))
    }

    pub fn square(num_partials: usize) -> Self {
        Self::generate(num_partials, |i| (2.0 * i + 1.0, 1.0 / (i + 1.0)))
    }

    pub fn triangle(num_partials: usize) -> Self {
        Self::generate(num_partials, |i| (2.0 * i + 1.0, 1.0 / (i + 1.0).powi(2)))
    }

    /// Harmonic series with every partial snapped to the nearest step of the
    /// equal division `2^(1/notes_per_octave)` (Sethares, "Tuning, Timbre,
    /// Spectrum, Scale", p. 247).
    pub fn equal_temperament(num_partials: usize, notes_per_octave: u32) -> Self {
        let s = 2.0f32.powf(1.0 / notes_per_octave.max(1) as f32);
        Self::generate(num_partials, |i| {
            let exponent = ((i + 1.0).ln() / s.ln()).round();
            (s.powf(exponent), 1.0 / (i + 1.0))
        })
    }

    /// Uniform ratios in `[0, num_partials)` and amplitudes in `[0, 1)`.
    /// Not reproducible.
    pub fn random(num_partials: usize) -> Self {
        let upper = num_partials.max(1) as f32;
        Self::generate(num_partials, |_| {
            // A zero ratio would be a DC partial; keep it strictly positive.
            let ratio = random_range(0.0, upper).max(f32::MIN_POSITIVE);
            (ratio, random_range(0.0, 1.0))
        })
    }

    fn generate(num_partials: usize, partial: impl Fn(f32) -> (f32, f32)) -> Self {
        let partials = (0..num_partials.max(1))
            .map(|i| {
                let (ratio, amplitude) = partial(i as f32);
                Partial { ratio, amplitude }
            })
            .collect();
        Self { partials }
    }
}

impl Default for Spectrum {
    fn default() -> Self {
        Self::sawtooth(DEFAULT_PARTIALS)
    }
}

pub const DEFAULT_PARTIALS: usize = 20;

/// The built-in spectrum generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpectrumPreset {
    Sawtooth,
    Square,
    Triangle,
    Random,
    EqualTemperament,
}

impl SpectrumPreset {
    pub fn generate(self, num_partials: usize, notes_per_octave: u32) -> Spectrum {
        match self {
            SpectrumPreset::Sawtooth => Spectrum::sawtooth(num_partials),
            SpectrumPreset::Square => Spectrum::square(num_partials),
            SpectrumPreset::Triangle => Spectrum::triangle(num_partials),
            SpectrumPreset::Random => Spectrum::random(num_partials),
            SpectrumPreset::EqualTemperament => {
                Spectrum::equal_temperament(num_partials, notes_per_octave)
            }
        }
    }

    /// Whether the generated spectrum depends on the scale division.
    pub fn follows_scale(self) -> bool {
        matches!(self, SpectrumPreset::EqualTemperament)
    }
}

impl Default for SpectrumPreset {
    fn default() -> Self {
        Self::Sawtooth
    }
}

impl fmt::Display for SpectrumPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpectrumPreset::Sawtooth => "sawtooth",
            SpectrumPreset::Square => "square",
            SpectrumPreset::Triangle => "triangle",
            SpectrumPreset::Random => "random",
            SpectrumPreset::EqualTemperament => "equal-temperament",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for SpectrumPreset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sawtooth" | "saw" => Ok(SpectrumPreset::Sawtooth),
            "square" => Ok(SpectrumPreset::Square),
            "triangle" => Ok(SpectrumPreset::Triangle),
            "random" => Ok(SpectrumPreset::Random),
            "equal-temperament" | "et" | "optimized" => Ok(SpectrumPreset::EqualTemperament),
            other => Err(CoreError::Config(format!("unknown spectrum preset '{other}'"))),
        }
    }
}
