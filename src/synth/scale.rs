use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Upper bound on the playable steps of a scale.
pub const MAX_SCALE_STEPS: u32 = 4096;

/// Equal division of the octave repeated over a number of octaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    pub notes_per_octave: u32,
    pub octaves: u32,
}

impl Scale {
    pub fn new(notes_per_octave: u32, octaves: u32) -> CoreResult<Self> {
        let steps = notes_per_octave.checked_mul(octaves).unwrap_or(0);
        if steps == 0 || steps > MAX_SCALE_STEPS {
            return Err(CoreError::InvalidScale {
                notes_per_octave,
                octaves,
            });
        }
        Ok(Self {
            notes_per_octave,
            octaves,
        })
    }

    /// Total number of scale steps across the playable range.
    pub fn number_of_notes(&self) -> u32 {
        self.notes_per_octave.saturating_mul(self.octaves)
    }

    /// `2^(step / notes_per_octave)`
    pub fn step_ratio(&self, step: u32) -> f32 {
        2.0f32.powf(step as f32 / self.notes_per_octave as f32)
    }

    /// Quantizes a normalized position in `[0, 1)` to a scale step.
    /// Positions at or past 1 land on the top step.
    pub fn quantize(&self, position: f32) -> u32 {
        let notes = self.number_of_notes();
        let step = (position.max(0.0) * notes as f32).floor() as u32;
        step.min(notes - 1)
    }

    /// One candidate ratio per scale step, lowest first.
    pub fn candidate_ratios(&self) -> Vec<f32> {
        (0..self.number_of_notes())
            .map(|step| self.step_ratio(step))
            .collect()
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            notes_per_octave: 12,
            octaves: 2,
        }
    }
}

/// Reference pitch plus the octave offset of the lowest playable note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub tuning_hz: f32,
    pub lowest_octave: i32,
}

impl Tuning {
    /// `tuning_hz * 2^lowest_octave`
    pub fn root(&self) -> f32 {
        self.tuning_hz * 2.0f32.powi(self.lowest_octave)
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tuning_hz: 440.0,
            lowest_octave: -2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_scale() {
        assert!(Scale::new(0, 2).is_err());
        assert!(Scale::new(12, 0).is_err());
        assert!(Scale::new(12, 2).is_ok());
    }

    #[test]
    fn rejects_oversized_scale() {
        let err = Scale::new(12, u32::MAX).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidScale {
                notes_per_octave: 12,
                octaves: u32::MAX
            }
        );
        assert!(Scale::new(u32::MAX, 2).is_err());
        assert!(Scale::new(1, 100_000_000).is_err());
        assert!(Scale::new(4096, 1).is_ok());
        assert!(Scale::new(4097, 1).is_err());
    }

    #[test]
    fn quantize_floors_and_clamps() {
        let scale = Scale::new(12, 2).unwrap();
        assert_eq!(scale.quantize(0.0), 0);
        assert_eq!(scale.quantize(0.5), 12);
        assert_eq!(scale.quantize(0.999), 23);
        assert_eq!(scale.quantize(1.0), 23);
        assert_eq!(scale.quantize(7.5), 23);
    }

    #[test]
    fn candidate_ratios_cover_the_range() {
        let scale = Scale::new(12, 2).unwrap();
        let ratios = scale.candidate_ratios();
        assert_eq!(ratios.len(), 24);
        assert_eq!(ratios[0], 1.0);
        assert!((ratios[12] - 2.0).abs() < 1e-6);
        assert!((ratios[7] - 1.498307).abs() < 1e-5);
    }

    #[test]
    fn default_tuning_root() {
        assert_eq!(Tuning::default().root(), 110.0);
        let tuning = Tuning {
            tuning_hz: 432.0,
            lowest_octave: 0,
        };
        assert_eq!(tuning.root(), 432.0);
    }
}
