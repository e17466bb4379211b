use super::scale::Scale;
use crate::error::{CoreError, CoreResult};
use tracing::debug;

/// One touch/pointer slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub slot: usize,
    pub active: bool,
    pub position: Option<f32>,   // Normalized position on the surface, if touched
    pub frequency_ratio: f32,    // Ratio to root, 0 when inactive
    pub absolute_frequency: f32, // ratio * root, 0 when inactive or muted
}

impl Voice {
    fn new(slot: usize) -> Self {
        Self {
            slot,
            active: false,
            position: None,
            frequency_ratio: 0.0,
            absolute_frequency: 0.0,
        }
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.position = None;
        self.frequency_ratio = 0.0;
        self.absolute_frequency = 0.0;
    }
}

/// Converts surface positions into frequency ratios and absolute frequencies.
///
/// The voice array is sized once at construction and never resized.
#[derive(Debug, Clone)]
pub struct VoiceMapper {
    voices: Vec<Voice>,
    scale: Scale,
    root: f32,
}

impl VoiceMapper {
    pub fn new(max_voices: usize, scale: Scale, root: f32) -> Self {
        Self {
            voices: (0..max_voices).map(Voice::new).collect(),
            scale,
            root,
        }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn max_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn root(&self) -> f32 {
        self.root
    }

    /// A root that is non-positive or non-finite means "no sound".
    pub fn root_is_audible(&self) -> bool {
        self.root.is_finite() && self.root > 0.0
    }

    /// Places (or lifts, with `None`) the voice in `slot`. Negative or NaN
    /// positions count as lifted.
    pub fn set_voice_position(&mut self, slot: usize, position: Option<f32>) -> CoreResult<()> {
        let max = self.voices.len();
        if slot >= max {
            return Err(CoreError::VoiceSlotOutOfRange { slot, max });
        }
        let position = position.filter(|p| p.is_finite() && *p >= 0.0);
        let (scale, root) = (self.scale, self.root);
        let voice = &mut self.voices[slot];
        match position {
            Some(p) => {
                voice.position = Some(p);
                Self::quantize_voice(voice, scale, root);
            }
            None => voice.deactivate(),
        }
        Ok(())
    }

    pub fn release_voice(&mut self, slot: usize) -> CoreResult<()> {
        self.set_voice_position(slot, None)
    }

    pub fn release_all(&mut self) {
        self.voices.iter_mut().for_each(Voice::deactivate);
    }

    /// Changes the root and rescales every active voice.
    pub fn set_root(&mut self, root: f32) {
        self.root = root;
        if !self.root_is_audible() {
            debug!(root, "non-positive root, voices muted");
        }
        self.requantize();
    }

    /// Changes the scale; touched voices keep their position and re-snap to
    /// the new grid.
    pub fn set_scale(&mut self, scale: Scale) {
        self.scale = scale;
        self.requantize();
    }

    /// Absolute frequencies of the sounding voices, inactive ones skipped.
    pub fn active_frequencies(&self) -> impl Iterator<Item = f32> + '_ {
        self.voices
            .iter()
            .filter(|v| v.active && v.absolute_frequency > 0.0)
            .map(|v| v.absolute_frequency)
    }

    /// Frequency ratios of the touched voices.
    pub fn active_ratios(&self) -> Vec<f32> {
        self.voices
            .iter()
            .filter(|v| v.active)
            .map(|v| v.frequency_ratio)
            .collect()
    }

    fn requantize(&mut self) {
        let (scale, root) = (self.scale, self.root);
        for voice in self.voices.iter_mut().filter(|v| v.position.is_some()) {
            Self::quantize_voice(voice, scale, root);
        }
    }

    fn quantize_voice(voice: &mut Voice, scale: Scale, root: f32) {
        let Some(position) = voice.position else {
            return;
        };
        let step = scale.quantize(position);
        voice.active = true;
        voice.frequency_ratio = scale.step_ratio(step);
        voice.absolute_frequency = if root.is_finite() && root > 0.0 {
            voice.frequency_ratio * root
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> VoiceMapper {
        VoiceMapper::new(4, Scale::new(12, 2).unwrap(), 110.0)
    }

    #[test]
    fn quantizes_position_to_scale_step() {
        let mut m = mapper();
        // 24 notes: 0.5 -> step 12 -> one octave up.
        m.set_voice_position(0, Some(0.5)).unwrap();
        let v = &m.voices()[0];
        assert!(v.active);
        assert!((v.frequency_ratio - 2.0).abs() < 1e-6);
        assert!((v.absolute_frequency - 220.0).abs() < 1e-3);
    }

    #[test]
    fn inactive_voices_are_excluded() {
        let mut m = mapper();
        m.set_voice_position(1, Some(0.0)).unwrap();
        m.set_voice_position(2, Some(-1.0)).unwrap();
        let freqs: Vec<f32> = m.active_frequencies().collect();
        assert_eq!(freqs, vec![110.0]);
        assert_eq!(m.voices()[2].absolute_frequency, 0.0);
        assert!(!m.voices()[2].active);
    }

    #[test]
    fn release_clears_voice() {
        let mut m = mapper();
        m.set_voice_position(0, Some(0.25)).unwrap();
        m.release_voice(0).unwrap();
        assert!(!m.voices()[0].active);
        assert_eq!(m.active_frequencies().count(), 0);
    }

    #[test]
    fn rejects_out_of_range_slot() {
        let mut m = mapper();
        assert_eq!(
            m.set_voice_position(4, Some(0.1)),
            Err(CoreError::VoiceSlotOutOfRange { slot: 4, max: 4 })
        );
    }

    #[test]
    fn set_root_rescales_active_voices() {
        let mut m = mapper();
        m.set_voice_position(0, Some(0.5)).unwrap();
        m.set_root(220.0);
        assert!((m.voices()[0].absolute_frequency - 440.0).abs() < 1e-3);
    }

    #[test]
    fn non_positive_root_mutes() {
        let mut m = mapper();
        m.set_voice_position(0, Some(0.5)).unwrap();
        m.set_root(-440.0);
        assert_eq!(m.voices()[0].absolute_frequency, 0.0);
        assert_eq!(m.active_frequencies().count(), 0);
        m.set_root(110.0);
        assert!((m.voices()[0].absolute_frequency - 220.0).abs() < 1e-3);
    }

    #[test]
    fn scale_change_resnaps_voices() {
        let mut m = mapper();
        m.set_voice_position(0, Some(0.5)).unwrap();
        m.set_scale(Scale::new(12, 1).unwrap());
        // 12 notes over one octave: 0.5 -> step 6 -> tritone.
        assert!((m.voices()[0].frequency_ratio - 2.0f32.sqrt()).abs() < 1e-5);
    }
}
