use super::frame::{MAX_PARTIAL_SLOTS, MAX_VOICE_SLOTS};
use super::scale::{Scale, Tuning};
use super::spectrum::{SpectrumPreset, DEFAULT_PARTIALS};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Size and level settings for the oscillator pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub max_voices: usize,
    pub max_partials: usize,
    pub sample_rate: f32,
    pub target_headroom: f32, // Peak of all voices × all partials in phase
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            max_voices: 10,
            max_partials: DEFAULT_PARTIALS,
            sample_rate: 44100.0, // Standard audio sample rate
            target_headroom: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    pub notes_per_octave: u32,
    pub octaves: u32,
    pub tuning_hz: f32,
    pub lowest_octave: i32,
}

impl ScaleConfig {
    pub fn scale(&self) -> CoreResult<Scale> {
        Scale::new(self.notes_per_octave, self.octaves)
    }

    pub fn tuning(&self) -> Tuning {
        Tuning {
            tuning_hz: self.tuning_hz,
            lowest_octave: self.lowest_octave,
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        let scale = Scale::default();
        let tuning = Tuning::default();
        Self {
            notes_per_octave: scale.notes_per_octave,
            octaves: scale.octaves,
            tuning_hz: tuning.tuning_hz,
            lowest_octave: tuning.lowest_octave,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    pub preset: SpectrumPreset,
    pub partials: usize,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            preset: SpectrumPreset::default(),
            partials: DEFAULT_PARTIALS,
        }
    }
}

/// Cadences of the dissonance ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerConfig {
    pub score_interval_ms: u64,
    pub field_interval_ms: u64,
    pub curve_points: usize,
}

impl TickerConfig {
    pub fn score_interval(&self) -> Duration {
        Duration::from_millis(self.score_interval_ms.max(1))
    }

    pub fn field_interval(&self) -> Duration {
        Duration::from_millis(self.field_interval_ms.max(1))
    }
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            score_interval_ms: 50,
            field_interval_ms: 500,
            curve_points: 100,
        }
    }
}

/// Whole-application configuration, read from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub synth: SynthConfig,
    pub scale: ScaleConfig,
    pub spectrum: SpectrumConfig,
    pub ticker: TickerConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> CoreResult<Self> {
        let config: Config =
            serde_json::from_str(text).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        let synth = &self.synth;
        if synth.max_voices == 0 || synth.max_voices > MAX_VOICE_SLOTS {
            return Err(CoreError::Config(format!(
                "max_voices must be in 1..={MAX_VOICE_SLOTS}, got {}",
                synth.max_voices
            )));
        }
        if synth.max_partials == 0 || synth.max_partials > MAX_PARTIAL_SLOTS {
            return Err(CoreError::Config(format!(
                "max_partials must be in 1..={MAX_PARTIAL_SLOTS}, got {}",
                synth.max_partials
            )));
        }
        if !(synth.sample_rate > 0.0) || !(synth.target_headroom > 0.0) {
            return Err(CoreError::Config(
                "sample_rate and target_headroom must be positive".to_string(),
            ));
        }
        if self.spectrum.partials == 0 || self.spectrum.partials > synth.max_partials {
            return Err(CoreError::Config(format!(
                "spectrum.partials must be in 1..={}, got {}",
                synth.max_partials, self.spectrum.partials
            )));
        }
        if self.ticker.curve_points == 0 {
            return Err(CoreError::Config("ticker.curve_points must be positive".to_string()));
        }
        self.scale
            .scale()
            .map_err(|e| CoreError::Config(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_instrument() {
        let config = Config::default();
        assert_eq!(config.synth.max_voices, 10);
        assert_eq!(config.synth.max_partials, 20);
        assert_eq!(config.scale.tuning().root(), 110.0);
        assert_eq!(config.spectrum.preset, SpectrumPreset::Sawtooth);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = Config::from_json(
            r#"{ "scale": { "notes_per_octave": 19 }, "spectrum": { "preset": "equal-temperament" } }"#,
        )
        .unwrap();
        assert_eq!(config.scale.notes_per_octave, 19);
        assert_eq!(config.scale.octaves, 2);
        assert_eq!(config.spectrum.preset, SpectrumPreset::EqualTemperament);
        assert_eq!(config.ticker, TickerConfig::default());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Config::from_json(r#"{ "synth": { "max_voices": 0 } }"#).is_err());
        assert!(Config::from_json(r#"{ "synth": { "max_voices": 64 } }"#).is_err());
        assert!(Config::from_json(r#"{ "scale": { "octaves": 0 } }"#).is_err());
        assert!(Config::from_json(r#"{ "spectrum": { "partials": 21 } }"#).is_err());
        assert!(Config::from_json("not json").is_err());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::load("/nonexistent/rustdissonance.json").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
