use crate::dissonance::AnalysisInput;
use crate::error::CoreError;
use crate::synth::config::Config;
use crate::synth::frame::{SpectrumFrame, VoiceFrame};
use crate::synth::{Scale, Spectrum, SpectrumPreset, Synth, VoiceMapper};
use js_sys::Float32Array;
use wasm_bindgen::prelude::*;

fn js_err(e: CoreError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM runtime (no threads, no channels, direct API). Dissonance is
/// evaluated on demand by the host's own timers.
#[wasm_bindgen]
pub struct WasmSynth {
    config: Config,
    synth: Synth,
    mapper: VoiceMapper,
    spectrum: Spectrum,
    preset: Option<SpectrumPreset>,
    left: Vec<f32>,
    right: Vec<f32>,
}

#[wasm_bindgen]
impl WasmSynth {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmSynth {
        let config = Config::default();
        let scale = config.scale.scale().unwrap_or_default();
        let preset = config.spectrum.preset;
        let spectrum = preset.generate(config.spectrum.partials, scale.notes_per_octave);
        let mut synth = WasmSynth {
            synth: Synth::new(&config.synth),
            mapper: VoiceMapper::new(config.synth.max_voices, scale, config.scale.tuning().root()),
            spectrum: Spectrum::default(),
            preset: None,
            left: Vec::new(),
            right: Vec::new(),
            config,
        };
        // Built-in presets always fit the default pool.
        let _ = synth.install_spectrum(spectrum, Some(preset));
        synth
    }

    /// Render one mono block into a JS-friendly Float32Array
    #[wasm_bindgen]
    pub fn render(&mut self, length: usize, sample_rate: f32) -> Float32Array {
        if self.left.len() != length {
            self.left = vec![0.0; length];
            self.right = vec![0.0; length];
        }
        if self.synth.sample_rate() != sample_rate {
            self.synth.set_sample_rate(sample_rate);
        }
        self.synth.process(&mut self.left, &mut self.right);
        Float32Array::from(self.left.as_slice())
    }

    /// Negative positions lift the voice.
    #[wasm_bindgen]
    pub fn set_voice_position(&mut self, slot: usize, position: f32) -> Result<(), JsValue> {
        let position = (position >= 0.0).then_some(position);
        self.mapper.set_voice_position(slot, position).map_err(js_err)?;
        self.publish_voices();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn release_voice(&mut self, slot: usize) -> Result<(), JsValue> {
        self.set_voice_position(slot, -1.0)
    }

    #[wasm_bindgen]
    pub fn release_all(&mut self) {
        self.mapper.release_all();
        self.publish_voices();
    }

    #[wasm_bindgen]
    pub fn set_root(&mut self, root: f32) {
        self.mapper.set_root(root);
        self.publish_voices();
    }

    #[wasm_bindgen]
    pub fn set_tuning(&mut self, tuning_hz: f32, lowest_octave: i32) {
        self.config.scale.tuning_hz = tuning_hz;
        self.config.scale.lowest_octave = lowest_octave;
        self.set_root(self.config.scale.tuning().root());
    }

    #[wasm_bindgen]
    pub fn set_spectrum(&mut self, ratios: Vec<f32>, amplitudes: Vec<f32>) -> Result<(), JsValue> {
        let spectrum = Spectrum::new(&ratios, &amplitudes).map_err(js_err)?;
        self.install_spectrum(spectrum, None).map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn select_preset(&mut self, name: &str) -> Result<(), JsValue> {
        let preset: SpectrumPreset = name.parse().map_err(js_err)?;
        let spectrum = preset.generate(
            self.config.spectrum.partials,
            self.mapper.scale().notes_per_octave,
        );
        self.install_spectrum(spectrum, Some(preset)).map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn set_scale(&mut self, notes_per_octave: u32, octaves: u32) -> Result<(), JsValue> {
        let scale = Scale::new(notes_per_octave, octaves).map_err(js_err)?;
        self.mapper.set_scale(scale);
        self.publish_voices();
        match self.preset.filter(|p| p.follows_scale()) {
            Some(preset) => self.select_preset(&preset.to_string()),
            None => Ok(()),
        }
    }

    #[wasm_bindgen]
    pub fn dissonance_score(&self) -> f32 {
        self.analysis().score()
    }

    #[wasm_bindgen]
    pub fn dissonance_field(&self) -> Float32Array {
        Float32Array::from(self.analysis().field().as_slice())
    }

    #[wasm_bindgen]
    pub fn dissonance_curve(&self) -> Float32Array {
        let curve = self.analysis().curve(self.config.ticker.curve_points);
        Float32Array::from(curve.as_slice())
    }
}

impl WasmSynth {
    fn analysis(&self) -> AnalysisInput {
        AnalysisInput {
            spectrum: self.spectrum.clone(),
            active_ratios: self.mapper.active_ratios(),
            scale: self.mapper.scale(),
            root: self.mapper.root(),
        }
    }

    fn install_spectrum(
        &mut self,
        spectrum: Spectrum,
        preset: Option<SpectrumPreset>,
    ) -> Result<(), CoreError> {
        let synth = &self.config.synth;
        let frame = SpectrumFrame::new(
            &spectrum,
            synth.max_partials,
            synth.max_voices,
            synth.target_headroom,
        )?;
        self.synth.set_spectrum_frame(frame);
        self.spectrum = spectrum;
        self.preset = preset;
        Ok(())
    }

    fn publish_voices(&mut self) {
        let frame =
            VoiceFrame::from_frequencies(self.mapper.voices().iter().map(|v| v.absolute_frequency));
        self.synth.set_voice_frame(frame);
    }
}

impl Default for WasmSynth {
    fn default() -> Self {
        Self::new()
    }
}
