#[cfg(feature = "native")]
use crate::audio::{AudioBackend, CpalBackend};
use crate::dissonance::{AnalysisInput, DissonanceMonitor, DissonanceTicker, FieldReport};
use crate::error::{CoreError, CoreResult};
use crate::synth::config::{Config, SynthConfig};
use crate::synth::frame::{frame_channel, FrameReceiver, FrameSender, SpectrumFrame, VoiceFrame};
use crate::synth::mapper::VoiceMapper;
use crate::synth::scale::{Scale, Tuning};
use crate::synth::spectrum::{Spectrum, SpectrumPreset};
use crate::synth::Synth;
use tracing::{debug, info, warn};

/// Audio-thread side of the instrument: the oscillator bank plus the
/// mailboxes it reads snapshots from.
pub struct NativeSynth {
    synth: Synth,
    voice_receiver: FrameReceiver<VoiceFrame>,
    spectrum_receiver: FrameReceiver<SpectrumFrame>,
}

impl NativeSynth {
    fn new(
        config: &SynthConfig,
        voice_receiver: FrameReceiver<VoiceFrame>,
        spectrum_receiver: FrameReceiver<SpectrumFrame>,
    ) -> Self {
        Self {
            synth: Synth::new(config),
            voice_receiver,
            spectrum_receiver,
        }
    }

    /// Renders one stereo block from the newest published snapshots.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.process_frames();
        self.synth.process(left, right);
    }

    pub fn process_interleaved(&mut self, output: &mut [f32], channels: usize) {
        self.process_frames();
        self.synth.process_interleaved(output, channels);
    }

    fn process_frames(&mut self) {
        if self.spectrum_receiver.poll() {
            self.synth
                .set_spectrum_frame(*self.spectrum_receiver.latest());
        }
        if self.voice_receiver.poll() {
            self.synth.set_voice_frame(*self.voice_receiver.latest());
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.synth.set_sample_rate(sample_rate);
    }

    pub fn synth(&self) -> &Synth {
        &self.synth
    }
}

/// UI/input side of the instrument.
///
/// Every setter validates, updates the local model and publishes fresh
/// snapshots to the audio thread and the dissonance ticker. A rejected call
/// changes nothing.
pub struct Controller {
    config: SynthConfig,
    mapper: VoiceMapper,
    tuning: Tuning,
    spectrum: Spectrum,
    preset: Option<SpectrumPreset>, // None for a user-supplied spectrum
    num_partials: usize,
    voice_sender: FrameSender<VoiceFrame>,
    spectrum_sender: FrameSender<SpectrumFrame>,
    analysis_sender: FrameSender<AnalysisInput>,
    monitor: DissonanceMonitor,
    _ticker: DissonanceTicker,
}

impl Controller {
    /// Builds the controller, its audio-side counterpart and the running
    /// dissonance ticker.
    pub fn new(config: &Config) -> CoreResult<(Self, NativeSynth)> {
        config.validate()?;
        let scale = config.scale.scale()?;
        let tuning = config.scale.tuning();
        let num_partials = config.spectrum.partials;
        let preset = config.spectrum.preset;
        let spectrum = preset.generate(num_partials, scale.notes_per_octave);
        let synth_config = config.synth.clone();

        let spectrum_frame = SpectrumFrame::new(
            &spectrum,
            synth_config.max_partials,
            synth_config.max_voices,
            synth_config.target_headroom,
        )?;
        let mapper = VoiceMapper::new(synth_config.max_voices, scale, tuning.root());

        let (voice_sender, voice_receiver) = frame_channel(VoiceFrame::silent());
        let (spectrum_sender, spectrum_receiver) = frame_channel(spectrum_frame);
        let (analysis_sender, analysis_receiver) = frame_channel(AnalysisInput::default());

        let (ticker, monitor) = DissonanceTicker::spawn(config.ticker.clone(), analysis_receiver)
            .map_err(|e| CoreError::Ticker(e.to_string()))?;

        let native = NativeSynth::new(&synth_config, voice_receiver, spectrum_receiver);
        let controller = Self {
            config: synth_config,
            mapper,
            tuning,
            spectrum,
            preset: Some(preset),
            num_partials,
            voice_sender,
            spectrum_sender,
            analysis_sender,
            monitor,
            _ticker: ticker,
        };
        controller.publish_spectrum_frame(spectrum_frame);
        controller.publish_voices();
        info!(
            voices = controller.config.max_voices,
            partials = num_partials,
            root = controller.root(),
            %preset,
            "controller ready"
        );
        Ok((controller, native))
    }

    // --- inbound ---

    /// Places the voice in `slot` at a normalized surface position, or lifts
    /// it with `None`.
    pub fn set_voice_position(&mut self, slot: usize, position: Option<f32>) -> CoreResult<()> {
        self.mapper.set_voice_position(slot, position).map_err(|e| {
            warn!(slot, "rejected voice position: {e}");
            e
        })?;
        self.publish_voices();
        Ok(())
    }

    pub fn release_voice(&mut self, slot: usize) -> CoreResult<()> {
        self.set_voice_position(slot, None)
    }

    /// Lifts every voice at once.
    pub fn release_all(&mut self) {
        debug!("all voices released");
        self.mapper.release_all();
        self.publish_voices();
    }

    /// Sets the root directly. Non-positive roots mute every voice.
    pub fn set_root(&mut self, root: f32) {
        debug!(root, "root changed");
        self.mapper.set_root(root);
        self.publish_voices();
    }

    /// Reference pitch; the root follows as `tuning_hz * 2^lowest_octave`.
    pub fn set_tuning(&mut self, tuning_hz: f32) {
        self.tuning.tuning_hz = tuning_hz;
        self.set_root(self.tuning.root());
    }

    pub fn set_lowest_octave(&mut self, lowest_octave: i32) {
        self.tuning.lowest_octave = lowest_octave;
        self.set_root(self.tuning.root());
    }

    /// Replaces the spectrum with a user-supplied one.
    pub fn set_spectrum(&mut self, ratios: &[f32], amplitudes: &[f32]) -> CoreResult<()> {
        let spectrum = Spectrum::new(ratios, amplitudes).map_err(|e| {
            warn!("rejected spectrum: {e}");
            e
        })?;
        self.install_spectrum(spectrum, None)
    }

    pub fn select_preset(&mut self, preset: SpectrumPreset) -> CoreResult<()> {
        let spectrum = preset.generate(self.num_partials, self.mapper.scale().notes_per_octave);
        self.install_spectrum(spectrum, Some(preset))
    }

    /// Number of partials generated for presets. Ignored for a custom spectrum
    /// until a preset is selected again.
    pub fn set_partial_count(&mut self, num_partials: usize) -> CoreResult<()> {
        if num_partials == 0 || num_partials > self.config.max_partials {
            warn!(num_partials, "rejected partial count");
            return Err(CoreError::PartialCountOutOfRange {
                count: num_partials,
                max: self.config.max_partials,
            });
        }
        self.num_partials = num_partials;
        match self.preset {
            Some(preset) => self.select_preset(preset),
            None => Ok(()),
        }
    }

    pub fn set_notes_per_octave(&mut self, notes_per_octave: u32) -> CoreResult<()> {
        let scale = Scale::new(notes_per_octave, self.mapper.scale().octaves)?;
        self.apply_scale(scale)?;
        if let Some(preset) = self.preset.filter(|p| p.follows_scale()) {
            self.select_preset(preset)?;
        }
        Ok(())
    }

    pub fn set_octave_range(&mut self, octaves: u32) -> CoreResult<()> {
        let scale = Scale::new(self.mapper.scale().notes_per_octave, octaves)?;
        self.apply_scale(scale)
    }

    // --- outbound ---

    /// Latest score published by the ticker.
    pub fn current_dissonance_score(&mut self) -> f32 {
        self.monitor.current_score()
    }

    /// Latest normalized field, one value per scale step.
    pub fn dissonance_field(&mut self) -> Vec<f32> {
        self.monitor.field_report().field.clone()
    }

    pub fn dissonance_curve(&mut self) -> Vec<f32> {
        self.monitor.field_report().curve.clone()
    }

    pub fn field_report(&mut self) -> &FieldReport {
        self.monitor.field_report()
    }

    /// The state the ticker evaluates, for synchronous evaluation.
    pub fn snapshot(&self) -> AnalysisInput {
        AnalysisInput {
            spectrum: self.spectrum.clone(),
            active_ratios: self.mapper.active_ratios(),
            scale: self.mapper.scale(),
            root: self.mapper.root(),
        }
    }

    pub fn mapper(&self) -> &VoiceMapper {
        &self.mapper
    }

    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn preset(&self) -> Option<SpectrumPreset> {
        self.preset
    }

    pub fn root(&self) -> f32 {
        self.mapper.root()
    }

    fn apply_scale(&mut self, scale: Scale) -> CoreResult<()> {
        debug!(
            notes_per_octave = scale.notes_per_octave,
            octaves = scale.octaves,
            "scale changed"
        );
        self.mapper.set_scale(scale);
        self.publish_voices();
        Ok(())
    }

    fn install_spectrum(&mut self, spectrum: Spectrum, preset: Option<SpectrumPreset>) -> CoreResult<()> {
        let frame = SpectrumFrame::new(
            &spectrum,
            self.config.max_partials,
            self.config.max_voices,
            self.config.target_headroom,
        )
        .map_err(|e| {
            warn!("rejected spectrum: {e}");
            e
        })?;
        debug!(
            partials = spectrum.len(),
            global_level = frame.global_level,
            preset = ?preset,
            "spectrum changed"
        );
        self.spectrum = spectrum;
        self.preset = preset;
        self.publish_spectrum_frame(frame);
        Ok(())
    }

    fn publish_spectrum_frame(&self, frame: SpectrumFrame) {
        self.spectrum_sender.publish(frame);
        self.analysis_sender.publish(self.snapshot());
    }

    fn publish_voices(&self) {
        let frame =
            VoiceFrame::from_frequencies(self.mapper.voices().iter().map(|v| v.absolute_frequency));
        self.voice_sender.publish(frame);
        self.analysis_sender.publish(self.snapshot());
    }
}

#[cfg(feature = "native")]
/// A running instrument: controller plus the open audio device.
pub struct NativeRuntime {
    pub controller: Controller,
    backend: CpalBackend,
}

#[cfg(feature = "native")]
impl NativeRuntime {
    pub fn stop(&mut self) {
        self.backend.stop();
    }
}

#[cfg(feature = "native")]
/// Opens the default output device and starts rendering.
pub fn start(config: &Config) -> CoreResult<NativeRuntime> {
    let (controller, synth) = Controller::new(config)?;
    let mut backend = CpalBackend::new();
    backend.start(synth)?;
    Ok(NativeRuntime {
        controller,
        backend,
    })
}
