use crate::audio::AudioBackend;
use crate::error::{CoreError, CoreResult};
use crate::runtime::NativeSynth;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use tracing::{debug, error, info};

fn audio_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::Audio(e.to_string())
}

#[derive(Default)]
pub struct CpalBackend {
    stream: Option<Stream>,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    fn select_output_device(&self, host: &cpal::Host) -> CoreResult<cpal::Device> {
        if cfg!(target_os = "linux") {
            if let Some(device) = self.select_linux_output_device(host)? {
                return Ok(device);
            }
        }
        host.default_output_device()
            .ok_or_else(|| audio_err("no output device available"))
    }

    /// Prefers the ALSA `default:` route or a PipeWire sink over raw hardware.
    fn select_linux_output_device(&self, host: &cpal::Host) -> CoreResult<Option<cpal::Device>> {
        for device in host.output_devices().map_err(audio_err)? {
            let name = device.name().unwrap_or_default().to_lowercase();
            debug!(device = %name, "found output device");
            if name.starts_with("default:") || name.contains("pipewire") {
                return Ok(Some(device));
            }
        }
        Ok(None)
    }

    fn build_stream(&mut self, mut synth: NativeSynth) -> CoreResult<Stream> {
        let host = cpal::default_host();
        let device = self.select_output_device(&host)?;
        info!(device = %device.name().unwrap_or_default(), "selected output device");

        let supported_config = device.default_output_config().map_err(audio_err)?;
        let stream_config: cpal::StreamConfig = supported_config.clone().into();
        let sample_rate = stream_config.sample_rate.0 as f32;
        let channels = stream_config.channels as usize;
        synth.set_sample_rate(sample_rate);

        let stream = match supported_config.sample_format() {
            SampleFormat::F32 => device
                .build_output_stream(
                    &stream_config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        synth.process_interleaved(data, channels);
                    },
                    |err| error!("stream error: {err}"),
                    None,
                )
                .map_err(audio_err)?,
            other => return Err(audio_err(format!("unsupported sample format {other:?}"))),
        };
        info!(sample_rate, channels, "audio stream built");

        Ok(stream)
    }
}

impl AudioBackend for CpalBackend {
    /// Replaces any stream that is already playing.
    fn start(&mut self, synth: NativeSynth) -> CoreResult<()> {
        if self.is_running() {
            self.stop();
        }
        let stream = self.build_stream(synth)?;
        stream.play().map_err(audio_err)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                error!("failed to pause stream: {e}");
            }
        }
    }
}
