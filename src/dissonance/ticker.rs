//! Periodic dissonance evaluation off the audio thread.
//!
//! The ticker is the only caller of `score`/`field` in a running instrument.
//! It keeps two cadences: the score of the sounding voices (fast) and the
//! field plus the one-octave curve (slow). A tick that arrives while the
//! previous evaluation is still running is coalesced, never queued.

use super::field::{dissonance_curve, scale_field};
use super::model::FrequencySet;
use crate::synth::config::TickerConfig;
use crate::synth::frame::{frame_channel, FrameReceiver, FrameSender};
use crate::synth::scale::Scale;
use crate::synth::spectrum::Spectrum;
use crossbeam_channel::{select, tick, Sender};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info};

/// Everything the ticker needs to know about the instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisInput {
    pub spectrum: Spectrum,
    pub active_ratios: Vec<f32>,
    pub scale: Scale,
    pub root: f32,
}

impl AnalysisInput {
    /// Dissonance of the sounding voices alone.
    pub fn score(&self) -> f32 {
        if !(self.root.is_finite() && self.root > 0.0) {
            return 0.0;
        }
        let voices = self.active_ratios.iter().map(|r| r * self.root);
        FrequencySet::from_voices(voices, &self.spectrum).score()
    }

    /// Normalized field over every scale step.
    pub fn field(&self) -> Vec<f32> {
        scale_field(&self.spectrum, &self.active_ratios, &self.scale, self.root)
    }

    pub fn curve(&self, points: usize) -> Vec<f32> {
        dissonance_curve(&self.spectrum, self.root, points)
    }
}

impl Default for AnalysisInput {
    fn default() -> Self {
        Self {
            spectrum: Spectrum::default(),
            active_ratios: Vec::new(),
            scale: Scale::default(),
            root: 0.0,
        }
    }
}

/// Output of one slow tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldReport {
    pub field: Vec<f32>,
    pub curve: Vec<f32>,
}

/// UI-side view of the latest ticker results.
pub struct DissonanceMonitor {
    score: FrameReceiver<f32>,
    field: FrameReceiver<FieldReport>,
}

impl DissonanceMonitor {
    pub fn current_score(&mut self) -> f32 {
        self.score.poll();
        *self.score.latest()
    }

    pub fn field_report(&mut self) -> &FieldReport {
        self.field.poll();
        self.field.latest()
    }
}

/// Handle to the ticker thread. Dropping it stops and joins the thread.
pub struct DissonanceTicker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl DissonanceTicker {
    pub fn spawn(
        config: TickerConfig,
        inputs: FrameReceiver<AnalysisInput>,
    ) -> io::Result<(Self, DissonanceMonitor)> {
        let (score_tx, score_rx) = frame_channel(0.0f32);
        let (field_tx, field_rx) = frame_channel(FieldReport::default());
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("dissonance-ticker".to_string())
            .spawn(move || run(config, inputs, score_tx, field_tx, stop_rx))?;

        Ok((
            Self {
                stop_tx: Some(stop_tx),
                handle: Some(handle),
            },
            DissonanceMonitor {
                score: score_rx,
                field: field_rx,
            },
        ))
    }

    pub fn stop(&mut self) {
        // Disconnecting the stop channel wakes the select loop.
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DissonanceTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    config: TickerConfig,
    mut inputs: FrameReceiver<AnalysisInput>,
    score_tx: FrameSender<f32>,
    field_tx: FrameSender<FieldReport>,
    stop_rx: crossbeam_channel::Receiver<()>,
) {
    info!(
        score_ms = config.score_interval_ms,
        field_ms = config.field_interval_ms,
        "dissonance ticker started"
    );
    let score_tick = tick(config.score_interval());
    let field_tick = tick(config.field_interval());

    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(score_tick) -> _ => {
                inputs.poll();
                score_tx.publish(inputs.latest().score());
            }
            recv(field_tick) -> _ => {
                inputs.poll();
                let started = Instant::now();
                let input = inputs.latest();
                let report = FieldReport {
                    field: input.field(),
                    curve: input.curve(config.curve_points),
                };
                debug!(
                    candidates = report.field.len(),
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "dissonance field updated"
                );
                field_tx.publish(report);
            }
        }
    }
    info!("dissonance ticker stopped");
}
