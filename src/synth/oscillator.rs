use crate::synth::prelude::TAU;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OscillatorState {
    Silent,
    Running,
}

/// Phase-accumulating sine oscillator.
///
/// Changing the frequency only changes `angle_delta`; the phase keeps running
/// so pitch glides and amplitude changes never click.
#[derive(Clone, Debug)]
pub struct SineOscillator {
    current_angle: f32, // [0, 2π)
    angle_delta: f32,
    state: OscillatorState,
}

impl SineOscillator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero, negative or non-finite frequencies silence the oscillator.
    pub fn set_frequency(&mut self, frequency: f32, sample_rate: f32) {
        if frequency.is_finite() && frequency > 0.0 && sample_rate > 0.0 {
            self.angle_delta = TAU * frequency / sample_rate;
            self.state = OscillatorState::Running;
        } else {
            self.angle_delta = 0.0;
            self.state = OscillatorState::Silent;
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.state == OscillatorState::Silent {
            return 0.0;
        }
        let sample = self.current_angle.sin();
        self.current_angle += self.angle_delta;
        if self.current_angle >= TAU {
            // angle_delta may exceed 2π above Nyquist; keep the phase in range.
            self.current_angle = self.current_angle.rem_euclid(TAU);
        }
        sample
    }

    pub fn current_angle(&self) -> f32 {
        self.current_angle
    }

    pub fn angle_delta(&self) -> f32 {
        self.angle_delta
    }

    pub fn state(&self) -> OscillatorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == OscillatorState::Running
    }
}

impl Default for SineOscillator {
    fn default() -> Self {
        Self {
            current_angle: 0.0,
            angle_delta: 0.0,
            state: OscillatorState::Silent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_silent() {
        let mut osc = SineOscillator::new();
        assert_eq!(osc.state(), OscillatorState::Silent);
        assert_eq!(osc.next_sample(), 0.0);
    }

    #[test]
    fn zero_frequency_silences() {
        let mut osc = SineOscillator::new();
        osc.set_frequency(440.0, 44100.0);
        assert!(osc.is_running());
        osc.set_frequency(0.0, 44100.0);
        assert_eq!(osc.state(), OscillatorState::Silent);
        osc.set_frequency(-3.0, 44100.0);
        assert_eq!(osc.state(), OscillatorState::Silent);
    }

    #[test]
    fn sine_starts_at_zero_and_stays_in_range() {
        let mut osc = SineOscillator::new();
        osc.set_frequency(440.0, 44100.0);
        assert!(osc.next_sample().abs() < 1e-7);
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!((-1.0..=1.0).contains(&s));
            assert!(osc.current_angle() >= 0.0 && osc.current_angle() < TAU);
        }
    }

    #[test]
    fn frequency_change_keeps_phase() {
        let mut osc = SineOscillator::new();
        osc.set_frequency(440.0, 44100.0);
        for _ in 0..1000 {
            osc.next_sample();
        }
        let before = osc.current_angle();
        osc.set_frequency(660.0, 44100.0);
        assert_eq!(osc.current_angle(), before);
        osc.set_frequency(0.0, 44100.0);
        assert_eq!(osc.current_angle(), before);
    }

    #[test]
    fn wraps_above_nyquist() {
        let mut osc = SineOscillator::new();
        osc.set_frequency(100_000.0, 44100.0);
        for _ in 0..100 {
            osc.next_sample();
            assert!(osc.current_angle() < TAU);
        }
    }
}
