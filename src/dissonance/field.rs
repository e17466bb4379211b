use super::model::{FrequencySet, LoudnessTable};
use crate::synth::scale::Scale;
use crate::synth::spectrum::Spectrum;

/// Raw dissonance of `active ∪ probe(root * c)` for every candidate ratio `c`.
///
/// The pairs inside the active set do not depend on the candidate, so they
/// are summed once; each candidate then only adds active × probe cross terms
/// and the probe's own pairs.
pub fn field_raw(
    spectrum: &Spectrum,
    active_ratios: &[f32],
    candidate_ratios: &[f32],
    root: f32,
) -> Vec<f32> {
    let table = LoudnessTable::new(spectrum);
    if !(root.is_finite() && root > 0.0) || table.is_empty() {
        return vec![0.0; candidate_ratios.len()];
    }
    let mut active = FrequencySet::with_capacity(active_ratios.len() * table.len());
    for &ratio in active_ratios {
        active.extend_voice(ratio * root, &table);
    }
    let constant = active.score();

    let mut probe = FrequencySet::with_capacity(table.len());
    candidate_ratios
        .iter()
        .map(|&c| {
            probe.clear();
            probe.extend_voice(root * c, &table);
            constant + active.cross_score(&probe) + probe.score()
        })
        .collect()
}

/// Dissonance field normalized to `[0, 1]`: minimum mapped to 0, maximum to 1.
/// A flat field comes back as all zeros.
pub fn field(
    spectrum: &Spectrum,
    active_ratios: &[f32],
    candidate_ratios: &[f32],
    root: f32,
) -> Vec<f32> {
    let mut values = field_raw(spectrum, active_ratios, candidate_ratios, root);
    normalize(&mut values);
    values
}

/// [`field`] over every step of `scale`, lowest step first.
pub fn scale_field(spectrum: &Spectrum, active_ratios: &[f32], scale: &Scale, root: f32) -> Vec<f32> {
    field(spectrum, active_ratios, &scale.candidate_ratios(), root)
}

/// One-octave dissonance curve of the spectrum against itself: a reference
/// tone at `root` and a probe at `root * 2^(i / points)`. Scaled by the
/// maximum only, so the unison end stays at 0.
pub fn dissonance_curve(spectrum: &Spectrum, root: f32, points: usize) -> Vec<f32> {
    let candidates: Vec<f32> = (0..points)
        .map(|i| 2.0f32.powf(i as f32 / points as f32))
        .collect();
    let mut values = field_raw(spectrum, &[1.0], &candidates, root);
    scale_to_max(&mut values);
    values
}

/// Subtracts the minimum, then divides by the new maximum.
pub fn normalize(values: &mut [f32]) {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    if !min.is_finite() {
        values.fill(0.0);
        return;
    }
    values.iter_mut().for_each(|v| *v -= min);
    scale_to_max(values);
}

/// Divides by the maximum; zeros when the maximum is not positive.
pub fn scale_to_max(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max.is_finite() && max > 0.0 {
        values.iter_mut().for_each(|v| *v /= max);
    } else {
        values.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dissonance::model::score;

    fn brute_force(spectrum: &Spectrum, active: &[f32], c: f32, root: f32) -> f32 {
        let mut freqs = Vec::new();
        let mut amps = Vec::new();
        for &voice in active.iter().chain(std::iter::once(&c)) {
            for p in spectrum.partials() {
                freqs.push(root * voice * p.ratio);
                amps.push(p.amplitude);
            }
        }
        score(&freqs, &amps)
    }

    #[test]
    fn incremental_matches_full_recompute() {
        let spectrum = Spectrum::sawtooth(6);
        let active = [1.0, 1.25, 1.5];
        let scale = Scale::new(12, 2).unwrap();
        let candidates = scale.candidate_ratios();
        let raw = field_raw(&spectrum, &active, &candidates, 110.0);
        for (value, &c) in raw.iter().zip(&candidates) {
            let expected = brute_force(&spectrum, &active, c, 110.0);
            assert!(
                (value - expected).abs() <= 1e-4 * expected.max(1.0),
                "candidate {c}: {value} vs {expected}"
            );
        }
    }

    #[test]
    fn field_is_normalized() {
        let spectrum = Spectrum::sawtooth(8);
        let scale = Scale::new(12, 2).unwrap();
        let values = scale_field(&spectrum, &[1.0, 1.5], &scale, 110.0);
        assert_eq!(values.len(), 24);
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(values.iter().any(|&v| v == 0.0));
        assert!(values.iter().any(|&v| v == 1.0));
    }

    #[test]
    fn flat_field_is_all_zero() {
        let mut values = vec![3.0, 3.0, 3.0];
        normalize(&mut values);
        assert_eq!(values, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn field_without_active_voices_still_scores_the_probe() {
        let spectrum = Spectrum::sawtooth(4);
        let raw = field_raw(&spectrum, &[], &[1.0, 2.0], 220.0);
        let alone = FrequencySet::from_voices([220.0], &spectrum).score();
        assert!((raw[0] - alone).abs() <= 1e-6 * alone);
    }

    #[test]
    fn non_positive_root_gives_zero_field() {
        let spectrum = Spectrum::sawtooth(4);
        assert_eq!(field(&spectrum, &[1.0], &[1.0, 1.5], -110.0), vec![0.0, 0.0]);
    }

    #[test]
    fn unison_is_the_consonant_end_of_the_curve() {
        let curve = dissonance_curve(&Spectrum::sawtooth(8), 220.0, 100);
        assert_eq!(curve.len(), 100);
        assert!(curve.iter().all(|v| (0.0..=1.0).contains(v)));
        let peak = curve.iter().copied().fold(0.0, f32::max);
        assert_eq!(peak, 1.0);
        // Unison and the fifth (~58.5 points in) sit in wells.
        assert!(curve[0] < 0.5);
        assert!(curve[58] < curve[10]);
    }

    #[test]
    fn normalize_handles_empty_input() {
        let mut empty: Vec<f32> = Vec::new();
        normalize(&mut empty);
        assert!(empty.is_empty());
    }
}
