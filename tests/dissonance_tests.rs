use rustdissonance::dissonance::{field, field_raw, score, scale_field, FrequencySet};
use rustdissonance::synth::{Scale, Spectrum};

fn relative_error(actual: f32, expected: f64) -> f64 {
    ((actual as f64 - expected) / expected).abs()
}

#[test]
fn sawtooth_voice_at_220_matches_reference() {
    // Four sawtooth partials: 220/440/660/880 Hz at 1, 1/2, 1/3, 1/4.
    let expected = 0.081_396_528_485_995_3;

    let spectrum = Spectrum::sawtooth(4);
    let from_voice = FrequencySet::from_voices([220.0], &spectrum).score();
    println!("sawtooth-4 @ 220 Hz: {from_voice}");
    assert!(relative_error(from_voice, expected) < 1e-4);

    let explicit = score(&[220.0, 440.0, 660.0, 880.0], &[1.0, 0.5, 1.0 / 3.0, 0.25]);
    assert!(relative_error(explicit, expected) < 1e-4);
}

#[test]
fn octave_is_more_consonant_than_near_unison() {
    let pure = Spectrum::new(&[1.0], &[1.0]).unwrap();
    let raw = field_raw(&pure, &[1.0], &[2.0, 1.05], 220.0);
    println!("octave {} vs near-unison {}", raw[0], raw[1]);
    assert!(raw[0] < raw[1]);
}

#[test]
fn field_spans_zero_to_one_over_the_scale() {
    let spectrum = Spectrum::sawtooth(12);
    let scale = Scale::new(12, 2).unwrap();
    let values = scale_field(&spectrum, &[1.0], &scale, 110.0);

    assert_eq!(values.len(), 24);
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    assert_eq!(min, 0.0);
    assert_eq!(max, 1.0);

    // Against a sounding root, the minor second is rougher than the fifth.
    assert!(values[1] > values[7]);
}

#[test]
fn adding_a_voice_never_lowers_the_field() {
    let spectrum = Spectrum::sawtooth(8);
    let candidates = Scale::new(12, 1).unwrap().candidate_ratios();
    let one = field_raw(&spectrum, &[1.0], &candidates, 110.0);
    let two = field_raw(&spectrum, &[1.0, 1.5], &candidates, 110.0);
    for (a, b) in one.iter().zip(&two) {
        assert!(b >= a);
    }
}

#[test]
fn muted_root_yields_flat_zero_field() {
    let spectrum = Spectrum::sawtooth(8);
    let values = field(&spectrum, &[1.0, 1.5], &[1.0, 1.25, 1.5], 0.0);
    assert_eq!(values, vec![0.0; 3]);
}
