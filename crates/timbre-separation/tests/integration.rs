//! Separator behavior on synthetic mixes.

use core::f32::consts::PI;

use proptest::prelude::*;
use timbre_config::{SeparationMode, SeparationSettings};
use timbre_core::{PcmBuffer, StemKind};
use timbre_separation::{FineMasks, MixProfile, Stem, StemSeparator, coarse_band, coarse_mask};

const SR: f32 = 44100.0;

fn tone(freq: f32, amp: f32, len: usize) -> Vec<f32> {
    (0..len).map(|i| amp * (2.0 * PI * freq * i as f32 / SR).sin()).collect()
}

fn energy(stem: &Stem) -> f64 {
    stem.audio.energy()
}

fn find(stems: &[Stem], kind: StemKind) -> &Stem {
    stems.iter().find(|s| s.kind() == kind).unwrap()
}

#[test]
fn two_tones_split_into_ambient_and_music() {
    let len = SR as usize;
    let low = tone(100.0, 0.5, len);
    let high = tone(5000.0, 0.5, len);
    let mix: Vec<f32> = low.iter().zip(&high).map(|(a, b)| a + b).collect();
    let input = PcmBuffer::mono(mix, SR).unwrap();
    let total = input.energy();

    let separator =
        StemSeparator::new(&SeparationSettings::for_mode(SeparationMode::Coarse)).unwrap();
    let stems = separator.separate(&input).unwrap();

    // ambient keeps nearly all of the 100 Hz tone and a trace of the 5 kHz one
    let ambient = find(&stems, StemKind::Ambient);
    let ambient_low = ambient.audio.energy();
    assert!(ambient_low > 0.45 * total && ambient_low < 0.55 * total, "{ambient_low} of {total}");

    // music passes both tones
    let music = energy(find(&stems, StemKind::Music));
    assert!(music > 0.9 * total, "{music} of {total}");

    // noise only sees the leak
    let noise = energy(find(&stems, StemKind::Noise));
    assert!(noise < 0.01 * total, "{noise} of {total}");
}

#[test]
fn fine_stems_do_not_add_energy() {
    let len = SR as usize;
    let parts = [
        tone(60.0, 0.4, len),
        tone(220.0, 0.2, len),
        tone(1800.0, 0.2, len),
        tone(9000.0, 0.1, len),
    ];
    let mix: Vec<f32> = (0..len).map(|i| parts.iter().map(|p| p[i]).sum()).collect();
    let input = PcmBuffer::stereo(mix.clone(), mix, SR).unwrap();
    let separator =
        StemSeparator::new(&SeparationSettings::for_mode(SeparationMode::Fine)).unwrap();
    let stems = separator.separate(&input).unwrap();
    let sum: f64 = stems.iter().map(energy).sum();
    assert!(sum <= 1.1 * input.energy(), "{sum} vs {}", input.energy());
    assert!(stems.iter().all(|s| s.audio.len() == len && s.audio.num_channels() == 2));
}

#[test]
fn bass_tone_lands_in_the_bass_stem() {
    let input = PcmBuffer::mono(tone(80.0, 0.5, 32768), SR).unwrap();
    let separator =
        StemSeparator::new(&SeparationSettings::for_mode(SeparationMode::Fine)).unwrap();
    let stems = separator.separate(&input).unwrap();
    let bass = energy(find(&stems, StemKind::Bass));
    let vocals = energy(find(&stems, StemKind::Vocals));
    assert!(bass > 10.0 * vocals, "bass {bass} vocals {vocals}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_mask_stays_in_unit_range(
        tonality in 0.0f32..=1.0,
        sensitivity in 0.0f32..=0.99,
        peaks in prop::collection::vec(0usize..1024, 0..16),
    ) {
        let width = SR / 2048.0;
        let profile = MixProfile::from_parts(1024, width, tonality, peaks);
        let fine = FineMasks::build(&profile, sensitivity);
        for kind in StemKind::FINE {
            let mask = fine.get(kind).unwrap();
            prop_assert!(mask.as_slice().iter().all(|g| (0.0..=1.0).contains(g)));
        }
        for kind in StemKind::COARSE {
            let mask = coarse_mask(coarse_band(kind).unwrap(), 1024, width, sensitivity);
            prop_assert!(mask.as_slice().iter().all(|g| (0.0..=1.0).contains(g)));
        }
        for k in 0..1024 {
            let sum: f32 = StemKind::FINE.iter().map(|&kind| fine.get(kind).unwrap().gain(k)).sum();
            prop_assert!(sum <= 1.0 + 1e-5);
        }
    }
}
