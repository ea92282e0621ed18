//! End-to-end behavior of the enhancement chain and its stages.

use proptest::prelude::*;
use timbre_config::{
    EnhancementOption, EnhancementSettings, FACTORY_PRESET_NAMES, LimiterSettings,
    get_factory_preset,
};
use timbre_core::{DspError, Effect, PcmBuffer, Result, Stage, db_to_linear};
use timbre_effects::{EnhancementChain, Limiter};

const SR: f32 = 44100.0;

fn noise(len: usize, seed: u32, amp: f32) -> Vec<f32> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            amp * (state as i32 as f32) / (i32::MAX as f32)
        })
        .collect()
}

fn program(len: usize) -> PcmBuffer {
    let tone =
        |f: f32, a: f32| move |i: usize| a * (2.0 * std::f32::consts::PI * f * i as f32 / SR).sin();
    let (low, mid) = (tone(110.0, 0.4), tone(1500.0, 0.2));
    let hiss = noise(len, 17, 0.02);
    let left: Vec<f32> = (0..len).map(|i| low(i) + mid(i) + hiss[i]).collect();
    let right: Vec<f32> = (0..len).map(|i| low(i) - mid(i) + hiss[i]).collect();
    PcmBuffer::stereo(left, right, SR).unwrap()
}

#[test]
fn every_factory_preset_yields_finite_output() {
    let input = program(SR as usize);
    for name in FACTORY_PRESET_NAMES {
        let settings = get_factory_preset(name).unwrap();
        let mut chain = EnhancementChain::from_settings(&settings, SR).unwrap();
        let out = chain.process(&input).unwrap();
        assert_eq!(out.len(), input.len(), "{name}");
        assert_eq!(out.num_channels(), 2, "{name}");
        assert!(out.is_finite(), "{name}");
    }
}

#[test]
fn short_buffer_passes_through_a_full_chain() {
    let settings = get_factory_preset("vocals").unwrap();
    let mut chain = EnhancementChain::from_settings(&settings, SR).unwrap();
    let input = PcmBuffer::stereo(vec![0.9; 300], vec![-0.9; 300], SR).unwrap();
    assert_eq!(chain.process(&input).unwrap(), input);
}

#[test]
fn chain_built_from_options_limits_hot_input() {
    let settings = EnhancementSettings::from_options([
        EnhancementOption::CompressorRatio(2.0),
        EnhancementOption::LimiterCeilingDb(-3.0),
    ])
    .unwrap();
    let mut chain = EnhancementChain::from_settings(&settings, SR).unwrap();
    let hot = PcmBuffer::mono(noise(8192, 5, 1.5), SR).unwrap();
    let out = chain.process(&hot).unwrap();
    let ceiling = db_to_linear(-3.0);
    assert!(out.channel(0).unwrap().iter().all(|x| x.abs() <= ceiling + 1e-6));
}

struct Blowup;

impl Effect for Blowup {
    fn stage(&self) -> Stage {
        Stage::HarmonicEnhancement
    }

    fn process(&mut self, input: &PcmBuffer) -> Result<PcmBuffer> {
        input.map_channels(|_, ch| Ok(ch.iter().map(|x| x / 0.0).collect()))
    }

    fn reset(&mut self) {}
}

#[test]
fn non_finite_stage_output_names_the_stage() {
    let mut chain = EnhancementChain::new();
    chain.push(Box::new(Blowup));
    let err = chain
        .process(&PcmBuffer::mono(vec![0.5; 4096], SR).unwrap())
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::HarmonicEnhancement));
    assert!(matches!(err, DspError::Processing { .. }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn limiter_never_exceeds_its_ceiling(
        samples in prop::collection::vec(-4.0f32..=4.0, 1..2048),
        ceiling_db in -24.0f32..=0.0,
        lookahead_ms in 0.0f32..=20.0,
    ) {
        let settings = LimiterSettings { ceiling_db, release_ms: 50.0, lookahead_ms };
        let mut lim = Limiter::from_settings(&settings, SR);
        let out = lim.process(&PcmBuffer::mono(samples, SR).unwrap()).unwrap();
        let ceiling = db_to_linear(ceiling_db);
        for &y in out.channel(0).unwrap() {
            prop_assert!(y.abs() <= ceiling * (1.0 + 1e-5), "{} > {}", y, ceiling);
        }
    }

    #[test]
    fn disabled_chain_is_bit_identical(
        left in prop::collection::vec(-1.0f32..=1.0, 2048..4096),
        seed in 1u32..1000,
    ) {
        let right = noise(left.len(), seed, 0.5);
        let input = PcmBuffer::stereo(left, right, SR).unwrap();
        let mut chain =
            EnhancementChain::from_settings(&EnhancementSettings::disabled(), SR).unwrap();
        prop_assert_eq!(chain.process(&input).unwrap(), input);
    }
}
