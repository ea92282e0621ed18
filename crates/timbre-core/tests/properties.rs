//! Property-based tests for timbre-core primitives.
//!
//! Transform round trips, mask bounds, and filter stability over randomized
//! input.

use proptest::prelude::*;
use timbre_core::{
    Biquad, BiquadCoefficients, CancelToken, Fft, Mask, OverlapAdd, WindowKind, generate_window,
};

fn power_of_two_signal() -> impl Strategy<Value = Vec<f32>> {
    (3u32..=11).prop_flat_map(|bits| prop::collection::vec(-1.0f32..=1.0f32, 1usize << bits))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// `inverse(forward(x))` reconstructs any real power-of-two signal.
    #[test]
    fn fft_round_trip(x in power_of_two_signal()) {
        let fft = Fft::new(x.len()).unwrap();
        let spectrum = fft.forward(&x, 48000.0).unwrap();
        prop_assert_eq!(spectrum.len(), x.len() / 2);
        prop_assert!(spectrum.magnitude().iter().all(|&m| m >= 0.0));

        let back = fft.inverse(&spectrum).unwrap();
        let scale = x.iter().fold(1.0f32, |acc, v| acc.max(v.abs()));
        for (a, b) in x.iter().zip(&back) {
            prop_assert!((a - b).abs() <= 1e-4 * scale, "{} vs {}", a, b);
        }
    }

    /// Masks built from arbitrary gains stay inside `[0, 1]`.
    #[test]
    fn mask_bounds(gains in prop::collection::vec(prop::num::f32::ANY, 0..512)) {
        let mask = Mask::new(gains);
        prop_assert!(mask.as_slice().iter().all(|g| (0.0..=1.0).contains(g)));
        prop_assert!(mask.complement().as_slice().iter().all(|g| (0.0..=1.0).contains(g)));
    }

    /// Window coefficients are finite and never exceed one.
    #[test]
    fn window_bounds(size in 1usize..2048, variant in 0usize..5, beta in 0.0f32..14.0) {
        let kind = match variant {
            0 => WindowKind::Rectangular,
            1 => WindowKind::Hann,
            2 => WindowKind::Hamming,
            3 => WindowKind::Blackman,
            _ => WindowKind::Kaiser { beta },
        };
        for c in generate_window(kind, size) {
            prop_assert!(c.is_finite());
            prop_assert!(c <= 1.0 + 1e-6 && c >= -1e-6, "{:?} gave {}", kind, c);
        }
    }

    /// Every RBJ design stays stable on bounded input.
    #[test]
    fn biquad_stability(
        freq in 20.0f32..20000.0f32,
        q in 0.1f32..10.0f32,
        gain_db in -18.0f32..18.0f32,
        variant in 0usize..5,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let sr = 48000.0;
        let coeffs = match variant {
            0 => BiquadCoefficients::lowpass(freq, q, sr),
            1 => BiquadCoefficients::highpass(freq, q, sr),
            2 => BiquadCoefficients::peaking(freq, q, gain_db, sr),
            3 => BiquadCoefficients::low_shelf(freq, q, gain_db, sr),
            _ => BiquadCoefficients::high_shelf(freq, q, gain_db, sr),
        };
        let mut filter = Biquad::new(coeffs);
        for _ in 0..32 {
            for &s in &input {
                prop_assert!(filter.process(s).is_finite());
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// An untouched overlap-add pass reproduces its input.
    #[test]
    fn overlap_add_identity(x in prop::collection::vec(-1.0f32..=1.0f32, 512..3000)) {
        let ola = OverlapAdd::new(512, 128, WindowKind::Hann).unwrap();
        let y = ola.process(&x, 44100.0, &CancelToken::new(), |_, s| Ok(s)).unwrap();
        prop_assert_eq!(y.len(), x.len());
        for (a, b) in x.iter().zip(&y) {
            prop_assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }
}
