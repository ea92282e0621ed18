//! Parametric equalizer built from RBJ cookbook sections.
//!
//! Bands run in series. Each channel has its own filter history; the
//! coefficients are shared.

use timbre_config::{EqBand, EqBandKind, EqSettings};
use timbre_core::{Biquad, BiquadCoefficients, Effect, PcmBuffer, Result, Stage};

/// Coefficients for one band at `sample_rate`.
pub fn band_coefficients(band: &EqBand, sample_rate: f32) -> BiquadCoefficients {
    let (f, q, g) = (band.frequency_hz, band.q, band.gain_db);
    match band.kind {
        EqBandKind::LowShelf => BiquadCoefficients::low_shelf(f, q, g, sample_rate),
        EqBandKind::HighShelf => BiquadCoefficients::high_shelf(f, q, g, sample_rate),
        EqBandKind::Peaking => BiquadCoefficients::peaking(f, q, g, sample_rate),
        EqBandKind::LowPass => BiquadCoefficients::lowpass(f, q, sample_rate),
        EqBandKind::HighPass => BiquadCoefficients::highpass(f, q, sample_rate),
    }
}

/// N-band parametric EQ.
///
/// # Example
///
/// ```rust
/// use timbre_config::{EqBand, EqBandKind};
/// use timbre_core::{Effect, PcmBuffer};
/// use timbre_effects::ParametricEq;
///
/// let mut eq = ParametricEq::new(
///     vec![EqBand::new(EqBandKind::Peaking, 1000.0, 6.0)],
///     48000.0,
/// );
/// let out = eq.process(&PcmBuffer::mono(vec![0.1; 256], 48000.0).unwrap()).unwrap();
/// assert!(out.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct ParametricEq {
    sample_rate: f32,
    coefficients: Vec<BiquadCoefficients>,
    /// `filters[channel][band]`.
    filters: Vec<Vec<Biquad>>,
}

impl ParametricEq {
    /// EQ with `bands` applied in order.
    pub fn new(bands: Vec<EqBand>, sample_rate: f32) -> Self {
        Self {
            sample_rate,
            coefficients: bands.iter().map(|b| band_coefficients(b, sample_rate)).collect(),
            filters: Vec::new(),
        }
    }

    /// Build from settings.
    pub fn from_settings(settings: &EqSettings, sample_rate: f32) -> Self {
        Self::new(settings.bands.clone(), sample_rate)
    }

    /// Number of bands.
    pub fn band_count(&self) -> usize {
        self.coefficients.len()
    }

    /// Combined magnitude response at `frequency`.
    pub fn magnitude_at(&self, frequency: f32) -> f32 {
        self.coefficients
            .iter()
            .map(|c| c.magnitude_at(frequency, self.sample_rate))
            .product()
    }

    fn ensure_channels(&mut self, channels: usize) {
        while self.filters.len() < channels {
            self.filters
                .push(self.coefficients.iter().map(|&c| Biquad::new(c)).collect());
        }
    }
}

impl Effect for ParametricEq {
    fn stage(&self) -> Stage {
        Stage::Equalizer
    }

    fn process(&mut self, input: &PcmBuffer) -> Result<PcmBuffer> {
        self.ensure_channels(input.num_channels());
        let filters = &mut self.filters;
        input.map_channels(|ch, samples| {
            let chain = &mut filters[ch];
            Ok(samples
                .iter()
                .map(|&x| chain.iter_mut().fold(x, |acc, f| f.process(acc)))
                .collect())
        })
    }

    fn reset(&mut self) {
        self.filters.iter_mut().flatten().for_each(Biquad::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;
    use timbre_core::{linear_to_db, rms};

    fn sine(freq: f32, sr: f32, len: usize) -> Vec<f32> {
        (0..len).map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sr).sin()).collect()
    }

    #[test]
    fn peaking_band_boosts_its_center() {
        let sr = 48000.0;
        let mut eq = ParametricEq::new(vec![EqBand::new(EqBandKind::Peaking, 1000.0, 6.0)], sr);
        assert!((linear_to_db(eq.magnitude_at(1000.0)) - 6.0).abs() < 0.1);

        let input = sine(1000.0, sr, 48000);
        let out = eq.process(&PcmBuffer::mono(input.clone(), sr).unwrap()).unwrap();
        // skip the filter's settling time
        let gain = rms(&out.channel(0).unwrap()[4800..]) / rms(&input[4800..]);
        assert!((linear_to_db(gain) - 6.0).abs() < 0.2, "{}", linear_to_db(gain));
    }

    #[test]
    fn high_pass_removes_rumble() {
        let sr = 48000.0;
        let mut eq = ParametricEq::new(
            vec![EqBand::new(EqBandKind::HighPass, 500.0, 0.0)],
            sr,
        );
        let input = sine(40.0, sr, 48000);
        let out = eq.process(&PcmBuffer::mono(input.clone(), sr).unwrap()).unwrap();
        assert!(rms(&out.channel(0).unwrap()[4800..]) < 0.02 * rms(&input));
    }

    #[test]
    fn no_bands_is_identity() {
        let mut eq = ParametricEq::new(Vec::new(), 44100.0);
        let input = PcmBuffer::stereo(vec![0.3; 64], vec![-0.2; 64], 44100.0).unwrap();
        assert_eq!(eq.process(&input).unwrap(), input);
    }

    #[test]
    fn channels_keep_separate_history() {
        let sr = 48000.0;
        let bands = vec![EqBand::new(EqBandKind::LowPass, 2000.0, 0.0)];
        let mut stereo = ParametricEq::new(bands.clone(), sr);
        let mut mono = ParametricEq::new(bands, sr);
        let x = sine(5000.0, sr, 512);
        let s = stereo
            .process(&PcmBuffer::stereo(x.clone(), vec![0.0; 512], sr).unwrap())
            .unwrap();
        let m = mono.process(&PcmBuffer::mono(x, sr).unwrap()).unwrap();
        assert_eq!(s.channel(0), m.channel(0));
        assert!(s.channel(1).unwrap().iter().all(|&v| v == 0.0));
    }
}
