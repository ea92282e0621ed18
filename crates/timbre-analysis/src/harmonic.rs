//! Fundamental estimation and harmonic-series descriptors.
//!
//! The fundamental comes from a Harmonic Product Spectrum: the magnitude
//! spectrum multiplied by copies of itself decimated by 2..5, so only a bin
//! whose integer multiples all carry energy survives. Harmonics are then
//! located as the strongest bin within ±5% of each multiple.

use serde::{Deserialize, Serialize};
use timbre_core::{Spectrum, safe_ratio};

/// Decimation factors used by the product spectrum (1 through this value).
pub const HPS_FACTORS: usize = 5;
/// Harmonics tracked, including the fundamental.
pub const MAX_HARMONICS: usize = 20;
/// Relative search window around each ideal harmonic.
pub const HARMONIC_TOLERANCE: f32 = 0.05;
/// Lowest fundamental considered, Hz.
pub const MIN_FUNDAMENTAL_HZ: f32 = 20.0;

/// One detected harmonic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Harmonic {
    /// Harmonic number (1 is the fundamental).
    pub number: usize,
    /// Frequency of the detected peak, Hz.
    pub frequency: f32,
    /// Magnitude at the peak.
    pub magnitude: f32,
    /// Phase at the peak, radians.
    pub phase: f32,
}

impl Harmonic {
    fn power(&self) -> f32 {
        self.magnitude * self.magnitude
    }
}

/// Harmonic descriptors of one spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicAnalysis {
    /// Fundamental from the product spectrum, Hz; 0 when none is found.
    pub fundamental_hz: f32,
    /// Fundamental refined by parabolic interpolation of the magnitude peak.
    pub refined_fundamental_hz: f32,
    /// Detected harmonics, ascending by number.
    pub harmonics: Vec<Harmonic>,
    /// `sqrt(Σ_{h>1} P_h / P_1)`.
    pub thd: f32,
    /// `10·log10(P_harmonic / (P_total - P_harmonic))`, dB.
    pub hnr_db: f32,
    /// Mean relative deviation of each harmonic from `h·f0`.
    pub inharmonicity: f32,
    /// Odd (3, 5, …) over even (2, 4, …) harmonic power. Infinite with odd
    /// power and no even power.
    pub odd_even_ratio: f32,
}

impl HarmonicAnalysis {
    fn none() -> Self {
        Self {
            fundamental_hz: 0.0,
            refined_fundamental_hz: 0.0,
            harmonics: Vec::new(),
            thd: 0.0,
            hnr_db: 0.0,
            inharmonicity: 0.0,
            odd_even_ratio: 0.0,
        }
    }
}

/// Bin of the Harmonic Product Spectrum maximum, if any bin has energy.
///
/// Bins below 20 Hz (and DC) are skipped; the search stops at `len / 5`
/// so every decimated index stays in range.
pub fn hps_peak_bin(spectrum: &Spectrum) -> Option<usize> {
    let mags = spectrum.magnitude();
    let upper = mags.len() / HPS_FACTORS;
    let lower = ((MIN_FUNDAMENTAL_HZ / spectrum.bin_width()).ceil() as usize).max(1);
    let mut best: Option<(usize, f64)> = None;
    for k in lower..upper {
        let product: f64 = (1..=HPS_FACTORS)
            .map(|h| f64::from(mags[k * h]))
            .product();
        if product > 0.0 && best.is_none_or(|(_, b)| product > b) {
            best = Some((k, product));
        }
    }
    best.map(|(k, _)| k)
}

/// Fundamental frequency estimate in Hz, `None` for silence or no candidate.
pub fn estimate_fundamental(spectrum: &Spectrum) -> Option<f32> {
    hps_peak_bin(spectrum).map(|k| spectrum.bin_to_freq(k))
}

/// Sub-bin peak position from a parabola through `k-1, k, k+1` (log magnitudes).
fn parabolic_offset(mags: &[f32], k: usize) -> f32 {
    if k == 0 || k + 1 >= mags.len() {
        return 0.0;
    }
    let db = |m: f32| m.max(1e-12).ln();
    let (a, b, c) = (db(mags[k - 1]), db(mags[k]), db(mags[k + 1]));
    let denom = a - 2.0 * b + c;
    if denom.abs() < 1e-12 {
        0.0
    } else {
        (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
    }
}

/// Harmonic analyzer with configurable search parameters.
#[derive(Debug, Clone)]
pub struct HarmonicAnalyzer {
    max_harmonics: usize,
    tolerance: f32,
}

impl Default for HarmonicAnalyzer {
    fn default() -> Self {
        Self {
            max_harmonics: MAX_HARMONICS,
            tolerance: HARMONIC_TOLERANCE,
        }
    }
}

impl HarmonicAnalyzer {
    /// Analyzer tracking 20 harmonics within ±5%.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the number of harmonics tracked.
    pub fn with_max_harmonics(mut self, n: usize) -> Self {
        self.max_harmonics = n.max(1);
        self
    }

    /// Locate harmonics of `f0`, strongest bin within the tolerance window of each.
    pub fn extract_harmonics(&self, spectrum: &Spectrum, f0: f32) -> Vec<Harmonic> {
        let mags = spectrum.magnitude();
        let phases = spectrum.phase();
        let width = spectrum.bin_width();
        let mut out = Vec::new();
        if f0 <= 0.0 {
            return out;
        }
        // first bin not yet claimed by a lower harmonic
        let mut free = 0;
        for h in 1..=self.max_harmonics {
            let ideal = f0 * h as f32;
            if ideal >= spectrum.nyquist_frequency() {
                break;
            }
            // windows never reach past the midpoint to a neighbouring harmonic
            let half = (ideal * self.tolerance).min(0.5 * f0);
            let lo = (((ideal - half) / width).floor() as usize).max(free);
            let hi = (((ideal + half) / width).ceil() as usize).min(mags.len() - 1);
            let Some(k) = (lo..=hi).max_by(|&a, &b| mags[a].total_cmp(&mags[b])) else {
                continue;
            };
            if mags[k] <= 0.0 {
                continue;
            }
            free = k + 1;
            out.push(Harmonic {
                number: h,
                frequency: spectrum.bin_to_freq(k),
                magnitude: mags[k],
                phase: phases[k],
            });
        }
        out
    }

    /// Full harmonic analysis of one spectrum.
    pub fn analyze(&self, spectrum: &Spectrum) -> HarmonicAnalysis {
        let Some(k0) = hps_peak_bin(spectrum) else {
            return HarmonicAnalysis::none();
        };
        let f0 = spectrum.bin_to_freq(k0);
        let refined =
            (k0 as f32 + parabolic_offset(spectrum.magnitude(), k0)) * spectrum.bin_width();
        let harmonics = self.extract_harmonics(spectrum, f0);

        let harmonic_power: f32 = harmonics.iter().map(Harmonic::power).sum();
        let noise_power = spectrum.energy() - harmonic_power;
        let hnr_db = if harmonic_power > 0.0 && noise_power > 0.0 {
            10.0 * (harmonic_power / noise_power).log10()
        } else {
            0.0
        };

        HarmonicAnalysis {
            fundamental_hz: f0,
            refined_fundamental_hz: refined,
            thd: total_harmonic_distortion(&harmonics),
            hnr_db,
            inharmonicity: inharmonicity(&harmonics, f0),
            odd_even_ratio: odd_even_ratio(&harmonics),
            harmonics,
        }
    }
}

/// `sqrt(Σ_{h>1} P_h / P_1)`; 0 without a fundamental.
pub fn total_harmonic_distortion(harmonics: &[Harmonic]) -> f32 {
    let fundamental = harmonics
        .iter()
        .find(|h| h.number == 1)
        .map_or(0.0, Harmonic::power);
    let overtones: f32 = harmonics
        .iter()
        .filter(|h| h.number > 1)
        .map(Harmonic::power)
        .sum();
    safe_ratio(overtones, fundamental).sqrt()
}

/// Mean `|f_h - h·f0| / (h·f0)`.
pub fn inharmonicity(harmonics: &[Harmonic], f0: f32) -> f32 {
    if harmonics.is_empty() || f0 <= 0.0 {
        return 0.0;
    }
    harmonics
        .iter()
        .map(|h| {
            let ideal = f0 * h.number as f32;
            (h.frequency - ideal).abs() / ideal
        })
        .sum::<f32>()
        / harmonics.len() as f32
}

/// Power of odd overtones (3, 5, …) over even ones (2, 4, …).
///
/// Infinite when there is odd power and no even power; 0 when neither.
pub fn odd_even_ratio(harmonics: &[Harmonic]) -> f32 {
    let odd: f32 = harmonics
        .iter()
        .filter(|h| h.number > 1 && h.number % 2 == 1)
        .map(Harmonic::power)
        .sum();
    let even: f32 = harmonics
        .iter()
        .filter(|h| h.number % 2 == 0)
        .map(Harmonic::power)
        .sum();
    if even > 0.0 {
        odd / even
    } else if odd > 0.0 {
        f32::INFINITY
    } else {
        0.0
    }
}
#[cfg(test)]
mod tests {
    use super::*;

    /// 1 Hz bins, peaks at the given bins.
    fn spectrum_with(bins: &[(usize, f32)]) -> Spectrum {
        let mut mags = vec![1e-3; 1024];
        for &(k, m) in bins {
            mags[k] = m;
        }
        Spectrum::from_parts(mags, vec![0.0; 1024], 0.0, 2048.0, 2048).unwrap()
    }

    #[test]
    fn product_spectrum_picks_series_root() {
        let s = spectrum_with(&[(100, 1.0), (200, 0.5), (300, 0.3), (400, 0.2), (500, 0.1)]);
        assert_eq!(estimate_fundamental(&s), Some(100.0));
    }

    #[test]
    fn high_harmonics_of_a_low_fundamental_claim_distinct_bins() {
        let mut peaks: Vec<(usize, f32)> = (1..=20).map(|h| (10 * h, 0.1)).collect();
        peaks.push((155, 1.0));
        let s = spectrum_with(&peaks);
        let harmonics = HarmonicAnalyzer::new().extract_harmonics(&s, 10.0);
        assert_eq!(harmonics.len(), 20);
        assert!(harmonics.windows(2).all(|w| w[0].frequency < w[1].frequency));
        let power: f32 = harmonics.iter().map(Harmonic::power).sum();
        assert!(power <= s.energy());
        assert_eq!(harmonics[15].frequency, 160.0);
    }

    #[test]
    fn silence_has_no_fundamental() {
        let s = Spectrum::from_parts(vec![0.0; 512], vec![0.0; 512], 0.0, 1024.0, 1024).unwrap();
        assert_eq!(estimate_fundamental(&s), None);
        let r = HarmonicAnalyzer::new().analyze(&s);
        assert_eq!(r, HarmonicAnalysis::none());
    }

    #[test]
    fn thd_of_known_series() {
        let mut mags = vec![0.0; 1024];
        for (k, m) in [(100, 1.0), (200, 0.3), (300, 0.4), (400, 0.05), (500, 0.02)] {
            mags[k] = m;
        }
        let s = Spectrum::from_parts(mags, vec![0.0; 1024], 0.0, 2048.0, 2048).unwrap();
        let r = HarmonicAnalyzer::new().analyze(&s);
        assert_eq!(r.fundamental_hz, 100.0);
        assert_eq!(r.harmonics.len(), 5);
        let expected = (0.09f32 + 0.16 + 0.0025 + 0.0004).sqrt();
        assert!((r.thd - expected).abs() < 1e-5, "{} vs {}", r.thd, expected);
        assert!(r.inharmonicity < 1e-6);
        // every bin of energy is harmonic: the noise guard applies
        assert_eq!(r.hnr_db, 0.0);
    }

    #[test]
    fn noise_floor_lowers_hnr() {
        let s = spectrum_with(&[(100, 1.0), (200, 0.5), (300, 0.3), (400, 0.2), (500, 0.1)]);
        let r = HarmonicAnalyzer::new().analyze(&s);
        assert!(r.hnr_db > 10.0 && r.hnr_db.is_finite());
    }

    fn harmonic(number: usize, magnitude: f32) -> Harmonic {
        Harmonic {
            number,
            frequency: 100.0 * number as f32,
            magnitude,
            phase: 0.0,
        }
    }

    #[test]
    fn odd_even_ratio_cases() {
        let odd_only = [harmonic(1, 1.0), harmonic(3, 0.3), harmonic(5, 0.1)];
        assert_eq!(odd_even_ratio(&odd_only), f32::INFINITY);
        assert_eq!(odd_even_ratio(&[harmonic(1, 1.0)]), 0.0);
        let mixed = [harmonic(1, 1.0), harmonic(2, 0.5), harmonic(3, 0.5)];
        assert!((odd_even_ratio(&mixed) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn inharmonicity_of_stretched_series() {
        let mut stretched = harmonic(2, 0.5);
        stretched.frequency = 210.0;
        let r = inharmonicity(&[harmonic(1, 1.0), stretched], 100.0);
        assert!((r - 0.025).abs() < 1e-6);
        assert_eq!(total_harmonic_distortion(&[]), 0.0);
    }

    #[test]
    fn parabolic_refinement_moves_toward_heavier_side() {
        let mags = [0.1, 0.5, 1.0, 0.9, 0.1];
        assert!(parabolic_offset(&mags, 2) > 0.0);
        assert_eq!(parabolic_offset(&mags, 0), 0.0);
    }
}
