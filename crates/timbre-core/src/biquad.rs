//! Second-order IIR sections with RBJ Audio EQ Cookbook coefficients.

use core::f32::consts::PI;

use libm::{cosf, powf, sinf, sqrtf};

/// Normalized biquad coefficients (`a0 == 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    /// Feedforward `b0`.
    pub b0: f32,
    /// Feedforward `b1`.
    pub b1: f32,
    /// Feedforward `b2`.
    pub b2: f32,
    /// Feedback `a1`.
    pub a1: f32,
    /// Feedback `a2`.
    pub a2: f32,
}

/// Shared RBJ intermediates for `(frequency, q, sample_rate)`.
struct Rbj {
    cos_w: f32,
    alpha: f32,
}

impl Rbj {
    fn new(frequency: f32, q: f32, sample_rate: f32) -> Self {
        let nyquist_guard = sample_rate * 0.499;
        let f = frequency.clamp(1.0, nyquist_guard);
        let w = 2.0 * PI * f / sample_rate;
        Self {
            cos_w: cosf(w),
            alpha: sinf(w) / (2.0 * q.max(0.01)),
        }
    }
}

impl BiquadCoefficients {
    /// Pass-through.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    fn normalized(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        let inv = 1.0 / a0;
        Self {
            b0: b0 * inv,
            b1: b1 * inv,
            b2: b2 * inv,
            a1: a1 * inv,
            a2: a2 * inv,
        }
    }

    /// Second-order low-pass.
    pub fn lowpass(frequency: f32, q: f32, sample_rate: f32) -> Self {
        let Rbj { cos_w, alpha } = Rbj::new(frequency, q, sample_rate);
        let b1 = 1.0 - cos_w;
        Self::normalized(b1 / 2.0, b1, b1 / 2.0, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
    }

    /// Second-order high-pass.
    pub fn highpass(frequency: f32, q: f32, sample_rate: f32) -> Self {
        let Rbj { cos_w, alpha } = Rbj::new(frequency, q, sample_rate);
        let b0 = (1.0 + cos_w) / 2.0;
        Self::normalized(b0, -(1.0 + cos_w), b0, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
    }

    /// Peaking bell boosting or cutting `gain_db` around `frequency`.
    pub fn peaking(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        let Rbj { cos_w, alpha } = Rbj::new(frequency, q, sample_rate);
        let a = powf(10.0, gain_db / 40.0);
        Self::normalized(
            1.0 + alpha * a,
            -2.0 * cos_w,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cos_w,
            1.0 - alpha / a,
        )
    }

    /// Low shelf with corner `frequency` and shelf gain `gain_db`.
    pub fn low_shelf(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        let Rbj { cos_w, alpha } = Rbj::new(frequency, q, sample_rate);
        let a = powf(10.0, gain_db / 40.0);
        let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;
        Self::normalized(
            a * ((a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha),
            2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
            a * ((a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha),
            (a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha,
            -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
            (a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha,
        )
    }

    /// High shelf with corner `frequency` and shelf gain `gain_db`.
    pub fn high_shelf(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        let Rbj { cos_w, alpha } = Rbj::new(frequency, q, sample_rate);
        let a = powf(10.0, gain_db / 40.0);
        let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;
        Self::normalized(
            a * ((a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha),
            -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w),
            a * ((a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha),
            (a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha,
            2.0 * ((a - 1.0) - (a + 1.0) * cos_w),
            (a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha,
        )
    }

    /// Magnitude response at `frequency`.
    pub fn magnitude_at(&self, frequency: f32, sample_rate: f32) -> f32 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (c1, s1) = (cosf(w), sinf(w));
        let (c2, s2) = (cosf(2.0 * w), sinf(2.0 * w));
        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);
        sqrtf((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im))
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Direct Form I biquad.
///
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    coeffs: BiquadCoefficients,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Filter with the given coefficients and cleared history.
    pub fn new(coeffs: BiquadCoefficients) -> Self {
        Self {
            coeffs,
            ..Self::default()
        }
    }

    /// Replace coefficients, keeping history.
    pub fn set_coefficients(&mut self, coeffs: BiquadCoefficients) {
        self.coeffs = coeffs;
    }

    /// Current coefficients.
    pub fn coefficients(&self) -> BiquadCoefficients {
        self.coeffs
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let c = &self.coeffs;
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    /// Filter a whole slice into a new vector.
    pub fn process_slice(&mut self, input: &[f32]) -> Vec<f32> {
        input.iter().map(|&x| self.process(x)).collect()
    }

    /// Clear history.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    #[test]
    fn identity_passes_through() {
        let mut f = Biquad::default();
        assert_eq!(f.process_slice(&[1.0, -0.5, 0.25]), vec![1.0, -0.5, 0.25]);
    }

    #[test]
    fn lowpass_response() {
        let c = BiquadCoefficients::lowpass(1000.0, core::f32::consts::FRAC_1_SQRT_2, SR);
        assert!((c.magnitude_at(20.0, SR) - 1.0).abs() < 0.01);
        assert!((c.magnitude_at(1000.0, SR) - core::f32::consts::FRAC_1_SQRT_2).abs() < 0.01);
        assert!(c.magnitude_at(10000.0, SR) < 0.02);
    }

    #[test]
    fn peaking_hits_gain_at_center() {
        let c = BiquadCoefficients::peaking(2000.0, 1.0, 6.0, SR);
        let db = 20.0 * c.magnitude_at(2000.0, SR).log10();
        assert!((db - 6.0).abs() < 0.05, "{db}");
        assert!((c.magnitude_at(50.0, SR) - 1.0).abs() < 0.02);
    }

    #[test]
    fn shelves_reach_their_plateau() {
        let low = BiquadCoefficients::low_shelf(200.0, 0.707, -6.0, SR);
        let db_low = 20.0 * low.magnitude_at(20.0, SR).log10();
        assert!((db_low + 6.0).abs() < 0.3, "{db_low}");
        assert!((low.magnitude_at(10000.0, SR) - 1.0).abs() < 0.02);

        let high = BiquadCoefficients::high_shelf(8000.0, 0.707, 4.0, SR);
        let db_high = 20.0 * high.magnitude_at(22000.0, SR).log10();
        assert!((db_high - 4.0).abs() < 0.3, "{db_high}");
        assert!((high.magnitude_at(100.0, SR) - 1.0).abs() < 0.02);
    }

    #[test]
    fn reset_clears_history() {
        let mut f = Biquad::new(BiquadCoefficients::lowpass(500.0, 0.707, SR));
        f.process(1.0);
        f.reset();
        let mut g = Biquad::new(f.coefficients());
        assert_eq!(f.process(0.3), g.process(0.3));
    }
}
