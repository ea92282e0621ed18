//! In-place radix-2 Cooley–Tukey FFT.
//!
//! The one transform used everywhere a spectrum is needed. Twiddle factors
//! and the bit-reversal table are computed once at construction, and a
//! non-power-of-two size is rejected there rather than at call time.

use core::f64::consts::PI;

use num_complex::Complex32;

use crate::spectrum::Spectrum;
use crate::{DspError, Result};

/// Radix-2 transform of a fixed power-of-two size.
#[derive(Debug, Clone)]
pub struct Fft {
    size: usize,
    /// `e^{-2πik/N}` for `k in 0..N/2`.
    twiddles: Vec<Complex32>,
    /// Bit-reversed index of each position.
    bit_reverse: Vec<usize>,
}

impl Fft {
    /// Plan a transform of `size` points.
    ///
    /// ```rust
    /// use timbre_core::{DspError, Fft};
    ///
    /// assert!(Fft::new(1024).is_ok());
    /// assert_eq!(Fft::new(1000).unwrap_err(), DspError::NonPowerOfTwo(1000));
    /// ```
    pub fn new(size: usize) -> Result<Self> {
        if size < 2 || !size.is_power_of_two() {
            return Err(DspError::NonPowerOfTwo(size));
        }
        let twiddles = (0..size / 2)
            .map(|k| {
                let angle = -2.0 * PI * k as f64 / size as f64;
                Complex32::new(angle.cos() as f32, angle.sin() as f32)
            })
            .collect();
        let bits = size.trailing_zeros();
        let bit_reverse = (0..size)
            .map(|i| i.reverse_bits() >> (usize::BITS - bits))
            .collect();
        Ok(Self {
            size,
            twiddles,
            bit_reverse,
        })
    }

    /// Transform size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Unscaled forward transform in place.
    pub fn forward_in_place(&self, buffer: &mut [Complex32]) -> Result<()> {
        self.check_len(buffer.len())?;
        self.butterflies(buffer, false);
        Ok(())
    }

    /// Inverse transform in place, scaled by `1/N`.
    pub fn inverse_in_place(&self, buffer: &mut [Complex32]) -> Result<()> {
        self.check_len(buffer.len())?;
        self.butterflies(buffer, true);
        let scale = 1.0 / self.size as f32;
        for c in buffer.iter_mut() {
            *c *= scale;
        }
        Ok(())
    }

    /// Spectrum of exactly `size` real samples.
    pub fn forward(&self, samples: &[f32], sample_rate: f32) -> Result<Spectrum> {
        self.check_len(samples.len())?;
        let mut buffer: Vec<Complex32> = samples.iter().map(|&x| Complex32::new(x, 0.0)).collect();
        self.butterflies(&mut buffer, false);
        Ok(Spectrum::from_half_complex(
            &buffer[..=self.size / 2],
            sample_rate,
            self.size,
        ))
    }

    /// `(magnitudes, phases)` of exactly `size` real samples, `size / 2` each.
    pub fn magnitudes_phases(&self, samples: &[f32]) -> Result<(Vec<f32>, Vec<f32>)> {
        let spectrum = self.forward(samples, 1.0)?;
        Ok((spectrum.magnitude().to_vec(), spectrum.phase().to_vec()))
    }

    /// Real signal of `size` samples from a spectrum, Nyquist bin included.
    pub fn inverse(&self, spectrum: &Spectrum) -> Result<Vec<f32>> {
        if spectrum.fft_size() != self.size {
            return Err(DspError::InvalidParameter {
                name: "fft_size",
                value: spectrum.fft_size() as f32,
                reason: "spectrum was produced by a different transform size",
            });
        }
        let half = self.size / 2;
        let mut buffer = vec![Complex32::new(0.0, 0.0); self.size];
        for (k, slot) in buffer.iter_mut().enumerate().take(half + 1) {
            *slot = spectrum.complex_bin(k);
        }
        Ok(self.inverse_mirrored(buffer))
    }

    /// Real signal of `size` samples from `size / 2` magnitudes and phases.
    ///
    /// Bins `1..N/2` are mirrored with conjugated phase; the Nyquist bin is
    /// taken as zero.
    pub fn inverse_parts(&self, magnitudes: &[f32], phases: &[f32]) -> Result<Vec<f32>> {
        let half = self.size / 2;
        if magnitudes.len() != half || phases.len() != half {
            return Err(DspError::InvalidParameter {
                name: "spectrum length",
                value: magnitudes.len().max(phases.len()) as f32,
                reason: "magnitudes and phases must hold fft_size / 2 bins",
            });
        }
        let mut buffer = vec![Complex32::new(0.0, 0.0); self.size];
        for (k, slot) in buffer.iter_mut().enumerate().take(half) {
            *slot = Complex32::from_polar(magnitudes[k], phases[k]);
        }
        Ok(self.inverse_mirrored(buffer))
    }

    /// Fill bins `N/2+1..N` from the conjugate of `1..N/2`, invert, keep the real part.
    fn inverse_mirrored(&self, mut buffer: Vec<Complex32>) -> Vec<f32> {
        let n = self.size;
        for k in 1..n / 2 {
            buffer[n - k] = buffer[k].conj();
        }
        self.butterflies(&mut buffer, true);
        let scale = 1.0 / n as f32;
        buffer.iter().map(|c| c.re * scale).collect()
    }

    fn check_len(&self, len: usize) -> Result<()> {
        match len.cmp(&self.size) {
            core::cmp::Ordering::Equal => Ok(()),
            core::cmp::Ordering::Less => Err(DspError::BufferTooShort {
                len,
                required: self.size,
            }),
            core::cmp::Ordering::Greater => Err(DspError::InvalidParameter {
                name: "frame length",
                value: len as f32,
                reason: "longer than the transform size",
            }),
        }
    }

    fn butterflies(&self, buffer: &mut [Complex32], inverse: bool) {
        let n = self.size;
        for i in 0..n {
            let j = self.bit_reverse[i];
            if j > i {
                buffer.swap(i, j);
            }
        }

        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let stride = n / len;
            for start in (0..n).step_by(len) {
                for k in 0..half {
                    let w = self.twiddles[k * stride];
                    let w = if inverse { w.conj() } else { w };
                    let u = buffer[start + k];
                    let v = buffer[start + k + half] * w;
                    buffer[start + k] = u + v;
                    buffer[start + k + half] = u - v;
                }
            }
            len <<= 1;
        }
    }
}
