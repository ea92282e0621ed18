//! Frequency ranges with an attached energy value.

use serde::{Deserialize, Serialize};

/// A `[low_hz, high_hz)` range and the energy measured inside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    /// Lower edge in Hz (inclusive).
    pub low_hz: f32,
    /// Upper edge in Hz (exclusive).
    pub high_hz: f32,
    /// Energy measured in the band. Zero until measured.
    pub energy: f32,
}

impl FrequencyBand {
    /// A band with no energy measured yet.
    pub const fn new(low_hz: f32, high_hz: f32) -> Self {
        Self {
            low_hz,
            high_hz,
            energy: 0.0,
        }
    }

    /// Same band carrying `energy`.
    pub fn with_energy(self, energy: f32) -> Self {
        Self { energy, ..self }
    }

    /// Arithmetic center frequency.
    pub fn center_hz(&self) -> f32 {
        (self.low_hz + self.high_hz) * 0.5
    }

    /// Bandwidth in Hz.
    pub fn width_hz(&self) -> f32 {
        self.high_hz - self.low_hz
    }

    /// Whether `freq` lies in `[low_hz, high_hz)`.
    pub fn contains(&self, freq: f32) -> bool {
        freq >= self.low_hz && freq < self.high_hz
    }
}
