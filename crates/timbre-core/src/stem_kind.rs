//! Stem categories produced by the separator.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of isolated component a stem holds.
///
/// The first four make up the coarse four-stream split; the last four the
/// fine stem split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StemKind {
    /// Speech band, 85–1100 Hz.
    Voice,
    /// Broadband music, 20–8000 Hz.
    Music,
    /// Low-frequency room tone and rumble, 20–200 Hz.
    Ambient,
    /// High-frequency hiss, 8–20 kHz.
    Noise,
    /// Sung vocals, emphasis at 1–3 kHz.
    Vocals,
    /// Kick, snare and hi-hat bands.
    Drums,
    /// Bass instruments, 20–250 Hz.
    Bass,
    /// Residual content not claimed by the other fine stems.
    Other,
}

impl StemKind {
    /// The coarse four-stream split.
    pub const COARSE: [StemKind; 4] = [
        StemKind::Voice,
        StemKind::Music,
        StemKind::Ambient,
        StemKind::Noise,
    ];

    /// The fine stem split.
    pub const FINE: [StemKind; 4] = [
        StemKind::Vocals,
        StemKind::Drums,
        StemKind::Bass,
        StemKind::Other,
    ];

    /// Every stem kind.
    pub const ALL: [StemKind; 8] = [
        StemKind::Voice,
        StemKind::Music,
        StemKind::Ambient,
        StemKind::Noise,
        StemKind::Vocals,
        StemKind::Drums,
        StemKind::Bass,
        StemKind::Other,
    ];

    /// Stable lowercase identifier.
    pub fn name(self) -> &'static str {
        match self {
            StemKind::Voice => "voice",
            StemKind::Music => "music",
            StemKind::Ambient => "ambient",
            StemKind::Noise => "noise",
            StemKind::Vocals => "vocals",
            StemKind::Drums => "drums",
            StemKind::Bass => "bass",
            StemKind::Other => "other",
        }
    }

    /// Whether this kind belongs to the coarse four-stream split.
    pub fn is_coarse(self) -> bool {
        Self::COARSE.contains(&self)
    }

    /// Heuristic separation confidence.
    ///
    /// These are fixed per kind, not measured. Callers must not read them as
    /// calibrated probabilities.
    ///
    /// | Kind | Confidence |
    /// |------|-----------|
    /// | voice | 0.75 |
    /// | music | 0.65 |
    /// | ambient | 0.55 |
    /// | noise | 0.50 |
    /// | vocals | 0.70 |
    /// | drums | 0.65 |
    /// | bass | 0.75 |
    /// | other | 0.50 |
    pub fn confidence(self) -> f32 {
        match self {
            StemKind::Voice => 0.75,
            StemKind::Music => 0.65,
            StemKind::Ambient => 0.55,
            StemKind::Noise => 0.50,
            StemKind::Vocals => 0.70,
            StemKind::Drums => 0.65,
            StemKind::Bass => 0.75,
            StemKind::Other => 0.50,
        }
    }

    /// Heuristic share of the original mix this kind usually accounts for.
    ///
    /// | Kind | Fraction |
    /// |------|---------|
    /// | voice | 0.35 |
    /// | music | 0.45 |
    /// | ambient | 0.10 |
    /// | noise | 0.10 |
    /// | vocals | 0.30 |
    /// | drums | 0.25 |
    /// | bass | 0.20 |
    /// | other | 0.25 |
    pub fn original_mix_fraction(self) -> f32 {
        match self {
            StemKind::Voice => 0.35,
            StemKind::Music => 0.45,
            StemKind::Ambient => 0.10,
            StemKind::Noise => 0.10,
            StemKind::Vocals => 0.30,
            StemKind::Drums => 0.25,
            StemKind::Bass => 0.20,
            StemKind::Other => 0.25,
        }
    }
}

impl fmt::Display for StemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        StemKind::ALL
            .into_iter()
            .find(|k| k.name() == lower)
            .ok_or_else(|| format!("unknown stem kind: {s}"))
    }
}
