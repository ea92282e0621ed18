//! Optional speech timing hints from an external voice detector.
//!
//! Hints never change the audio. They only bias the reported confidence of
//! voice and vocal stems: a mix the detector found mostly speech raises the
//! confidence by up to 20%, one with no speech lowers it by 20%.

use serde::{Deserialize, Serialize};
use timbre_core::StemKind;

/// One detected speech segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSegment {
    /// Start, seconds from the beginning of the buffer.
    pub start_secs: f64,
    /// End, seconds; segments with `end <= start` are ignored.
    pub end_secs: f64,
    /// Detector confidence, `[0, 1]`.
    pub confidence: f32,
}

/// Speech segments for one buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceHints {
    /// Detected segments; may overlap.
    pub segments: Vec<VoiceSegment>,
}

impl VoiceHints {
    /// Hints from a list of segments.
    pub fn new(segments: Vec<VoiceSegment>) -> Self {
        Self { segments }
    }

    /// Confidence-weighted share of `[0, duration_secs)` covered by speech.
    ///
    /// Overlapping segments are merged first; where they overlap the higher
    /// confidence counts. Result in `[0, 1]`, 0 for an empty duration.
    pub fn coverage(&self, duration_secs: f64) -> f32 {
        if duration_secs <= 0.0 {
            return 0.0;
        }
        // sweep over segment boundaries, tracking the strongest open segment
        let mut edges: Vec<f64> = self
            .segments
            .iter()
            .filter(|s| s.end_secs > s.start_secs)
            .flat_map(|s| [s.start_secs.max(0.0), s.end_secs.min(duration_secs)])
            .filter(|t| (0.0..=duration_secs).contains(t))
            .collect();
        edges.sort_by(f64::total_cmp);
        edges.dedup();

        let mut covered = 0.0f64;
        for pair in edges.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let mid = (a + b) * 0.5;
            let weight = self
                .segments
                .iter()
                .filter(|s| s.start_secs <= mid && mid < s.end_secs)
                .map(|s| f64::from(s.confidence.clamp(0.0, 1.0)))
                .fold(0.0, f64::max);
            covered += (b - a) * weight;
        }
        (covered / duration_secs).clamp(0.0, 1.0) as f32
    }

    /// `kind`'s confidence biased by speech coverage.
    ///
    /// Only voice and vocal stems are affected:
    /// `base × (0.8 + 0.4 × coverage)`, clamped to `[0, 1]`.
    pub fn biased_confidence(&self, kind: StemKind, duration_secs: f64) -> f32 {
        let base = kind.confidence();
        match kind {
            StemKind::Voice | StemKind::Vocals => {
                (base * (0.8 + 0.4 * self.coverage(duration_secs))).clamp(0.0, 1.0)
            }
            _ => base,
        }
    }
}
