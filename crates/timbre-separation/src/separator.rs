//! The DSP stem separator.
//!
//! Each stem goes through the same phases, reported as progress events:
//!
//! ```text
//! Idle → Analyzing → Masking → Synthesizing → Done
//! ```
//!
//! The mix is analyzed once; every stem then builds its own mask and runs
//! its own overlap-add pass over every channel. Stems share nothing
//! mutable, so [`StemSeparator::separate_stem`] can run on several threads
//! against one separator.

use std::time::Instant;

use timbre_config::{MAX_SENSITIVITY, SeparationMode, SeparationSettings};
use timbre_core::{
    CancelToken, DspError, NoProgress, OverlapAdd, PcmBuffer, ProgressEvent, ProgressSink, Result,
    SeparationPhase, Stage, StemKind,
};
use tracing::{debug, info};

use crate::hints::VoiceHints;
use crate::masks::mask_for;
use crate::profile::MixProfile;
use crate::stem::Stem;

/// Frames between two synthesis progress events.
const PROGRESS_EVERY: usize = 32;

fn event(kind: StemKind, phase: SeparationPhase, fraction: f32) -> ProgressEvent {
    ProgressEvent::new(Stage::Separation, fraction)
        .for_stem(kind)
        .in_phase(phase)
}

/// Mask-based separator over a fixed frame, hop and window.
///
/// # Example
///
/// ```rust
/// use timbre_config::{SeparationMode, SeparationSettings};
/// use timbre_core::{PcmBuffer, StemKind};
/// use timbre_separation::StemSeparator;
///
/// let settings = SeparationSettings::for_mode(SeparationMode::Coarse);
/// let separator = StemSeparator::new(&settings).unwrap();
/// let tone: Vec<f32> = (0..8192)
///     .map(|i| (2.0 * std::f32::consts::PI * 100.0 * i as f32 / 44100.0).sin())
///     .collect();
/// let stems = separator.separate(&PcmBuffer::mono(tone, 44100.0).unwrap()).unwrap();
/// assert_eq!(stems.len(), 4);
/// assert_eq!(stems[0].kind(), StemKind::Voice);
/// ```
#[derive(Debug, Clone)]
pub struct StemSeparator {
    mode: SeparationMode,
    stft: OverlapAdd,
    sensitivity: f32,
    hints: Option<VoiceHints>,
    cancel: CancelToken,
}

impl StemSeparator {
    /// Separator for `settings`. Sensitivity is clamped to `[0, 0.99]`.
    pub fn new(settings: &SeparationSettings) -> Result<Self> {
        Ok(Self {
            mode: settings.mode,
            stft: OverlapAdd::new(settings.frame_size, settings.hop_size, settings.window)?,
            sensitivity: settings.sensitivity.clamp(0.0, MAX_SENSITIVITY),
            hints: None,
            cancel: CancelToken::new(),
        })
    }

    /// Check `cancel` between frames.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Bias voice and vocal confidence with detector hints.
    pub fn with_voice_hints(mut self, hints: VoiceHints) -> Self {
        self.hints = Some(hints);
        self
    }

    /// Coarse or fine.
    pub fn mode(&self) -> SeparationMode {
        self.mode
    }

    /// Stems this separator produces, in output order.
    pub fn stem_kinds(&self) -> [StemKind; 4] {
        self.mode.stems()
    }

    /// Analysis frame size; shorter buffers pass through.
    pub fn frame_size(&self) -> usize {
        self.stft.frame_size()
    }

    /// Effective sensitivity.
    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// Analyze the mix the masks are built from.
    pub fn analyze(&self, buffer: &PcmBuffer) -> Result<MixProfile> {
        MixProfile::analyze(buffer, self.frame_size())
    }

    /// Separate into every stem of the mode.
    pub fn separate(&self, buffer: &PcmBuffer) -> Result<Vec<Stem>> {
        self.separate_with_progress(buffer, &mut NoProgress)
    }

    /// Separate into every stem of the mode, reporting phases to `progress`.
    pub fn separate_with_progress(
        &self,
        buffer: &PcmBuffer,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<Stem>> {
        let kinds = self.stem_kinds();
        if buffer.len() < self.frame_size() {
            return Ok(kinds
                .iter()
                .map(|&kind| self.pass_through(kind, buffer, progress))
                .collect());
        }
        for &kind in &kinds {
            progress.report(event(kind, SeparationPhase::Analyzing, 0.0));
        }
        let profile = self.analyze(buffer)?;
        debug!(
            tonality = profile.tonality(),
            harmonicity = profile.harmonicity(),
            "separation: mix analyzed"
        );
        kinds
            .iter()
            .map(|&kind| self.separate_stem(buffer, kind, &profile, progress))
            .collect()
    }

    /// Extract one stem using a precomputed mix profile.
    pub fn separate_stem(
        &self,
        buffer: &PcmBuffer,
        kind: StemKind,
        profile: &MixProfile,
        progress: &mut dyn ProgressSink,
    ) -> Result<Stem> {
        if buffer.len() < self.frame_size() {
            return Ok(self.pass_through(kind, buffer, progress));
        }
        let started = Instant::now();

        progress.report(event(kind, SeparationPhase::Masking, 0.05));
        let mask = mask_for(kind, profile, self.sensitivity);
        debug!(stem = %kind, mean_gain = mask.mean(), "separation: mask built");

        let frames = self.stft.frame_count(buffer.len());
        let total = (frames * buffer.num_channels()).max(1);
        let sr = buffer.sample_rate();
        let audio = buffer.map_channels(|ch, samples| {
            self.stft
                .process(samples, sr, &self.cancel, |index, spectrum| {
                    if index % PROGRESS_EVERY == 0 {
                        let done = (ch * frames + index) as f32 / total as f32;
                        let fraction = 0.1 + 0.85 * done;
                        progress.report(event(kind, SeparationPhase::Synthesizing, fraction));
                    }
                    spectrum.apply_mask(&mask)
                })
                .map_err(|e| match e {
                    DspError::Cancelled => DspError::Cancelled,
                    other => DspError::processing(Stage::Separation, format!("{kind}: {other}")),
                })
        })?;

        progress.report(event(kind, SeparationPhase::Done, 1.0));
        info!(
            stem = %kind,
            frames,
            elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
            "stem separated"
        );
        Ok(self.describe(kind, audio).with_profile(mask))
    }

    fn pass_through(
        &self,
        kind: StemKind,
        buffer: &PcmBuffer,
        progress: &mut dyn ProgressSink,
    ) -> Stem {
        debug!(
            stem = %kind,
            len = buffer.len(),
            frame = self.frame_size(),
            "separation: buffer shorter than one frame, passing through"
        );
        progress.report(event(kind, SeparationPhase::Done, 1.0));
        self.describe(kind, buffer.clone())
    }

    fn describe(&self, kind: StemKind, audio: PcmBuffer) -> Stem {
        let duration = audio.duration_secs();
        let stem = Stem::new(kind, audio, self.frame_size());
        match &self.hints {
            Some(hints) => stem.with_confidence(hints.biased_confidence(kind, duration)),
            None => stem,
        }
    }
}
