//! The engine: analysis, separation and enhancement on a worker pool.

use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Sender;
use rayon::prelude::*;
use timbre_analysis::{
    Framer, HarmonicAnalyzer, PsychoacousticAnalyzer, SpatialAnalyzer, SpectralAnalyzer,
    analyze_dynamics,
};
use timbre_config::{EngineConfig, SeparationMode, SeparationSettings};
use timbre_core::{CancelToken, PcmBuffer, ProgressEvent, ProgressSink, Stage, StemKind};
use timbre_effects::EnhancementChain;
use timbre_separation::{
    FallbackSeparator, MixProfile, ModelSeparator, Stem, StemSeparator, VoiceHints,
};
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::report::AnalysisReport;
use crate::sink::ChannelSink;

/// Options for one separation request.
#[derive(Debug, Clone, Default)]
pub struct SeparateRequest {
    /// Mode override; the config's mode when `None`.
    pub mode: Option<SeparationMode>,
    /// Speech hints biasing voice confidence.
    pub hints: Option<VoiceHints>,
    /// Skip the enhancement chains.
    pub skip_enhancement: bool,
}

impl SeparateRequest {
    /// Request for `mode`.
    pub fn mode(mode: SeparationMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    /// Attach voice hints.
    pub fn with_hints(mut self, hints: VoiceHints) -> Self {
        self.hints = Some(hints);
        self
    }

    /// Return stems without enhancement.
    pub fn without_enhancement(mut self) -> Self {
        self.skip_enhancement = true;
        self
    }
}

/// Runs analyses and per-stem pipelines in parallel.
///
/// # Example
///
/// ```rust
/// use timbre_config::EngineConfig;
/// use timbre_core::PcmBuffer;
/// use timbre_engine::Engine;
///
/// let engine = Engine::new(EngineConfig::default()).unwrap();
/// let tone: Vec<f32> = (0..8192)
///     .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
///     .collect();
/// let report = engine.analyze(&PcmBuffer::mono(tone, 44100.0).unwrap()).unwrap();
/// assert!(report.spatial.is_none());
/// ```
pub struct Engine {
    config: EngineConfig,
    pool: rayon::ThreadPool,
    cancel: CancelToken,
    model: Option<Arc<dyn ModelSeparator>>,
}

impl Engine {
    /// Validate `config` and start the worker pool.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads.unwrap_or(0))
            .thread_name(|i| format!("timbre-worker-{i}"))
            .build()?;
        debug!(threads = pool.current_num_threads(), "engine started");
        Ok(Self {
            config,
            pool,
            cancel: CancelToken::new(),
            model: None,
        })
    }

    /// Try `model` before DSP separation. A model reporting
    /// `ModelUnavailable` hands the request back to the DSP path.
    pub fn with_model(mut self, model: Box<dyn ModelSeparator>) -> Self {
        self.model = Some(Arc::from(model));
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Token that cancels every running and future request of this engine.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the five analyses of `buffer`.
    pub fn analyze(&self, buffer: &PcmBuffer) -> Result<AnalysisReport> {
        self.analyze_with_progress(buffer, None)
    }

    /// Run the five analyses in parallel, reporting each one's completion.
    ///
    /// Buffers shorter than the analysis FFT size are rejected.
    pub fn analyze_with_progress(
        &self,
        buffer: &PcmBuffer,
        progress: Option<Sender<ProgressEvent>>,
    ) -> Result<AnalysisReport> {
        let started = Instant::now();
        let settings = self.config.analysis;
        let sr = buffer.sample_rate();
        let spectrum = Framer::new(settings.fft_size)?.average_spectrum(&buffer.mixdown(), sr)?;
        self.cancel.check()?;

        let done = |stage: Stage| {
            let mut sink = ChannelSink::new(progress.clone());
            sink.report(ProgressEvent::new(stage, 1.0));
        };

        let ((spectral, psychoacoustic), ((spatial, dynamics), harmonic)) = self.pool.install(|| {
            rayon::join(
                || {
                    rayon::join(
                        || {
                            let result = SpectralAnalyzer::new()
                                .with_rolloff(settings.rolloff)
                                .with_peak_threshold(settings.peak_threshold)
                                .analyze(&spectrum);
                            done(Stage::SpectralAnalysis);
                            result
                        },
                        || {
                            let result = PsychoacousticAnalyzer::new(sr, settings.fft_size)
                                .and_then(|a| a.analyze(&spectrum));
                            done(Stage::PsychoacousticAnalysis);
                            result
                        },
                    )
                },
                || {
                    rayon::join(
                        || {
                            rayon::join(
                                || {
                                    let result = if buffer.num_channels() >= 2 {
                                        SpatialAnalyzer::new(settings.fft_size)
                                            .and_then(|a| a.analyze_buffer(buffer))
                                            .map(Some)
                                    } else {
                                        Ok(None)
                                    };
                                    done(Stage::SpatialAnalysis);
                                    result
                                },
                                || {
                                    let result = analyze_dynamics(buffer);
                                    done(Stage::DynamicsAnalysis);
                                    result
                                },
                            )
                        },
                        || {
                            let result = HarmonicAnalyzer::new().analyze(&spectrum);
                            done(Stage::HarmonicAnalysis);
                            result
                        },
                    )
                },
            )
        });

        let report = AnalysisReport {
            sample_rate: sr,
            channels: buffer.num_channels(),
            duration_secs: buffer.duration_secs(),
            spectral,
            psychoacoustic: psychoacoustic?,
            spatial: spatial?,
            dynamics: dynamics?,
            harmonic,
        };
        info!(
            elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
            "analysis complete"
        );
        Ok(report)
    }

    /// Separate and enhance `buffer` in the configured mode.
    pub fn separate(&self, buffer: &PcmBuffer) -> Result<Vec<Stem>> {
        self.separate_with(buffer, &SeparateRequest::default(), None)
    }

    /// Separate `buffer`, one stem per worker, then run each stem's
    /// enhancement chain on the same worker.
    ///
    /// With a model attached its stems are used instead and only enhanced.
    /// Stems come back in mode order. The first failure cancels nothing
    /// else but is returned once every worker finishes.
    pub fn separate_with(
        &self,
        buffer: &PcmBuffer,
        request: &SeparateRequest,
        progress: Option<Sender<ProgressEvent>>,
    ) -> Result<Vec<Stem>> {
        let started = Instant::now();
        let settings = SeparationSettings {
            mode: request.mode.unwrap_or(self.config.separation.mode),
            ..self.config.separation
        };
        let mut separator = StemSeparator::new(&settings)?.with_cancel(self.cancel.clone());
        if let Some(hints) = &request.hints {
            separator = separator.with_voice_hints(hints.clone());
        }
        let sink = ChannelSink::new(progress);

        let mut fallback = FallbackSeparator::new(separator);
        if let Some(model) = &self.model {
            fallback = fallback.with_model(Arc::clone(model));
        }
        let output =
            fallback.separate_or(buffer, |dsp| self.dsp_stems(dsp, buffer, request, &sink))?;
        let stems = if output.source.is_model() {
            self.finish_model_stems(output.stems, request, &sink)?
        } else {
            output.stems
        };
        info!(
            mode = %settings.mode,
            source = %output.source,
            stems = stems.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
            "separation complete"
        );
        Ok(stems)
    }

    fn dsp_stems(
        &self,
        separator: &StemSeparator,
        buffer: &PcmBuffer,
        request: &SeparateRequest,
        sink: &ChannelSink,
    ) -> Result<Vec<Stem>> {
        let profile = if buffer.len() >= separator.frame_size() {
            separator.analyze(buffer)?
        } else {
            let frame = separator.frame_size();
            MixProfile::from_parts(frame / 2, buffer.sample_rate() / frame as f32, 0.0, Vec::new())
        };

        let kinds = separator.stem_kinds();
        let stems: Vec<Result<Stem>> = self.pool.install(|| {
            kinds
                .par_iter()
                .map(|&kind| {
                    let mut stem_sink = sink.for_stem(kind);
                    let stem = separator.separate_stem(buffer, kind, &profile, &mut stem_sink)?;
                    if request.skip_enhancement {
                        return Ok(stem);
                    }
                    self.enhance_stem(stem, &mut stem_sink)
                })
                .collect()
        });
        stems.into_iter().collect()
    }

    fn finish_model_stems(
        &self,
        stems: Vec<Stem>,
        request: &SeparateRequest,
        sink: &ChannelSink,
    ) -> Result<Vec<Stem>> {
        if request.skip_enhancement {
            return Ok(stems);
        }
        let stems: Vec<Result<Stem>> = self.pool.install(|| {
            stems
                .into_par_iter()
                .map(|stem| {
                    let mut stem_sink = sink.for_stem(stem.kind());
                    self.enhance_stem(stem, &mut stem_sink)
                })
                .collect()
        });
        stems.into_iter().collect()
    }

    /// Chain for `kind` at `sample_rate`, from the config's settings.
    pub fn chain_for(&self, kind: StemKind, sample_rate: f32) -> Result<EnhancementChain> {
        let settings = self.config.enhancement_for(kind)?;
        Ok(EnhancementChain::build(&settings, sample_rate, self.cancel.clone())?)
    }

    /// Run `kind`'s enhancement chain over `buffer`.
    pub fn enhance(&self, kind: StemKind, buffer: &PcmBuffer) -> Result<PcmBuffer> {
        let mut chain = self.chain_for(kind, buffer.sample_rate())?;
        chain
            .process(buffer)
            .map_err(|source| EngineError::Enhancement { stem: kind, source })
    }

    fn enhance_stem(&self, stem: Stem, progress: &mut dyn ProgressSink) -> Result<Stem> {
        let kind = stem.kind();
        let settings = self.config.enhancement_for(kind)?;
        let sample_rate = stem.audio.sample_rate();
        let audio = EnhancementChain::build(&settings, sample_rate, self.cancel.clone())
            .and_then(|mut chain| chain.process_with_progress(&stem.audio, progress))
            .map_err(|source| EngineError::Enhancement { stem: kind, source })?;
        Ok(Stem { audio, ..stem })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("threads", &self.pool.current_num_threads())
            .field("model", &self.model.as_ref().map(|m| m.model_name()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timbre_core::DspError;

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            threads: Some(0),
            ..EngineConfig::default()
        };
        assert!(matches!(Engine::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn thread_count_is_honored() {
        let config = EngineConfig {
            threads: Some(2),
            ..EngineConfig::default()
        };
        assert_eq!(Engine::new(config).unwrap().pool.current_num_threads(), 2);
    }

    #[test]
    fn short_buffer_analysis_is_rejected() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let err = engine
            .analyze(&PcmBuffer::mono(vec![0.0; 100], 44100.0).unwrap())
            .unwrap_err();
        assert!(matches!(err, EngineError::Dsp(DspError::BufferTooShort { .. })));
    }
}
