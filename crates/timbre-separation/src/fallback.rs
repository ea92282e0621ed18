//! Model-backed separation with the DSP separator as fallback.
//!
//! A learned separator lives outside this crate. It plugs in through
//! [`ModelSeparator`]; when it reports [`DspError::ModelUnavailable`] the
//! request is served by the [`StemSeparator`] instead. Failures of the DSP
//! path are final.

use std::sync::Arc;

use timbre_core::{DspError, PcmBuffer, ProgressSink, Result};
use tracing::warn;

use crate::separator::StemSeparator;
use crate::stem::Stem;

/// An external separator, typically a model-serving client.
pub trait ModelSeparator: Send + Sync {
    /// Model name and version, for logs.
    fn model_name(&self) -> &str;

    /// Separate `buffer` into the stems of `separator`'s mode.
    ///
    /// Return [`DspError::ModelUnavailable`] to hand the request to the DSP
    /// path.
    fn separate(&self, buffer: &PcmBuffer, separator: &StemSeparator) -> Result<Vec<Stem>>;
}

/// Which path produced a set of stems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeparationSource {
    /// The named model.
    Model(String),
    /// The DSP separator.
    Dsp,
}

impl SeparationSource {
    /// Whether the stems came from a model.
    pub fn is_model(&self) -> bool {
        matches!(self, SeparationSource::Model(_))
    }
}

impl std::fmt::Display for SeparationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeparationSource::Model(name) => write!(f, "model:{name}"),
            SeparationSource::Dsp => f.write_str("dsp"),
        }
    }
}

/// Stems plus the path that produced them.
#[derive(Debug, Clone)]
pub struct SeparationOutput {
    /// Separated stems, in mode order.
    pub stems: Vec<Stem>,
    /// Producer.
    pub source: SeparationSource,
}

/// Tries a model first, then falls back to DSP.
pub struct FallbackSeparator {
    model: Option<Arc<dyn ModelSeparator>>,
    dsp: StemSeparator,
}

impl FallbackSeparator {
    /// DSP-only separator.
    pub fn new(dsp: StemSeparator) -> Self {
        Self { model: None, dsp }
    }

    /// Try `model` before the DSP path.
    pub fn with_model(mut self, model: Arc<dyn ModelSeparator>) -> Self {
        self.model = Some(model);
        self
    }

    /// The DSP separator.
    pub fn dsp(&self) -> &StemSeparator {
        &self.dsp
    }

    /// Separate, preferring the model.
    pub fn separate(
        &self,
        buffer: &PcmBuffer,
        progress: &mut dyn ProgressSink,
    ) -> Result<SeparationOutput> {
        self.separate_or(buffer, |dsp| dsp.separate_with_progress(buffer, progress))
    }

    /// Separate with the model, or hand the DSP separator to `dsp_path`
    /// when there is no model or it reports `ModelUnavailable`.
    pub fn separate_or<E, F>(
        &self,
        buffer: &PcmBuffer,
        dsp_path: F,
    ) -> std::result::Result<SeparationOutput, E>
    where
        E: From<DspError>,
        F: FnOnce(&StemSeparator) -> std::result::Result<Vec<Stem>, E>,
    {
        if let Some(model) = &self.model {
            match model.separate(buffer, &self.dsp) {
                Ok(stems) => {
                    return Ok(SeparationOutput {
                        stems,
                        source: SeparationSource::Model(model.model_name().to_string()),
                    });
                }
                Err(DspError::ModelUnavailable(reason)) => {
                    warn!(
                        model = model.model_name(),
                        %reason,
                        "model unavailable, using DSP separation"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(SeparationOutput {
            stems: dsp_path(&self.dsp)?,
            source: SeparationSource::Dsp,
        })
    }
}

impl std::fmt::Debug for FallbackSeparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackSeparator")
            .field("model", &self.model.as_ref().map(|m| m.model_name()))
            .field("dsp", &self.dsp)
            .finish()
    }
}
