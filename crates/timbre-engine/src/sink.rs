//! Forwarding progress events to another thread.

use crossbeam_channel::Sender;
use timbre_core::{ProgressEvent, ProgressSink, StemKind};

/// Sends every event down a channel.
///
/// A disconnected receiver is ignored: nobody is listening, so the work
/// carries on. Events without a stem get `stem` attached when set.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Option<Sender<ProgressEvent>>,
    stem: Option<StemKind>,
}

impl ChannelSink {
    /// Sink over `sender`; `None` drops everything.
    pub fn new(sender: Option<Sender<ProgressEvent>>) -> Self {
        Self { sender, stem: None }
    }

    /// Tag untagged events with `stem`.
    pub fn for_stem(&self, stem: StemKind) -> Self {
        Self {
            sender: self.sender.clone(),
            stem: Some(stem),
        }
    }
}

impl ProgressSink for ChannelSink {
    fn report(&mut self, event: ProgressEvent) {
        let event = match (event.stem, self.stem) {
            (None, Some(stem)) => event.for_stem(stem),
            _ => event,
        };
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
