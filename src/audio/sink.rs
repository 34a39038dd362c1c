//! Audio output seam
//!
//! Output devices typically start suspended and only unlock after a user
//! gesture, so a sink reports readiness and is resumed explicitly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::AudioError;

/// Destination for rendered cues
pub trait AudioSink: Send + 'static {
    /// Whether the output is unlocked
    fn is_ready(&self) -> bool;

    /// Unlock the output
    fn resume(&mut self) -> Result<(), AudioError>;

    /// Queue mono samples for playback at `gain` and return immediately
    fn play(&mut self, samples: Arc<[f32]>, sample_rate: u32, gain: f32) -> Result<(), AudioError>;
}

/// One recorded playback
#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
    pub gain: f32,
}

/// Sink that records playbacks instead of making sound
///
/// Clones share the same record, so a test can keep one while the engine
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    ready: Arc<AtomicBool>,
    plays: Arc<Mutex<Vec<Playback>>>,
}

impl MemorySink {
    /// Sink that starts suspended
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that is already unlocked
    pub fn resumed() -> Self {
        let sink = Self::default();
        sink.ready.store(true, Ordering::SeqCst);
        sink
    }

    /// Everything played so far
    pub fn plays(&self) -> Vec<Playback> {
        match self.plays.lock() {
            Ok(plays) => plays.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn play_count(&self) -> usize {
        self.plays().len()
    }
}

impl AudioSink for MemorySink {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn play(&mut self, samples: Arc<[f32]>, sample_rate: u32, gain: f32) -> Result<(), AudioError> {
        if !self.is_ready() {
            return Err(AudioError::NotInitialized);
        }

        let playback = Playback {
            samples,
            sample_rate,
            gain,
        };
        match self.plays.lock() {
            Ok(mut plays) => plays.push(playback),
            Err(poisoned) => poisoned.into_inner().push(playback),
        }
        Ok(())
    }
}

/// Sink that discards everything, for hosts without audio
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn is_ready(&self) -> bool {
        true
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn play(&mut self, _samples: Arc<[f32]>, _sample_rate: u32, _gain: f32) -> Result<(), AudioError> {
        Ok(())
    }
}
