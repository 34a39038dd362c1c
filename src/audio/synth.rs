//! Cue synthesizer
//!
//! Resolves a cue, renders it once, and hands the samples to an
//! [`AudioSink`]. Nothing here returns an error to the caller: every call
//! reports a [`PlayOutcome`] and failures are logged.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::Instant;

use crate::error::AudioError;

use super::config::{clamp_unit, SynthConfig};
use super::cooldown::CooldownLedger;
use super::cues::{cue_for_class, Cue, CueRegistry};
use super::sink::AudioSink;
use super::waveform::render;

/// Confidence assumed when none is reported
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// What happened to a play request
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// Queued on the sink at this gain (master volume included)
    Played { cue: Cue, volume: f32 },
    /// Same class played less than one cooldown window ago
    CooledDown,
    /// Sound is switched off
    Disabled,
    Failed(AudioError),
}

impl PlayOutcome {
    pub fn is_played(&self) -> bool {
        matches!(self, PlayOutcome::Played { .. })
    }
}

/// Per-cue volume for a detection confidence
///
/// Missing or non-numeric confidence counts as [`DEFAULT_CONFIDENCE`].
pub fn volume_tier(confidence: Option<f32>) -> f32 {
    let confidence = confidence
        .filter(|c| c.is_finite())
        .unwrap_or(DEFAULT_CONFIDENCE);

    if confidence > 0.8 {
        1.0
    } else if confidence > 0.5 {
        0.7
    } else {
        0.5
    }
}

/// Procedural audio feedback
pub struct Synthesizer<S: AudioSink> {
    config: SynthConfig,
    sink: S,
    registry: CueRegistry,
    rendered: HashMap<Cue, Arc<[f32]>>,
    ledger: CooldownLedger,
    enabled: bool,
    master_volume: f32,
}

impl<S: AudioSink> Synthesizer<S> {
    pub fn new(config: SynthConfig, sink: S) -> Self {
        Self::with_registry(config, sink, CueRegistry::standard())
    }

    /// Synthesizer with a custom cue set
    pub fn with_registry(config: SynthConfig, sink: S, registry: CueRegistry) -> Self {
        Self {
            ledger: CooldownLedger::new(config.cooldown),
            enabled: config.enabled,
            master_volume: clamp_unit(config.master_volume),
            config,
            sink,
            registry,
            rendered: HashMap::new(),
        }
    }

    /// Play a cue by name at full per-cue volume
    pub fn play_cue(&mut self, name: &str) -> PlayOutcome {
        match Cue::from_name(name) {
            Some(cue) => self.play(cue, 1.0),
            None => {
                tracing::warn!(cue = name, "Unknown sound cue");
                PlayOutcome::Failed(AudioError::UnknownCue(name.to_string()))
            }
        }
    }

    /// Play a cue at `volume` (scaled by the master volume)
    pub fn play(&mut self, cue: Cue, volume: f32) -> PlayOutcome {
        if !self.enabled {
            return PlayOutcome::Disabled;
        }

        let samples = match self.samples(cue) {
            Some(samples) => samples,
            None => {
                tracing::warn!(%cue, "No waveform registered for cue");
                return PlayOutcome::Failed(AudioError::UnknownCue(cue.name().to_string()));
            }
        };

        let gain = clamp_unit(volume) * self.master_volume;
        match self.sink.play(samples, self.config.sample_rate, gain) {
            Ok(()) => {
                tracing::debug!(%cue, gain, "Played cue");
                PlayOutcome::Played { cue, volume: gain }
            }
            Err(e) => {
                tracing::warn!(%cue, error = %e, "Failed to play cue");
                PlayOutcome::Failed(e)
            }
        }
    }

    /// Play the cue for a detected class, subject to the class cooldown
    pub fn play_object_detection_sound(
        &mut self,
        class: &str,
        confidence: Option<f32>,
    ) -> PlayOutcome {
        self.play_object_detection_sound_at(class, confidence, Instant::now())
    }

    /// [`play_object_detection_sound`](Self::play_object_detection_sound) at an explicit time
    pub fn play_object_detection_sound_at(
        &mut self,
        class: &str,
        confidence: Option<f32>,
        now: Instant,
    ) -> PlayOutcome {
        if !self.enabled {
            return PlayOutcome::Disabled;
        }

        if !self.ledger.try_acquire(class, now) {
            tracing::debug!(class, "Detection cue cooling down");
            return PlayOutcome::CooledDown;
        }

        self.play(cue_for_class(class), volume_tier(confidence))
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Set the master volume, clamped to `[0, 1]`
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = clamp_unit(volume);
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Unlock the sink after a user gesture
    pub fn resume(&mut self) -> Result<(), AudioError> {
        if self.sink.is_ready() {
            return Ok(());
        }
        self.sink.resume().map_err(|e| {
            tracing::warn!(error = %e, "Failed to resume audio output");
            e
        })
    }

    pub fn is_ready(&self) -> bool {
        self.sink.is_ready()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn samples(&mut self, cue: Cue) -> Option<Arc<[f32]>> {
        if let Some(samples) = self.rendered.get(&cue) {
            return Some(samples.clone());
        }

        let waveform = self.registry.waveform(cue)?;
        let samples: Arc<[f32]> = Arc::from(render(
            waveform,
            self.config.sample_rate,
            self.config.fade_fraction,
        ));
        self.rendered.insert(cue, samples.clone());
        Some(samples)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::audio::sink::MemorySink;

    fn synth() -> (Synthesizer<MemorySink>, MemorySink) {
        let sink = MemorySink::resumed();
        let synth = Synthesizer::new(SynthConfig::new().master_volume(1.0), sink.clone());
        (synth, sink)
    }

    #[test]
    fn test_volume_tiers() {
        assert_eq!(volume_tier(Some(0.92)), 1.0);
        assert_eq!(volume_tier(Some(0.8)), 0.7);
        assert_eq!(volume_tier(Some(0.6)), 0.7);
        assert_eq!(volume_tier(Some(0.5)), 0.5);
        assert_eq!(volume_tier(Some(0.1)), 0.5);
        assert_eq!(volume_tier(None), 0.5);
        assert_eq!(volume_tier(Some(f32::NAN)), 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_cooldown() {
        let (mut synth, sink) = synth();

        assert!(synth.play_object_detection_sound("person", Some(0.92)).is_played());
        tokio::time::advance(Duration::from_millis(400)).await;
        assert_eq!(
            synth.play_object_detection_sound("person", Some(0.92)),
            PlayOutcome::CooledDown
        );
        assert_eq!(sink.play_count(), 1);

        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(synth.play_object_detection_sound("person", Some(0.92)).is_played());
        assert_eq!(sink.play_count(), 2);
    }

    #[test]
    fn test_class_maps_to_cue_and_volume() {
        let (mut synth, sink) = synth();
        let now = Instant::now();

        assert_eq!(
            synth.play_object_detection_sound_at("Truck", Some(0.6), now),
            PlayOutcome::Played {
                cue: Cue::Vehicle,
                volume: 0.7
            }
        );
        assert_eq!(
            synth.play_object_detection_sound_at("toaster", None, now),
            PlayOutcome::Played {
                cue: Cue::Object,
                volume: 0.5
            }
        );
        assert_eq!(sink.play_count(), 2);
    }

    #[test]
    fn test_master_volume_scales_gain() {
        let (mut synth, sink) = synth();
        synth.set_master_volume(0.5);

        synth.play_object_detection_sound_at("person", Some(0.95), Instant::now());
        assert_eq!(sink.plays()[0].gain, 0.5);

        synth.set_master_volume(7.0);
        assert_eq!(synth.master_volume(), 1.0);
    }

    #[test]
    fn test_disabled_plays_nothing() {
        let (mut synth, sink) = synth();
        synth.set_enabled(false);

        assert_eq!(synth.play_cue("alert"), PlayOutcome::Disabled);
        assert_eq!(
            synth.play_object_detection_sound_at("person", Some(0.9), Instant::now()),
            PlayOutcome::Disabled
        );
        assert_eq!(sink.play_count(), 0);

        // Disabled attempts do not start a cooldown
        synth.set_enabled(true);
        assert!(synth
            .play_object_detection_sound_at("person", Some(0.9), Instant::now())
            .is_played());
    }

    #[test]
    fn test_unknown_cue_fails_quietly() {
        let (mut synth, sink) = synth();

        assert_eq!(
            synth.play_cue("kazoo"),
            PlayOutcome::Failed(AudioError::UnknownCue("kazoo".into()))
        );
        assert_eq!(sink.play_count(), 0);
    }

    #[test]
    fn test_suspended_sink_until_resume() {
        let sink = MemorySink::new();
        let mut synth = Synthesizer::new(SynthConfig::default(), sink.clone());

        assert_eq!(
            synth.play_cue("click"),
            PlayOutcome::Failed(AudioError::NotInitialized)
        );

        synth.resume().unwrap();
        assert!(synth.is_ready());
        assert!(synth.play_cue("click").is_played());
        assert_eq!(sink.play_count(), 1);
    }

    #[test]
    fn test_rendered_samples_are_reused() {
        let (mut synth, sink) = synth();

        synth.play_cue("success");
        synth.play_cue("success");

        let plays = sink.plays();
        assert!(Arc::ptr_eq(&plays[0].samples, &plays[1].samples));
        assert_eq!(plays[0].sample_rate, 44_100);
    }
}
