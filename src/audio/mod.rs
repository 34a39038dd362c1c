//! Audio feedback synthesizer
//!
//! Short cues generated on demand, with no recorded assets:
//!
//! ```text
//!   class ──► cue_for_class ──► CueRegistry ──► render ──► AudioSink
//!               │                  (Waveform)    (f32)       │
//!               ▼                                             ▼
//!        CooldownLedger                              MemorySink / CpalSink
//!        (1 s per class)
//! ```
//!
//! Detection cues pass through a per-class cooldown and take their volume
//! from the detection confidence. Every gain is scaled by the master volume.

pub mod config;
pub mod cooldown;
#[cfg(feature = "cpal-output")]
pub mod cpal_sink;
pub mod cues;
pub mod sink;
pub mod synth;
pub mod waveform;

pub use config::SynthConfig;
pub use cooldown::CooldownLedger;
#[cfg(feature = "cpal-output")]
pub use cpal_sink::CpalSink;
pub use cues::{cue_for_class, Cue, CueRegistry};
pub use sink::{AudioSink, MemorySink, NullSink, Playback};
pub use synth::{volume_tier, PlayOutcome, Synthesizer};
pub use waveform::{render, Note, Oscillator, Waveform};
