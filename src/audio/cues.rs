//! Cue registry
//!
//! Named cues and the table that maps detected object classes onto them.
//! Classes the table does not know fall back to [`Cue::Object`].

use std::collections::HashMap;
use std::fmt;

use super::waveform::{Oscillator, Waveform};

/// Symbolic cue name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cue {
    Person,
    Vehicle,
    Bicycle,
    Animal,
    Bird,
    /// Fallback for unrecognized classes
    Object,
    Click,
    Alert,
    Success,
    Error,
    Notification,
    CameraStart,
    CameraStop,
}

impl Cue {
    pub const ALL: [Cue; 13] = [
        Cue::Person,
        Cue::Vehicle,
        Cue::Bicycle,
        Cue::Animal,
        Cue::Bird,
        Cue::Object,
        Cue::Click,
        Cue::Alert,
        Cue::Success,
        Cue::Error,
        Cue::Notification,
        Cue::CameraStart,
        Cue::CameraStop,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Cue::Person => "person",
            Cue::Vehicle => "vehicle",
            Cue::Bicycle => "bicycle",
            Cue::Animal => "animal",
            Cue::Bird => "bird",
            Cue::Object => "object",
            Cue::Click => "click",
            Cue::Alert => "alert",
            Cue::Success => "success",
            Cue::Error => "error",
            Cue::Notification => "notification",
            Cue::CameraStart => "camera_start",
            Cue::CameraStop => "camera_stop",
        }
    }

    /// Look a cue up by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Cue> {
        Cue::ALL
            .into_iter()
            .find(|cue| cue.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Object class → cue, matched case-insensitively
const CLASS_CUES: &[(&str, Cue)] = &[
    ("person", Cue::Person),
    ("car", Cue::Vehicle),
    ("truck", Cue::Vehicle),
    ("bus", Cue::Vehicle),
    ("motorcycle", Cue::Vehicle),
    ("train", Cue::Vehicle),
    ("vehicle", Cue::Vehicle),
    ("bicycle", Cue::Bicycle),
    ("dog", Cue::Animal),
    ("cat", Cue::Animal),
    ("horse", Cue::Animal),
    ("sheep", Cue::Animal),
    ("cow", Cue::Animal),
    ("elephant", Cue::Animal),
    ("bear", Cue::Animal),
    ("zebra", Cue::Animal),
    ("giraffe", Cue::Animal),
    ("animal", Cue::Animal),
    ("bird", Cue::Bird),
];

/// Cue for a detected class
pub fn cue_for_class(class: &str) -> Cue {
    let class = class.trim();
    CLASS_CUES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(class))
        .map(|(_, cue)| *cue)
        .unwrap_or(Cue::Object)
}

/// Waveform for every cue
#[derive(Debug, Clone)]
pub struct CueRegistry {
    waveforms: HashMap<Cue, Waveform>,
}

impl Default for CueRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CueRegistry {
    /// Registry with the built-in cue set
    pub fn standard() -> Self {
        use Oscillator::*;

        let waveforms = HashMap::from([
            (Cue::Person, Waveform::sequence(&[(659.25, 0.1), (880.0, 0.15)], Sine)),
            (Cue::Vehicle, Waveform::tone(220.0, 0.3, Sawtooth)),
            (
                Cue::Bicycle,
                Waveform::sequence(&[(1046.5, 0.08), (1318.5, 0.08)], Triangle),
            ),
            (Cue::Animal, Waveform::chord(&[440.0, 554.37], 0.25, Triangle)),
            (
                Cue::Bird,
                Waveform::sequence(&[(1568.0, 0.06), (1760.0, 0.06), (1568.0, 0.06)], Sine),
            ),
            (Cue::Object, Waveform::tone(523.25, 0.15, Sine)),
            (Cue::Click, Waveform::tone(1000.0, 0.03, Square)),
            (
                Cue::Alert,
                Waveform::sequence(&[(880.0, 0.15), (660.0, 0.15), (880.0, 0.15)], Square),
            ),
            (
                Cue::Success,
                Waveform::chord(&[523.25, 659.25, 783.99], 0.3, Sine),
            ),
            (Cue::Error, Waveform::tone(200.0, 0.3, Sawtooth)),
            (
                Cue::Notification,
                Waveform::sequence(&[(659.25, 0.1), (783.99, 0.15)], Sine),
            ),
            (
                Cue::CameraStart,
                Waveform::sequence(&[(440.0, 0.08), (660.0, 0.12)], Triangle),
            ),
            (
                Cue::CameraStop,
                Waveform::sequence(&[(660.0, 0.08), (440.0, 0.12)], Triangle),
            ),
        ]);

        Self { waveforms }
    }

    /// Waveform registered for a cue
    pub fn waveform(&self, cue: Cue) -> Option<&Waveform> {
        self.waveforms.get(&cue)
    }

    /// Replace a cue's waveform
    pub fn insert(&mut self, cue: Cue, waveform: Waveform) -> Option<Waveform> {
        self.waveforms.insert(cue, waveform)
    }

    /// Remove a cue
    pub fn remove(&mut self, cue: Cue) -> Option<Waveform> {
        self.waveforms.remove(&cue)
    }
}
