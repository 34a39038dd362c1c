//! Waveform descriptors and rendering
//!
//! A cue is described, not recorded: a [`Waveform`] says which frequencies
//! to play, for how long, with which [`Oscillator`]. [`render`] turns it into
//! mono `f32` samples in `[-1, 1]`.
//!
//! Every note gets a linear fade-in and fade-out so it starts and ends at
//! zero amplitude. Sequence notes are enveloped one by one.

use std::f32::consts::TAU;

/// Periodic wave shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Oscillator {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Oscillator {
    /// Value at `phase` (cycles, fractional part used)
    pub fn sample(self, phase: f32) -> f32 {
        let p = phase.fract();
        match self {
            Oscillator::Sine => (TAU * p).sin(),
            Oscillator::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Oscillator::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Oscillator::Sawtooth => 2.0 * p - 1.0,
        }
    }
}

/// One step of a sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Pitch in Hz
    pub frequency: f32,
    /// Length in seconds
    pub duration: f32,
}

impl Note {
    pub const fn new(frequency: f32, duration: f32) -> Self {
        Self {
            frequency,
            duration,
        }
    }
}

/// Procedural cue description
#[derive(Debug, Clone, PartialEq)]
pub enum Waveform {
    /// A single pitch
    Tone {
        frequency: f32,
        duration: f32,
        oscillator: Oscillator,
    },
    /// Several pitches at once, summed and normalized
    Chord {
        frequencies: Vec<f32>,
        duration: f32,
        oscillator: Oscillator,
    },
    /// Pitches back to back
    Sequence {
        notes: Vec<Note>,
        oscillator: Oscillator,
    },
}

impl Waveform {
    pub fn tone(frequency: f32, duration: f32, oscillator: Oscillator) -> Self {
        Waveform::Tone {
            frequency,
            duration,
            oscillator,
        }
    }

    pub fn chord(frequencies: &[f32], duration: f32, oscillator: Oscillator) -> Self {
        Waveform::Chord {
            frequencies: frequencies.to_vec(),
            duration,
            oscillator,
        }
    }

    pub fn sequence(notes: &[(f32, f32)], oscillator: Oscillator) -> Self {
        Waveform::Sequence {
            notes: notes.iter().map(|&(f, d)| Note::new(f, d)).collect(),
            oscillator,
        }
    }

    /// Total length in seconds
    pub fn duration(&self) -> f32 {
        match self {
            Waveform::Tone { duration, .. } | Waveform::Chord { duration, .. } => duration.max(0.0),
            Waveform::Sequence { notes, .. } => notes.iter().map(|n| n.duration.max(0.0)).sum(),
        }
    }
}

/// Render a waveform to mono samples
pub fn render(waveform: &Waveform, sample_rate: u32, fade_fraction: f32) -> Vec<f32> {
    match waveform {
        Waveform::Tone {
            frequency,
            duration,
            oscillator,
        } => render_note(&[*frequency], *duration, *oscillator, sample_rate, fade_fraction),
        Waveform::Chord {
            frequencies,
            duration,
            oscillator,
        } => render_note(frequencies, *duration, *oscillator, sample_rate, fade_fraction),
        Waveform::Sequence { notes, oscillator } => notes
            .iter()
            .flat_map(|note| {
                render_note(
                    &[note.frequency],
                    note.duration,
                    *oscillator,
                    sample_rate,
                    fade_fraction,
                )
            })
            .collect(),
    }
}

fn render_note(
    frequencies: &[f32],
    duration: f32,
    oscillator: Oscillator,
    sample_rate: u32,
    fade_fraction: f32,
) -> Vec<f32> {
    if frequencies.is_empty() || !duration.is_finite() || duration <= 0.0 {
        return Vec::new();
    }

    let rate = sample_rate as f32;
    let len = (duration * rate).round() as usize;
    let norm = 1.0 / frequencies.len() as f32;

    (0..len)
        .map(|i| {
            let t = i as f32 / rate;
            let sum: f32 = frequencies
                .iter()
                .map(|f| oscillator.sample(f * t))
                .sum();
            sum * norm * envelope(i, len, fade_fraction)
        })
        .collect()
}

/// Linear fade-in/fade-out gain for sample `i` of `len`
///
/// Zero at the first and last sample, one in the sustained middle.
pub fn envelope(i: usize, len: usize, fade_fraction: f32) -> f32 {
    if len < 2 {
        return 0.0;
    }

    let last = (len - 1) as f32;
    let fade = (last * fade_fraction.clamp(0.0, 0.5)).max(1.0);
    let i = i as f32;

    (i / fade).min((last - i) / fade).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 44_100;

    #[test]
    fn test_tone_length_and_bounds() {
        let samples = render(&Waveform::tone(440.0, 0.1, Oscillator::Sine), RATE, 0.1);

        assert_eq!(samples.len(), 4410);
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_boundaries_are_silent() {
        for oscillator in [
            Oscillator::Sine,
            Oscillator::Square,
            Oscillator::Triangle,
            Oscillator::Sawtooth,
        ] {
            let samples = render(&Waveform::tone(523.25, 0.05, oscillator), RATE, 0.1);
            assert_eq!(samples[0], 0.0);
            assert_eq!(*samples.last().unwrap(), 0.0);
        }
    }

    #[test]
    fn test_sequence_notes_enveloped_independently() {
        let waveform = Waveform::sequence(&[(440.0, 0.01), (880.0, 0.01)], Oscillator::Square);
        let samples = render(&waveform, RATE, 0.1);

        assert_eq!(samples.len(), 882);
        // End of the first note and start of the second are both silent
        assert_eq!(samples[440], 0.0);
        assert_eq!(samples[441], 0.0);
        assert!((waveform.duration() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_chord_is_normalized() {
        let waveform = Waveform::chord(&[100.0, 100.0, 100.0], 0.05, Oscillator::Square);
        let samples = render(&waveform, RATE, 0.1);

        let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= 1.0 + 1e-6);
        assert!(peak > 0.99);
    }

    #[test]
    fn test_empty_or_zero_length() {
        assert!(render(&Waveform::chord(&[], 0.1, Oscillator::Sine), RATE, 0.1).is_empty());
        assert!(render(&Waveform::tone(440.0, 0.0, Oscillator::Sine), RATE, 0.1).is_empty());
    }

    #[test]
    fn test_envelope_shape() {
        assert_eq!(envelope(0, 101, 0.1), 0.0);
        assert_eq!(envelope(100, 101, 0.1), 0.0);
        assert_eq!(envelope(50, 101, 0.1), 1.0);
        assert!((envelope(5, 101, 0.1) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_oscillator_shapes() {
        assert_eq!(Oscillator::Square.sample(0.25), 1.0);
        assert_eq!(Oscillator::Square.sample(0.75), -1.0);
        assert_eq!(Oscillator::Sawtooth.sample(0.0), -1.0);
        assert_eq!(Oscillator::Triangle.sample(0.5), 1.0);
        assert!(Oscillator::Sine.sample(0.0).abs() < 1e-6);
    }
}
