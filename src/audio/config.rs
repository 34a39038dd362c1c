//! Synthesizer configuration

use std::time::Duration;

/// Default per-class cooldown
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1000);

/// Synthesizer configuration options
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,

    /// Minimum time between two detection cues of the same class
    pub cooldown: Duration,

    /// Global volume in `[0, 1]`, applied on top of per-cue volume
    pub master_volume: f32,

    /// Whether cues play at all
    pub enabled: bool,

    /// Share of each note spent fading in (and again fading out)
    pub fade_fraction: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            cooldown: DEFAULT_COOLDOWN,
            master_volume: 0.5,
            enabled: true,
            fade_fraction: 0.1,
        }
    }
}

impl SynthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sample rate (at least 8 kHz)
    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate.max(8_000);
        self
    }

    /// Set the cooldown window (at least 1 ms)
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown.max(Duration::from_millis(1));
        self
    }

    /// Set the master volume, clamped to `[0, 1]`
    pub fn master_volume(mut self, volume: f32) -> Self {
        self.master_volume = clamp_unit(volume);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the fade share, clamped to `[0.01, 0.5]`
    pub fn fade_fraction(mut self, fraction: f32) -> Self {
        self.fade_fraction = if fraction.is_finite() {
            fraction.clamp(0.01, 0.5)
        } else {
            0.1
        };
        self
    }
}

/// Clamp into `[0, 1]`; NaN becomes 0
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
