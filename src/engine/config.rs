//! Engine configuration

use crate::audio::SynthConfig;
use crate::session::SessionConfig;

/// Engine configuration options
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Transport session settings
    pub session: SessionConfig,

    /// Audio cue settings
    pub synth: SynthConfig,

    /// Dashboard event buffer; slow subscribers lag past it
    pub event_capacity: usize,

    /// Queue depth for user commands
    pub command_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            synth: SynthConfig::default(),
            event_capacity: 256,
            command_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// Create a config around the given session settings
    pub fn with_session(session: SessionConfig) -> Self {
        Self {
            session,
            ..Default::default()
        }
    }

    /// Set the audio settings
    pub fn synth(mut self, synth: SynthConfig) -> Self {
        self.synth = synth;
        self
    }

    /// Set the dashboard event buffer (at least 1)
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Set the command queue depth (at least 1)
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = EngineConfig::with_session(SessionConfig::with_url("ws://cams:8000/ws"))
            .event_capacity(0)
            .command_capacity(8);

        assert_eq!(config.session.url, "ws://cams:8000/ws");
        assert_eq!(config.event_capacity, 1);
        assert_eq!(config.command_capacity, 8);
        assert_eq!(config.synth.sample_rate, 44_100);
    }
}
