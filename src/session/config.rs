//! Session configuration

use std::time::Duration;

/// Default keepalive cadence
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Transport session configuration options
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Endpoint URL, e.g. `ws://localhost:8000/ws`
    pub url: String,

    /// Client id appended to the URL path when set (`.../ws/{client_id}`)
    pub client_id: Option<String>,

    /// Interval between keepalive probes
    pub keepalive_interval: Duration,

    /// Outbound queue depth; sends beyond it are refused, never awaited
    pub outbound_capacity: usize,

    /// Inbound event queue depth
    pub inbound_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8000/ws".into(),
            client_id: None,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            outbound_capacity: 64,
            inbound_capacity: 256,
        }
    }
}

impl SessionConfig {
    /// Create a config for the given endpoint
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the client id
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Set the keepalive interval (at least 1 ms)
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Set the outbound queue depth (at least 1)
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity.max(1);
        self
    }

    /// Set the inbound queue depth (at least 1)
    pub fn inbound_capacity(mut self, capacity: usize) -> Self {
        self.inbound_capacity = capacity.max(1);
        self
    }

    /// URL actually dialled
    pub fn endpoint(&self) -> String {
        match &self.client_id {
            Some(id) => format!("{}/{}", self.url.trim_end_matches('/'), id),
            None => self.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();

        assert_eq!(config.keepalive_interval, Duration::from_secs(30));
        assert_eq!(config.endpoint(), "ws://127.0.0.1:8000/ws");
        assert!(config.client_id.is_none());
    }

    #[test]
    fn test_endpoint_with_client_id() {
        let config = SessionConfig::with_url("ws://example.test/ws/").client_id("dash-1");

        assert_eq!(config.endpoint(), "ws://example.test/ws/dash-1");
    }

    #[test]
    fn test_builder_clamps() {
        let config = SessionConfig::default()
            .keepalive_interval(Duration::ZERO)
            .outbound_capacity(0)
            .inbound_capacity(0);

        assert_eq!(config.keepalive_interval, Duration::from_millis(1));
        assert_eq!(config.outbound_capacity, 1);
        assert_eq!(config.inbound_capacity, 1);
    }
}
