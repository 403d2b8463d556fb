use emg_core::{EmgError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure parsed from `emg.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Visible history window.
    pub window: WindowConfig,
    /// Where readings come from.
    pub endpoint: EndpointConfig,
    /// Reconnect timing.
    pub reconnect: ReconnectPolicy,
    /// Terminal chart settings.
    pub render: RenderConfig,
}

impl MonitorConfig {
    /// Reject settings no session could run with.
    ///
    /// Endpoint URL syntax is checked when the link endpoint is built.
    pub fn validate(&self) -> Result<()> {
        if self.window.capacity == 0 {
            return Err(EmgError::Config("window.capacity must be at least 1".into()));
        }
        if self.endpoint.url.trim().is_empty() {
            return Err(EmgError::Config("endpoint.url must not be empty".into()));
        }
        if self.endpoint.event.trim().is_empty() {
            return Err(EmgError::Config("endpoint.event must not be empty".into()));
        }
        self.reconnect.validate()
    }
}

/// Window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Number of most-recent readings kept for display.
    pub capacity: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

/// Remote Socket.IO endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Server URL (`http` or `ws`).  A path selects a namespace.
    pub url: String,
    /// Event name carrying one reading per emit.
    pub event: String,
    /// Engine.IO mount path on the server.
    pub path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url:   "http://localhost:5000".to_string(),
            event: "emg_data".to_string(),
            path:  "/socket.io/".to_string(),
        }
    }
}

/// Reconnect backoff and connect timeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub initial_delay_ms: u64,
    /// Upper bound for any single retry delay.
    pub max_delay_ms: u64,
    /// Give up after this many consecutive failures.  Absent = retry forever.
    pub max_attempts: Option<u32>,
    /// Budget for one dial plus handshake.
    pub timeout_ms: u64,
    /// Randomization factor in `[0, 1]` applied to every delay.
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms:     5_000,
            max_attempts:     None,
            timeout_ms:       20_000,
            jitter:           0.5,
        }
    }
}

impl ReconnectPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.initial_delay_ms == 0 {
            return Err(EmgError::Config("reconnect.initial_delay_ms must be positive".into()));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(EmgError::Config(format!(
                "reconnect.max_delay_ms ({}) is below initial_delay_ms ({})",
                self.max_delay_ms, self.initial_delay_ms
            )));
        }
        if self.timeout_ms == 0 {
            return Err(EmgError::Config("reconnect.timeout_ms must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(EmgError::Config(format!(
                "reconnect.jitter must be within [0, 1], got {}",
                self.jitter
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    #[must_use]
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Terminal chart settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Decimal places for value, peak and mean.
    pub precision: usize,
    /// Draw a sparkline of the window next to the numbers.
    pub sparkline: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            precision: 2,
            sparkline: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = MonitorConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.window.capacity, 100);
        assert_eq!(cfg.reconnect.initial_delay(), Duration::from_secs(1));
        assert_eq!(cfg.reconnect.max_delay(), Duration::from_secs(5));
        assert_eq!(cfg.reconnect.timeout(), Duration::from_secs(20));
        assert_eq!(cfg.reconnect.max_attempts, None);
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_keys() {
        let cfg: MonitorConfig = toml::from_str(
            r#"
            [window]
            capacity = 60

            [endpoint]
            url = "http://sensor.local:5000"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.window.capacity, 60);
        assert_eq!(cfg.endpoint.url, "http://sensor.local:5000");
        assert_eq!(cfg.endpoint.event, "emg_data");
        assert_eq!(cfg.reconnect, ReconnectPolicy::default());
    }

    #[test]
    fn bounded_attempts_parse() {
        let cfg: MonitorConfig = toml::from_str("[reconnect]\nmax_attempts = 3\n").unwrap();
        assert_eq!(cfg.reconnect.max_attempts, Some(3));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut cfg = MonitorConfig::default();
        cfg.window.capacity = 0;
        assert!(matches!(cfg.validate(), Err(EmgError::Config(_))));
    }

    #[test]
    fn negative_capacity_fails_to_parse() {
        let parsed: std::result::Result<MonitorConfig, _> =
            toml::from_str("[window]\ncapacity = -5\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn inverted_delays_are_rejected() {
        let policy = ReconnectPolicy {
            initial_delay_ms: 5_000,
            max_delay_ms: 1_000,
            ..ReconnectPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn jitter_out_of_range_is_rejected() {
        let policy = ReconnectPolicy {
            jitter: 1.5,
            ..ReconnectPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn blank_url_is_rejected() {
        let mut cfg = MonitorConfig::default();
        cfg.endpoint.url = "  ".into();
        assert!(cfg.validate().is_err());
    }
}
