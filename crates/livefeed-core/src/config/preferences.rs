use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::defaults;

/// Connection preferences
///
/// Every field has a default, so a partial preferences file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Host name or IP of the telemetry bridge
    pub robot_address: String,

    /// TCP port of the telemetry bridge
    pub port: u16,

    /// Delay before a reconnect attempt (milliseconds)
    pub reconnect_delay_ms: u64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            robot_address: defaults::DEFAULT_ROBOT_ADDRESS.to_string(),
            port: defaults::DEFAULT_PORT,
            reconnect_delay_ms: defaults::DEFAULT_RECONNECT_DELAY_MS,
        }
    }
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.robot_address = address.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_reconnect_delay_ms(mut self, delay_ms: u64) -> Self {
        self.reconnect_delay_ms = delay_ms;
        self
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// `host:port` for socket connection
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.robot_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.robot_address, "127.0.0.1");
        assert_eq!(prefs.port, 5809);
        assert_eq!(prefs.reconnect_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let prefs: Preferences = serde_json::from_str(r#"{"robot_address":"10.0.0.2"}"#).unwrap();
        assert_eq!(prefs.robot_address, "10.0.0.2");
        assert_eq!(prefs.port, 5809);
        assert_eq!(prefs.reconnect_delay_ms, 500);
    }

    #[test]
    fn test_builder_and_socket_address() {
        let prefs = Preferences::new()
            .with_address("robot.local")
            .with_port(9000)
            .with_reconnect_delay_ms(250);
        assert_eq!(prefs.socket_address(), "robot.local:9000");
        assert_eq!(prefs.reconnect_delay(), Duration::from_millis(250));
    }
}
