//! Arena configuration: relay ports, chat limits and engine strength.

use derive_getters::Getters;
use derive_more::{Display, Error};
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tictactoe_core::{DEFAULT_BLUNDER_RATE, EngineError, RandomThrottle};
use tracing::{debug, info, instrument};

/// Top-level configuration, one TOML table per concern.
#[derive(Debug, Clone, PartialEq, Default, Getters, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Relay server settings.
    #[serde(default)]
    relay: RelayConfig,

    /// Computer opponent settings.
    #[serde(default)]
    engine: EngineConfig,
}

/// `[relay]` table.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Game connections (newline-delimited JSON over TCP).
    #[serde(default = "default_port")]
    port: u16,

    /// HTTP status API.
    #[serde(default = "default_http_port")]
    http_port: u16,

    /// Longest chat line relayed, in characters.
    #[serde(default = "default_max_chat_len")]
    max_chat_len: usize,
}

/// `[engine]` table.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Chance the computer plays a random cell instead of searching.
    #[serde(default = "default_blunder_rate")]
    blunder_rate: f64,

    /// Fixed seed for reproducible games.
    #[serde(default)]
    seed: Option<u64>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_http_port() -> u16 {
    3001
}

fn default_max_chat_len() -> usize {
    280
}

fn default_blunder_rate() -> f64 {
    DEFAULT_BLUNDER_RATE
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            http_port: default_http_port(),
            max_chat_len: default_max_chat_len(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            blunder_rate: default_blunder_rate(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Builds the throttle this configuration describes.
    pub fn throttle(&self) -> Result<RandomThrottle<SmallRng>, EngineError> {
        match self.seed {
            Some(seed) => RandomThrottle::seeded(self.blunder_rate, seed),
            None => RandomThrottle::from_os(self.blunder_rate),
        }
    }
}

impl ArenaConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(port = config.relay.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise falls back to defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Applies `PORT` and `HTTP_PORT` from the environment.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(port) = lookup("PORT") {
            self.relay.port = parse_port("PORT", &port)?;
        }
        if let Some(port) = lookup("HTTP_PORT") {
            self.relay.http_port = parse_port("HTTP_PORT", &port)?;
        }
        Ok(self)
    }

    /// Applies command-line overrides. `None` keeps the current value.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        http_port: Option<u16>,
        blunder_rate: Option<f64>,
        seed: Option<u64>,
    ) -> Self {
        if let Some(host) = host {
            self.relay.host = host;
        }
        if let Some(port) = port {
            self.relay.port = port;
        }
        if let Some(http_port) = http_port {
            self.relay.http_port = http_port;
        }
        if let Some(rate) = blunder_rate {
            self.engine.blunder_rate = rate;
        }
        if seed.is_some() {
            self.engine.seed = seed;
        }
        self
    }

    /// Rejects settings that cannot run.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.engine.blunder_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::new(format!(
                "engine.blunder_rate must be between 0 and 1, got {}",
                rate
            )));
        }
        if self.relay.port == self.relay.http_port {
            return Err(ConfigError::new(format!(
                "relay.port and relay.http_port are both {}",
                self.relay.port
            )));
        }
        if self.relay.max_chat_len == 0 {
            return Err(ConfigError::new("relay.max_chat_len must be positive".to_string()));
        }
        Ok(())
    }

    /// `host:port` for game connections.
    pub fn relay_addr(&self) -> String {
        format!("{}:{}", self.relay.host, self.relay.port)
    }

    /// `host:http_port` for the status API.
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.relay.host, self.relay.http_port)
    }
}

#[track_caller]
fn parse_port(key: &str, value: &str) -> Result<u16, ConfigError> {
    match value.trim().parse() {
        Ok(port) => Ok(port),
        Err(e) => Err(ConfigError::new(format!(
            "{} is not a port ({:?}): {}",
            key, value, e
        ))),
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ArenaConfig::default();
        assert_eq!(*config.relay().port(), 3000);
        assert_eq!(*config.relay().http_port(), 3001);
        assert_eq!(*config.relay().max_chat_len(), 280);
        assert_eq!(*config.engine().blunder_rate(), 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_ports() {
        let config = ArenaConfig::default()
            .with_env(|key| match key {
                "PORT" => Some("4000".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(*config.relay().port(), 4000);
        assert_eq!(*config.relay().http_port(), 3001);
    }

    #[test]
    fn test_bad_env_port_rejected() {
        let err = ArenaConfig::default()
            .with_env(|key| (key == "HTTP_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(err.message.contains("HTTP_PORT"));
    }

    #[test]
    fn test_port_error_points_at_caller() {
        let (err, line) = (parse_port("PORT", "eighty").unwrap_err(), line!());
        assert_eq!(err.file, file!());
        assert_eq!(err.line, line);
    }

    #[test]
    fn test_cli_beats_env() {
        let config = ArenaConfig::default()
            .with_env(|key| (key == "PORT").then(|| "4000".to_string()))
            .unwrap()
            .with_overrides(None, Some(5000), None, Some(0.0), Some(9));
        assert_eq!(*config.relay().port(), 5000);
        assert_eq!(*config.engine().blunder_rate(), 0.0);
        assert_eq!(*config.engine().seed(), Some(9));
    }

    #[test]
    fn test_validation_failures() {
        let rate = ArenaConfig::default().with_overrides(None, None, None, Some(1.5), None);
        assert!(rate.validate().is_err());

        let ports = ArenaConfig::default().with_overrides(None, Some(3001), None, None, None);
        assert!(ports.validate().unwrap_err().message.contains("3001"));
    }
}
