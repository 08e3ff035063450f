//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `hearth.toml` in the working directory, or at the path in
//! `HEARTH_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use hearth_adapter_kasa::KasaConfig;
use hearth_adapter_konnected::KonnectedConfig;
use hearth_domain::accessory::AccessoryDefinition;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity reported by the HTTP API.
    pub bridge: BridgeConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    pub kasa: KasaConfig,
    pub konnected: KonnectedConfig,
    /// Accessories handed to their platform at startup.
    pub accessories: Vec<AccessoryDefinition>,
}

/// Bridge identity.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub name: String,
    pub id: String,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `hearth.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("HEARTH_CONFIG").unwrap_or_else(|_| "hearth.toml".to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HEARTH_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("HEARTH_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("HEARTH_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("HEARTH_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        for (index, def) in self.accessories.iter().enumerate() {
            def.validate()
                .map_err(|err| ConfigError::Validation(format!("accessory #{index}: {err}")))?;
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            name: "Hearth".to_string(),
            id: "CC:22:3D:E3:CE:30".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8581,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hearthd=info,hearth=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::zone::ZoneKind;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.bridge.name, "Hearth");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8581);
        assert_eq!(config.kasa, KasaConfig::default());
        assert_eq!(config.konnected, KonnectedConfig::default());
        assert!(config.accessories.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8581);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = r#"
            [bridge]
            name = "Cabin"
            id = "AA:BB:CC:DD:EE:FF"

            [server]
            host = '127.0.0.1'
            port = 9090

            [logging]
            filter = 'debug'

            [kasa]
            pull_rate_secs = 30
            discover = true

            [konnected]
            countdown_secs = 45

            [[accessories]]
            platform = "Kasa"
            name = "Porch Light"
            ip = "192.168.1.20"

            [[accessories.actions]]
            trigger = "On"
            platform = "Virtual"
            accessory = "Evening"
            verb = "SetRelayState"
            value = "on"

            [[accessories]]
            platform = "Konnected"
            name = "Alarm"
            address = "192.168.1.30"
            username = "8cf3eb123456"
            password = "secret"
            zones = [
                { pin = 1, name = "Hall", type = "motion" },
                { pin = 2, name = "Front", type = "door" },
                { pin = 5, type = "buzzer" },
            ]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bridge.name, "Cabin");
        assert_eq!(config.bridge.id, "AA:BB:CC:DD:EE:FF");
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.kasa.pull_rate_secs, 30);
        assert!(config.kasa.discover);
        assert_eq!(config.kasa.port, 9999);
        assert_eq!(config.konnected.countdown_secs, 45);
        assert_eq!(config.konnected.max_ring_secs, 300);

        let plug = &config.accessories[0];
        assert_eq!(plug.address, "192.168.1.20");
        assert_eq!(plug.actions.len(), 1);
        assert_eq!(plug.actions[0].target_accessory, "Evening");

        let alarm = &config.accessories[1];
        assert_eq!(alarm.password.as_deref(), Some("secret"));
        assert_eq!(alarm.zones.len(), 3);
        assert_eq!(alarm.zones[1].kind, ZoneKind::Contact);
        assert_eq!(alarm.zones[2].kind, ZoneKind::Buzzer);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 8581);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_accessory_without_name() {
        let mut config = Config::default();
        config.accessories.push(AccessoryDefinition {
            platform: "Virtual".to_string(),
            ..AccessoryDefinition::default()
        });

        let err = config.validate().unwrap_err();

        assert!(matches!(err, ConfigError::Validation(msg) if msg.starts_with("accessory #0")));
    }

    #[test]
    fn should_accept_valid_config() {
        let mut config = Config::default();
        config.accessories.push(AccessoryDefinition {
            platform: "Virtual".to_string(),
            name: "Scene".to_string(),
            ..AccessoryDefinition::default()
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_format_custom_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
