//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, RoverError};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Controller input configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_rescan_interval_ms")]
    pub rescan_interval_ms: u64,

    /// Only accept gamepads whose name contains this (case-insensitive)
    #[serde(default)]
    pub name_filter: String,

    #[serde(default = "default_deadzone_stick")]
    pub deadzone_stick: f32,

    #[serde(default = "default_deadzone_trigger")]
    pub deadzone_trigger: f32,

    #[serde(default = "default_expo_drive")]
    pub expo_drive: f32,
}

/// Actuator command configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DriveConfig {
    #[serde(default = "default_max_command")]
    pub max_command: i32,
}

/// Frame timing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FrameConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Microcontroller endpoints; an absent endpoint means log-only
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TransportConfig {
    #[serde(default)]
    pub drive: Option<EndpointConfig>,

    #[serde(default)]
    pub arm: Option<EndpointConfig>,
}

/// One microcontroller endpoint
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EndpointConfig {
    /// UDP datagrams, one packet line per datagram
    Udp {
        address: String,
        #[serde(default = "default_udp_bind")]
        bind: String,
    },
    /// Serial line (USB CDC or UART)
    Serial {
        port: String,
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
    },
}

/// Frame recorder configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for the daily packet log; empty disables it
    #[serde(default)]
    pub packet_log_dir: String,
}

// Default value functions
fn default_rescan_interval_ms() -> u64 { 1000 }
fn default_deadzone_stick() -> f32 { 0.05 }
fn default_deadzone_trigger() -> f32 { 0.10 }
fn default_expo_drive() -> f32 { 0.0 }

fn default_max_command() -> i32 { 100 }

fn default_fps() -> u32 { 60 }
fn default_poll_interval_ms() -> u64 { 2 }

fn default_udp_bind() -> String { "0.0.0.0:0".to_string() }
fn default_baud_rate() -> u32 { 115200 }

fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

fn default_log_level() -> String { "info".to_string() }

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            rescan_interval_ms: default_rescan_interval_ms(),
            name_filter: String::new(),
            deadzone_stick: default_deadzone_stick(),
            deadzone_trigger: default_deadzone_trigger(),
            expo_drive: default_expo_drive(),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            max_command: default_max_command(),
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            packet_log_dir: String::new(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> RoverError {
    RoverError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rover_controller::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.input.rescan_interval_ms == 0 || self.input.rescan_interval_ms > 60000 {
            return Err(invalid("rescan_interval_ms must be between 1 and 60000"));
        }

        for (name, value) in [
            ("deadzone_stick", self.input.deadzone_stick),
            ("deadzone_trigger", self.input.deadzone_trigger),
        ] {
            if !(0.0..=0.25).contains(&value) {
                return Err(invalid(format!("{} must be between 0.0 and 0.25", name)));
            }
        }

        if !(0.0..=1.0).contains(&self.input.expo_drive) {
            return Err(invalid("expo_drive must be between 0.0 and 1.0"));
        }

        if self.drive.max_command < 1 || self.drive.max_command > 32767 {
            return Err(invalid("max_command must be between 1 and 32767"));
        }

        if self.frame.fps == 0 || self.frame.fps > 1000 {
            return Err(invalid("fps must be between 1 and 1000"));
        }

        if self.frame.poll_interval_ms == 0 || self.frame.poll_interval_ms > 1000 {
            return Err(invalid("poll_interval_ms must be between 1 and 1000"));
        }

        for (name, endpoint) in [("drive", &self.transport.drive), ("arm", &self.transport.arm)] {
            match endpoint {
                Some(EndpointConfig::Udp { address, bind }) => {
                    if address.is_empty() || bind.is_empty() {
                        return Err(invalid(format!(
                            "{} endpoint address and bind cannot be empty",
                            name
                        )));
                    }
                }
                Some(EndpointConfig::Serial { port, baud_rate }) => {
                    if port.is_empty() {
                        return Err(invalid(format!("{} serial port cannot be empty", name)));
                    }
                    if *baud_rate == 0 {
                        return Err(invalid(format!("{} baud_rate must be greater than 0", name)));
                    }
                }
                None => {}
            }
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid(
                "log level must be one of: trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }

    /// Name filter, if one is configured
    pub fn name_filter(&self) -> Option<String> {
        Some(self.input.name_filter.clone()).filter(|filter| !filter.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_default_config() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.frame.fps, 60);
        assert_eq!(config.drive.max_command, 100);
        assert!(config.transport.drive.is_none());
        assert!(config.transport.arm.is_none());
        assert!(!config.telemetry.enabled);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[input]
name_filter = "xbox"

[drive]
max_command = 255

[transport.drive]
kind = "udp"
address = "192.168.4.10:5000"

[transport.arm]
kind = "serial"
port = "/dev/ttyACM1"

[telemetry]
enabled = true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.name_filter().as_deref(), Some("xbox"));
        assert_eq!(config.drive.max_command, 255);
        assert_eq!(
            config.transport.drive,
            Some(EndpointConfig::Udp {
                address: "192.168.4.10:5000".to_string(),
                bind: "0.0.0.0:0".to_string(),
            })
        );
        assert_eq!(
            config.transport.arm,
            Some(EndpointConfig::Serial {
                port: "/dev/ttyACM1".to_string(),
                baud_rate: 115200,
            })
        );
        assert!(config.telemetry.enabled);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/rover.toml");
        assert!(matches!(result, Err(RoverError::Io(_))));
    }

    #[test]
    fn test_unknown_endpoint_kind() {
        let result = Config::from_toml(
            r#"
[transport.drive]
kind = "carrier-pigeon"
address = "coop"
"#,
        );
        assert!(matches!(result, Err(RoverError::Config(_))));
    }

    #[test]
    fn test_empty_name_filter_is_none() {
        assert!(create_valid_config().name_filter().is_none());
    }

    #[test]
    fn test_rescan_interval_zero() {
        let mut config = create_valid_config();
        config.input.rescan_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_stick_negative() {
        let mut config = create_valid_config();
        config.input.deadzone_stick = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_trigger_too_high() {
        let mut config = create_valid_config();
        config.input.deadzone_trigger = 0.3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expo_drive_too_high() {
        let mut config = create_valid_config();
        config.input.expo_drive = 1.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_command_zero() {
        let mut config = create_valid_config();
        config.drive.max_command = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fps_zero() {
        let mut config = create_valid_config();
        config.frame.fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_interval_too_high() {
        let mut config = create_valid_config();
        config.frame.poll_interval_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_udp_address() {
        let mut config = create_valid_config();
        config.transport.drive = Some(EndpointConfig::Udp {
            address: String::new(),
            bind: default_udp_bind(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_serial_port() {
        let mut config = create_valid_config();
        config.transport.arm = Some(EndpointConfig::Serial {
            port: String::new(),
            baud_rate: default_baud_rate(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serial_baud_rate_zero() {
        let mut config = create_valid_config();
        config.transport.arm = Some(EndpointConfig::Serial {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_enabled() {
        let mut config = create_valid_config();
        config.telemetry.enabled = true;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_disabled() {
        let mut config = create_valid_config();
        config.telemetry.enabled = false;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_records_per_file_zero() {
        let mut config = create_valid_config();
        config.telemetry.max_records_per_file = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_files_to_keep_zero() {
        let mut config = create_valid_config();
        config.telemetry.max_files_to_keep = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = create_valid_config();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_rescan_interval_ms(), 1000);
        assert_eq!(default_deadzone_stick(), 0.05);
        assert_eq!(default_deadzone_trigger(), 0.10);
        assert_eq!(default_expo_drive(), 0.0);
        assert_eq!(default_max_command(), 100);
        assert_eq!(default_fps(), 60);
        assert_eq!(default_poll_interval_ms(), 2);
        assert_eq!(default_udp_bind(), "0.0.0.0:0");
        assert_eq!(default_baud_rate(), 115200);
        assert_eq!(default_log_dir(), "./logs");
        assert_eq!(default_max_records_per_file(), 10000);
        assert_eq!(default_max_files_to_keep(), 10);
        assert_eq!(default_log_level(), "info");
    }
}
