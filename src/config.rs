//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::command::protocol::{Command, LOCAL_PORT, SPEED_MAX, SPEED_MIN, VEHICLE_HOST, VEHICLE_PORT};
use crate::controller::calibration::AxisCalibration;
use crate::controller::source::MAX_BUTTONS;
use crate::controller::translator::ButtonMap;
use crate::error::{BridgeError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub buttons: ButtonConfig,
    #[serde(default)]
    pub vehicle: VehicleConfig,
}

/// Vehicle link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ConnectionConfig {
    #[serde(default = "default_local_port")]
    pub local_port: u16,

    #[serde(default = "default_remote_host")]
    pub remote_host: String,

    #[serde(default = "default_remote_port")]
    pub remote_port: u16,
}

/// Controller configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// Left stick (yaw, throttle) deadzone, fraction of full travel
    #[serde(default = "default_deadzone_left")]
    pub deadzone_left: f32,

    /// Right stick (roll, pitch) deadzone, fraction of full travel
    #[serde(default = "default_deadzone_right")]
    pub deadzone_right: f32,

    #[serde(default = "default_trigger_threshold")]
    pub trigger_threshold: f32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
}

/// Button assignment configuration (canonical indices)
#[derive(Debug, Deserialize, Clone)]
pub struct ButtonConfig {
    #[serde(default = "default_land_button")]
    pub land: usize,

    #[serde(default = "default_battery_button")]
    pub battery: usize,

    #[serde(default = "default_takeoff_button")]
    pub takeoff: usize,

    #[serde(default = "default_emergency_combo")]
    pub emergency_combo: Vec<usize>,
}

/// Vehicle behaviour configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct VehicleConfig {
    /// Cruise speed sent once after connecting (cm/s)
    #[serde(default)]
    pub speed: Option<u8>,
}

// Default value functions
fn default_local_port() -> u16 { LOCAL_PORT }
fn default_remote_host() -> String { VEHICLE_HOST.to_string() }
fn default_remote_port() -> u16 { VEHICLE_PORT }

fn default_deadzone_left() -> f32 { 0.06 }
fn default_deadzone_right() -> f32 { 0.06 }
fn default_trigger_threshold() -> f32 { 0.12 }
fn default_poll_interval_ms() -> u64 { 10 }
fn default_reconnect_attempts() -> u32 { 1 }
fn default_reconnect_interval_ms() -> u64 { 250 }

fn default_land_button() -> usize { 1 }
fn default_battery_button() -> usize { 2 }
fn default_takeoff_button() -> usize { 3 }
fn default_emergency_combo() -> Vec<usize> { vec![4, 5, 6, 7] }

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            local_port: default_local_port(),
            remote_host: default_remote_host(),
            remote_port: default_remote_port(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            deadzone_left: default_deadzone_left(),
            deadzone_right: default_deadzone_right(),
            trigger_threshold: default_trigger_threshold(),
            poll_interval_ms: default_poll_interval_ms(),
            reconnect_attempts: default_reconnect_attempts(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
        }
    }
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            land: default_land_button(),
            battery: default_battery_button(),
            takeoff: default_takeoff_button(),
            emergency_combo: default_emergency_combo(),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> BridgeError {
    BridgeError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
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
    /// use tello_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Validate connection configuration
        if self.connection.remote_host.parse::<IpAddr>().is_err() {
            return Err(invalid(format!(
                "remote_host '{}' is not an IP address",
                self.connection.remote_host
            )));
        }

        if self.connection.remote_port == 0 {
            return Err(invalid("remote_port cannot be 0"));
        }

        // Validate controller configuration
        for (name, deadzone) in [
            ("deadzone_left", self.controller.deadzone_left),
            ("deadzone_right", self.controller.deadzone_right),
        ] {
            if !(0.0..=0.5).contains(&deadzone) {
                return Err(invalid(format!("{} must be between 0.0 and 0.5", name)));
            }
        }

        if !(0.0..=1.0).contains(&self.controller.trigger_threshold) {
            return Err(invalid("trigger_threshold must be between 0.0 and 1.0"));
        }

        if self.controller.poll_interval_ms == 0 || self.controller.poll_interval_ms > 1000 {
            return Err(invalid("poll_interval_ms must be between 1 and 1000"));
        }

        if self.controller.reconnect_attempts > 100 {
            return Err(invalid("reconnect_attempts must be between 0 and 100"));
        }

        if self.controller.reconnect_interval_ms == 0 || self.controller.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        // Validate button indices
        for (name, index) in [
            ("land", self.buttons.land),
            ("battery", self.buttons.battery),
            ("takeoff", self.buttons.takeoff),
        ] {
            if index >= MAX_BUTTONS {
                return Err(invalid(format!(
                    "{} button index {} is out of bounds (must be 0-{})",
                    name,
                    index,
                    MAX_BUTTONS - 1
                )));
            }
        }

        let combo = &self.buttons.emergency_combo;
        if combo.len() != 4 {
            return Err(invalid("emergency_combo must list exactly 4 buttons"));
        }
        for (i, &index) in combo.iter().enumerate() {
            if index >= MAX_BUTTONS {
                return Err(invalid(format!(
                    "emergency_combo index {} is out of bounds (must be 0-{})",
                    index,
                    MAX_BUTTONS - 1
                )));
            }
            if combo[..i].contains(&index) {
                return Err(invalid("emergency_combo buttons must be distinct"));
            }
        }

        // Validate vehicle configuration
        if let Some(speed) = self.vehicle.speed {
            if !(SPEED_MIN..=SPEED_MAX).contains(&speed) {
                return Err(invalid(format!(
                    "speed must be between {} and {}",
                    SPEED_MIN, SPEED_MAX
                )));
            }
        }

        Ok(())
    }

    /// Local endpoint to bind (all interfaces)
    pub fn local_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.connection.local_port))
    }

    /// Vehicle endpoint
    ///
    /// # Errors
    ///
    /// Returns error if `remote_host` is not an IP address
    pub fn remote_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .connection
            .remote_host
            .parse()
            .map_err(|_| invalid(format!("remote_host '{}' is not an IP address", self.connection.remote_host)))?;
        Ok(SocketAddr::new(ip, self.connection.remote_port))
    }

    /// Fixed delay between poll ticks
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.controller.poll_interval_ms)
    }

    /// Delay between device re-detection attempts
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.controller.reconnect_interval_ms)
    }

    /// Stick calibration for the translator
    pub fn axis_calibration(&self) -> AxisCalibration {
        AxisCalibration::per_stick(self.controller.deadzone_left, self.controller.deadzone_right)
    }

    /// Button assignments for the translator
    ///
    /// Assumes [`Config::validate`] passed.
    pub fn button_map(&self) -> ButtonMap {
        let combo = &self.buttons.emergency_combo;
        let defaults = default_emergency_combo();
        let pick = |i: usize| combo.get(i).copied().unwrap_or(defaults[i]);
        ButtonMap {
            one_shots: vec![
                (self.buttons.land, Command::Land),
                (self.buttons.battery, Command::QueryBattery),
                (self.buttons.takeoff, Command::Takeoff),
            ],
            emergency_combo: [pick(0), pick(1), pick(2), pick(3)],
        }
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
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[connection]
remote_host = "10.0.0.5"

[controller]
deadzone_right = 0.1

[buttons]
emergency_combo = [0, 1, 2, 3]

[vehicle]
speed = 50
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.connection.remote_host, "10.0.0.5");
        assert_eq!(config.connection.remote_port, 8889);
        assert_eq!(config.connection.local_port, 9000);
        assert!((config.controller.deadzone_right - 0.1).abs() < 0.001);
        assert!((config.controller.deadzone_left - 0.06).abs() < 0.001);
        assert_eq!(config.buttons.emergency_combo, vec![0, 1, 2, 3]);
        assert_eq!(config.buttons.land, 1);
        assert_eq!(config.vehicle.speed, Some(50));
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.controller.poll_interval_ms, 10);
        assert_eq!(config.vehicle.speed, None);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = Config::load("/nonexistent/tello-bridge.toml");
        assert!(matches!(result, Err(BridgeError::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        use std::io::Write;
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        temp_file.write_all(b"[controller\n").unwrap();
        let result = Config::load(temp_file.path());
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_invalid_remote_host() {
        let mut config = create_valid_config();
        config.connection.remote_host = "tello.local".to_string();
        assert!(config.validate().is_err());
        assert!(config.remote_addr().is_err());
    }

    #[test]
    fn test_remote_port_zero() {
        let mut config = create_valid_config();
        config.connection.remote_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_negative() {
        let mut config = create_valid_config();
        config.controller.deadzone_left = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_too_high() {
        let mut config = create_valid_config();
        config.controller.deadzone_right = 0.6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stick_deadzones_apply_per_stick() {
        let mut config = create_valid_config();
        config.controller.deadzone_left = 0.25;
        config.controller.deadzone_right = 0.0;

        let cal = config.axis_calibration();
        let raw = (0.2 * 32767.0) as i32;
        // Left stick: yaw and throttle inside the wider deadzone
        assert_eq!(cal.yaw.apply(raw), 0);
        assert_eq!(cal.throttle.apply(raw), 0);
        // Right stick: roll and pitch are linear
        assert_eq!(cal.roll.apply(raw), 19);
        assert_eq!(cal.pitch.apply(-raw), -19);
    }

    #[test]
    fn test_trigger_threshold_too_high() {
        let mut config = create_valid_config();
        config.controller.trigger_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_interval_zero() {
        let mut config = create_valid_config();
        config.controller.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_interval_too_high() {
        let mut config = create_valid_config();
        config.controller.poll_interval_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reconnect_attempts_too_high() {
        let mut config = create_valid_config();
        config.controller.reconnect_attempts = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reconnect_attempts_zero_is_valid() {
        let mut config = create_valid_config();
        config.controller.reconnect_attempts = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reconnect_interval_zero() {
        let mut config = create_valid_config();
        config.controller.reconnect_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_button_index_out_of_bounds() {
        let mut config = create_valid_config();
        config.buttons.takeoff = 32;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_combo_wrong_length() {
        let mut config = create_valid_config();
        config.buttons.emergency_combo = vec![4, 5, 6];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_combo_duplicate_index() {
        let mut config = create_valid_config();
        config.buttons.emergency_combo = vec![4, 5, 5, 7];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_combo_index_out_of_bounds() {
        let mut config = create_valid_config();
        config.buttons.emergency_combo = vec![4, 5, 6, 40];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_speed_out_of_range() {
        for speed in [0u8, 9, 101, 255] {
            let mut config = create_valid_config();
            config.vehicle.speed = Some(speed);
            assert!(config.validate().is_err(), "speed {} should be invalid", speed);
        }
    }

    #[test]
    fn test_speed_in_range() {
        for speed in [10u8, 55, 100] {
            let mut config = create_valid_config();
            config.vehicle.speed = Some(speed);
            assert!(config.validate().is_ok(), "speed {} should be valid", speed);
        }
    }

    #[test]
    fn test_addresses() {
        let config = create_valid_config();
        assert_eq!(config.local_addr(), "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.remote_addr().unwrap(), "192.168.10.1:8889".parse().unwrap());
    }

    #[test]
    fn test_button_map_from_config() {
        let mut config = create_valid_config();
        config.buttons.land = 0;
        config.buttons.emergency_combo = vec![8, 9, 10, 11];

        let map = config.button_map();
        assert_eq!(map.one_shots[0], (0, Command::Land));
        assert_eq!(map.one_shots[1], (2, Command::QueryBattery));
        assert_eq!(map.one_shots[2], (3, Command::Takeoff));
        assert_eq!(map.emergency_combo, [8, 9, 10, 11]);
    }

    #[test]
    fn test_default_button_map_matches_translator_default() {
        assert_eq!(create_valid_config().button_map(), ButtonMap::default());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_local_port(), 9000);
        assert_eq!(default_remote_host(), "192.168.10.1");
        assert_eq!(default_remote_port(), 8889);
        assert_eq!(default_deadzone_left(), 0.06);
        assert_eq!(default_deadzone_right(), 0.06);
        assert_eq!(default_trigger_threshold(), 0.12);
        assert_eq!(default_poll_interval_ms(), 10);
        assert_eq!(default_reconnect_attempts(), 1);
        assert_eq!(default_reconnect_interval_ms(), 250);
        assert_eq!(default_land_button(), 1);
        assert_eq!(default_battery_button(), 2);
        assert_eq!(default_takeoff_button(), 3);
        assert_eq!(default_emergency_combo(), vec![4, 5, 6, 7]);
    }
}
