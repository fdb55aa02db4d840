//! # Config Module
//!
//! Runtime configuration, read from a RON file with environment overrides.
//!
//! ```ron
//! (
//!     port_name: "/dev/ttyUSB0",
//!     baud_rate: 115200,
//!     poll_interval_ms: 300,
//! )
//! ```
//!
//! Every field is optional in the file; missing ones take their defaults.

use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{HmiError, Result};

/// Configuration file path.
pub const CONFIG_FILE: &str = "config/hmi.ron";

/// Environment variable overriding [`HmiConfig::port_name`].
pub const PORT_ENV: &str = "PLC_HMI_PORT";

/// Environment variable overriding [`HmiConfig::baud_rate`].
pub const BAUD_ENV: &str = "PLC_HMI_BAUD";

/// Link and panel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HmiConfig {
    /// Serial device path or port name.
    pub port_name: String,
    pub baud_rate: u32,
    /// Upper bound on a single blocking read attempt.
    pub read_timeout_ms: u64,
    /// Cadence of the `status` poll.
    pub poll_interval_ms: u64,
    /// Pause after a read error before the reader tries again.
    pub read_retry_ms: u64,
    pub default_speed: i32,
    pub default_auto_run_ms: u32,
    pub default_auto_stop_ms: u32,
    /// Lines kept in the on-screen log.
    pub max_log_lines: usize,
}

impl Default for HmiConfig {
    fn default() -> Self {
        Self {
            port_name: String::from("/dev/ttyUSB0"),
            baud_rate: 115200,
            read_timeout_ms: 100,
            poll_interval_ms: 300,
            read_retry_ms: 500,
            default_speed: 10,
            default_auto_run_ms: 4000,
            default_auto_stop_ms: 2000,
            max_log_lines: 500,
        }
    }
}

impl HmiConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron(text: &str) -> Result<Self> {
        let config: HmiConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Loads `path`, falling back to defaults, then applies environment overrides.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut config = match Self::load(path) {
            Ok(config) => {
                info!("[config] Loaded {}", path.display());
                config
            }
            Err(HmiError::FileIo(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[config] {} not found, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("[config] {e}, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        config
    }

    /// Applies `PLC_HMI_PORT` / `PLC_HMI_BAUD` style overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup(PORT_ENV).filter(|p| !p.trim().is_empty()) {
            self.port_name = port.trim().to_owned();
        }
        if let Some(baud) = lookup(BAUD_ENV) {
            match baud.trim().parse::<u32>() {
                Ok(baud) if baud > 0 => self.baud_rate = baud,
                _ => warn!("[config] ignoring {BAUD_ENV}={baud:?}"),
            }
        }
    }

    /// Rejects settings the link cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.port_name.trim().is_empty() {
            return Err(HmiError::invalid_config("port_name must not be empty"));
        }
        if self.baud_rate == 0 {
            return Err(HmiError::invalid_config("baud_rate must be non-zero"));
        }
        for (name, value) in [
            ("read_timeout_ms", self.read_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("read_retry_ms", self.read_retry_ms),
        ] {
            if value == 0 {
                return Err(HmiError::invalid_config(format!("{name} must be non-zero")));
            }
        }
        if self.max_log_lines == 0 {
            return Err(HmiError::invalid_config("max_log_lines must be non-zero"));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn read_retry(&self) -> Duration {
        Duration::from_millis(self.read_retry_ms)
    }
}
