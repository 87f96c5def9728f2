//! YAML configuration loading and validation.
//!
//! The configuration is loaded once at startup and held read-only for the
//! process lifetime. Any missing file, malformed document, or invalid value
//! is fatal before the scheduler loop starts.

use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Default per-packet ICMP timeout (3 seconds).
pub const DEFAULT_PING_TIMEOUT_SECS: u64 = 3;

/// Default DNS query timeout (5 seconds).
pub const DEFAULT_DNS_TIMEOUT_SECS: u64 = 5;

fn default_ping_timeout() -> u64 {
    DEFAULT_PING_TIMEOUT_SECS
}

fn default_dns_timeout() -> u64 {
    DEFAULT_DNS_TIMEOUT_SECS
}

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Probe target lists.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    /// IPv4 addresses probed with ICMP ping.
    pub s3_ipv4: Vec<String>,

    /// Nameserver IPv4 addresses probed with DNS queries.
    pub dns: Vec<String>,
}

/// ICMP probe settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PingSettings {
    /// Send echo requests without an inter-packet gap.
    pub flood: bool,

    /// Echo requests per endpoint per pass.
    pub icmp_count: u32,

    /// Per-packet reply timeout in seconds (default: 3).
    #[serde(default = "default_ping_timeout")]
    pub timeout: u64,
}

impl PingSettings {
    /// Per-packet reply timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// DNS probe settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DnsSettings {
    /// Query hostnames; the first entry supplies the latency measurement.
    pub hosts: Vec<String>,

    /// Query timeout in seconds (default: 5).
    #[serde(default = "default_dns_timeout")]
    pub timeout: u64,
}

impl DnsSettings {
    /// Query timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalSettings {
    /// Inter-cycle sleep in seconds.
    pub timer: u64,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Probe target lists.
    pub endpoints: Endpoints,

    /// ICMP probe settings.
    pub ping_settings: PingSettings,

    /// DNS probe settings.
    pub dns_settings: DnsSettings,

    /// Process-wide settings.
    pub global_settings: GlobalSettings,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for addr in &self.endpoints.s3_ipv4 {
            addr.parse::<Ipv4Addr>().map_err(|_| {
                ConfigError::Validation(format!("invalid ping endpoint: '{addr}'"))
            })?;
        }

        for addr in &self.endpoints.dns {
            addr.parse::<Ipv4Addr>().map_err(|_| {
                ConfigError::Validation(format!("invalid dns nameserver: '{addr}'"))
            })?;
        }

        if self.ping_settings.icmp_count == 0 {
            return Err(ConfigError::Validation(
                "ping_settings.icmp_count must be positive".to_string(),
            ));
        }

        if self.dns_settings.hosts.is_empty() {
            return Err(ConfigError::Validation(
                "dns_settings.hosts cannot be empty".to_string(),
            ));
        }

        for host in &self.dns_settings.hosts {
            if host.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "dns_settings.hosts entries cannot be empty".to_string(),
                ));
            }
        }

        if self.global_settings.timer == 0 {
            return Err(ConfigError::Validation(
                "global_settings.timer must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Inter-cycle sleep as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.global_settings.timer)
    }
}
