//! Configuration loading and validation

use anyhow::Result;
use netsweep_core::Platform;
use netsweep_discovery::arp::DEFAULT_COMMAND_TIMEOUT_MS;
use netsweep_discovery::pool::DEFAULT_CONCURRENCY;
use netsweep_discovery::reachability::{DEFAULT_PROBE_TIMEOUT_MS, ECHO_PORT};
use netsweep_discovery::ScannerConfig;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Bind address for web server
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Address inside the subnet to sweep (defaults to the local interface)
    #[serde(default)]
    pub base_address: Option<Ipv4Addr>,
    /// Reachability timeout per host
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
    /// Timeout for ping, arp and getent invocations
    #[serde(default = "default_command_timeout")]
    pub command_timeout_ms: u64,
    /// Maximum probes in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Port used for the reachability connect
    #[serde(default = "default_echo_port")]
    pub echo_port: u16,
    /// Tool flag family; detected at startup when unset
    #[serde(default)]
    pub platform: Option<Platform>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            base_address: None,
            probe_timeout_ms: default_probe_timeout(),
            command_timeout_ms: default_command_timeout(),
            concurrency: default_concurrency(),
            echo_port: default_echo_port(),
            platform: None,
        }
    }
}

fn default_probe_timeout() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

fn default_command_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_MS
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_echo_port() -> u16 {
    ECHO_PORT
}

impl Config {
    /// Convert to ScannerConfig, resolving the platform once
    pub fn to_scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            base_address: self.scan.base_address,
            probe_timeout_ms: self.scan.probe_timeout_ms,
            command_timeout_ms: self.scan.command_timeout_ms,
            concurrency: self.scan.concurrency,
            echo_port: self.scan.echo_port,
            platform: self.scan.platform.unwrap_or_else(Platform::detect),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.scan.concurrency == 0 {
            anyhow::bail!("scan.concurrency must be at least 1");
        }
        if self.scan.probe_timeout_ms == 0 {
            anyhow::bail!("scan.probe_timeout_ms must be positive");
        }
        Ok(())
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        config
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.daemon.bind, "0.0.0.0:8080");
        assert_eq!(config.scan.probe_timeout_ms, 5000);
        assert_eq!(config.scan.concurrency, 64);
        assert!(config.scan.base_address.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("netsweep.toml");
        std::fs::write(
            &path,
            "[scan]\nbase_address = \"192.168.4.0\"\nconcurrency = 16\nplatform = \"windows\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.scan.base_address, Some(Ipv4Addr::new(192, 168, 4, 0)));
        assert_eq!(config.scan.concurrency, 16);
        assert_eq!(config.scan.echo_port, 7);

        let scanner = config.to_scanner_config();
        assert_eq!(scanner.platform, Platform::Windows);
        assert_eq!(scanner.concurrency, 16);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("netsweep.toml");
        std::fs::write(&path, "[scan]\nconcurrency = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_default_config_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("netsweep.toml");
        save_default_config(&path).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.daemon.bind, default_bind());
        assert_eq!(config.scan.command_timeout_ms, DEFAULT_COMMAND_TIMEOUT_MS);
    }
}
