//! Configuration management for the REST gateway
//!
//! Handles configuration loading (TOML or JSON), validation and security
//! warnings.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Chain the gateway serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChainNetwork {
    Bitcoin,
    Testnet,
    Signet,
    #[default]
    Regtest,
}

impl From<ChainNetwork> for bitcoin::Network {
    fn from(network: ChainNetwork) -> Self {
        match network {
            ChainNetwork::Bitcoin => bitcoin::Network::Bitcoin,
            ChainNetwork::Testnet => bitcoin::Network::Testnet,
            ChainNetwork::Signet => bitcoin::Network::Signet,
            ChainNetwork::Regtest => bitcoin::Network::Regtest,
        }
    }
}

/// REST service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Serve the REST interface (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address to bind (default: 127.0.0.1:8080)
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Largest accepted request body in bytes (default: 1 MiB)
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_max_request_size() -> usize {
    1_048_576
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: default_listen_addr(),
            max_request_size: default_max_request_size(),
        }
    }
}

/// Mempool limits reported by `/rest/mempool/info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MempoolConfig {
    /// Maximum mempool size in bytes (default: 300 MB)
    #[serde(default = "default_max_mempool_bytes")]
    pub max_mempool_bytes: u64,

    /// Minimum relay fee rate in sat/kvB (default: 1000)
    #[serde(default = "default_min_relay_fee")]
    pub min_relay_fee_sat_per_kvb: u64,
}

fn default_max_mempool_bytes() -> u64 {
    300_000_000
}

fn default_min_relay_fee() -> u64 {
    1000
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_mempool_bytes: default_max_mempool_bytes(),
            min_relay_fee_sat_per_kvb: default_min_relay_fee(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "chain_rest=debug,hyper=warn")
    /// If not set, uses RUST_LOG environment variable or defaults to "info"
    #[serde(default)]
    pub filter: Option<String>,

    /// Enable JSON logging format (requires the `json-logging` feature)
    #[serde(default)]
    pub json_format: bool,
}

/// Gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub network: ChainNetwork,

    #[serde(default)]
    pub rest: RestConfig,

    /// Logging configuration
    pub logging: Option<LoggingConfig>,

    #[serde(default)]
    pub mempool: MempoolConfig,
}

impl GatewayConfig {
    /// Load configuration from file (TOML for `.toml`, JSON otherwise)
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        #[cfg(unix)]
        {
            if let Ok(metadata) = std::fs::metadata(path) {
                use std::os::unix::fs::PermissionsExt;
                let mode = metadata.permissions().mode();
                if mode & 0o077 != 0 {
                    tracing::warn!(
                        "Configuration file {:?} is readable by others (mode: {:o}). \
                         Consider setting permissions to 600",
                        path,
                        mode
                    );
                }
            }
        }

        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            Self::from_toml_file(path)
        } else {
            Self::from_json_file(path)
        }
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("Failed to parse JSON config: {}", e))
    }

    /// Load configuration from TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))
    }

    /// Save configuration to TOML file
    pub fn to_toml_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize TOML config: {}", e))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.rest.enabled {
            anyhow::bail!("REST service is disabled (rest.enabled = false); nothing to serve");
        }
        if self.rest.max_request_size == 0 {
            anyhow::bail!("rest.max_request_size must be greater than 0");
        }
        Ok(())
    }

    /// Security warnings that should be logged but don't prevent startup
    pub fn validate_security(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let addr = self.rest.listen_addr;
        if !addr.ip().is_loopback() {
            warnings.push(format!(
                "SECURITY WARNING: REST interface is binding to {} (non-localhost). \
                 It has no authentication; restrict access at the network level",
                addr
            ));
        }
        warnings
    }
}
