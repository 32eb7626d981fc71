//! Environment-based configuration
//!
//! # Environment Variable Schema
//!
//! ```text
//! DATABASE_URL=postgres://...
//! BIND_ADDRESS=0.0.0.0            # optional, default 0.0.0.0
//! PORT=3001                       # optional, default 3001
//! INCLUSION_TIMEOUT_SECS=120      # optional, bounded wait for tx inclusion
//! CHAINS_COUNT=2                  # number of chains to configure
//! CHAIN_1_NAME=flow-testnet       # optional, default chain_1
//! CHAIN_1_CHAIN_ID=545
//! CHAIN_1_RPC_URL=https://...
//! CHAIN_1_PRIVATE_KEY=0x...       # pool signing key for this chain
//! CHAIN_1_EXPLORER_URL=https://evm-testnet.flowscan.io
//! CHAIN_1_USDC_ADDRESS=0x...
//! ```

use eyre::{eyre, Result, WrapErr};
use std::collections::HashSet;
use std::env;
use std::fmt;
use std::path::Path;

/// Main configuration for the bridge server
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub bridge: BridgeSettings,
    pub chains: Vec<ChainConfig>,
}

/// Database configuration
#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Custom Debug that redacts the database URL (may contain credentials).
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .finish()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Bounded wait for on-ledger inclusion. A stuck transaction must not
    /// block deduplicated waiters forever, so the wait is always finite.
    pub inclusion_timeout_secs: u64,
}

/// Configuration for a single chain
#[derive(Clone)]
pub struct ChainConfig {
    /// Human-readable name (e.g., "flow-testnet", "base-sepolia")
    pub name: String,
    /// Native EVM chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Pool signing key for this chain (the custodial pool is the signer's
    /// own address)
    pub private_key: String,
    /// Block-explorer base URL, without the trailing /tx segment
    pub explorer_url: String,
    /// USDC contract address on this chain
    pub usdc_address: String,
}

/// Custom Debug that redacts private_key to prevent accidental log leakage.
impl fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainConfig")
            .field("name", &self.name)
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &"<redacted>")
            .field("explorer_url", &self.explorer_url)
            .field("usdc_address", &self.usdc_address)
            .finish()
    }
}

fn default_port() -> u16 {
    3001
}

fn default_inclusion_timeout() -> u64 {
    120
}

/// Validates that a URL uses http/https and has a host component.
pub fn validate_url(url_str: &str, name: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url_str).map_err(|e| eyre!("{} must be a valid URL: {}", name, e))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(eyre!(
            "{} must use http:// or https:// scheme, got {}",
            name,
            scheme
        ));
    }

    if parsed.host_str().is_none() {
        return Err(eyre!("{} must have a host component", name));
    }

    Ok(())
}

impl Config {
    /// Load configuration from environment variables.
    /// Loads .env file if present, then reads from environment.
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env").or_else(|_| Self::load_from_env())
    }

    /// Load from a specific .env file path
    pub fn load_from_file(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path))?;
        }
        Self::load_from_env()
    }

    /// Load configuration from environment variables
    fn load_from_env() -> Result<Self> {
        let database = DatabaseConfig {
            url: env::var("DATABASE_URL")
                .map_err(|_| eyre!("DATABASE_URL environment variable is required"))?,
        };

        let server = ServerConfig {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_port),
        };

        let bridge = BridgeSettings {
            inclusion_timeout_secs: env::var("INCLUSION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_inclusion_timeout),
        };

        let count: usize = env::var("CHAINS_COUNT")
            .map_err(|_| eyre!("CHAINS_COUNT environment variable is required"))?
            .parse()
            .wrap_err("CHAINS_COUNT must be a valid usize")?;

        let mut chains = Vec::with_capacity(count);
        for i in 1..=count {
            let prefix = format!("CHAIN_{}", i);

            let name =
                env::var(format!("{}_NAME", prefix)).unwrap_or_else(|_| format!("chain_{}", i));

            let chain_id: u64 = env::var(format!("{}_CHAIN_ID", prefix))
                .map_err(|_| eyre!("Missing {}_CHAIN_ID", prefix))?
                .parse()
                .map_err(|_| eyre!("Invalid {}_CHAIN_ID — must be a u64", prefix))?;

            let rpc_url = env::var(format!("{}_RPC_URL", prefix))
                .map_err(|_| eyre!("Missing {}_RPC_URL", prefix))?;

            let private_key = env::var(format!("{}_PRIVATE_KEY", prefix))
                .map_err(|_| eyre!("Missing {}_PRIVATE_KEY", prefix))?;

            let explorer_url = env::var(format!("{}_EXPLORER_URL", prefix))
                .map_err(|_| eyre!("Missing {}_EXPLORER_URL", prefix))?;

            let usdc_address = env::var(format!("{}_USDC_ADDRESS", prefix))
                .map_err(|_| eyre!("Missing {}_USDC_ADDRESS", prefix))?;

            chains.push(ChainConfig {
                name,
                chain_id,
                rpc_url,
                private_key,
                explorer_url,
                usdc_address,
            });
        }

        let config = Config {
            database,
            server,
            bridge,
            chains,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(eyre!("database.url cannot be empty"));
        }

        if self.chains.is_empty() {
            return Err(eyre!("At least one chain must be configured"));
        }

        if self.bridge.inclusion_timeout_secs == 0 {
            return Err(eyre!("INCLUSION_TIMEOUT_SECS must be greater than 0"));
        }

        let mut seen_ids = HashSet::new();
        for chain in &self.chains {
            if !seen_ids.insert(chain.chain_id) {
                return Err(eyre!(
                    "Duplicate chain ID: {} (chain: {})",
                    chain.chain_id,
                    chain.name
                ));
            }

            validate_url(&chain.rpc_url, &format!("{}_RPC_URL", chain.name))?;
            validate_url(&chain.explorer_url, &format!("{}_EXPLORER_URL", chain.name))?;

            if chain.usdc_address.len() != 42 || !chain.usdc_address.starts_with("0x") {
                return Err(eyre!(
                    "Invalid USDC address for chain {}: expected 0x-prefixed 42-char hex",
                    chain.name
                ));
            }

            if chain.private_key.len() != 66 || !chain.private_key.starts_with("0x") {
                return Err(eyre!(
                    "Invalid private key for chain {}: expected 0x-prefixed 66-char hex",
                    chain.name
                ));
            }
        }

        Ok(())
    }
}
