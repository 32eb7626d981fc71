//! Ledger access facade
//!
//! Immutable per-chain registry built once from configuration: signing
//! identity, USDC contract, explorer URL, RPC endpoint. The orchestrator
//! never talks to a ledger except through this facade, and every lookup of an
//! unconfigured chain fails with a typed `UnknownLedger`.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use tracing::info;

use crate::config::Config;
use crate::error::BridgeError;
use crate::token::{EvmTokenGateway, TokenGateway};
use crate::types::ChainId;

/// Per-ledger read access and identity resolution consumed by the
/// orchestrator and fee checker.
#[async_trait]
pub trait LedgerDirectory: Send + Sync {
    /// Custodial pool account on `chain` (the signing identity's address).
    fn pool_address(&self, chain: ChainId) -> Result<Address, BridgeError>;

    /// USDC contract address configured for `chain`.
    fn usdc_address(&self, chain: ChainId) -> Result<Address, BridgeError>;

    /// Block-explorer base URL for `chain`, without the /tx segment.
    fn explorer_url(&self, chain: ChainId) -> Result<String, BridgeError>;

    /// Token gateway bound to `chain`'s USDC contract and pool signer.
    fn token_gateway(&self, chain: ChainId) -> Result<Arc<dyn TokenGateway>, BridgeError>;

    /// Native balance of the pool signing identity on `chain`.
    async fn native_balance(&self, chain: ChainId) -> Result<U256, BridgeError>;

    /// Current unit gas price on `chain`.
    async fn gas_price(&self, chain: ChainId) -> Result<u128, BridgeError>;
}

/// One configured chain entry.
struct ChainHandle {
    name: String,
    rpc_url: String,
    signer: PrivateKeySigner,
    explorer_url: String,
    usdc_address: Address,
}

/// Registry of all configured chains. Immutable after startup; safe to share
/// across concurrent operations.
pub struct ChainRegistry {
    chains: HashMap<ChainId, ChainHandle>,
    inclusion_timeout: Duration,
}

impl ChainRegistry {
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut chains = HashMap::new();

        for chain in &config.chains {
            let signer: PrivateKeySigner = chain
                .private_key
                .parse()
                .wrap_err_with(|| format!("Invalid private key for chain {}", chain.name))?;

            let usdc_address = Address::from_str(&chain.usdc_address)
                .wrap_err_with(|| format!("Invalid USDC address for chain {}", chain.name))?;

            info!(
                chain = %chain.name,
                chain_id = chain.chain_id,
                pool_address = %signer.address(),
                usdc_address = %usdc_address,
                "Chain registered"
            );

            chains.insert(
                ChainId(chain.chain_id),
                ChainHandle {
                    name: chain.name.clone(),
                    rpc_url: chain.rpc_url.clone(),
                    signer,
                    explorer_url: chain.explorer_url.trim_end_matches('/').to_string(),
                    usdc_address,
                },
            );
        }

        Ok(Self {
            chains,
            inclusion_timeout: Duration::from_secs(config.bridge.inclusion_timeout_secs),
        })
    }

    /// Number of configured chains.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    fn handle(&self, chain: ChainId) -> Result<&ChainHandle, BridgeError> {
        self.chains
            .get(&chain)
            .ok_or(BridgeError::UnknownLedger(chain))
    }

    fn read_err(handle: &ChainHandle, context: &str, e: impl std::fmt::Display) -> BridgeError {
        BridgeError::LedgerRead {
            detail: format!("{} on chain {}: {}", context, handle.name, e),
        }
    }
}

#[async_trait]
impl LedgerDirectory for ChainRegistry {
    fn pool_address(&self, chain: ChainId) -> Result<Address, BridgeError> {
        Ok(self.handle(chain)?.signer.address())
    }

    fn usdc_address(&self, chain: ChainId) -> Result<Address, BridgeError> {
        Ok(self.handle(chain)?.usdc_address)
    }

    fn explorer_url(&self, chain: ChainId) -> Result<String, BridgeError> {
        Ok(self.handle(chain)?.explorer_url.clone())
    }

    fn token_gateway(&self, chain: ChainId) -> Result<Arc<dyn TokenGateway>, BridgeError> {
        let handle = self.handle(chain)?;
        Ok(Arc::new(EvmTokenGateway::new(
            handle.rpc_url.clone(),
            handle.signer.clone(),
            handle.usdc_address,
            self.inclusion_timeout,
        )))
    }

    async fn native_balance(&self, chain: ChainId) -> Result<U256, BridgeError> {
        let handle = self.handle(chain)?;
        let provider = ProviderBuilder::new().on_http(
            handle
                .rpc_url
                .parse()
                .map_err(|e| Self::read_err(handle, "Invalid RPC URL", e))?,
        );
        provider
            .get_balance(handle.signer.address())
            .await
            .map_err(|e| Self::read_err(handle, "Failed to get native balance", e))
    }

    async fn gas_price(&self, chain: ChainId) -> Result<u128, BridgeError> {
        let handle = self.handle(chain)?;
        let provider = ProviderBuilder::new().on_http(
            handle
                .rpc_url
                .parse()
                .map_err(|e| Self::read_err(handle, "Invalid RPC URL", e))?,
        );
        provider
            .get_gas_price()
            .await
            .map_err(|e| Self::read_err(handle, "Failed to get gas price", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BridgeSettings, ChainConfig, Config, DatabaseConfig, ServerConfig};

    fn test_config() -> Config {
        Config {
            database: DatabaseConfig {
                url: "postgres://localhost/test".to_string(),
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 3001,
            },
            bridge: BridgeSettings {
                inclusion_timeout_secs: 120,
            },
            chains: vec![ChainConfig {
                name: "anvil".to_string(),
                chain_id: 31337,
                rpc_url: "http://localhost:8545".to_string(),
                private_key:
                    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
                        .to_string(),
                explorer_url: "https://explorer.example.com/".to_string(),
                usdc_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            }],
        }
    }

    #[test]
    fn test_registry_resolves_configured_chain() {
        let registry = ChainRegistry::from_config(&test_config()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.pool_address(ChainId(31337)).is_ok());
        assert!(registry.usdc_address(ChainId(31337)).is_ok());
        assert!(registry.token_gateway(ChainId(31337)).is_ok());
    }

    #[test]
    fn test_unknown_chain_is_typed() {
        let registry = ChainRegistry::from_config(&test_config()).unwrap();
        assert_eq!(
            registry.pool_address(ChainId(999)),
            Err(BridgeError::UnknownLedger(ChainId(999)))
        );
    }

    #[test]
    fn test_explorer_url_trailing_slash_trimmed() {
        let registry = ChainRegistry::from_config(&test_config()).unwrap();
        assert_eq!(
            registry.explorer_url(ChainId(31337)).unwrap(),
            "https://explorer.example.com"
        );
    }

    #[test]
    fn test_pool_address_derived_from_key() {
        let registry = ChainRegistry::from_config(&test_config()).unwrap();
        // well-known anvil account 0
        assert_eq!(
            registry.pool_address(ChainId(31337)).unwrap(),
            Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
        );
    }
}
