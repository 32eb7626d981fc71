//! Token contract gateway
//!
//! One gateway per (chain, token contract) pair: the reads the orchestrator
//! validates against and the transfer submissions it executes, behind a trait
//! so tests can drive the state machine without a live ledger.

use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, U256};
use alloy::providers::ProviderBuilder;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::contracts::erc20::ERC20;
use crate::types::TransferReceipt;

/// Typed failure of one gateway call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{0}")]
    Rpc(String),

    /// The bounded inclusion wait expired before a receipt arrived. The
    /// transaction may still land later; the operation is reported failed.
    #[error("timed out after {0}s waiting for transaction inclusion")]
    InclusionTimeout(u64),
}

/// Read and transfer operations against one token contract.
#[async_trait]
pub trait TokenGateway: Send + Sync {
    async fn decimals(&self) -> Result<u8, GatewayError>;

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, GatewayError>;

    async fn balance_of(&self, account: Address) -> Result<U256, GatewayError>;

    async fn estimate_transfer_from(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<u64, GatewayError>;

    async fn estimate_transfer(&self, to: Address, amount: U256) -> Result<u64, GatewayError>;

    /// Submit a transferFrom and wait (bounded) for inclusion.
    async fn transfer_from(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferReceipt, GatewayError>;

    /// Submit a transfer and wait (bounded) for inclusion.
    async fn transfer(&self, to: Address, amount: U256) -> Result<TransferReceipt, GatewayError>;
}

/// Alloy-backed gateway submitting through the chain's pool signing key.
pub struct EvmTokenGateway {
    rpc_url: String,
    signer: PrivateKeySigner,
    token: Address,
    inclusion_timeout: Duration,
}

impl EvmTokenGateway {
    pub fn new(
        rpc_url: String,
        signer: PrivateKeySigner,
        token: Address,
        inclusion_timeout: Duration,
    ) -> Self {
        Self {
            rpc_url,
            signer,
            token,
            inclusion_timeout,
        }
    }

    fn rpc_err(context: &str, e: impl std::fmt::Display) -> GatewayError {
        GatewayError::Rpc(format!("{}: {}", context, e))
    }

    fn parse_url(&self) -> Result<url::Url, GatewayError> {
        self.rpc_url
            .parse()
            .map_err(|e| Self::rpc_err("Invalid RPC URL", e))
    }
}

#[async_trait]
impl TokenGateway for EvmTokenGateway {
    async fn decimals(&self) -> Result<u8, GatewayError> {
        let provider = ProviderBuilder::new().on_http(self.parse_url()?);
        let contract = ERC20::new(self.token, &provider);
        let decimals = contract
            .decimals()
            .call()
            .await
            .map_err(|e| Self::rpc_err("Failed to get decimals", e))?;
        Ok(decimals._0)
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, GatewayError> {
        let provider = ProviderBuilder::new().on_http(self.parse_url()?);
        let contract = ERC20::new(self.token, &provider);
        let allowance = contract
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| Self::rpc_err("Failed to get allowance", e))?;
        Ok(allowance._0)
    }

    async fn balance_of(&self, account: Address) -> Result<U256, GatewayError> {
        let provider = ProviderBuilder::new().on_http(self.parse_url()?);
        let contract = ERC20::new(self.token, &provider);
        let balance = contract
            .balanceOf(account)
            .call()
            .await
            .map_err(|e| Self::rpc_err("Failed to get balance", e))?;
        Ok(balance._0)
    }

    async fn estimate_transfer_from(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<u64, GatewayError> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let provider = ProviderBuilder::new().wallet(wallet).on_http(self.parse_url()?);
        let contract = ERC20::new(self.token, &provider);
        contract
            .transferFrom(from, to, amount)
            .estimate_gas()
            .await
            .map_err(|e| Self::rpc_err("Failed to estimate transferFrom gas", e))
    }

    async fn estimate_transfer(&self, to: Address, amount: U256) -> Result<u64, GatewayError> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let provider = ProviderBuilder::new().wallet(wallet).on_http(self.parse_url()?);
        let contract = ERC20::new(self.token, &provider);
        contract
            .transfer(to, amount)
            .estimate_gas()
            .await
            .map_err(|e| Self::rpc_err("Failed to estimate transfer gas", e))
    }

    async fn transfer_from(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferReceipt, GatewayError> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let provider = ProviderBuilder::new().wallet(wallet).on_http(self.parse_url()?);
        let contract = ERC20::new(self.token, &provider);

        debug!(token = %self.token, %from, %to, %amount, "Submitting transferFrom");

        let pending = contract
            .transferFrom(from, to, amount)
            .send()
            .await
            .map_err(|e| Self::rpc_err("Failed to send transferFrom", e))?;

        let tx_hash = *pending.tx_hash();
        info!(tx_hash = %tx_hash, "Transaction sent, waiting for inclusion");

        let receipt = tokio::time::timeout(self.inclusion_timeout, pending.get_receipt())
            .await
            .map_err(|_| GatewayError::InclusionTimeout(self.inclusion_timeout.as_secs()))?
            .map_err(|e| Self::rpc_err("Failed to get receipt", e))?;

        Ok(TransferReceipt {
            tx_hash: format!("0x{:x}", tx_hash),
            succeeded: receipt.status(),
        })
    }

    async fn transfer(&self, to: Address, amount: U256) -> Result<TransferReceipt, GatewayError> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let provider = ProviderBuilder::new().wallet(wallet).on_http(self.parse_url()?);
        let contract = ERC20::new(self.token, &provider);

        debug!(token = %self.token, %to, %amount, "Submitting transfer");

        let pending = contract
            .transfer(to, amount)
            .send()
            .await
            .map_err(|e| Self::rpc_err("Failed to send transfer", e))?;

        let tx_hash = *pending.tx_hash();
        info!(tx_hash = %tx_hash, "Transaction sent, waiting for inclusion");

        let receipt = tokio::time::timeout(self.inclusion_timeout, pending.get_receipt())
            .await
            .map_err(|_| GatewayError::InclusionTimeout(self.inclusion_timeout.as_secs()))?
            .map_err(|e| Self::rpc_err("Failed to get receipt", e))?;

        Ok(TransferReceipt {
            tx_hash: format!("0x{:x}", tx_hash),
            succeeded: receipt.status(),
        })
    }
}
