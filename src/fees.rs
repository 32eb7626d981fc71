//! Gas fee sufficiency checks
//!
//! Pure decision over live reads: can the pool signing identity on a chain
//! pay for one estimated call? All arithmetic is integer smallest-unit math;
//! no floating point anywhere near on-chain accounting.

use std::sync::Arc;

use alloy::primitives::U256;
use tracing::debug;

use crate::chains::LedgerDirectory;
use crate::error::BridgeError;
use crate::types::ChainId;

pub struct FeeChecker {
    ledgers: Arc<dyn LedgerDirectory>,
}

impl FeeChecker {
    pub fn new(ledgers: Arc<dyn LedgerDirectory>) -> Self {
        Self { ledgers }
    }

    /// True when the chain's signing identity holds enough native balance to
    /// cover `estimated_gas` units at the current gas price.
    pub async fn has_sufficient_fee_balance(
        &self,
        chain: ChainId,
        estimated_gas: u64,
    ) -> Result<bool, BridgeError> {
        let balance = self.ledgers.native_balance(chain).await?;
        let gas_price = self.ledgers.gas_price(chain).await?;

        let required = U256::from(gas_price) * U256::from(estimated_gas);

        debug!(
            %chain,
            %balance,
            %gas_price,
            estimated_gas,
            %required,
            "Fee sufficiency check"
        );

        Ok(balance >= required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenGateway;
    use alloy::primitives::Address;
    use async_trait::async_trait;

    struct FixedLedger {
        balance: U256,
        gas_price: u128,
    }

    #[async_trait]
    impl LedgerDirectory for FixedLedger {
        fn pool_address(&self, _chain: ChainId) -> Result<Address, BridgeError> {
            Ok(Address::ZERO)
        }

        fn usdc_address(&self, _chain: ChainId) -> Result<Address, BridgeError> {
            Ok(Address::ZERO)
        }

        fn explorer_url(&self, _chain: ChainId) -> Result<String, BridgeError> {
            Ok("https://explorer.example.com".to_string())
        }

        fn token_gateway(
            &self,
            chain: ChainId,
        ) -> Result<Arc<dyn TokenGateway>, BridgeError> {
            Err(BridgeError::UnknownLedger(chain))
        }

        async fn native_balance(&self, _chain: ChainId) -> Result<U256, BridgeError> {
            Ok(self.balance)
        }

        async fn gas_price(&self, _chain: ChainId) -> Result<u128, BridgeError> {
            Ok(self.gas_price)
        }
    }

    fn checker(balance: u128, gas_price: u128) -> FeeChecker {
        FeeChecker::new(Arc::new(FixedLedger {
            balance: U256::from(balance),
            gas_price,
        }))
    }

    #[tokio::test]
    async fn test_sufficient_balance_passes() {
        let checker = checker(1_000_000, 10);
        assert!(checker
            .has_sufficient_fee_balance(ChainId(1), 50_000)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_exact_balance_passes() {
        let checker = checker(500_000, 10);
        assert!(checker
            .has_sufficient_fee_balance(ChainId(1), 50_000)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_short_by_one_wei_fails() {
        let checker = checker(499_999, 10);
        assert!(!checker
            .has_sufficient_fee_balance(ChainId(1), 50_000)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_zero_gas_price_always_passes() {
        let checker = checker(0, 0);
        assert!(checker
            .has_sufficient_fee_balance(ChainId(1), 1_000_000)
            .await
            .unwrap());
    }
}
