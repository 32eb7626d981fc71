//! Common types for cross-ledger transfers
//!
//! Request/response shapes for the bridge API plus the validated chain
//! identifier used to key the ledger registry.

use alloy::primitives::utils::{parse_units, ParseUnits};
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::BridgeError;

/// Validated ledger identifier (native EVM chain ID).
///
/// Configuration loads one registry entry per chain ID at startup; any
/// request naming an unregistered ID fails with a typed `UnknownLedger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        ChainId(id)
    }
}

/// One bridging request: move `amount` USDC from a user on the source chain
/// to a user on the destination chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRequest {
    pub source_user_address: Address,
    pub source_chain_id: ChainId,
    pub destination_user_address: Address,
    pub destination_chain_id: ChainId,
    /// Decimal token amount. Accepted as a JSON number or string; kept as a
    /// string so conversion to smallest units never round-trips through
    /// floating point.
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(serde_json::Number),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}

impl BridgeRequest {
    /// Structural checks that need no ledger access. Anything failing here is
    /// rejected before a context is built.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.source_chain_id == self.destination_chain_id {
            return Err(BridgeError::InvalidRequest(
                "Source and destination chains must be different".to_string(),
            ));
        }

        let amount = self.amount.trim();
        if amount.is_empty() {
            return Err(BridgeError::InvalidRequest(
                "Amount is required".to_string(),
            ));
        }
        if amount.starts_with('-') {
            return Err(BridgeError::InvalidRequest(
                "Amount must be a positive number".to_string(),
            ));
        }

        Ok(())
    }

    /// Deterministic identity of this logical request, used to deduplicate
    /// concurrent identical submissions. In-memory only.
    pub fn operation_key(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            self.source_user_address,
            self.source_chain_id,
            self.destination_user_address,
            self.destination_chain_id,
            self.amount
        )
    }

    /// Convert the decimal amount to the token's smallest units.
    pub fn amount_in_units(&self, decimals: u8) -> Result<U256, BridgeError> {
        let parsed = parse_units(self.amount.trim(), decimals).map_err(|e| {
            BridgeError::InvalidRequest(format!("Invalid amount {}: {}", self.amount, e))
        })?;

        let units = match parsed {
            ParseUnits::U256(value) => value,
            ParseUnits::I256(_) => {
                return Err(BridgeError::InvalidRequest(
                    "Amount must be a positive number".to_string(),
                ))
            }
        };

        if units.is_zero() {
            return Err(BridgeError::InvalidRequest(
                "Amount must be greater than zero".to_string(),
            ));
        }

        Ok(units)
    }
}

/// Receipt handle for one included on-ledger transfer. A receipt with
/// `succeeded == false` is treated identically to a failed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub tx_hash: String,
    pub succeeded: bool,
}

/// Successful bridge outcome returned to the API layer.
#[derive(Debug, Clone)]
pub struct BridgeSuccess {
    pub message: String,
    /// False when both transfers landed but the audit log append failed
    /// (degraded success: funds moved, trail incomplete).
    pub log_appended: bool,
}
