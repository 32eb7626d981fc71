//! Typed failure taxonomy for bridge operations
//!
//! Every outcome the orchestrator can produce carries a stable kind code for
//! the wire envelope and monitoring. Variants are `Clone` because deduplicated
//! callers share one settled outcome.

use std::fmt;

use crate::types::ChainId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Malformed or self-referential request, caught before context setup.
    InvalidRequest(String),

    /// No chain configured for the requested identifier.
    UnknownLedger(ChainId),

    /// Source and destination tokens disagree on granularity; the transfer is
    /// rejected rather than auto-converted.
    PrecisionMismatch { source: u8, destination: u8 },

    /// The user's pre-approved allowance to the source pool is too small.
    InsufficientAllowance,

    /// The destination pool cannot cover the credit.
    InsufficientPoolLiquidity,

    /// The signing identity on `chain` cannot pay for its own leg's gas.
    InsufficientFeeBalance { chain: ChainId },

    /// The user-to-pool debit failed. Nothing has moved; no compensation.
    SourceTransferFailed { detail: String },

    /// The pool-to-user credit failed before compensation was attempted.
    DestinationTransferFailed { detail: String },

    /// The destination credit failed and the compensating reversal succeeded:
    /// the user's funds are restored, the bridge attempt itself failed.
    Reverted { detail: String },

    /// The compensating reversal itself failed. Funds are held in the source
    /// pool pending manual reconciliation; requires operator attention.
    RevertFailed { detail: String },

    /// A read against a ledger (decimals, balances, gas estimation) failed
    /// during the side-effect-free phase.
    LedgerRead { detail: String },
}

// Manual `Display`/`Error` impls (equivalent to the former `#[derive(thiserror::Error)]`):
// a field literally named `source` is unconditionally treated as the error source by
// thiserror, but here `source` is a decimal count, so the derive cannot be used.
impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::InvalidRequest(msg) => write!(f, "{}", msg),
            BridgeError::UnknownLedger(id) => write!(f, "No chain configured for chain ID: {}", id),
            BridgeError::PrecisionMismatch { source, destination } => write!(
                f,
                "Source and destination decimals must be the same (source: {}, destination: {})",
                source, destination
            ),
            BridgeError::InsufficientAllowance => write!(f, "Insufficient allowance"),
            BridgeError::InsufficientPoolLiquidity => {
                write!(f, "Insufficient destination pool balance")
            }
            BridgeError::InsufficientFeeBalance { chain } => write!(
                f,
                "Insufficient native token balance to pay for gas on chain {}",
                chain
            ),
            BridgeError::SourceTransferFailed { detail } => {
                write!(f, "Source user to source pool transaction failed: {}", detail)
            }
            BridgeError::DestinationTransferFailed { detail } => write!(
                f,
                "Destination pool to destination user transaction failed: {}",
                detail
            ),
            BridgeError::Reverted { detail } => {
                write!(f, "Transfer failed and the source debit was reverted: {}", detail)
            }
            BridgeError::RevertFailed { detail } => write!(
                f,
                "Revert of source transfer failed, funds held in source pool pending manual reconciliation: {}",
                detail
            ),
            BridgeError::LedgerRead { detail } => write!(f, "Ledger read failed: {}", detail),
        }
    }
}

impl std::error::Error for BridgeError {}

impl BridgeError {
    /// Stable machine-readable code for the wire envelope and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::InvalidRequest(_) => "INVALID_REQUEST",
            BridgeError::UnknownLedger(_) => "UNKNOWN_LEDGER",
            BridgeError::PrecisionMismatch { .. } => "INVALID_DECIMALS",
            BridgeError::InsufficientAllowance => "INSUFFICIENT_ALLOWANCE",
            BridgeError::InsufficientPoolLiquidity => "INSUFFICIENT_DESTINATION_POOL_BALANCE",
            BridgeError::InsufficientFeeBalance { .. } => "INSUFFICIENT_FEE_BALANCE",
            BridgeError::SourceTransferFailed { .. } => "SOURCE_TRANSFER_FAILED",
            BridgeError::DestinationTransferFailed { .. } => "DESTINATION_TRANSFER_FAILED",
            BridgeError::Reverted { .. } => "TRANSFER_REVERTED",
            BridgeError::RevertFailed { .. } => "REVERT_FAILED",
            BridgeError::LedgerRead { .. } => "LEDGER_READ_FAILED",
        }
    }

    /// HTTP status the API layer maps this failure to. Request-shaped
    /// failures are the caller's fault; everything at or past submission is a
    /// server-side failure.
    pub fn http_status(&self) -> u16 {
        match self {
            BridgeError::InvalidRequest(_)
            | BridgeError::UnknownLedger(_)
            | BridgeError::InsufficientAllowance
            | BridgeError::InsufficientPoolLiquidity
            | BridgeError::InsufficientFeeBalance { .. } => 400,
            BridgeError::PrecisionMismatch { .. }
            | BridgeError::SourceTransferFailed { .. }
            | BridgeError::DestinationTransferFailed { .. }
            | BridgeError::Reverted { .. }
            | BridgeError::RevertFailed { .. }
            | BridgeError::LedgerRead { .. } => 500,
        }
    }

    /// True for failures that signal pool/user balance inconsistency and must
    /// stand out from ordinary transfer failures in logs and monitoring.
    pub fn is_critical(&self) -> bool {
        matches!(self, BridgeError::RevertFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_stable() {
        assert_eq!(
            BridgeError::InsufficientAllowance.kind(),
            "INSUFFICIENT_ALLOWANCE"
        );
        assert_eq!(
            BridgeError::Reverted {
                detail: "x".to_string()
            }
            .kind(),
            "TRANSFER_REVERTED"
        );
        assert_eq!(
            BridgeError::RevertFailed {
                detail: "x".to_string()
            }
            .kind(),
            "REVERT_FAILED"
        );
    }

    #[test]
    fn test_http_status_split() {
        assert_eq!(BridgeError::InsufficientAllowance.http_status(), 400);
        assert_eq!(BridgeError::UnknownLedger(ChainId(9)).http_status(), 400);
        assert_eq!(
            BridgeError::SourceTransferFailed {
                detail: "x".to_string()
            }
            .http_status(),
            500
        );
    }

    #[test]
    fn test_only_revert_failed_is_critical() {
        assert!(BridgeError::RevertFailed {
            detail: "x".to_string()
        }
        .is_critical());
        assert!(!BridgeError::Reverted {
            detail: "x".to_string()
        }
        .is_critical());
        assert!(!BridgeError::InsufficientAllowance.is_critical());
    }
}
