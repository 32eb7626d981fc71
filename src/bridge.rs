//! Transfer orchestrator
//!
//! Executes one bridging request end-to-end: context setup, validation, fee
//! checks, source debit, destination credit, and the compensating reversal
//! when the credit fails after the debit landed. The two ledgers share no
//! atomicity, so ordering is everything here:
//!
//! - all reads run before any write;
//! - the debit and credit run strictly sequentially;
//! - a credit failure triggers exactly one reversal, never retried;
//! - a log append failure after both legs succeeded must NOT revert:
//!   reversing a completed credit would double-move funds.
//!
//! The whole sequence runs under the operation tracker, so concurrent
//! identical requests share a single execution and outcome.

use std::sync::Arc;
use std::time::Instant;

use alloy::primitives::{Address, U256};
use tracing::{debug, error, info, warn};

use crate::chains::LedgerDirectory;
use crate::db::{BridgingLogStore, NewBridgingLog};
use crate::error::BridgeError;
use crate::fees::FeeChecker;
use crate::metrics;
use crate::token::TokenGateway;
use crate::tracker::OperationTracker;
use crate::types::{BridgeRequest, BridgeSuccess, TransferReceipt};

pub type BridgeOutcome = Result<BridgeSuccess, BridgeError>;

/// Ephemeral per-request state, built once during context setup and discarded
/// when the operation settles.
struct BridgeContext {
    source_token: Arc<dyn TokenGateway>,
    destination_token: Arc<dyn TokenGateway>,
    source_pool: Address,
    destination_pool: Address,
    source_explorer_url: String,
    destination_explorer_url: String,
    source_decimals: u8,
    destination_decimals: u8,
    amount_to_bridge: U256,
}

#[derive(Clone)]
pub struct BridgeOrchestrator {
    inner: Arc<OrchestratorInner>,
}

struct OrchestratorInner {
    ledgers: Arc<dyn LedgerDirectory>,
    fee_checker: FeeChecker,
    logs: Arc<dyn BridgingLogStore>,
    tracker: OperationTracker<BridgeOutcome>,
}

impl BridgeOrchestrator {
    pub fn new(ledgers: Arc<dyn LedgerDirectory>, logs: Arc<dyn BridgingLogStore>) -> Self {
        Self {
            inner: Arc::new(OrchestratorInner {
                fee_checker: FeeChecker::new(ledgers.clone()),
                ledgers,
                logs,
                tracker: OperationTracker::new(),
            }),
        }
    }

    /// Execute one bridging request. Deduplicated by operation key: a request
    /// identical to one already in flight awaits that execution's outcome
    /// instead of running again.
    pub async fn execute_bridge(&self, request: BridgeRequest) -> BridgeOutcome {
        if let Err(e) = request.validate() {
            metrics::record_request(false);
            metrics::record_failure(e.kind());
            return Err(e);
        }

        let key = request.operation_key();
        let inner = Arc::clone(&self.inner);
        self.inner
            .tracker
            .track(&key, async move { inner.process(request).await })
            .await
    }

    /// Number of operations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.tracker.in_flight()
    }
}

impl OrchestratorInner {
    async fn process(&self, request: BridgeRequest) -> BridgeOutcome {
        let started = Instant::now();
        metrics::INFLIGHT_OPERATIONS.inc();

        let result = self.run(&request).await;

        metrics::INFLIGHT_OPERATIONS.dec();
        metrics::observe_processing(result.is_ok(), started.elapsed().as_secs_f64());
        metrics::record_request(result.is_ok());
        if let Err(e) = &result {
            metrics::record_failure(e.kind());
            if e.is_critical() {
                error!(
                    error = %e,
                    source_user = %request.source_user_address,
                    source_chain = %request.source_chain_id,
                    amount = %request.amount,
                    "Bridge operation left funds in the source pool"
                );
            }
        }

        result
    }

    async fn run(&self, request: &BridgeRequest) -> BridgeOutcome {
        let context = self.setup_context(request).await?;

        self.validate_requirements(&context, request).await?;
        self.check_fee_requirements(&context, request).await?;

        let source_receipt = self.execute_source_transfer(&context, request).await?;

        let destination_receipt = match self.execute_destination_transfer(&context, request).await
        {
            Ok(receipt) => receipt,
            Err(destination_failure) => {
                return Err(self
                    .revert_source_transfer(&context, request, destination_failure)
                    .await);
            }
        };

        self.finalize(&context, request, &source_receipt, &destination_receipt)
            .await
    }

    /// Resolve gateways, pool identities, and decimal precision for both
    /// chains, and convert the requested amount to source smallest units.
    async fn setup_context(&self, request: &BridgeRequest) -> Result<BridgeContext, BridgeError> {
        let source_token = self.ledgers.token_gateway(request.source_chain_id)?;
        let destination_token = self.ledgers.token_gateway(request.destination_chain_id)?;

        let source_pool = self.ledgers.pool_address(request.source_chain_id)?;
        let destination_pool = self.ledgers.pool_address(request.destination_chain_id)?;

        let source_explorer_url = self.ledgers.explorer_url(request.source_chain_id)?;
        let destination_explorer_url = self.ledgers.explorer_url(request.destination_chain_id)?;

        let source_decimals = source_token.decimals().await.map_err(|e| {
            BridgeError::LedgerRead {
                detail: format!("Failed to read source token decimals: {}", e),
            }
        })?;
        let destination_decimals = destination_token.decimals().await.map_err(|e| {
            BridgeError::LedgerRead {
                detail: format!("Failed to read destination token decimals: {}", e),
            }
        })?;

        let amount_to_bridge = request.amount_in_units(source_decimals)?;

        Ok(BridgeContext {
            source_token,
            destination_token,
            source_pool,
            destination_pool,
            source_explorer_url,
            destination_explorer_url,
            source_decimals,
            destination_decimals,
            amount_to_bridge,
        })
    }

    /// Pre-flight validation. Reads only; any failure here is side-effect-free
    /// and needs no compensation.
    async fn validate_requirements(
        &self,
        context: &BridgeContext,
        request: &BridgeRequest,
    ) -> Result<(), BridgeError> {
        if context.source_decimals != context.destination_decimals {
            return Err(BridgeError::PrecisionMismatch {
                source: context.source_decimals,
                destination: context.destination_decimals,
            });
        }

        let allowance = context
            .source_token
            .allowance(request.source_user_address, context.source_pool)
            .await
            .map_err(|e| BridgeError::LedgerRead {
                detail: format!("Failed to read source allowance: {}", e),
            })?;

        debug!(
            %allowance,
            amount_to_bridge = %context.amount_to_bridge,
            "Checked source allowance"
        );

        if allowance < context.amount_to_bridge {
            return Err(BridgeError::InsufficientAllowance);
        }

        let destination_pool_balance = context
            .destination_token
            .balance_of(context.destination_pool)
            .await
            .map_err(|e| BridgeError::LedgerRead {
                detail: format!("Failed to read destination pool balance: {}", e),
            })?;

        if destination_pool_balance < context.amount_to_bridge {
            return Err(BridgeError::InsufficientPoolLiquidity);
        }

        Ok(())
    }

    /// Each chain's signing identity must cover its own leg's gas. Still
    /// read-only.
    async fn check_fee_requirements(
        &self,
        context: &BridgeContext,
        request: &BridgeRequest,
    ) -> Result<(), BridgeError> {
        let source_estimated_gas = context
            .source_token
            .estimate_transfer_from(
                request.source_user_address,
                context.source_pool,
                context.amount_to_bridge,
            )
            .await
            .map_err(|e| BridgeError::LedgerRead {
                detail: format!("Failed to estimate source transfer gas: {}", e),
            })?;

        if !self
            .fee_checker
            .has_sufficient_fee_balance(request.source_chain_id, source_estimated_gas)
            .await?
        {
            return Err(BridgeError::InsufficientFeeBalance {
                chain: request.source_chain_id,
            });
        }

        let destination_estimated_gas = context
            .destination_token
            .estimate_transfer(request.destination_user_address, context.amount_to_bridge)
            .await
            .map_err(|e| BridgeError::LedgerRead {
                detail: format!("Failed to estimate destination transfer gas: {}", e),
            })?;

        if !self
            .fee_checker
            .has_sufficient_fee_balance(request.destination_chain_id, destination_estimated_gas)
            .await?
        {
            return Err(BridgeError::InsufficientFeeBalance {
                chain: request.destination_chain_id,
            });
        }

        Ok(())
    }

    /// First state-changing step: debit the user into the source pool on the
    /// pre-approved allowance. On failure nothing has moved, so the error is
    /// returned directly with no compensation.
    async fn execute_source_transfer(
        &self,
        context: &BridgeContext,
        request: &BridgeRequest,
    ) -> Result<TransferReceipt, BridgeError> {
        match context
            .source_token
            .transfer_from(
                request.source_user_address,
                context.source_pool,
                context.amount_to_bridge,
            )
            .await
        {
            Ok(receipt) if receipt.succeeded => {
                info!(tx_hash = %receipt.tx_hash, "Source debit confirmed");
                Ok(receipt)
            }
            Ok(receipt) => Err(BridgeError::SourceTransferFailed {
                detail: format!(
                    "transaction {} included with failure status",
                    receipt.tx_hash
                ),
            }),
            Err(e) => Err(BridgeError::SourceTransferFailed {
                detail: e.to_string(),
            }),
        }
    }

    async fn execute_destination_transfer(
        &self,
        context: &BridgeContext,
        request: &BridgeRequest,
    ) -> Result<TransferReceipt, BridgeError> {
        match context
            .destination_token
            .transfer(request.destination_user_address, context.amount_to_bridge)
            .await
        {
            Ok(receipt) if receipt.succeeded => {
                info!(tx_hash = %receipt.tx_hash, "Destination credit confirmed");
                Ok(receipt)
            }
            Ok(receipt) => Err(BridgeError::DestinationTransferFailed {
                detail: format!(
                    "transaction {} included with failure status",
                    receipt.tx_hash
                ),
            }),
            Err(e) => Err(BridgeError::DestinationTransferFailed {
                detail: e.to_string(),
            }),
        }
    }

    /// Single compensation attempt: move the debited amount from the source
    /// pool back to the user. Never retried; a failed reversal means the pool
    /// holds user funds until manual reconciliation.
    async fn revert_source_transfer(
        &self,
        context: &BridgeContext,
        request: &BridgeRequest,
        destination_failure: BridgeError,
    ) -> BridgeError {
        warn!(
            error = %destination_failure,
            source_user = %request.source_user_address,
            amount = %context.amount_to_bridge,
            "Destination credit failed, reverting source debit"
        );

        match context
            .source_token
            .transfer_from(
                context.source_pool,
                request.source_user_address,
                context.amount_to_bridge,
            )
            .await
        {
            Ok(receipt) if receipt.succeeded => {
                metrics::record_revert(true);
                info!(
                    tx_hash = %receipt.tx_hash,
                    "Source debit reverted, user funds restored"
                );
                BridgeError::Reverted {
                    detail: destination_failure.to_string(),
                }
            }
            Ok(receipt) => {
                metrics::record_revert(false);
                BridgeError::RevertFailed {
                    detail: format!(
                        "reversal transaction {} included with failure status",
                        receipt.tx_hash
                    ),
                }
            }
            Err(e) => {
                metrics::record_revert(false);
                BridgeError::RevertFailed {
                    detail: e.to_string(),
                }
            }
        }
    }

    /// Both legs landed: record the transfer. An append failure degrades the
    /// success instead of failing the operation; reversal after a completed
    /// destination credit would double-move funds.
    async fn finalize(
        &self,
        context: &BridgeContext,
        request: &BridgeRequest,
        source_receipt: &TransferReceipt,
        destination_receipt: &TransferReceipt,
    ) -> BridgeOutcome {
        let entry = NewBridgingLog {
            source_tx_hash: source_receipt.tx_hash.clone(),
            source_tx_explorer_url: format!(
                "{}/tx/{}",
                context.source_explorer_url, source_receipt.tx_hash
            ),
            source_user_address: request.source_user_address.to_string(),
            destination_tx_hash: destination_receipt.tx_hash.clone(),
            destination_tx_explorer_url: format!(
                "{}/tx/{}",
                context.destination_explorer_url, destination_receipt.tx_hash
            ),
            destination_user_address: request.destination_user_address.to_string(),
            amount_bridged: context.amount_to_bridge.to_string(),
        };

        let message = format!(
            "Transfer completed successfully. Source transaction: {} - Destination transaction: {} - Amount bridged: {}",
            entry.source_tx_explorer_url, entry.destination_tx_explorer_url, entry.amount_bridged
        );

        match self.logs.append(&entry).await {
            Ok(()) => {
                info!(%message);
                Ok(BridgeSuccess {
                    message,
                    log_appended: true,
                })
            }
            Err(e) => {
                metrics::record_log_append_failure();
                warn!(
                    error = %e,
                    source_tx = %entry.source_tx_hash,
                    destination_tx = %entry.destination_tx_hash,
                    "Bridging log append failed after completed transfer; funds moved, audit trail incomplete"
                );
                Ok(BridgeSuccess {
                    message: format!("{} (audit log entry could not be recorded)", message),
                    log_appended: false,
                })
            }
        }
    }
}
