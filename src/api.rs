//! HTTP API for the bridge server
//!
//! - POST /api/bridge/transfer - execute a bridging request
//! - GET  /api/logs            - completed transfers for an address pair
//! - GET  /api/usdc-address    - configured USDC contract for a chain
//! - GET  /health              - health status (JSON)
//! - GET  /healthz             - liveness probe
//! - GET  /metrics             - Prometheus metrics

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::Address;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use eyre::eyre;
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::bridge::{BridgeOrchestrator, BridgeOutcome};
use crate::chains::LedgerDirectory;
use crate::db::BridgingLogStore;
use crate::types::{BridgeRequest, ChainId};

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: BridgeOrchestrator,
    pub logs: Arc<dyn BridgingLogStore>,
    pub ledgers: Arc<dyn LedgerDirectory>,
    pub chain_count: usize,
}

/// Wire envelope for transfer outcomes
#[derive(Debug, Serialize)]
struct Envelope {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

fn error_envelope(status: StatusCode, message: String, code: &'static str) -> (StatusCode, Json<Envelope>) {
    (
        status,
        Json(Envelope {
            status: "error",
            message,
            code: Some(code),
        }),
    )
}

/// Map an orchestrator outcome to the wire envelope. Degraded success (log
/// append failed) still reports success: the funds moved correctly.
fn outcome_to_response(outcome: BridgeOutcome) -> (StatusCode, Json<Envelope>) {
    match outcome {
        Ok(success) => (
            StatusCode::OK,
            Json(Envelope {
                status: "success",
                message: success.message,
                code: Some("TRANSFER_COMPLETED_SUCCESSFULLY"),
            }),
        ),
        Err(e) => (
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(Envelope {
                status: "error",
                message: e.to_string(),
                code: Some(e.kind()),
            }),
        ),
    }
}

/// Execute a bridging request
async fn execute_transfer(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<Envelope>) {
    let request: BridgeRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => {
            return error_envelope(StatusCode::BAD_REQUEST, e.to_string(), "INVALID_INPUT");
        }
    };

    // Spawned so the operation runs to completion even if the client
    // disconnects: once the source debit is submitted, aborting mid-flight
    // would strand funds in the pool.
    let orchestrator = state.orchestrator.clone();
    let outcome = match tokio::spawn(async move { orchestrator.execute_bridge(request).await }).await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Bridge task aborted unexpectedly");
            return error_envelope(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
                "INTERNAL_ERROR",
            );
        }
    };

    outcome_to_response(outcome)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogsParams {
    source_user_address: Option<String>,
    destination_user_address: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// Validated query arguments for the logs endpoint
#[derive(Debug)]
struct LogsQuery {
    source_user_address: Address,
    destination_user_address: Address,
    limit: i64,
    offset: i64,
}

fn validate_logs_params(params: LogsParams) -> Result<LogsQuery, String> {
    let source = params
        .source_user_address
        .ok_or("Source user address is required")?;
    let destination = params
        .destination_user_address
        .ok_or("Destination user address is required")?;

    let source_user_address = Address::from_str(&source)
        .map_err(|_| "Source user address must be a valid blockchain address".to_string())?;
    let destination_user_address = Address::from_str(&destination)
        .map_err(|_| "Destination user address must be a valid blockchain address".to_string())?;

    let limit = params.limit.unwrap_or(10);
    if !(1..=100).contains(&limit) {
        return Err("Limit must be between 1 and 100".to_string());
    }

    let offset = params.offset.unwrap_or(0);
    if offset < 0 {
        return Err("Offset must be greater than or equal to 0".to_string());
    }

    Ok(LogsQuery {
        source_user_address,
        destination_user_address,
        limit,
        offset,
    })
}

/// Completed transfers for an address pair, newest first
async fn get_logs(
    State(state): State<AppState>,
    Query(params): Query<LogsParams>,
) -> (StatusCode, Json<serde_json::Value>) {
    let query = match validate_logs_params(params) {
        Ok(query) => query,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "status": "error",
                    "message": message,
                    "code": "INVALID_PARAMS",
                })),
            );
        }
    };

    match state
        .logs
        .query_by_addresses(
            &query.source_user_address.to_string(),
            &query.destination_user_address.to_string(),
            query.limit,
            query.offset,
        )
        .await
    {
        Ok(logs) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "success", "data": logs })),
        ),
        Err(e) => {
            error!(error = %e, "Failed to query bridging logs");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "error",
                    "message": e.to_string(),
                })),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdcAddressParams {
    chain_id: Option<u64>,
}

/// Configured USDC contract address for a chain
async fn get_usdc_address(
    State(state): State<AppState>,
    Query(params): Query<UsdcAddressParams>,
) -> (StatusCode, Json<serde_json::Value>) {
    let chain_id = match params.chain_id {
        Some(id) => ChainId(id),
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "status": "error",
                    "message": "Chain ID is required",
                    "code": "INVALID_PARAMS",
                })),
            );
        }
    };

    match state.ledgers.usdc_address(chain_id) {
        Ok(address) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "success", "data": address.to_string() })),
        ),
        Err(e) => (
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(serde_json::json!({
                "status": "error",
                "message": e.to_string(),
                "code": e.kind(),
            })),
        ),
    }
}

/// Health response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    chains: usize,
    inflight_operations: usize,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        chains: state.chain_count,
        inflight_operations: state.orchestrator.in_flight(),
    })
}

/// Liveness probe (always returns OK if the server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Prometheus metrics endpoint
async fn prometheus_metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response();
    }

    match Response::builder()
        .header(header::CONTENT_TYPE, encoder.format_type())
        .body(axum::body::Body::from(buffer))
    {
        Ok(resp) => resp,
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to build metrics response",
        )
            .into_response(),
    }
}

/// Build the router with all endpoints
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/bridge/transfer", post(execute_transfer))
        .route("/api/logs", get(get_logs))
        .route("/api/usdc-address", get(get_usdc_address))
        .route("/health", get(health_check))
        .route("/healthz", get(liveness))
        .route("/metrics", get(prometheus_metrics))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(bind_address: &str, port: u16, state: AppState) -> eyre::Result<()> {
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", bind_address, port)
        .parse()
        .map_err(|e| eyre!("Invalid bind address {}:{}: {}", bind_address, port, e))?;

    info!("API server listening on {}", addr);
    info!("  POST /api/bridge/transfer - execute a bridge transfer");
    info!("  GET  /api/logs            - bridging history");
    info!("  GET  /metrics             - Prometheus metrics");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use crate::types::BridgeSuccess;

    #[test]
    fn test_success_outcome_maps_to_200() {
        let (status, Json(envelope)) = outcome_to_response(Ok(BridgeSuccess {
            message: "done".to_string(),
            log_appended: true,
        }));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.status, "success");
        assert_eq!(envelope.code, Some("TRANSFER_COMPLETED_SUCCESSFULLY"));
    }

    #[test]
    fn test_degraded_success_still_maps_to_200() {
        let (status, Json(envelope)) = outcome_to_response(Ok(BridgeSuccess {
            message: "done (audit log entry could not be recorded)".to_string(),
            log_appended: false,
        }));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.status, "success");
    }

    #[test]
    fn test_validation_failure_maps_to_400() {
        let (status, Json(envelope)) =
            outcome_to_response(Err(BridgeError::InsufficientAllowance));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope.status, "error");
        assert_eq!(envelope.code, Some("INSUFFICIENT_ALLOWANCE"));
    }

    #[test]
    fn test_transfer_failure_maps_to_500() {
        let (status, Json(envelope)) = outcome_to_response(Err(BridgeError::RevertFailed {
            detail: "x".to_string(),
        }));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope.code, Some("REVERT_FAILED"));
    }

    #[test]
    fn test_logs_params_defaults() {
        let query = validate_logs_params(LogsParams {
            source_user_address: Some(
                "0x000000000000000000000000000000000000dEaD".to_string(),
            ),
            destination_user_address: Some(
                "0x000000000000000000000000000000000000bEEF".to_string(),
            ),
            limit: None,
            offset: None,
        })
        .unwrap();
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_logs_params_require_addresses() {
        let err = validate_logs_params(LogsParams {
            source_user_address: None,
            destination_user_address: None,
            limit: None,
            offset: None,
        })
        .unwrap_err();
        assert!(err.contains("required"));
    }

    #[test]
    fn test_logs_params_limit_bounds() {
        let base = |limit| LogsParams {
            source_user_address: Some(
                "0x000000000000000000000000000000000000dEaD".to_string(),
            ),
            destination_user_address: Some(
                "0x000000000000000000000000000000000000bEEF".to_string(),
            ),
            limit: Some(limit),
            offset: None,
        };
        assert!(validate_logs_params(base(0)).is_err());
        assert!(validate_logs_params(base(101)).is_err());
        assert!(validate_logs_params(base(100)).is_ok());
    }

    #[test]
    fn test_logs_params_reject_malformed_address() {
        let err = validate_logs_params(LogsParams {
            source_user_address: Some("nope".to_string()),
            destination_user_address: Some(
                "0x000000000000000000000000000000000000bEEF".to_string(),
            ),
            limit: None,
            offset: None,
        })
        .unwrap_err();
        assert!(err.contains("valid blockchain address"));
    }
}
