use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Note: amount_bridged is stored as NUMERIC(78,0) in the database. We keep it
// as a String in Rust; inserts cast the text value ($n::NUMERIC) and reads
// cast back (amount_bridged::TEXT).

/// One completed bridge transfer, created only after both legs succeeded.
/// Immutable once written.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgingLog {
    pub id: i64,
    pub source_tx_hash: String,
    pub source_tx_explorer_url: String,
    pub source_user_address: String,
    pub destination_tx_hash: String,
    pub destination_tx_explorer_url: String,
    pub destination_user_address: String,
    /// Smallest-unit integer amount as a decimal string
    pub amount_bridged: String,
    pub timestamp: DateTime<Utc>,
}

/// For inserting new bridging logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBridgingLog {
    pub source_tx_hash: String,
    pub source_tx_explorer_url: String,
    pub source_user_address: String,
    pub destination_tx_hash: String,
    pub destination_tx_explorer_url: String,
    pub destination_user_address: String,
    pub amount_bridged: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridging_log_serializes_camel_case() {
        let log = BridgingLog {
            id: 1,
            source_tx_hash: "0xabc".to_string(),
            source_tx_explorer_url: "https://explorer.example.com/tx/0xabc".to_string(),
            source_user_address: "0x000000000000000000000000000000000000dEaD".to_string(),
            destination_tx_hash: "0xdef".to_string(),
            destination_tx_explorer_url: "https://explorer.example.com/tx/0xdef".to_string(),
            destination_user_address: "0x000000000000000000000000000000000000bEEF".to_string(),
            amount_bridged: "100000000".to_string(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&log).unwrap();
        assert!(json.get("sourceTxHash").is_some());
        assert!(json.get("destinationTxExplorerUrl").is_some());
        assert!(json.get("amountBridged").is_some());
        assert!(json.get("source_tx_hash").is_none());
    }
}
