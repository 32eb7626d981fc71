//! Bridging log persistence
//!
//! Durable append-only record of completed transfers, queried by user
//! address pair. The orchestrator only appends; querying serves the API's
//! logs endpoint.

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use sqlx::postgres::{PgPool, PgPoolOptions};

pub mod models;

pub use models::*;

/// Create a database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .wrap_err("Failed to connect to database")
}

/// Run pending migrations (uses the migration files in migrations/)
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .wrap_err("Failed to run database migrations")?;
    Ok(())
}

/// Insert a completed bridge transfer
pub async fn insert_bridging_log(pool: &PgPool, log: &NewBridgingLog) -> Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO bridging_logs (source_tx_hash, source_tx_explorer_url, source_user_address,
            destination_tx_hash, destination_tx_explorer_url, destination_user_address,
            amount_bridged)
        VALUES ($1, $2, $3, $4, $5, $6, $7::NUMERIC)
        RETURNING id
        "#,
    )
    .bind(&log.source_tx_hash)
    .bind(&log.source_tx_explorer_url)
    .bind(&log.source_user_address)
    .bind(&log.destination_tx_hash)
    .bind(&log.destination_tx_explorer_url)
    .bind(&log.destination_user_address)
    .bind(&log.amount_bridged)
    .fetch_one(pool)
    .await
    .wrap_err("Failed to insert bridging log")?;

    Ok(row.0)
}

/// Get bridging logs for a user address pair, newest first
pub async fn get_bridging_logs_by_addresses(
    pool: &PgPool,
    source_user_address: &str,
    destination_user_address: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<BridgingLog>> {
    let rows = sqlx::query_as::<_, BridgingLog>(
        r#"SELECT id, source_tx_hash, source_tx_explorer_url, source_user_address,
                  destination_tx_hash, destination_tx_explorer_url, destination_user_address,
                  amount_bridged::TEXT as amount_bridged, timestamp
           FROM bridging_logs
           WHERE source_user_address = $1 AND destination_user_address = $2
           ORDER BY timestamp DESC
           LIMIT $3 OFFSET $4"#,
    )
    .bind(source_user_address)
    .bind(destination_user_address)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .wrap_err("Failed to get bridging logs")?;

    Ok(rows)
}

/// Append/query contract the orchestrator and API consume, so tests can swap
/// in an in-memory store.
#[async_trait]
pub trait BridgingLogStore: Send + Sync {
    async fn append(&self, log: &NewBridgingLog) -> Result<()>;

    async fn query_by_addresses(
        &self,
        source_user_address: &str,
        destination_user_address: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BridgingLog>>;
}

/// Postgres-backed store
pub struct PgBridgingLogStore {
    pool: PgPool,
}

impl PgBridgingLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BridgingLogStore for PgBridgingLogStore {
    async fn append(&self, log: &NewBridgingLog) -> Result<()> {
        insert_bridging_log(&self.pool, log).await?;
        Ok(())
    }

    async fn query_by_addresses(
        &self,
        source_user_address: &str,
        destination_user_address: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BridgingLog>> {
        get_bridging_logs_by_addresses(
            &self.pool,
            source_user_address,
            destination_user_address,
            limit,
            offset,
        )
        .await
    }
}
