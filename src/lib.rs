//! USDC Bridge Server - Library interface
//!
//! Re-exports internal modules for use in integration tests.

pub mod api;
pub mod bridge;
pub mod chains;
pub mod config;
pub mod contracts;
pub mod db;
pub mod error;
pub mod fees;
pub mod metrics;
pub mod token;
pub mod tracker;
pub mod types;
