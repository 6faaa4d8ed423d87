//! Oracle error types

use thiserror::Error;

/// Oracle-related errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Asset has no price feed
    #[error("No price for asset: {asset}")]
    AssetNotFound { asset: String },

    /// Price data is stale (older than threshold)
    #[error("Stale price for {asset}: last update was {last_update}, threshold is {threshold_secs}s")]
    StalePrice {
        asset: String,
        last_update: String,
        threshold_secs: u64,
    },

    /// Price data is invalid
    #[error("Invalid price for {asset}: {reason}")]
    InvalidPrice { asset: String, reason: String },
}
