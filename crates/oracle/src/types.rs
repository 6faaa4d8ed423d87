//! Core oracle types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::OracleError;

/// Price of one base unit of an asset in the common quote unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Asset code (e.g., SOL)
    pub asset: String,
    /// Quote value of one base unit
    pub value: Decimal,
    /// Timestamp when this price was observed
    pub timestamp: DateTime<Utc>,
    /// Source of the price (e.g., "parity", "mock", "pyth")
    pub source: String,
}

impl Price {
    pub fn new(asset: impl Into<String>, value: Decimal, source: impl Into<String>) -> Self {
        Self {
            asset: asset.into().to_uppercase(),
            value,
            timestamp: Utc::now(),
            source: source.into(),
        }
    }

    /// Check if price is stale (older than threshold)
    pub fn is_stale(&self, max_age_secs: u64) -> bool {
        let age = Utc::now().signed_duration_since(self.timestamp);
        age.num_seconds() > max_age_secs as i64
    }

    /// Reject non-positive or stale prices
    pub fn validate(&self, max_age_secs: u64) -> Result<Decimal, OracleError> {
        if self.value <= Decimal::ZERO {
            return Err(OracleError::InvalidPrice {
                asset: self.asset.clone(),
                reason: format!("price must be positive, got {}", self.value),
            });
        }
        if self.is_stale(max_age_secs) {
            return Err(OracleError::StalePrice {
                asset: self.asset.clone(),
                last_update: self.timestamp.to_rfc3339(),
                threshold_secs: max_age_secs,
            });
        }
        Ok(self.value)
    }
}

/// Price Oracle trait - interface for asset valuation
///
/// Implementations can be:
/// - ParityOracle: Every asset worth 1 (single-unit accounting)
/// - MockOracle: For testing with fixed prices
/// - An on-chain feed adapter in a deployment
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Get the current price for an asset
    async fn get_price(&self, asset: &str) -> Result<Price, OracleError>;

    /// Get prices for multiple assets at once
    async fn get_prices(&self, assets: &[&str]) -> Vec<Result<Price, OracleError>> {
        let mut results = Vec::new();
        for asset in assets {
            results.push(self.get_price(asset).await);
        }
        results
    }
}
