//! Mock Oracle for testing
//!
//! Provides configurable fixed prices for exercising liquidation paths.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::OracleError;
use crate::types::{Price, PriceOracle};

/// Mock Price Oracle for testing
///
/// Stores fixed prices that can be updated programmatically, e.g. to push a
/// healthy position under the liquidation threshold.
#[derive(Debug, Default)]
pub struct MockOracle {
    /// Stored prices (asset -> price)
    prices: RwLock<HashMap<String, Price>>,
}

impl MockOracle {
    /// Create a new empty mock oracle
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock oracle with the given asset prices
    pub fn with_prices(prices: &[(&str, Decimal)]) -> Self {
        let oracle = Self::new();
        for (asset, value) in prices {
            oracle.set_price(asset, *value);
        }
        oracle
    }

    /// Set a fixed price for an asset
    pub fn set_price(&self, asset: &str, value: Decimal) {
        let price = Price::new(asset, value, "mock");
        let mut prices = self.prices.write().unwrap_or_else(PoisonError::into_inner);
        prices.insert(asset.to_uppercase(), price);
    }

    /// Insert a fully specified price (e.g. with an old timestamp)
    pub fn set_raw(&self, price: Price) {
        let mut prices = self.prices.write().unwrap_or_else(PoisonError::into_inner);
        prices.insert(price.asset.to_uppercase(), price);
    }

    /// Remove a price (for testing asset-not-found errors)
    pub fn remove_price(&self, asset: &str) {
        let mut prices = self.prices.write().unwrap_or_else(PoisonError::into_inner);
        prices.remove(&asset.to_uppercase());
    }
}

#[async_trait]
impl PriceOracle for MockOracle {
    async fn get_price(&self, asset: &str) -> Result<Price, OracleError> {
        let prices = self.prices.read().unwrap_or_else(PoisonError::into_inner);
        prices
            .get(&asset.to_uppercase())
            .cloned()
            .ok_or_else(|| OracleError::AssetNotFound {
                asset: asset.to_uppercase(),
            })
    }
}
