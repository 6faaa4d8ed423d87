//! Liquidation quotes
//!
//! A liquidator who repays `repaid` units of debt receives collateral worth
//! the repaid value plus the liquidation bonus, rounded down to whole
//! collateral units and capped at what the position holds.

use lending_core::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::engine::{Prices, RiskEngine};

/// Collateral movement of one liquidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seizure {
    /// Collateral transferred to the liquidator
    pub collateral_seized: Amount,
    /// Portion of the seized collateral that is bonus
    pub bonus: Amount,
    /// Collateral units owed but not available (bad debt)
    pub shortfall: Decimal,
}

impl Seizure {
    /// Whether the position could cover the full quote
    pub fn is_covered(&self) -> bool {
        self.shortfall.is_zero()
    }
}

impl RiskEngine {
    /// Quote the collateral seized for repaying `repaid` units of debt
    pub fn quote_seizure(&self, repaid: Amount, collateral_balance: Amount, prices: &Prices) -> Seizure {
        let repaid_value = repaid.value().saturating_mul(prices.loan);
        let in_collateral = |value: Decimal| {
            value
                .checked_div(prices.collateral)
                .unwrap_or(Decimal::MAX)
                .floor()
        };
        let base = in_collateral(repaid_value);
        let owed = in_collateral(
            repaid_value.saturating_mul(Decimal::ONE + self.params().liquidation_bonus),
        );

        let available = collateral_balance.value();
        let seized = owed.min(available);
        let shortfall = (owed - seized).max(Decimal::ZERO);
        let bonus = (seized - base).max(Decimal::ZERO);

        Seizure {
            collateral_seized: Amount::new(seized).unwrap_or(Amount::ZERO),
            bonus: Amount::new(bonus).unwrap_or(Amount::ZERO),
            shortfall,
        }
    }
}
