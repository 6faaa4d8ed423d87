//! Risk engine implementation

use lending_core::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::RiskError;
use crate::params::RiskParams;

/// Quote value of one base unit of each asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prices {
    pub collateral: Decimal,
    pub loan: Decimal,
}

impl Prices {
    pub fn new(collateral: Decimal, loan: Decimal) -> Self {
        Self { collateral, loan }
    }

    /// Both assets worth one quote unit
    pub fn parity() -> Self {
        Self::new(Decimal::ONE, Decimal::ONE)
    }
}

impl Default for Prices {
    fn default() -> Self {
        Self::parity()
    }
}

/// Derived state of a user's combined position
///
/// Never stored; recomputed from balances on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    /// At least one of the two records is missing
    Uninitialized,
    /// Principal within the loan-to-value limit
    Healthy,
    /// Above the loan-to-value limit but below the liquidation threshold
    AtRisk,
    /// Above the liquidation threshold
    Liquidatable,
}

/// Risk Engine - Pre-commit gatekeeper
///
/// Validates borrows and liquidations against the configured ratios.
#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    params: RiskParams,
}

impl RiskEngine {
    pub fn new(params: RiskParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RiskParams {
        &self.params
    }

    /// Quote value of a collateral balance
    ///
    /// Values beyond the decimal range saturate at `Decimal::MAX`.
    pub fn collateral_value(&self, collateral: Amount, prices: &Prices) -> Decimal {
        collateral.value().saturating_mul(prices.collateral)
    }

    /// Quote value of a loan principal, saturating like `collateral_value`
    pub fn debt_value(&self, principal: Amount, prices: &Prices) -> Decimal {
        principal.value().saturating_mul(prices.loan)
    }

    /// Collateral value the loan-to-value ratio allows to be borrowed against
    fn borrow_limit(&self, collateral: Amount, prices: &Prices) -> Decimal {
        self.collateral_value(collateral, prices)
            .saturating_mul(self.params.ltv_ratio)
    }

    /// Maximum principal (in loan base units) the collateral supports
    pub fn max_borrowable(&self, collateral: Amount, prices: &Prices) -> Amount {
        if prices.loan <= Decimal::ZERO {
            return Amount::ZERO;
        }
        let limit = self
            .borrow_limit(collateral, prices)
            .checked_div(prices.loan)
            .unwrap_or(Decimal::MAX);
        Amount::new(limit.floor()).unwrap_or(Amount::ZERO)
    }

    /// Approve or reject borrowing `amount` on top of `principal`
    ///
    /// Permitted iff `principal + amount <= max_borrowable(collateral)`.
    pub fn check_borrow(
        &self,
        collateral: Amount,
        principal: Amount,
        amount: Amount,
        prices: &Prices,
    ) -> Result<(), RiskError> {
        let exceeds = || RiskError::ExceedsBorrowLimit {
            requested: amount.value(),
            principal: principal.value(),
            max_borrowable: self.max_borrowable(collateral, prices).value(),
        };

        // A debt outside the decimal range can never be within the limit
        let new_debt = principal
            .value()
            .checked_add(amount.value())
            .and_then(|debt| debt.checked_mul(prices.loan))
            .ok_or_else(exceeds)?;

        if new_debt > self.borrow_limit(collateral, prices) {
            return Err(exceeds());
        }

        Ok(())
    }

    /// Debt value above which the position becomes liquidatable
    pub fn liquidation_limit(&self, collateral: Amount, prices: &Prices) -> Decimal {
        self.collateral_value(collateral, prices)
            .saturating_mul(self.params.liquidation_threshold)
    }

    /// `principal_value > collateral_value * liquidation_threshold`
    pub fn is_liquidatable(&self, collateral: Amount, principal: Amount, prices: &Prices) -> bool {
        self.debt_value(principal, prices) > self.liquidation_limit(collateral, prices)
    }

    /// Reject liquidation of a healthy position
    pub fn check_liquidatable(
        &self,
        collateral: Amount,
        principal: Amount,
        prices: &Prices,
    ) -> Result<(), RiskError> {
        if !self.is_liquidatable(collateral, principal, prices) {
            return Err(RiskError::PositionHealthy {
                debt_value: self.debt_value(principal, prices),
                limit: self.liquidation_limit(collateral, prices),
            });
        }
        Ok(())
    }

    /// Health factor = liquidation limit / debt value
    ///
    /// Below 1 means liquidatable. None when there is no debt.
    pub fn health_factor(&self, collateral: Amount, principal: Amount, prices: &Prices) -> Option<Decimal> {
        let debt = self.debt_value(principal, prices);
        if debt.is_zero() {
            return None;
        }
        Some(
            self.liquidation_limit(collateral, prices)
                .checked_div(debt)
                .unwrap_or(Decimal::MAX),
        )
    }

    /// Derive the position status from the two (possibly missing) balances
    pub fn status(
        &self,
        collateral: Option<Amount>,
        principal: Option<Amount>,
        prices: &Prices,
    ) -> PositionStatus {
        let (collateral, principal) = match (collateral, principal) {
            (Some(c), Some(p)) => (c, p),
            _ => return PositionStatus::Uninitialized,
        };

        if self.is_liquidatable(collateral, principal, prices) {
            PositionStatus::Liquidatable
        } else if self.debt_value(principal, prices) > self.borrow_limit(collateral, prices) {
            PositionStatus::AtRisk
        } else {
            PositionStatus::Healthy
        }
    }
}
