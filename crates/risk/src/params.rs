//! Risk parameters

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RiskError;

/// Default loan-to-value ratio (50%)
pub const DEFAULT_LTV_RATIO: Decimal = Decimal::from_parts(50, 0, 0, false, 2);
/// Default liquidation threshold (60%)
pub const DEFAULT_LIQUIDATION_THRESHOLD: Decimal = Decimal::from_parts(60, 0, 0, false, 2);
/// Default liquidation bonus paid to liquidators (5%)
pub const DEFAULT_LIQUIDATION_BONUS: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Fixed protocol ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParams {
    /// Maximum fraction of collateral value that may be borrowed, in (0, 1)
    pub ltv_ratio: Decimal,
    /// Debt-to-collateral ratio above which a position is liquidatable
    pub liquidation_threshold: Decimal,
    /// Extra collateral fraction awarded to liquidators
    pub liquidation_bonus: Decimal,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            ltv_ratio: DEFAULT_LTV_RATIO,
            liquidation_threshold: DEFAULT_LIQUIDATION_THRESHOLD,
            liquidation_bonus: DEFAULT_LIQUIDATION_BONUS,
        }
    }
}

impl RiskParams {
    /// Check the ordering constraints between the ratios
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.ltv_ratio <= Decimal::ZERO || self.ltv_ratio >= Decimal::ONE {
            return Err(RiskError::InvalidParams(format!(
                "ltv_ratio must be in (0, 1), got {}",
                self.ltv_ratio
            )));
        }
        if self.liquidation_threshold < self.ltv_ratio {
            return Err(RiskError::InvalidParams(format!(
                "liquidation_threshold {} must be >= ltv_ratio {}",
                self.liquidation_threshold, self.ltv_ratio
            )));
        }
        if self.liquidation_threshold > Decimal::ONE {
            return Err(RiskError::InvalidParams(format!(
                "liquidation_threshold must be <= 1, got {}",
                self.liquidation_threshold
            )));
        }
        if self.liquidation_bonus < Decimal::ZERO || self.liquidation_bonus >= Decimal::ONE {
            return Err(RiskError::InvalidParams(format!(
                "liquidation_bonus must be in [0, 1), got {}",
                self.liquidation_bonus
            )));
        }
        Ok(())
    }
}
