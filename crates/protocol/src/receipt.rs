//! Operation results and the position read model

use lending_core::{Address, Amount};
use lending_risk::{PositionStatus, Seizure};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::instruction::Operation;

/// Outcome of a committed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub operation: Operation,
    pub owner: Address,
    /// Correlation id shared with the journal record and log lines
    pub correlation_id: String,
    /// Journal sequence, when a journal is attached
    pub sequence: Option<u64>,
    /// Collateral balance after the operation, if the record exists
    pub collateral: Option<Amount>,
    /// Principal after the operation, if the record exists
    pub principal: Option<Amount>,
    /// Liquidations only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seizure: Option<Seizure>,
}

/// Derived view of one owner's position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub owner: Address,
    pub collateral: Option<Amount>,
    pub principal: Option<Amount>,
    pub max_borrowable: Amount,
    /// Liquidation limit over debt value; `None` without debt
    pub health_factor: Option<Decimal>,
    pub status: PositionStatus,
}

impl PositionSnapshot {
    pub fn is_liquidatable(&self) -> bool {
        self.status == PositionStatus::Liquidatable
    }
}
