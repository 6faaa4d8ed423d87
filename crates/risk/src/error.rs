//! Risk engine errors

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("Borrow of {requested} exceeds limit: principal {principal}, max borrowable {max_borrowable}")]
    ExceedsBorrowLimit {
        requested: Decimal,
        principal: Decimal,
        max_borrowable: Decimal,
    },

    #[error("Position is healthy: debt value {debt_value} within liquidation limit {limit}")]
    PositionHealthy { debt_value: Decimal, limit: Decimal },

    #[error("Invalid risk parameters: {0}")]
    InvalidParams(String),
}
