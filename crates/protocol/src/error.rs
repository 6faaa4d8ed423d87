//! Lending protocol errors

use lending_core::{Address, PositionKind};
use lending_custody::CustodyError;
use lending_events::EventError;
use lending_ledger::LedgerError;
use lending_oracle::OracleError;
use lending_risk::RiskError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Every way an operation can fail
///
/// Errors are surfaced verbatim; nothing is retried internally.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LendingError {
    #[error("{kind} position of {owner} already initialized")]
    AlreadyInitialized { owner: Address, kind: PositionKind },

    #[error("{kind} position of {owner} not found")]
    NotFound { owner: Address, kind: PositionKind },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds in {account}: available {available}, required {required}")]
    InsufficientFunds {
        account: Address,
        available: Decimal,
        required: Decimal,
    },

    #[error("Vault {vault} holds {available}, cannot pay out {required}")]
    VaultInsufficient {
        vault: Address,
        available: Decimal,
        required: Decimal,
    },

    #[error("Borrow of {requested} exceeds limit: principal {principal}, max borrowable {max_borrowable}")]
    ExceedsBorrowLimit {
        requested: Decimal,
        principal: Decimal,
        max_borrowable: Decimal,
    },

    #[error("Repayment of {requested} exceeds outstanding principal {outstanding}")]
    OverRepayment { requested: Decimal, outstanding: Decimal },

    #[error("Position is healthy: debt value {debt_value} within liquidation limit {limit}")]
    PositionHealthy { debt_value: Decimal, limit: Decimal },

    #[error("Account mismatch for {field}: expected {expected}, got {actual}")]
    AccountMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("{kind} position of {owner} would underflow")]
    Underflow { owner: Address, kind: PositionKind },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Journal error: {0}")]
    Journal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LendingError {
    /// Errors that mean the books disagree with reality
    ///
    /// These are never expected from well-formed input and are logged at
    /// error level.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            LendingError::VaultInsufficient { .. }
                | LendingError::Underflow { .. }
                | LendingError::Journal(_)
        )
    }

    pub(crate) fn mismatch(field: &'static str, expected: impl ToString, actual: impl ToString) -> Self {
        LendingError::AccountMismatch {
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl From<LedgerError> for LendingError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::AlreadyInitialized { owner, kind } => {
                LendingError::AlreadyInitialized { owner, kind }
            }
            LedgerError::NotFound { owner, kind } => LendingError::NotFound { owner, kind },
            LedgerError::Underflow { owner, kind, .. } | LedgerError::Overflow { owner, kind } => {
                LendingError::Underflow { owner, kind }
            }
        }
    }
}

impl From<CustodyError> for LendingError {
    fn from(e: CustodyError) -> Self {
        match e {
            CustodyError::InsufficientFunds {
                account,
                available,
                required,
            } => LendingError::InsufficientFunds {
                account,
                available,
                required,
            },
            CustodyError::VaultInsufficient {
                vault,
                available,
                required,
            } => LendingError::VaultInsufficient {
                vault,
                available,
                required,
            },
            CustodyError::AccountNotFound(address) => {
                LendingError::mismatch("token_account", "an open token account", address)
            }
            CustodyError::Unauthorized { account, authority } => {
                LendingError::mismatch("authority", format!("controller of {}", account), authority)
            }
            CustodyError::BalanceOverflow(account) => {
                LendingError::InvalidAmount(format!("balance overflow in {}", account))
            }
            CustodyError::AssetMismatch { from_asset, to_asset } => {
                LendingError::mismatch("asset", from_asset, to_asset)
            }
        }
    }
}

impl From<RiskError> for LendingError {
    fn from(e: RiskError) -> Self {
        match e {
            RiskError::ExceedsBorrowLimit {
                requested,
                principal,
                max_borrowable,
            } => LendingError::ExceedsBorrowLimit {
                requested,
                principal,
                max_borrowable,
            },
            RiskError::PositionHealthy { debt_value, limit } => {
                LendingError::PositionHealthy { debt_value, limit }
            }
            RiskError::InvalidParams(msg) => LendingError::Config(msg),
        }
    }
}

impl From<EventError> for LendingError {
    fn from(e: EventError) -> Self {
        LendingError::Journal(e.to_string())
    }
}
